//! Per-node spatial configuration (spec §3.4, §4.5).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exactly one of these per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordSystem {
    Gps,
    Relative,
    Logical,
    None,
}

impl Default for CoordSystem {
    fn default() -> Self {
        CoordSystem::None
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpatialError {
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(String),
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(String),
    #[error("coordinate is not finite")]
    NonFinite,
}

/// A node's coordinate system tag, optional `(x,y,z)`, zone tag, and
/// declared barrier descriptors (spec §3.4). Barriers themselves live in
/// [`crate::BarrierRegistry`]; this struct only carries the node's own
/// position and zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    pub system: CoordSystem,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub zone: Option<String>,
}

impl SpatialConfig {
    pub fn none() -> Self {
        Self::default()
    }

    /// GPS requires latitude in `[-90,90]` and longitude in `[-180,180]`;
    /// relative admits any finite triple; logical ignores coordinates;
    /// none disables all spatial computation (spec §4.5).
    pub fn validate(&self) -> Result<(), SpatialError> {
        match self.system {
            CoordSystem::Gps => {
                let lat = self.x.unwrap_or(0.0);
                let lon = self.y.unwrap_or(0.0);
                if !lat.is_finite() || !lon.is_finite() {
                    return Err(SpatialError::NonFinite);
                }
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(SpatialError::LatitudeOutOfRange(lat.to_string()));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(SpatialError::LongitudeOutOfRange(lon.to_string()));
                }
                if let Some(z) = self.z {
                    if !z.is_finite() {
                        return Err(SpatialError::NonFinite);
                    }
                }
                Ok(())
            }
            CoordSystem::Relative => {
                for v in [self.x, self.y, self.z].into_iter().flatten() {
                    if !v.is_finite() {
                        return Err(SpatialError::NonFinite);
                    }
                }
                Ok(())
            }
            CoordSystem::Logical | CoordSystem::None => Ok(()),
        }
    }

    pub fn has_zone(&self, zone: &str) -> bool {
        self.zone.as_deref() == Some(zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_rejects_out_of_range_latitude() {
        let cfg = SpatialConfig {
            system: CoordSystem::Gps,
            x: Some(120.0),
            y: Some(0.0),
            z: None,
            zone: None,
        };
        assert_eq!(
            cfg.validate(),
            Err(SpatialError::LatitudeOutOfRange("120".to_string()))
        );
    }

    #[test]
    fn relative_admits_any_finite_triple() {
        let cfg = SpatialConfig {
            system: CoordSystem::Relative,
            x: Some(-1000.0),
            y: Some(99999.0),
            z: Some(0.0),
            zone: None,
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn logical_ignores_coordinates() {
        let cfg = SpatialConfig {
            system: CoordSystem::Logical,
            x: Some(f64::NAN),
            y: None,
            z: None,
            zone: Some("bridge".into()),
        };
        assert!(cfg.validate().is_ok());
    }
}
