//! Pure distance and scoring functions (spec §4.5).
//!
//! Kept free of any stateful registry so they can be called directly from
//! the adaptive neighbor-priority policy in `ryx-behavior` without pulling
//! in a lock.

use crate::config::{CoordSystem, SpatialConfig};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Two nodes are "same zone" iff both carry a non-empty, equal zone tag.
pub fn same_zone(a: &SpatialConfig, b: &SpatialConfig) -> bool {
    match (&a.zone, &b.zone) {
        (Some(za), Some(zb)) => !za.is_empty() && za == zb,
        _ => false,
    }
}

/// Distance between two spatial configs, or `None` when the systems are
/// incompatible or either side lacks the coordinates needed (spec §4.5:
/// "Between incompatible systems: undefined -> returns absent").
pub fn distance_between(a: &SpatialConfig, b: &SpatialConfig) -> Option<f64> {
    if a.system != b.system {
        return None;
    }
    match a.system {
        CoordSystem::Gps => haversine(a, b),
        CoordSystem::Relative => euclidean(a, b),
        CoordSystem::Logical => Some(if same_zone(a, b) { 0.0 } else { 1.0 }),
        CoordSystem::None => None,
    }
}

fn haversine(a: &SpatialConfig, b: &SpatialConfig) -> Option<f64> {
    let (lat1, lon1) = (a.x?, a.y?);
    let (lat2, lon2) = (b.x?, b.y?);
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let sin_half_phi = (d_phi / 2.0).sin();
    let sin_half_lambda = (d_lambda / 2.0).sin();
    let h = sin_half_phi * sin_half_phi + phi1.cos() * phi2.cos() * sin_half_lambda * sin_half_lambda;
    let surface_km = 2.0 * EARTH_RADIUS_KM * h.sqrt().asin();

    // Altitude contributes quadratically if both sides have z (meters -> km).
    let total = match (a.z, b.z) {
        (Some(za), Some(zb)) => {
            let dz_km = (za - zb) / 1000.0;
            (surface_km * surface_km + dz_km * dz_km).sqrt()
        }
        _ => surface_km,
    };
    Some(total)
}

fn euclidean(a: &SpatialConfig, b: &SpatialConfig) -> Option<f64> {
    let dx = (a.x? - b.x?).powi(2);
    let dy = (a.y.unwrap_or(0.0) - b.y.unwrap_or(0.0)).powi(2);
    let dz = (a.z.unwrap_or(0.0) - b.z.unwrap_or(0.0)).powi(2);
    Some((dx + dy + dz).sqrt())
}

/// System-specific distance score used in neighbor priority (spec §4.5):
/// GPS uses a soft threshold curve (~1 within 1 km, falling linearly to 0
/// by ~50 km); relative uses a meter-scale equivalent; logical is 1.0
/// same-zone else 0.2. Returns 0.0 when distance is unavailable, per the
/// "never cause message loss" failure semantics — a missing score simply
/// contributes nothing rather than erroring.
pub fn distance_score(system: CoordSystem, distance_km_or_units: Option<f64>) -> f64 {
    match system {
        CoordSystem::Gps => match distance_km_or_units {
            Some(d) if d <= 1.0 => 1.0,
            Some(d) if d >= 50.0 => 0.0,
            Some(d) => 1.0 - (d - 1.0) / 49.0,
            None => 0.0,
        },
        CoordSystem::Relative => match distance_km_or_units {
            // Meter-scale equivalent: full score within 10 units, zero by 500.
            Some(d) if d <= 10.0 => 1.0,
            Some(d) if d >= 500.0 => 0.0,
            Some(d) => 1.0 - (d - 10.0) / 490.0,
            None => 0.0,
        },
        CoordSystem::Logical => match distance_km_or_units {
            Some(d) if d <= 0.0 => 1.0,
            Some(_) => 0.2,
            None => 0.0,
        },
        CoordSystem::None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gps(lat: f64, lon: f64) -> SpatialConfig {
        SpatialConfig {
            system: CoordSystem::Gps,
            x: Some(lat),
            y: Some(lon),
            z: None,
            zone: None,
        }
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        let a = gps(40.0, -73.0);
        let d = distance_between(&a, &a).unwrap();
        assert!(d < 1e-6);
    }

    #[test]
    fn haversine_nonzero_and_symmetric() {
        let a = gps(40.7128, -74.0060); // NYC
        let b = gps(34.0522, -118.2437); // LA
        let d1 = distance_between(&a, &b).unwrap();
        let d2 = distance_between(&b, &a).unwrap();
        assert!((d1 - d2).abs() < 1e-6);
        // Real-world distance is ~3936 km; allow generous tolerance.
        assert!(d1 > 3000.0 && d1 < 4500.0);
    }

    #[test]
    fn incompatible_systems_return_none() {
        let gps_node = gps(0.0, 0.0);
        let relative_node = SpatialConfig {
            system: CoordSystem::Relative,
            x: Some(0.0),
            y: Some(0.0),
            z: None,
            zone: None,
        };
        assert_eq!(distance_between(&gps_node, &relative_node), None);
    }

    #[test]
    fn logical_distance_is_zero_same_zone_else_one() {
        let a = SpatialConfig {
            system: CoordSystem::Logical,
            zone: Some("bridge".into()),
            ..Default::default()
        };
        let b = SpatialConfig {
            system: CoordSystem::Logical,
            zone: Some("bridge".into()),
            ..Default::default()
        };
        let c = SpatialConfig {
            system: CoordSystem::Logical,
            zone: Some("engine_bay".into()),
            ..Default::default()
        };
        assert_eq!(distance_between(&a, &b), Some(0.0));
        assert_eq!(distance_between(&a, &c), Some(1.0));
    }

    #[test]
    fn gps_distance_score_curve() {
        assert_eq!(distance_score(CoordSystem::Gps, Some(0.5)), 1.0);
        assert_eq!(distance_score(CoordSystem::Gps, Some(60.0)), 0.0);
        let mid = distance_score(CoordSystem::Gps, Some(25.5));
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn missing_distance_scores_zero_never_errors() {
        assert_eq!(distance_score(CoordSystem::Gps, None), 0.0);
    }
}
