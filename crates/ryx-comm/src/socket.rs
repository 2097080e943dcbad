//! The transport seam: a minimal async datagram trait so
//! [`crate::service::Communication`] never names `tokio::net::UdpSocket`
//! directly, matching the teacher's habit of trait-isolating I/O at the
//! adapter boundary even for a single production implementation.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

#[async_trait]
pub trait DatagramSocket: Send + Sync {
    async fn send_to(&self, bytes: &[u8], addr: SocketAddr) -> std::io::Result<usize>;
    async fn recv_from(&self, buf: &mut [u8]) -> std::io::Result<(usize, SocketAddr)>;
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

pub struct UdpDatagramSocket {
    inner: UdpSocket,
}

impl UdpDatagramSocket {
    pub async fn bind(addr: SocketAddr) -> std::io::Result<Arc<Self>> {
        let inner = UdpSocket::bind(addr).await?;
        Ok(Arc::new(Self { inner }))
    }
}

#[async_trait]
impl DatagramSocket for UdpDatagramSocket {
    async fn send_to(&self, bytes: &[u8], addr: SocketAddr) -> std::io::Result<usize> {
        self.inner.send_to(bytes, addr).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> std::io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}
