//! TCP listener for the echo service.
//!
//! Owns the listening socket and hands every accepted connection to its own
//! echo task.

use crate::echo;
use crate::error::BindError;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error};

/// Pending connection queue length
const LISTEN_BACKLOG: i32 = 1024;

/// Bound listening endpoint
pub struct Listener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind the listening socket and register it with the Tokio reactor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(addr: SocketAddr) -> Result<Self, BindError> {
        let bind_err = |source| BindError::Bind { addr, source };

        let listener = create_listener(addr).map_err(bind_err)?;
        let listener = TcpListener::from_std(listener).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        Ok(Listener {
            listener,
            local_addr,
        })
    }

    /// Address the socket is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections forever.
    ///
    /// A failed accept is logged and the loop moves on to the next one.
    pub async fn run(self) {
        let mut next_id: u64 = 0;

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let conn_id = next_id;
                    next_id += 1;
                    debug!(conn_id, peer = %peer, "New connection");

                    tokio::spawn(echo::handle_connection(stream, peer, conn_id));
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Create a non-blocking TCP listener.
///
/// IPv6 addresses are bound dual-stack so `::` also accepts IPv4 clients.
fn create_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}
