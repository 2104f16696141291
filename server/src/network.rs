//! Server network layer: UDP receive loop, outbound queue and idle watchdog.

use crate::session_manager::{Outbound, SessionManager};
use log::{debug, error, info};
use match3_shared::{BUFLEN, WATCHDOG_INTERVAL};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Owns the socket and wires it to the session table.
pub struct Server {
    socket: Arc<UdpSocket>,
    sessions: Arc<SessionManager>,
    outbox_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl Server {
    pub async fn new(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            sessions: Arc::new(SessionManager::new(outbox_tx)),
            outbox_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    /// Writes queued datagrams. A failed send is logged and never retried.
    fn spawn_network_sender(
        socket: Arc<UdpSocket>,
        mut outbox_rx: mpsc::UnboundedReceiver<Outbound>,
    ) {
        tokio::spawn(async move {
            while let Some(Outbound { addr, payload }) = outbox_rx.recv().await {
                match socket.send_to(&payload, addr).await {
                    Ok(len) => debug!("Sent {} bytes to {}", len, addr),
                    Err(e) => error!("Error sending to {}: {}", addr, e),
                }
            }
        });
    }

    /// Sweeps the session table for idle players once per interval.
    fn spawn_watchdog(sessions: Arc<SessionManager>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(WATCHDOG_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let evicted = sessions.tick().await;
                if evicted > 0 {
                    info!("Watchdog ended {} idle games", evicted);
                }
            }
        });
    }

    /// Serves requests forever. Receive errors are logged and the loop continues.
    pub async fn run(self) {
        let Server {
            socket,
            sessions,
            outbox_rx,
        } = self;

        Self::spawn_network_sender(Arc::clone(&socket), outbox_rx);
        Self::spawn_watchdog(Arc::clone(&sessions));

        info!("Server started successfully");

        let mut buffer = [0u8; BUFLEN];
        loop {
            match socket.recv_from(&mut buffer).await {
                Ok((len, addr)) => {
                    debug!(
                        "Received message from {}: {}",
                        addr,
                        String::from_utf8_lossy(&buffer[..len])
                    );
                    sessions.dispatch(addr, &buffer[..len]).await;
                }
                Err(e) => {
                    error!("Error reading from UDP: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
