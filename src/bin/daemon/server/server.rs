use super::command_registry::CommandRegistry;
use super::connection::{Connection, ConnectionLimits};
use crate::config::DaemonConfig;
use crate::controller::SharedController;
use crate::utils::error::{QpError, Result};
use async_std::channel::Receiver;
use async_std::net::TcpListener;
use async_std::task;
use futures::FutureExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Loopback TCP server that turns each connection into one command batch
pub struct CommandServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<CommandRegistry>,
    controller: SharedController,
    limits: ConnectionLimits,
    next_connection_id: u64,
}

impl CommandServer {
    /// Bind the listener described by `config`
    ///
    /// # Returns
    /// * `Result<CommandServer>` - A listening server, or `NotLoopback`/`Bind` on failure
    pub async fn bind(
        config: &DaemonConfig,
        registry: CommandRegistry,
        controller: SharedController,
    ) -> Result<Self> {
        let addr = config.listen_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| QpError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!("Command server listening on {}", local_addr);

        Ok(CommandServer {
            listener,
            local_addr,
            registry: Arc::new(registry),
            controller,
            limits: ConnectionLimits {
                max_request_size: config.max_request_size,
                read_timeout: config.read_timeout(),
            },
            next_connection_id: 0,
        })
    }

    /// Bind, or log a warning and leave remote control disabled.
    ///
    /// A bind failure is final: the server is not retried.
    pub async fn start(
        config: &DaemonConfig,
        registry: CommandRegistry,
        controller: SharedController,
    ) -> Option<Self> {
        match Self::bind(config, registry, controller).await {
            Ok(server) => Some(server),
            Err(e) => {
                warn!("Unable to start the command server: {}. Remote control disabled.", e);
                None
            }
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until the shutdown channel fires or closes
    pub async fn run(&mut self, shutdown_rx: Receiver<()>) -> Result<()> {
        loop {
            let accepted = futures::select! {
                accepted = self.listener.accept().fuse() => Some(accepted),
                _ = shutdown_rx.recv().fuse() => None,
            };

            match accepted {
                Some(Ok((stream, peer))) => self.spawn_connection(stream, peer),
                Some(Err(e)) => error!("Error accepting connection: {:?}", e),
                None => {
                    info!("Shutdown signal received, stopping command server");
                    break;
                }
            }
        }
        Ok(())
    }

    fn spawn_connection(&mut self, stream: async_std::net::TcpStream, peer: SocketAddr) {
        self.next_connection_id += 1;
        let connection = Connection::new(self.next_connection_id, peer, stream);
        let registry = Arc::clone(&self.registry);
        let controller = Arc::clone(&self.controller);
        let limits = self.limits;

        task::spawn(async move {
            connection.serve(&registry, &controller, limits).await;
        });
    }
}
