//! Per-connection lifecycle
//!
//! Each accepted socket gets its own [`Connection`]: it reads one request
//! chunk, dispatches the batch under the controller lock, writes the reply and
//! closes the socket. Nothing is carried over between connections.

use super::command_registry::CommandRegistry;
use super::response_handler::format_response;
use crate::controller::SharedController;
use async_std::io;
use async_std::net::TcpStream;
use async_std::prelude::*;
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle of one accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepted,
    Reading,
    Dispatching,
    Replying,
    Closed,
}

/// Limits applied to every connection
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub max_request_size: usize,
    pub read_timeout: Option<Duration>,
}

pub struct Connection {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
    state: ConnectionState,
}

impl Connection {
    pub fn new(id: u64, peer: SocketAddr, stream: TcpStream) -> Self {
        debug!("Connection {} accepted from {}", id, peer);
        Self {
            id,
            peer,
            stream,
            state: ConnectionState::Accepted,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!("Connection {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }

    /// Serve a single request and close the connection.
    ///
    /// Errors are logged here; nothing propagates to the accept loop.
    pub async fn serve(
        mut self,
        registry: &CommandRegistry,
        controller: &SharedController,
        limits: ConnectionLimits,
    ) {
        if let Err(e) = self.process(registry, controller, limits).await {
            warn!("Connection {} from {} failed: {}", self.id, self.peer, e);
        }
        self.close();
    }

    async fn process(
        &mut self,
        registry: &CommandRegistry,
        controller: &SharedController,
        limits: ConnectionLimits,
    ) -> io::Result<()> {
        self.transition(ConnectionState::Reading);
        let request = match self.read_request(limits).await? {
            Some(request) => request,
            None => {
                debug!("Connection {} sent no data", self.id);
                return Ok(());
            }
        };

        self.transition(ConnectionState::Dispatching);
        info!("Request from {}: {}", self.peer, request.trim_end());
        let reply = {
            let mut guard = controller
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            registry.dispatch(&request, &mut *guard)
        };

        let Some(response) = format_response(&reply) else {
            debug!("Connection {}: nothing to reply", self.id);
            return Ok(());
        };

        self.transition(ConnectionState::Replying);
        debug!("Reply to {}: {}", self.peer, response);
        self.stream.write_all(response.as_bytes()).await?;
        self.stream.flush().await
    }

    /// Read one chunk; `None` for a zero-length read
    async fn read_request(&mut self, limits: ConnectionLimits) -> io::Result<Option<String>> {
        let mut buf = vec![0u8; limits.max_request_size];
        let read = self.stream.read(&mut buf);
        let n = match limits.read_timeout {
            Some(timeout) => io::timeout(timeout, read).await?,
            None => read.await?,
        };

        if n == 0 {
            return Ok(None);
        }
        if n == limits.max_request_size {
            warn!(
                "Connection {}: request filled the {} byte buffer and may be truncated",
                self.id, limits.max_request_size
            );
        }
        Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
    }

    fn close(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!("Connection {}: shutdown: {}", self.id, e);
        }
        self.transition(ConnectionState::Closed);
    }
}
