//! tiny_http server loop.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tiny_http::{Header, Method, Request, Response, Server};

use crate::routes::{Reply, Routes};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {error}")]
    BindError { addr: String, error: String },
    #[error("Server thread panicked")]
    ThreadPanic,
}

/// The planet HTTP service.
///
/// Requests are handled one at a time on a background thread.
pub struct PlanetServer {
    host: String,
    port: u16,
    actual_port: Option<u16>,
    server: Option<Arc<Server>>,
    handle: Option<JoinHandle<()>>,
}

impl PlanetServer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            actual_port: None,
            server: None,
            handle: None,
        }
    }

    /// Bind and start serving `routes`. Port 0 lets the OS pick.
    pub fn start(&mut self, routes: Routes) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.host, self.port);
        let server = Server::http(&addr).map_err(|e| ServerError::BindError {
            addr: addr.clone(),
            error: e.to_string(),
        })?;

        let actual_port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        self.actual_port = Some(actual_port);

        let server = Arc::new(server);
        let worker = Arc::clone(&server);
        let handle = thread::Builder::new()
            .name("terra-http".to_string())
            .spawn(move || Self::run_server(&worker, &routes))
            .map_err(|e| ServerError::BindError {
                addr,
                error: e.to_string(),
            })?;

        tracing::info!("Planet server listening on {}:{actual_port}", self.host);
        self.server = Some(server);
        self.handle = Some(handle);
        Ok(())
    }

    pub fn actual_port(&self) -> u16 {
        self.actual_port.unwrap_or(self.port)
    }

    /// Block until the server thread exits.
    pub fn wait(&mut self) -> Result<(), ServerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ServerError::ThreadPanic),
            None => Ok(()),
        }
    }

    /// Unblock the accept loop and join the server thread.
    pub fn stop(&mut self) {
        if let Some(server) = self.server.take() {
            server.unblock();
        }
        if self.wait().is_err() {
            tracing::error!("Planet server thread panicked");
        }
    }

    fn run_server(server: &Server, routes: &Routes) {
        for request in server.incoming_requests() {
            if let Err(e) = Self::handle_request(request, routes) {
                tracing::warn!("Planet server error: {e}");
            }
        }
        tracing::debug!("Planet server loop exited");
    }

    fn handle_request(request: Request, routes: &Routes) -> std::io::Result<()> {
        let reply = match request.method() {
            Method::Get => routes.get(request.url()),
            _ => Reply {
                status: 404,
                content_type: "text/plain; charset=utf-8",
                body: b"Not Found".to_vec(),
            },
        };

        let mut response = Response::from_data(reply.body).with_status_code(reply.status);
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
        {
            response = response.with_header(header);
        }
        request.respond(response)
    }
}

impl Drop for PlanetServer {
    fn drop(&mut self) {
        self.stop();
    }
}
