//! `QuizroomServer` builder and server loop.
//!
//! This is the entry point for running a quiz server. It ties together
//! all the layers: transport → protocol → session → room.

use std::sync::Arc;

use quizroom_protocol::{Codec, JsonCodec};
use quizroom_room::{EngineConfig, QuizStore, SessionRecorder};
use quizroom_session::Authenticator;
use quizroom_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{QuizroomError, SessionEngine};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<A, Q, R, C>
where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    pub(crate) engine: Arc<SessionEngine<Q, R>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a quiz server.
///
/// # Example
///
/// ```rust,ignore
/// use quizroom::prelude::*;
///
/// let server = QuizroomServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .engine_config(EngineConfig::default())
///     .build(my_auth, my_quizzes, Arc::new(my_recorder))
///     .await?;
/// server.run().await
/// ```
pub struct QuizroomServerBuilder {
    bind_addr: String,
    engine_config: EngineConfig,
}

impl QuizroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            engine_config: EngineConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the start delay, tick period and channel sizing.
    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Binds the listener and assembles the server around the given
    /// collaborators.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<A, Q, R>(
        self,
        auth: A,
        quizzes: Q,
        recorder: Arc<R>,
    ) -> Result<QuizroomServer<A, Q, R, JsonCodec>, QuizroomError>
    where
        A: Authenticator,
        Q: QuizStore,
        R: SessionRecorder,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            engine: Arc::new(SessionEngine::new(quizzes, recorder, self.engine_config)),
            auth,
            codec: JsonCodec,
        });

        Ok(QuizroomServer { transport, state })
    }
}

impl Default for QuizroomServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A quiz server bound to its listen address.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizroomServer<A, Q, R, C>
where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    transport: WebSocketTransport,
    state: Arc<ServerState<A, Q, R, C>>,
}

impl<A, Q, R, C> QuizroomServer<A, Q, R, C>
where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The engine behind this server. Stays usable after [`run`](Self::run)
    /// takes the server.
    pub fn engine(&self) -> Arc<SessionEngine<Q, R>> {
        Arc::clone(&self.state.engine)
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated or the future is dropped.
    pub async fn run(mut self) -> Result<(), QuizroomError> {
        tracing::info!(addr = ?self.local_addr().ok(), "quizroom server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
