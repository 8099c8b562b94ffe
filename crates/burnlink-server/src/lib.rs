pub mod envelope;
pub mod handlers;
pub mod server;
pub mod store;

/// Shared application state threaded through axum handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub store: store::Store,
}

pub use envelope::{seal, ProtocolError, Reveal, SecretChannel};
pub use server::{build_router, run, ServerConfig};
