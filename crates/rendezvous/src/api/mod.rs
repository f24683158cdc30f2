//! HTTP surface: health check, WebSocket upgrade and optional static assets.

mod handlers;
mod routes;
mod state;

pub use handlers::HealthResponse;
pub use routes::create_router;
pub use state::AppState;
