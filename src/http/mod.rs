//! HTTP control surface
//!
//! The thin shell over the pipeline's public operations:
//! - POST /session/start - Start the recording session
//! - POST /session/stop - Stop it (idempotent)
//! - GET /session/transcript - Accumulated transcript
//! - GET /session/status - Session statistics
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
