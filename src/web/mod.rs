//! HTTP transport for trace requests.

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::WebError;
pub use server::{build_router, run_server, ServerConfig};
pub use state::WebAppState;
