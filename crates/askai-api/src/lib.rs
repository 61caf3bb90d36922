pub mod app;
pub mod classifier;
pub mod config;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod state;
pub mod validation;

pub use app::build_router;
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use service::AskService;
pub use state::AppState;
