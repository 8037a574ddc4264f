//! # CCBank Server
//!
//! REST API cho CCBank trên axum: mỗi handler gọi một business service và
//! trả JSON camelCase; lỗi được ánh xạ sang HTTP status qua [`ApiError`].

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use extract::AppJson;
pub use routes::create_router;
pub use state::AppState;
