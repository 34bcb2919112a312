pub mod auth;
pub mod logging;

pub use logging::simple_http_logging_middleware;
