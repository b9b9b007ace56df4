//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the conversion endpoints
//! - Multipart upload staging into scratch files
//! - Streaming file responses with deferred cleanup
//! - OpenAPI document and Swagger UI
//! - CORS middleware

pub mod docs;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod upload;

pub use routes::create_router;
