//! # aerofiles HTTP Server Module
//!
//! Axum server exposing the file API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/upload`, `/create-folder`, `/list`, `/download`, `/view`, `/delete`
//! - `/object/{token}` - Target of signed URLs

pub mod config;
pub mod errors;
pub mod health_routes;
pub mod server;
pub mod storage_routes;

pub use config::HttpServerConfig;
pub use errors::ApiError;
pub use server::HttpServer;
pub use storage_routes::{storage_routes, StorageState};
