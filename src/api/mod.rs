//! API Module
//!
//! HTTP handlers and routing for the cache server REST API. The cache is one
//! collaborator among the application's components; it is handed in through
//! [`AppState`].
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /keys` - List every key
//! - `POST /purge` - Drop every entry
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
