//! API Module
//!
//! HTTP handlers and routing exposing the namespaced cache.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `POST /get` - Retrieve several keys, in order
//! - `GET /all` - Retrieve every value in the namespace
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /pattern/:fragment` - Delete keys by prefix fragment
//! - `GET /stats` - Operation counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
