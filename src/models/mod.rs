//! Request and Response models for the cache HTTP facade
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{GetMultipleRequest, PutRequest};
pub use responses::{
    DeleteResponse, GetResponse, HealthResponse, PatternDeleteResponse, PutResponse,
    StatsResponse, ValuesResponse,
};
