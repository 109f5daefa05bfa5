//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry purge: Drops expired entries from the in-memory store

mod purge;

pub use purge::spawn_purge_task;
