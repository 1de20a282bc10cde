//! Persistence backends and bundled default content.
//!
//! # Responsibility
//! - Define the byte-level storage contract used by the persistence queue.
//! - Provide file, SQLite and in-memory storage implementations.
//! - Resolve named seed drawings for first-run stores.
//!
//! # Invariants
//! - A backend is bound to exactly one fixed location for its lifetime.
//! - Backends move bytes only; encoding belongs to `model::drawing`.

pub mod backend;
pub mod default_content;
pub mod sqlite_store;
