//! Data model orchestration.
//!
//! # Responsibility
//! - Own the authoritative drawing store and its lifecycle.
//! - Schedule persistence I/O off the owning thread.
//! - Fan out change notifications to observers.

pub mod data_model_controller;
pub mod observer;
mod persistence_queue;
