//! Drawing-notes domain model.
//!
//! # Responsibility
//! - Define the opaque drawing record and the ordered drawing store.
//! - Own the canonical on-disk shape of the whole model.
//!
//! # Invariants
//! - Position in the store is the only identity a drawing has.
//! - Record bytes are never inspected or rewritten by core.

pub mod drawing;
