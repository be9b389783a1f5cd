//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract consumed by the inventory service.
//! - Provide one implementation per backing store (SQLite table, in-memory list).
//!
//! # Invariants
//! - Repository writes must enforce `Popsicle::validate()` before persistence.
//! - Both implementations assign identifiers as `max(id) + 1`.

pub mod memory_repo;
pub mod popsicle_repo;
