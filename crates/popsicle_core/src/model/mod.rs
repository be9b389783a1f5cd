//! Popsicle inventory domain model.
//!
//! # Responsibility
//! - Define the record shape shared by storage, service and HTTP layers.
//! - Keep field-level validation as pure functions over that shape.

pub mod popsicle;
pub mod validation;
