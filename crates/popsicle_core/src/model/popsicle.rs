//! Popsicle domain model.
//!
//! # Responsibility
//! - Define the single inventory record exposed over the HTTP surface.
//! - Provide the canonical seed rows shared by every storage backend.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused while the row exists.
//! - All fields except `id` are mutable through the update path.

use super::validation::{validate_popsicle, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Integer key identifying a popsicle row.
pub type PopsicleId = i32;

/// One popsicle inventory row.
///
/// Missing string fields deserialize as empty strings so that the validator,
/// not the JSON decoder, reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Popsicle {
    /// Store-assigned identifier.
    #[serde(default)]
    pub id: PopsicleId,
    /// Display name, at most 100 characters.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub flavour: String,
    /// Unit price, 0..=50.
    #[serde(default)]
    pub price: i32,
    #[serde(default)]
    pub quantity: i32,
}

impl Popsicle {
    pub fn new(
        id: PopsicleId,
        name: impl Into<String>,
        flavour: impl Into<String>,
        price: i32,
        quantity: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            flavour: flavour.into(),
            price,
            quantity,
        }
    }

    /// Runs field-level validation rules.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_popsicle(self)
    }

    /// Copies every mutable field from `source`, keeping `self.id`.
    pub fn overwrite_from(&mut self, source: &Popsicle) {
        self.name.clone_from(&source.name);
        self.flavour.clone_from(&source.flavour);
        self.price = source.price;
        self.quantity = source.quantity;
    }

    /// Case-insensitive substring match against name or flavour.
    pub fn matches_term(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.flavour.to_lowercase().contains(&needle)
    }
}

/// Returns the rows every fresh inventory starts with.
pub fn seed_popsicles() -> Vec<Popsicle> {
    vec![
        Popsicle::new(1, "Nicollete path hole", "Chocolate", 15, 15),
        Popsicle::new(2, "Durham style", "Vanilla", 10, 10),
        Popsicle::new(3, "Duval style", "Strawberry", 20, 20),
        Popsicle::new(4, "Deccan style", "Orange", 25, 25),
        Popsicle::new(5, "Boulevard style", "Blueberry", 20, 20),
    ]
}
