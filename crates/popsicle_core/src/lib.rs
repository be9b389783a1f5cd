//! Core domain logic for the popsicle inventory service.
//! This crate is the single source of truth for inventory invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, sanitize_message, LogDestination};
pub use model::popsicle::{seed_popsicles, Popsicle, PopsicleId};
pub use model::validation::{validate_popsicle, ValidationErrors, ValidationFailure};
pub use repo::memory_repo::InMemoryPopsicleRepository;
pub use repo::popsicle_repo::{
    PopsicleRepository, RepoError, RepoResult, SharedRepository, SharedSqliteRepository,
    SqlitePopsicleRepository,
};
pub use service::inventory_service::{InventoryError, InventoryService, ServiceResult};
