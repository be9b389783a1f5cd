//! Popsicle inventory use-case service.
//!
//! # Responsibility
//! - Apply request-level rules (missing body, path/body id mismatch,
//!   empty search term, not-found) on top of the repository contract.
//! - Keep HTTP and storage concerns out of each other's way.
//!
//! # Invariants
//! - Validation runs before any repository write.
//! - Update never changes a record's identifier.
//! - Service layer remains storage-agnostic.

use crate::model::popsicle::{Popsicle, PopsicleId};
use crate::model::validation::ValidationErrors;
use crate::repo::popsicle_repo::{PopsicleRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, InventoryError>;

/// Service error for inventory use-cases.
#[derive(Debug)]
pub enum InventoryError {
    /// Create was called without a record.
    MissingBody,
    /// Update body is absent or its id differs from the addressed id.
    InvalidUpdate {
        path_id: PopsicleId,
        body_id: Option<PopsicleId>,
    },
    Validation(ValidationErrors),
    EmptySearchTerm,
    /// Search ran but matched nothing.
    NoMatches(String),
    NotFound(PopsicleId),
    AlreadyExists(PopsicleId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for InventoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBody => f.write_str("Popsicle data is required"),
            Self::InvalidUpdate { .. } => f.write_str("Invalid popsicle data"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::EmptySearchTerm => f.write_str("Search item cannot be null or empty"),
            Self::NoMatches(term) => write!(f, "no popsicles match `{term}`"),
            Self::NotFound(id) => write!(f, "popsicle not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "Popsicle with ID {id} already exists."),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InventoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for InventoryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::AlreadyExists(id) => Self::AlreadyExists(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationErrors> for InventoryError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Use-case service wrapper for popsicle inventory operations.
pub struct InventoryService<R: PopsicleRepository> {
    repo: R,
}

impl<R: PopsicleRepository> InventoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and stores a new record.
    ///
    /// # Contract
    /// - `None` input returns `MissingBody`.
    /// - The returned record carries the store-assigned identifier.
    pub fn create_popsicle(&self, popsicle: Option<Popsicle>) -> ServiceResult<Popsicle> {
        let popsicle = popsicle.ok_or(InventoryError::MissingBody)?;
        popsicle.validate()?;

        let created = self.repo.create_popsicle(&popsicle).inspect_err(|err| {
            warn!(
                "event=popsicle_create module=service status=error requested_id={} error={}",
                popsicle.id, err
            );
        })?;
        info!(
            "event=popsicle_create module=service status=ok id={}",
            created.id
        );
        Ok(created)
    }

    /// Lists every record ordered by id.
    pub fn list_popsicles(&self) -> ServiceResult<Vec<Popsicle>> {
        Ok(self.repo.list_popsicles()?)
    }

    pub fn get_popsicle(&self, id: PopsicleId) -> ServiceResult<Popsicle> {
        self.repo
            .get_popsicle(id)?
            .ok_or(InventoryError::NotFound(id))
    }

    /// Finds records whose name or flavour contains `term`, ignoring case.
    ///
    /// # Contract
    /// - Empty `term` returns `EmptySearchTerm`.
    /// - A search with no hits returns `NoMatches`, never an empty list.
    pub fn search_popsicles(&self, term: &str) -> ServiceResult<Vec<Popsicle>> {
        if term.is_empty() {
            return Err(InventoryError::EmptySearchTerm);
        }

        let matches = self.repo.search_popsicles(term)?;
        info!(
            "event=popsicle_search module=service status=ok hits={}",
            matches.len()
        );
        if matches.is_empty() {
            return Err(InventoryError::NoMatches(term.to_string()));
        }
        Ok(matches)
    }

    /// Replaces every mutable field of the record addressed by `id`.
    ///
    /// # Contract
    /// - Checks run in order: body presence and id match, validation,
    ///   existence.
    pub fn update_popsicle(
        &self,
        id: PopsicleId,
        popsicle: Option<Popsicle>,
    ) -> ServiceResult<Popsicle> {
        let popsicle = match popsicle {
            Some(popsicle) if popsicle.id == id => popsicle,
            other => {
                return Err(InventoryError::InvalidUpdate {
                    path_id: id,
                    body_id: other.map(|popsicle| popsicle.id),
                })
            }
        };
        popsicle.validate()?;

        if self.repo.get_popsicle(id)?.is_none() {
            return Err(InventoryError::NotFound(id));
        }

        let updated = self.repo.update_popsicle(&popsicle)?;
        info!("event=popsicle_update module=service status=ok id={id}");
        Ok(updated)
    }

    /// Removes the record addressed by `id`.
    pub fn delete_popsicle(&self, id: PopsicleId) -> ServiceResult<()> {
        if !self.repo.delete_popsicle(id)? {
            return Err(InventoryError::NotFound(id));
        }
        info!("event=popsicle_delete module=service status=ok id={id}");
        Ok(())
    }
}
