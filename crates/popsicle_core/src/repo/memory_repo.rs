//! In-memory popsicle repository.
//!
//! Mirrors the SQLite repository's semantics over a locked `Vec`, for tests
//! and for running the service without a database file.

use crate::model::popsicle::{seed_popsicles, Popsicle, PopsicleId};
use crate::repo::popsicle_repo::{PopsicleRepository, RepoError, RepoResult};
use std::sync::{Mutex, MutexGuard};

/// Popsicle rows held in process memory, ordered by id.
pub struct InMemoryPopsicleRepository {
    rows: Mutex<Vec<Popsicle>>,
}

impl InMemoryPopsicleRepository {
    /// Starts with the standard seed rows.
    pub fn seeded() -> Self {
        Self::with_rows(seed_popsicles())
    }

    pub fn empty() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(mut rows: Vec<Popsicle>) -> Self {
        rows.sort_by_key(|popsicle| popsicle.id);
        Self {
            rows: Mutex::new(rows),
        }
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Vec<Popsicle>>> {
        self.rows
            .lock()
            .map_err(|_| RepoError::Poisoned("in-memory inventory"))
    }
}

impl Default for InMemoryPopsicleRepository {
    fn default() -> Self {
        Self::seeded()
    }
}

impl PopsicleRepository for InMemoryPopsicleRepository {
    fn search_popsicles(&self, term: &str) -> RepoResult<Vec<Popsicle>> {
        let rows = self.lock()?;
        Ok(rows
            .iter()
            .filter(|popsicle| popsicle.matches_term(term))
            .cloned()
            .collect())
    }

    fn list_popsicles(&self) -> RepoResult<Vec<Popsicle>> {
        Ok(self.lock()?.clone())
    }

    fn get_popsicle(&self, id: PopsicleId) -> RepoResult<Option<Popsicle>> {
        let rows = self.lock()?;
        Ok(rows.iter().find(|popsicle| popsicle.id == id).cloned())
    }

    fn create_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        popsicle.validate()?;

        let mut rows = self.lock()?;
        if rows.iter().any(|existing| existing.id == popsicle.id) {
            return Err(RepoError::AlreadyExists(popsicle.id));
        }

        let next_id = rows.iter().map(|existing| existing.id).max().unwrap_or(0) + 1;
        let mut created = popsicle.clone();
        created.id = next_id;
        rows.push(created.clone());
        Ok(created)
    }

    fn update_popsicle(&self, popsicle: &Popsicle) -> RepoResult<Popsicle> {
        popsicle.validate()?;

        let mut rows = self.lock()?;
        let existing = rows
            .iter_mut()
            .find(|existing| existing.id == popsicle.id)
            .ok_or(RepoError::NotFound(popsicle.id))?;
        existing.overwrite_from(popsicle);
        Ok(existing.clone())
    }

    fn delete_popsicle(&self, id: PopsicleId) -> RepoResult<bool> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|popsicle| popsicle.id != id);
        Ok(rows.len() < before)
    }
}
