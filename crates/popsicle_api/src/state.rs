use std::sync::Arc;

use popsicle_core::{InventoryService, PopsicleId, SharedRepository};

use crate::config::normalize_base_path;

/// Shared handler state: the inventory service plus the mounted prefix.
#[derive(Clone)]
pub struct ApiState {
    pub inventory: Arc<InventoryService<SharedRepository>>,
    base_path: Arc<str>,
}

impl ApiState {
    pub fn new(repo: SharedRepository, base_path: &str) -> Self {
        Self {
            inventory: Arc::new(InventoryService::new(repo)),
            base_path: Arc::from(normalize_base_path(base_path)),
        }
    }

    /// Normalized route prefix, `""` when mounted at the root.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Value of the `Location` header for a created record.
    pub fn location_of(&self, id: PopsicleId) -> String {
        format!("{}/{id}", self.base_path)
    }
}
