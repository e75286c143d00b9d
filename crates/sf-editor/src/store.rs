//! Remote collaborators: the design record store and the template catalog.
//!
//! The editor core never performs I/O itself. Hosts implement these traits
//! over their HTTP client; the in-memory versions back tests and offline use.

use sf_core::design::{Design, DesignPatch, Page};
use sf_core::id::DesignId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("design {0} not found")]
    NotFound(DesignId),
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Persistence for design records.
#[allow(async_fn_in_trait)]
pub trait DesignStore {
    async fn get(&self, id: &DesignId) -> Result<Design, StoreError>;

    /// Merge `patch` into the stored record.
    async fn update(&self, id: &DesignId, patch: &DesignPatch) -> Result<(), StoreError>;
}

/// Paged catalog of template pages.
#[allow(async_fn_in_trait)]
pub trait TemplateSource {
    /// `page` is 1-based. `None` lists templates of every category.
    async fn list(
        &self,
        category: Option<&str>,
        page: usize,
        limit: usize,
    ) -> Result<Vec<Page>, StoreError>;
}

// ─── In-memory implementations ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryDesignStore {
    designs: RefCell<HashMap<DesignId, Design>>,
    writes: RefCell<Vec<(DesignId, DesignPatch)>>,
    reject: Cell<bool>,
}

impl MemoryDesignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, design: Design) {
        self.designs.borrow_mut().insert(design.id.clone(), design);
    }

    /// Make subsequent writes fail with `StoreError::Rejected`.
    pub fn set_reject(&self, reject: bool) {
        self.reject.set(reject);
    }

    /// Every accepted write, in arrival order.
    pub fn writes(&self) -> Vec<(DesignId, DesignPatch)> {
        self.writes.borrow().clone()
    }

    pub fn snapshot(&self, id: &DesignId) -> Option<Design> {
        self.designs.borrow().get(id).cloned()
    }
}

impl DesignStore for MemoryDesignStore {
    async fn get(&self, id: &DesignId) -> Result<Design, StoreError> {
        self.snapshot(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update(&self, id: &DesignId, patch: &DesignPatch) -> Result<(), StoreError> {
        if self.reject.get() {
            return Err(StoreError::Rejected("store is read-only".into()));
        }
        let mut designs = self.designs.borrow_mut();
        let design = designs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        design.apply(patch);
        self.writes.borrow_mut().push((id.clone(), patch.clone()));
        Ok(())
    }
}

/// Templates in insertion order, each with an optional category.
#[derive(Debug, Default)]
pub struct MemoryTemplateSource {
    templates: Vec<(Option<String>, Page)>,
}

impl MemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: impl Into<String>, template: Page) {
        self.templates.push((Some(category.into()), template));
    }

    pub fn add_uncategorised(&mut self, template: Page) {
        self.templates.push((None, template));
    }
}

impl TemplateSource for MemoryTemplateSource {
    async fn list(
        &self,
        category: Option<&str>,
        page: usize,
        limit: usize,
    ) -> Result<Vec<Page>, StoreError> {
        let skip = page.saturating_sub(1).saturating_mul(limit);
        Ok(self
            .templates
            .iter()
            .filter(|(c, _)| category.is_none() || c.as_deref() == category)
            .skip(skip)
            .take(limit)
            .map(|(_, template)| template.clone())
            .collect())
    }
}
