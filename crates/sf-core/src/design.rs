//! Design and page records as exchanged with the persistence API.
//!
//! Page elements stay opaque here (`serde_json::Value`); only the canvas
//! controller interprets them.

use crate::document::to_value;
use crate::id::{DesignId, PageId};
use crate::model::ElementsDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A multi-page design owned by one user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub id: DesignId,
    #[serde(default)]
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub is_public: bool,
    /// Document order.
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub current_page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Design {
    /// A fresh design with one blank page.
    pub fn new(id: DesignId, name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id,
            name: name.into(),
            width,
            height,
            is_public: false,
            pages: vec![Page::blank(width, height)],
            current_page: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Enforce the record invariants: at least one page, and a current
    /// page index inside the page list.
    pub fn normalize(&mut self) {
        if self.pages.is_empty() {
            log::warn!("design {} has no pages; adding a blank one", self.id);
            self.pages.push(Page::blank(self.width, self.height));
        }
        if self.current_page >= self.pages.len() {
            self.current_page = self.pages.len() - 1;
        }
    }

    /// Merge a partial update into this record.
    pub fn apply(&mut self, patch: &DesignPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(pages) = &patch.pages {
            self.pages.clone_from(pages);
        }
        if let Some(current) = patch.current_page {
            self.current_page = current;
        }
    }
}

/// One canvas surface within a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    /// Serialized elements document; `null` for a page never edited.
    #[serde(default)]
    pub elements: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Page {
    /// A new page holding only the workspace rectangle.
    pub fn blank(width: f64, height: f64) -> Self {
        Self::with_elements(&ElementsDocument::blank(width, height))
    }

    pub fn with_elements(doc: &ElementsDocument) -> Self {
        Self {
            id: PageId::fresh(),
            elements: to_value(doc),
            thumbnail: None,
        }
    }
}

/// Partial update of a design record. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<Page>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
}

impl DesignPatch {
    pub fn is_empty(&self) -> bool {
        *self == DesignPatch::default()
    }
}
