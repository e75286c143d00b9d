pub mod config;
pub mod design;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod viewport;

pub use config::EditorConfig;
pub use design::{Design, DesignPatch, Page};
pub use document::{
    elements_from_value, emit_elements, load_or_blank, normalize_workspace, parse_elements,
    require_workspace,
};
pub use error::{ConfigError, DocumentError};
pub use id::{DesignId, PageId};
pub use model::*;
pub use viewport::{DEFAULT_FIT_PADDING, ViewportTransform, fit_workspace};

// Re-export kurbo geometry so downstream crates agree on one version
pub use kurbo::{Point, Rect, Size, Vec2};
