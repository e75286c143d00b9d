//! The narrow interface between a page controller and the drawing surface.
//!
//! A `Scene` holds the live elements document of one canvas, its
//! selection, and view state, and knows how to draw and rasterize itself.
//! Only `PageCanvasController` talks to a scene; tools and sidebars go
//! through the controller.

use kurbo::Rect;
use sf_core::document::emit_elements;
use sf_core::model::ElementsDocument;
use sf_core::viewport::ViewportTransform;
use smallvec::SmallVec;
use thiserror::Error;

/// Indices into the scene's object list, in stacking order.
pub type Selection = SmallVec<[usize; 4]>;

/// Output formats for `PageCanvasController::serialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Svg,
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0:?} export is not supported by this scene")]
    Unsupported(ExportFormat),
    #[error("export failed: {0}")]
    Render(String),
}

/// Freehand drawing brush.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub color: String,
    pub width: f64,
}

pub trait Scene {
    /// Replace the whole document. Clears the selection.
    fn load(&mut self, doc: ElementsDocument);

    fn document(&self) -> &ElementsDocument;

    fn document_mut(&mut self) -> &mut ElementsDocument;

    fn selection(&self) -> &[usize];

    fn set_selection(&mut self, selection: Selection);

    fn set_viewport(&mut self, transform: ViewportTransform);

    /// Restrict painting to `clip` (world space), or paint everything.
    fn set_clip(&mut self, clip: Option<Rect>);

    fn set_drawing_mode(&mut self, brush: Option<Brush>);

    fn drawing_mode(&self) -> Option<&Brush>;

    /// Schedule a redraw of the surface.
    fn request_render(&mut self);

    /// JSON and SVG are produced from the document; raster formats need a
    /// surface and are unsupported unless the scene overrides this.
    fn export(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_vector(self.document(), format)
    }
}

/// Export formats that need no drawing surface.
pub fn export_vector(doc: &ElementsDocument, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(emit_elements(doc)),
        ExportFormat::Svg => Ok(sf_render::render_svg(doc)),
        ExportFormat::Png | ExportFormat::Jpeg => Err(ExportError::Unsupported(format)),
    }
}

/// Headless scene: keeps the document and view state in memory and counts
/// redraw requests. Used by native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryScene {
    doc: ElementsDocument,
    selection: Selection,
    viewport: ViewportTransform,
    clip: Option<Rect>,
    brush: Option<Brush>,
    renders: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    /// Number of redraws requested so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }
}

impl Scene for MemoryScene {
    fn load(&mut self, doc: ElementsDocument) {
        self.doc = doc;
        self.selection.clear();
    }

    fn document(&self) -> &ElementsDocument {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut ElementsDocument {
        &mut self.doc
    }

    fn selection(&self) -> &[usize] {
        &self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    fn set_viewport(&mut self, transform: ViewportTransform) {
        self.viewport = transform;
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn set_drawing_mode(&mut self, brush: Option<Brush>) {
        self.brush = brush;
    }

    fn drawing_mode(&self) -> Option<&Brush> {
        self.brush.as_ref()
    }

    fn request_render(&mut self) {
        self.renders += 1;
    }
}
