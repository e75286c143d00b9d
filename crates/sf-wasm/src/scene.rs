//! `Scene` backed by an HTML canvas element.

use crate::render2d::{self, CanvasTheme, Frame, ImageCache};
use kurbo::Rect;
use sf_core::document::require_workspace;
use sf_core::model::ElementsDocument;
use sf_core::viewport::ViewportTransform;
use sf_editor::scene::{Brush, ExportError, ExportFormat, Scene, Selection, export_vector};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct CanvasScene {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    doc: ElementsDocument,
    selection: Selection,
    viewport: ViewportTransform,
    clip: Option<Rect>,
    brush: Option<Brush>,
    images: ImageCache,
    theme: CanvasTheme,
    dirty: bool,
}

impl CanvasScene {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            doc: ElementsDocument::empty(),
            selection: Selection::new(),
            viewport: ViewportTransform::IDENTITY,
            clip: None,
            brush: None,
            images: ImageCache::default(),
            theme: CanvasTheme::light(),
            dirty: true,
        })
    }

    /// Whether a redraw was requested or images are still arriving.
    pub fn needs_render(&self) -> bool {
        self.dirty || self.images.is_loading()
    }

    /// Draw now and clear the redraw request.
    pub fn draw(&mut self) {
        self.paint();
        self.dirty = false;
    }

    fn paint(&self) {
        let frame = Frame {
            doc: &self.doc,
            selection: &self.selection,
            viewport: self.viewport,
            clip: self.clip,
            canvas_width: f64::from(self.canvas.width()),
            canvas_height: f64::from(self.canvas.height()),
        };
        render2d::render_frame(&self.ctx, &frame, &self.theme, &self.images);
    }

    /// Rasterize the page at its design size. The canvas is resized for the
    /// capture and restored afterwards.
    fn export_raster(&self, format: ExportFormat) -> Result<String, ExportError> {
        let page =
            require_workspace(&self.doc).map_err(|err| ExportError::Render(err.to_string()))?;
        let (width, height) = (self.canvas.width(), self.canvas.height());
        self.canvas.set_width(page.width().round() as u32);
        self.canvas.set_height(page.height().round() as u32);
        render2d::render_page(&self.ctx, &self.doc, page, &self.images);
        let url = self.canvas.to_data_url_with_type(format.mime_type());
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.paint();
        url.map_err(|err| ExportError::Render(format!("{err:?}")))
    }
}

impl Scene for CanvasScene {
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
        self.dirty = true;
    }

    fn export(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Png | ExportFormat::Jpeg => self.export_raster(format),
            ExportFormat::Json | ExportFormat::Svg => export_vector(&self.doc, format),
        }
    }
}
