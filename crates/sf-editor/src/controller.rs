//! Page canvas controller: binds one `Scene` to one design page.
//!
//! Every mutation that changes what the page looks like goes through
//! `commit`, which redraws the scene, records a history snapshot, and marks
//! the page as edited so the session can hand it to the autosave pipeline.
//!
//! Drag gestures use snapshot batching: mutations between `begin_gesture`
//! and `end_gesture` are applied live but recorded as one history step.

use crate::debounce::Debouncer;
use crate::history::HistoryManager;
use crate::scene::{Brush, ExportError, ExportFormat, Scene, Selection};
use kurbo::{Point, Rect, Size};
use sf_core::config::EditorConfig;
use sf_core::design::Page;
use sf_core::document::{emit_elements, load_or_blank, normalize_workspace, parse_elements};
use sf_core::id::PageId;
use sf_core::model::*;
use sf_core::viewport::{ViewportTransform, fit_workspace};
use smallvec::SmallVec;

/// Side length of newly added square shapes.
const SHAPE_SIZE: f64 = 400.0;
/// Width of newly added text boxes.
const TEXTBOX_WIDTH: f64 = 400.0;

/// The latest state of an edited page, ready to be written back.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEdit {
    pub page_id: PageId,
    pub elements: ElementsDocument,
}

pub struct PageCanvasController<S: Scene> {
    page_id: PageId,
    scene: S,
    history: HistoryManager,
    config: EditorConfig,
    width: f64,
    height: f64,
    viewport: ViewportTransform,
    /// Last applied container size.
    container: Option<Size>,
    resize: Debouncer<Size>,
    /// Batch nesting depth (0 = not in a gesture).
    gesture_depth: usize,
    /// Snapshot captured when the outermost gesture began.
    gesture_snapshot: Option<String>,
    edited: bool,
}

impl<S: Scene> PageCanvasController<S> {
    /// Load `page` into `scene` for a `width × height` design.
    ///
    /// Missing or malformed elements fall back to a blank workspace. The
    /// workspace rectangle is always the bottom-most object.
    pub fn mount(
        page: &Page,
        width: f64,
        height: f64,
        mut scene: S,
        config: &EditorConfig,
    ) -> Self {
        let doc = load_or_blank(Some(&page.elements), width, height);
        let initial = emit_elements(&doc);
        scene.load(doc);
        scene.set_drawing_mode(None);

        let mut history = HistoryManager::new(config.history_limit);
        history.initialize(initial);

        let mut controller = Self {
            page_id: page.id.clone(),
            scene,
            history,
            config: config.clone(),
            width,
            height,
            viewport: ViewportTransform::IDENTITY,
            container: None,
            resize: Debouncer::new(config.resize_debounce_ms),
            gesture_depth: 0,
            gesture_snapshot: None,
            edited: false,
        };
        controller.scene.request_render();
        controller
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn page_id(&self) -> &PageId {
        &self.page_id
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn document(&self) -> &ElementsDocument {
        self.scene.document()
    }

    pub fn selection(&self) -> &[usize] {
        self.scene.selection()
    }

    /// The first selected object, if any.
    pub fn selected_object(&self) -> Option<&SceneObject> {
        let &index = self.scene.selection().first()?;
        self.scene.document().objects.get(index)
    }

    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_drawing(&self) -> bool {
        self.scene.drawing_mode().is_some()
    }

    /// Drain the pending edit, if the page changed since the last call.
    pub fn take_edit(&mut self) -> Option<PageEdit> {
        if !std::mem::take(&mut self.edited) {
            return None;
        }
        Some(PageEdit {
            page_id: self.page_id.clone(),
            elements: self.scene.document().clone(),
        })
    }

    // ─── Commit pipeline ─────────────────────────────────────────────────

    fn commit(&mut self) {
        self.scene.request_render();
        if self.gesture_depth > 0 {
            return;
        }
        self.history.record(emit_elements(self.scene.document()));
        self.edited = true;
    }

    /// Start a gesture. Mutations until the matching `end_gesture` are
    /// recorded as one undo step.
    pub fn begin_gesture(&mut self) {
        if self.gesture_depth == 0 {
            self.gesture_snapshot = Some(emit_elements(self.scene.document()));
        }
        self.gesture_depth += 1;
    }

    /// End a gesture. When the outermost gesture closes and the document
    /// changed, one snapshot is recorded.
    pub fn end_gesture(&mut self) {
        if self.gesture_depth == 0 {
            return;
        }
        self.gesture_depth -= 1;
        if self.gesture_depth > 0 {
            return;
        }
        let before = self.gesture_snapshot.take().unwrap_or_default();
        let after = emit_elements(self.scene.document());
        if before != after {
            self.history.record(after);
            self.edited = true;
        }
    }

    /// Load a snapshot emitted by this controller back into the scene.
    fn restore(&mut self, snapshot: &str) -> bool {
        match parse_elements(snapshot) {
            Ok(doc) => {
                self.scene.load(doc);
                self.scene.request_render();
                self.edited = true;
                true
            }
            Err(err) => {
                log::warn!("page {}: cannot restore history snapshot: {err}", self.page_id);
                false
            }
        }
    }

    /// Step back one snapshot. The history position only moves once the
    /// snapshot has loaded.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.peek_undo().map(str::to_owned) else {
            return false;
        };
        if !self.restore(&snapshot) {
            return false;
        }
        self.history.undo();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.peek_redo().map(str::to_owned) else {
            return false;
        };
        if !self.restore(&snapshot) {
            return false;
        }
        self.history.redo();
        true
    }

    /// Whether every numeric argument of `op` is finite. Non-finite values
    /// serialize as `null`, which no longer validates on reload.
    fn finite(&self, op: &str, values: &[f64]) -> bool {
        if values.iter().all(|v| v.is_finite()) {
            return true;
        }
        log::warn!("page {}: {op}: ignoring non-finite input", self.page_id);
        false
    }

    // ─── Adding objects ──────────────────────────────────────────────────

    fn workspace_center(&self) -> Point {
        self.scene
            .document()
            .workspace_rect()
            .map(|r| r.center())
            .unwrap_or(Point::new(self.width / 2.0, self.height / 2.0))
    }

    /// Center `obj` on the workspace, append it on top, and select it.
    fn add_centered(&mut self, mut obj: SceneObject) -> usize {
        let center = self.workspace_center();
        let b = &mut obj.base;
        b.left = center.x - b.width * b.scale_x / 2.0;
        b.top = center.y - b.height * b.scale_y / 2.0;
        self.push_object(obj)
    }

    fn push_object(&mut self, obj: SceneObject) -> usize {
        let doc = self.scene.document_mut();
        doc.objects.push(obj);
        let index = doc.objects.len() - 1;
        self.scene.set_selection(SmallVec::from_slice(&[index]));
        self.commit();
        index
    }

    fn filled(&self, width: f64, height: f64) -> ObjectBase {
        let mut base = ObjectBase::new(0.0, 0.0, width, height);
        base.fill = Some(self.config.default_fill.clone());
        base
    }

    pub fn add_rect(&mut self) -> usize {
        let base = self.filled(SHAPE_SIZE, SHAPE_SIZE);
        self.add_centered(SceneObject::new(base, Shape::Rect { rx: 0.0, ry: 0.0 }))
    }

    /// A rectangle with rounded corners.
    pub fn add_soft_rect(&mut self) -> usize {
        let base = self.filled(SHAPE_SIZE, SHAPE_SIZE);
        self.add_centered(SceneObject::new(base, Shape::Rect { rx: 50.0, ry: 50.0 }))
    }

    pub fn add_circle(&mut self) -> usize {
        let radius = SHAPE_SIZE / 2.0;
        let base = self.filled(SHAPE_SIZE, SHAPE_SIZE);
        self.add_centered(SceneObject::new(base, Shape::Circle { radius }))
    }

    pub fn add_ellipse(&mut self) -> usize {
        let (w, h) = (SHAPE_SIZE, SHAPE_SIZE * 0.6);
        let base = self.filled(w, h);
        self.add_centered(SceneObject::new(base, Shape::Ellipse { rx: w / 2.0, ry: h / 2.0 }))
    }

    pub fn add_triangle(&mut self) -> usize {
        let base = self.filled(SHAPE_SIZE, SHAPE_SIZE);
        self.add_centered(SceneObject::new(base, Shape::Triangle))
    }

    /// A triangle pointing down.
    pub fn add_inverse_triangle(&mut self) -> usize {
        let mut base = self.filled(SHAPE_SIZE, SHAPE_SIZE);
        base.flip_y = true;
        self.add_centered(SceneObject::new(base, Shape::Triangle))
    }

    pub fn add_text(&mut self, text: &str) -> usize {
        let props = TextProps::new(text, self.config.default_font.clone());
        let height = props.font_size * props.line_height * text.lines().count().max(1) as f64;
        let base = self.filled(TEXTBOX_WIDTH, height);
        self.add_centered(SceneObject::new(base, Shape::Textbox(props)))
    }

    /// Add an image of `natural` pixel size, scaled down to fit the
    /// workspace. Returns `None` when the size is degenerate.
    pub fn add_image(&mut self, src: &str, natural: Size) -> Option<usize> {
        if !self.finite("add_image", &[natural.width, natural.height]) {
            return None;
        }
        if !(natural.width > 0.0 && natural.height > 0.0) {
            log::warn!("page {}: ignoring image with size {natural:?}", self.page_id);
            return None;
        }
        let page = self
            .scene
            .document()
            .workspace_rect()
            .map(|r| r.size())
            .unwrap_or(Size::new(self.width, self.height));
        let scale = (page.width / natural.width)
            .min(page.height / natural.height)
            .min(1.0);

        let mut base = ObjectBase::new(0.0, 0.0, natural.width, natural.height);
        base.scale_x = scale;
        base.scale_y = scale;
        let image = ImageProps {
            src: src.to_string(),
            cross_origin: Some("anonymous".to_string()),
            filters: Vec::new(),
        };
        Some(self.add_centered(SceneObject::new(base, Shape::Image(image))))
    }

    /// Add a path given in world coordinates. The object's left/top become
    /// the path's bounding box origin and the commands are stored relative
    /// to it.
    pub fn add_path(
        &mut self,
        commands: &[PathCmd],
        stroke: &str,
        stroke_width: f64,
    ) -> Option<usize> {
        let values: Vec<f64> = path_points(commands)
            .flat_map(|p| [p.x, p.y])
            .chain([stroke_width])
            .collect();
        if !self.finite("add_path", &values) {
            return None;
        }
        let bounds = path_bounds(commands)?;
        let dx = bounds.x0;
        let dy = bounds.y0;
        let local: Vec<PathCmd> = commands
            .iter()
            .map(|cmd| match *cmd {
                PathCmd::MoveTo(x, y) => PathCmd::MoveTo(x - dx, y - dy),
                PathCmd::LineTo(x, y) => PathCmd::LineTo(x - dx, y - dy),
                PathCmd::QuadTo(cx, cy, x, y) => PathCmd::QuadTo(cx - dx, cy - dy, x - dx, y - dy),
                PathCmd::CubicTo(a, b, c, d, x, y) => {
                    PathCmd::CubicTo(a - dx, b - dy, c - dx, d - dy, x - dx, y - dy)
                }
                PathCmd::Close => PathCmd::Close,
            })
            .collect();

        let mut base = ObjectBase::new(dx, dy, bounds.width(), bounds.height());
        base.stroke = Some(stroke.to_string());
        base.stroke_width = stroke_width;
        Some(self.push_object(SceneObject::new(base, Shape::Path { path: local })))
    }

    // ─── Freehand drawing ────────────────────────────────────────────────

    pub fn enable_drawing_mode(&mut self) {
        self.scene.set_selection(Selection::new());
        self.scene.set_drawing_mode(Some(Brush {
            color: self.config.default_fill.clone(),
            width: self.config.brush_width,
        }));
        self.scene.request_render();
    }

    pub fn disable_drawing_mode(&mut self) {
        self.scene.set_drawing_mode(None);
    }

    /// Update the active brush. No-op outside drawing mode.
    pub fn set_brush(&mut self, color: Option<&str>, width: Option<f64>) -> bool {
        let Some(mut brush) = self.scene.drawing_mode().cloned() else {
            return false;
        };
        if let Some(color) = color {
            brush.color = color.to_string();
        }
        if let Some(width) = width {
            if !self.finite("set_brush", &[width]) {
                return false;
            }
            brush.width = width.max(0.0);
        }
        self.scene.set_drawing_mode(Some(brush));
        true
    }

    /// Turn a finished freehand stroke (screen-space points) into a path
    /// drawn with the current brush. No-op outside drawing mode or for
    /// strokes of fewer than two points.
    pub fn finish_stroke(&mut self, screen_points: &[Point]) -> Option<usize> {
        let brush = self.scene.drawing_mode()?.clone();
        if screen_points.len() < 2 {
            return None;
        }
        let mut commands = Vec::with_capacity(screen_points.len());
        for (i, p) in screen_points.iter().enumerate() {
            let w = self.viewport.screen_to_world(*p);
            commands.push(if i == 0 {
                PathCmd::MoveTo(w.x, w.y)
            } else {
                PathCmd::LineTo(w.x, w.y)
            });
        }
        self.add_path(&commands, &brush.color, brush.width)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    fn is_pickable(&self, index: usize) -> bool {
        self.scene
            .document()
            .objects
            .get(index)
            .is_some_and(|o| o.base.selectable && !o.is_workspace())
    }

    /// Select the topmost object under a screen-space point, or clear the
    /// selection when nothing is hit.
    pub fn select_at(&mut self, screen: Point) -> Option<usize> {
        let world = self.viewport.screen_to_world(screen);
        let hit = sf_render::hit_test(self.scene.document(), world);
        let selection = hit.map(|i| SmallVec::from_slice(&[i])).unwrap_or_default();
        self.scene.set_selection(selection);
        self.scene.request_render();
        hit
    }

    /// Select every object overlapping a screen-space rectangle.
    pub fn select_area(&mut self, screen: Rect) -> usize {
        let a = self.viewport.screen_to_world(Point::new(screen.x0, screen.y0));
        let b = self.viewport.screen_to_world(Point::new(screen.x1, screen.y1));
        let hits = sf_render::hit_test_rect(self.scene.document(), Rect::from_points(a, b));
        let count = hits.len();
        self.scene.set_selection(hits.into_iter().collect());
        self.scene.request_render();
        count
    }

    /// Select objects by index; indices that are out of range or not
    /// selectable are ignored.
    pub fn select(&mut self, indices: &[usize]) -> usize {
        let mut selection: Selection = indices
            .iter()
            .copied()
            .filter(|&i| self.is_pickable(i))
            .collect();
        selection.sort_unstable();
        selection.dedup();
        let count = selection.len();
        self.scene.set_selection(selection);
        self.scene.request_render();
        count
    }

    /// Drop the selection and redraw. Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let had = !self.scene.selection().is_empty();
        self.scene.set_selection(Selection::new());
        self.scene.request_render();
        had
    }

    /// Apply `f` to every selected object; commit if any reported a change.
    fn edit_selection(&mut self, mut f: impl FnMut(&mut SceneObject) -> bool) -> bool {
        let selection: Selection = self.scene.selection().iter().copied().collect();
        if selection.is_empty() {
            return false;
        }
        let mut changed = false;
        let doc = self.scene.document_mut();
        for index in selection {
            if let Some(obj) = doc.objects.get_mut(index).filter(|o| !o.is_workspace()) {
                changed |= f(obj);
            }
        }
        if changed {
            self.commit();
        }
        changed
    }

    fn edit_text(&mut self, mut f: impl FnMut(&mut TextProps) -> bool) -> bool {
        self.edit_selection(|obj| match &mut obj.shape {
            Shape::Textbox(text) => f(text),
            _ => false,
        })
    }

    // ─── Style operations (selection-dependent) ──────────────────────────

    pub fn set_fill(&mut self, color: &str) -> bool {
        self.edit_selection(|obj| replace(&mut obj.base.fill, Some(color.to_string())))
    }

    pub fn set_stroke(&mut self, color: &str) -> bool {
        self.edit_selection(|obj| replace(&mut obj.base.stroke, Some(color.to_string())))
    }

    pub fn set_stroke_width(&mut self, width: f64) -> bool {
        if !self.finite("set_stroke_width", &[width]) {
            return false;
        }
        let width = width.max(0.0);
        self.edit_selection(|obj| replace(&mut obj.base.stroke_width, width))
    }

    /// Set the dash pattern; an empty pattern draws solid strokes.
    pub fn set_stroke_dash(&mut self, dash: &[f64]) -> bool {
        if !self.finite("set_stroke_dash", dash) {
            return false;
        }
        let dash = (!dash.is_empty()).then(|| SmallVec::from_slice(dash));
        self.edit_selection(|obj| replace(&mut obj.base.stroke_dash_array, dash.clone()))
    }

    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        if !self.finite("set_opacity", &[opacity]) {
            return false;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        self.edit_selection(|obj| replace(&mut obj.base.opacity, opacity))
    }

    pub fn set_font_family(&mut self, family: &str) -> bool {
        self.edit_text(|t| replace(&mut t.font_family, family.to_string()))
    }

    pub fn set_font_size(&mut self, size: f64) -> bool {
        if !self.finite("set_font_size", &[size]) || size <= 0.0 {
            return false;
        }
        self.edit_text(|t| replace(&mut t.font_size, size))
    }

    pub fn set_font_weight(&mut self, weight: u16) -> bool {
        let weight = weight.clamp(100, 900);
        self.edit_text(|t| replace(&mut t.font_weight, weight))
    }

    pub fn set_font_style(&mut self, style: FontStyle) -> bool {
        self.edit_text(|t| replace(&mut t.font_style, style))
    }

    pub fn set_text_align(&mut self, align: TextAlign) -> bool {
        self.edit_text(|t| replace(&mut t.text_align, align))
    }

    pub fn set_underline(&mut self, on: bool) -> bool {
        self.edit_text(|t| replace(&mut t.underline, on))
    }

    pub fn set_linethrough(&mut self, on: bool) -> bool {
        self.edit_text(|t| replace(&mut t.linethrough, on))
    }

    pub fn set_text(&mut self, content: &str) -> bool {
        self.edit_text(|t| replace(&mut t.text, content.to_string()))
    }

    /// Replace the filter chain of selected images with a named preset
    /// (`"none"` clears it).
    pub fn set_image_filter(&mut self, preset: &str) -> bool {
        let filters: Vec<ImageFilter> = ImageFilter::preset(preset).into_iter().collect();
        if filters.is_empty() && preset != "none" {
            log::warn!("unknown image filter preset {preset:?}");
            return false;
        }
        self.edit_selection(|obj| match &mut obj.shape {
            Shape::Image(img) => replace(&mut img.filters, filters.clone()),
            _ => false,
        })
    }

    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        if !self.finite("move_selected", &[dx, dy]) || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.edit_selection(|obj| {
            obj.base.left += dx;
            obj.base.top += dy;
            true
        })
    }

    // ─── Structure operations (selection-dependent) ──────────────────────

    /// Remove the selected objects. The workspace rectangle is never removed.
    pub fn delete_selected(&mut self) -> bool {
        let mut doomed: Selection = self
            .scene
            .selection()
            .iter()
            .copied()
            .filter(|&i| self.is_pickable(i))
            .collect();
        if doomed.is_empty() {
            return false;
        }
        doomed.sort_unstable();
        doomed.dedup();
        let doc = self.scene.document_mut();
        for &index in doomed.iter().rev() {
            doc.objects.remove(index);
        }
        self.scene.set_selection(Selection::new());
        self.commit();
        true
    }

    /// Raise the first selected object one step in stacking order.
    pub fn bring_forward(&mut self) -> bool {
        let Some(&index) = self.scene.selection().first() else {
            return false;
        };
        let len = self.scene.document().objects.len();
        if !self.is_pickable(index) || index + 1 >= len {
            return false;
        }
        self.scene.document_mut().objects.swap(index, index + 1);
        self.scene.set_selection(SmallVec::from_slice(&[index + 1]));
        self.commit();
        true
    }

    /// Lower the first selected object one step, never beneath the
    /// workspace rectangle.
    pub fn send_backward(&mut self) -> bool {
        let Some(&index) = self.scene.selection().first() else {
            return false;
        };
        let floor = self.scene.document().workspace_index().map_or(0, |w| w + 1);
        if !self.is_pickable(index) || index <= floor {
            return false;
        }
        self.scene.document_mut().objects.swap(index, index - 1);
        self.scene.set_selection(SmallVec::from_slice(&[index - 1]));
        self.commit();
        true
    }

    // ─── Whole-page operations ───────────────────────────────────────────

    /// Replace the page contents wholesale (e.g. with a template). The
    /// workspace rectangle is kept at the design's dimensions.
    pub fn replace_elements(&mut self, mut doc: ElementsDocument) {
        normalize_workspace(&mut doc, self.width, self.height);
        self.scene.load(doc);
        self.commit();
        self.fit();
    }

    /// Resize the workspace rectangle to new design dimensions.
    pub fn change_size(&mut self, width: f64, height: f64) -> bool {
        if !self.finite("change_size", &[width, height]) {
            return false;
        }
        if !(width > 0.0 && height > 0.0) || (width == self.width && height == self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        normalize_workspace(self.scene.document_mut(), width, height);
        self.commit();
        self.fit();
        true
    }

    /// Produce the page in the requested format.
    pub fn serialize(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.scene.export(format)
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Report the container's current size. The first report fits
    /// immediately; later ones are debounced.
    pub fn observe_container(&mut self, now: f64, size: Size) {
        if !self.finite("observe_container", &[size.width, size.height]) {
            return;
        }
        if self.container.is_none() {
            self.container = Some(size);
            self.fit();
        } else {
            self.resize.push(now, size);
        }
    }

    /// Apply a debounced container resize if its quiet period has elapsed.
    pub fn tick(&mut self, now: f64) -> bool {
        match self.resize.poll(now) {
            Some(size) => {
                self.container = Some(size);
                self.fit()
            }
            None => false,
        }
    }

    /// Fit the workspace into the container and clip to it. Skipped (with a
    /// warning) when the workspace marker is missing or degenerate.
    pub fn fit(&mut self) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        let workspace = match sf_core::document::require_workspace(self.scene.document()) {
            Ok(rect) => rect,
            Err(err) => {
                log::warn!("page {}: skipping viewport fit: {err}", self.page_id);
                return false;
            }
        };
        let Some(transform) = fit_workspace(workspace, container, self.config.fit_padding) else {
            log::warn!("page {}: skipping viewport fit for container {container:?}", self.page_id);
            return false;
        };
        self.viewport = transform;
        self.scene.set_viewport(transform);
        self.scene.set_clip(Some(workspace));
        self.scene.request_render();
        true
    }

    /// Change the zoom by an additive `step` about the container center.
    pub fn zoom_by(&mut self, step: f64) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        if !self.finite("zoom_by", &[step]) {
            return false;
        }
        let target = (self.viewport.scale + step).clamp(self.config.min_zoom, self.config.max_zoom);
        if target == self.viewport.scale {
            return false;
        }
        let anchor = Point::new(container.width / 2.0, container.height / 2.0);
        self.viewport = self.viewport.scaled_about(anchor, target);
        self.scene.set_viewport(self.viewport);
        self.scene.request_render();
        true
    }
}

/// Assign `value` to `slot`, reporting whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn path_points(commands: &[PathCmd]) -> impl Iterator<Item = Point> + '_ {
    commands.iter().flat_map(|cmd| {
        let pts: SmallVec<[Point; 3]> = match *cmd {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => {
                SmallVec::from_slice(&[Point::new(x, y)])
            }
            PathCmd::QuadTo(cx, cy, x, y) => {
                SmallVec::from_slice(&[Point::new(cx, cy), Point::new(x, y)])
            }
            PathCmd::CubicTo(a, b, c, d, x, y) => SmallVec::from_slice(&[
                Point::new(a, b),
                Point::new(c, d),
                Point::new(x, y),
            ]),
            PathCmd::Close => SmallVec::new(),
        };
        pts
    })
}

fn path_bounds(commands: &[PathCmd]) -> Option<Rect> {
    let mut points = path_points(commands);
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mount_blank() -> PageCanvasController<MemoryScene> {
        let page = Page::blank(1080.0, 1080.0);
        let config = EditorConfig::default();
        PageCanvasController::mount(&page, 1080.0, 1080.0, MemoryScene::new(), &config)
    }

    #[test]
    fn mount_puts_workspace_first() {
        let c = mount_blank();
        let ws = &c.document().objects[0];
        assert!(ws.is_workspace());
        assert!(!ws.base.selectable);
        assert_eq!(ws.rect(), Rect::new(0.0, 0.0, 1080.0, 1080.0));
        assert_eq!(c.history().len(), 1);
        assert!(!c.can_undo());
    }

    #[test]
    fn malformed_page_mounts_blank() {
        let mut page = Page::blank(10.0, 10.0);
        page.elements = json!({ "version": "5.3.0", "objects": "nope" });
        let config = EditorConfig::default();
        let c = PageCanvasController::mount(&page, 300.0, 200.0, MemoryScene::new(), &config);
        assert_eq!(c.document(), &ElementsDocument::blank(300.0, 200.0));
    }

    #[test]
    fn mutation_renders_records_and_marks_edit() {
        let mut c = mount_blank();
        let renders = c.scene().render_count();
        let index = c.add_rect();
        assert_eq!(index, 1);
        assert!(c.scene().render_count() > renders);
        assert!(c.can_undo());
        let edit = c.take_edit().expect("edit queued");
        assert_eq!(edit.elements.objects.len(), 2);
        assert!(c.take_edit().is_none());
    }

    #[test]
    fn new_shapes_are_centered_and_selected() {
        let mut c = mount_blank();
        let i = c.add_circle();
        let r = c.document().objects[i].rect();
        assert_eq!(r.center(), Point::new(540.0, 540.0));
        assert_eq!(c.selection(), &[i]);
    }

    #[test]
    fn selection_ops_without_selection_are_noops() {
        let mut c = mount_blank();
        c.add_rect();
        c.clear_selection();
        let len = c.history().len();
        assert!(!c.set_fill("#ff0000"));
        assert!(!c.set_opacity(0.5));
        assert!(!c.set_font_family("Georgia"));
        assert!(!c.delete_selected());
        assert!(!c.bring_forward());
        assert_eq!(c.history().len(), len);
    }

    #[test]
    fn style_changes_apply_to_selection_only() {
        let mut c = mount_blank();
        let a = c.add_rect();
        let b = c.add_triangle();
        c.select(&[a]);
        assert!(c.set_fill("#ff0000"));
        assert!(!c.set_fill("#ff0000"), "unchanged value is not an edit");
        assert_eq!(c.document().objects[a].base.fill.as_deref(), Some("#ff0000"));
        assert_eq!(c.document().objects[b].base.fill.as_deref(), Some("#000000"));
    }

    #[test]
    fn font_ops_only_touch_text() {
        let mut c = mount_blank();
        let r = c.add_rect();
        let t = c.add_text("Hello");
        c.select(&[r, t]);
        assert!(c.set_font_weight(700));
        match &c.document().objects[t].shape {
            Shape::Textbox(props) => assert_eq!(props.font_weight, 700),
            other => panic!("expected textbox, got {other:?}"),
        }
        c.select(&[r]);
        assert!(!c.set_underline(true));
    }

    #[test]
    fn workspace_cannot_be_selected_or_deleted() {
        let mut c = mount_blank();
        assert_eq!(c.select(&[0]), 0);
        assert_eq!(c.select_at(Point::new(10.0, 10.0)), None);
        assert!(!c.delete_selected());
        assert_eq!(c.document().objects.len(), 1);
    }

    #[test]
    fn undo_redo_restore_documents() {
        let mut c = mount_blank();
        c.add_rect();
        c.set_fill("#00ff00");
        assert!(c.undo());
        assert_eq!(c.document().objects[1].base.fill.as_deref(), Some("#000000"));
        assert!(c.undo());
        assert_eq!(c.document().objects.len(), 1);
        assert!(!c.undo());
        assert!(c.redo());
        assert_eq!(c.document().objects.len(), 2);
        assert!(c.take_edit().is_some(), "undo/redo feed autosave");
    }

    #[test]
    fn gesture_records_one_step() {
        let mut c = mount_blank();
        c.add_rect();
        let len = c.history().len();
        c.begin_gesture();
        for _ in 0..5 {
            c.move_selected(10.0, 5.0);
        }
        c.end_gesture();
        assert_eq!(c.history().len(), len + 1);
        c.undo();
        let r = c.document().objects[1].rect();
        assert_eq!(r.origin(), Point::new(340.0, 340.0));
    }

    #[test]
    fn empty_gesture_records_nothing() {
        let mut c = mount_blank();
        c.take_edit();
        c.begin_gesture();
        c.end_gesture();
        assert_eq!(c.history().len(), 1);
        assert!(c.take_edit().is_none());
    }

    #[test]
    fn stacking_never_goes_below_workspace() {
        let mut c = mount_blank();
        let a = c.add_rect();
        let b = c.add_circle();
        c.select(&[a]);
        assert!(!c.send_backward());
        assert!(c.bring_forward());
        assert_eq!(c.document().objects[b].kind_name(), "rect");
        assert!(!c.bring_forward());
        assert!(c.send_backward());
        assert_eq!(c.document().objects[1].kind_name(), "rect");
    }

    #[test]
    fn images_scale_to_fit_workspace() {
        let mut c = mount_blank();
        let i = c.add_image("https://cdn.example.com/x.png", Size::new(2160.0, 1080.0)).unwrap();
        let r = c.document().objects[i].rect();
        assert!((r.width() - 1080.0).abs() < 1e-9);
        assert!((r.height() - 540.0).abs() < 1e-9);
        assert!(c.add_image("x", Size::ZERO).is_none());
    }

    #[test]
    fn image_filters_use_presets() {
        let mut c = mount_blank();
        c.add_image("a.png", Size::new(100.0, 100.0));
        assert!(c.set_image_filter("grayscale"));
        assert!(!c.set_image_filter("nonexistent"));
        assert!(c.set_image_filter("none"));
    }

    #[test]
    fn fit_applies_transform_and_clip() {
        let mut c = mount_blank();
        c.observe_container(0.0, Size::new(500.0, 400.0));
        let expected = 400.0 / 1080.0 * 0.85;
        assert!((c.viewport().scale - expected).abs() < 1e-12);
        assert_eq!(c.scene().clip(), Some(Rect::new(0.0, 0.0, 1080.0, 1080.0)));
        assert_eq!(c.scene().viewport(), c.viewport());
    }

    #[test]
    fn resize_is_debounced() {
        let mut c = mount_blank();
        c.observe_container(0.0, Size::new(500.0, 400.0));
        let first = c.viewport();
        c.observe_container(10.0, Size::new(800.0, 800.0));
        c.observe_container(50.0, Size::new(1000.0, 1000.0));
        assert!(!c.tick(100.0));
        assert_eq!(c.viewport(), first);
        assert!(c.tick(150.0));
        assert!((c.viewport().scale - 1000.0 / 1080.0 * 0.85).abs() < 1e-12);
    }

    #[test]
    fn fit_skips_without_workspace() {
        let mut c = mount_blank();
        c.scene_mut().document_mut().objects.clear();
        c.observe_container(0.0, Size::new(500.0, 400.0));
        assert_eq!(c.viewport(), ViewportTransform::IDENTITY);
        assert!(!c.fit());
    }

    #[test]
    fn freehand_stroke_becomes_local_path() {
        let mut c = mount_blank();
        assert_eq!(c.finish_stroke(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]), None);
        c.enable_drawing_mode();
        let stroke = [
            Point::new(100.0, 200.0),
            Point::new(150.0, 260.0),
            Point::new(120.0, 210.0),
        ];
        let i = c.finish_stroke(&stroke).unwrap();
        let obj = &c.document().objects[i];
        assert_eq!(obj.rect(), Rect::new(100.0, 200.0, 150.0, 260.0));
        match &obj.shape {
            Shape::Path { path } => assert_eq!(path[0], PathCmd::MoveTo(0.0, 0.0)),
            other => panic!("expected path, got {other:?}"),
        }
        assert_eq!(obj.base.stroke_width, 5.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut c = mount_blank();
        assert!(!c.zoom_by(0.05), "no container yet");
        c.observe_container(0.0, Size::new(500.0, 400.0));
        let before = c.viewport().scale;
        assert!(c.zoom_by(0.05));
        assert!((c.viewport().scale - (before + 0.05)).abs() < 1e-12);
        assert!(c.zoom_by(100.0));
        assert_eq!(c.viewport().scale, 4.0);
        assert!(!c.zoom_by(1.0));
    }

    #[test]
    fn change_size_resizes_workspace() {
        let mut c = mount_blank();
        assert!(c.change_size(1080.0, 1920.0));
        assert_eq!(c.document().objects[0].rect(), Rect::new(0.0, 0.0, 1080.0, 1920.0));
        assert!(!c.change_size(1080.0, 1920.0));
        assert!(!c.change_size(0.0, 10.0));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut c = mount_blank();
        c.add_rect();
        c.add_text("Sale");
        c.select(&[1, 2]);
        let len = c.history().len();
        assert!(!c.set_opacity(f64::NAN));
        assert!(!c.move_selected(f64::NAN, 0.0));
        assert!(!c.set_stroke_width(f64::INFINITY));
        assert!(!c.set_stroke_dash(&[4.0, f64::NAN]));
        assert!(!c.set_font_size(f64::INFINITY));
        assert!(!c.change_size(f64::INFINITY, 1080.0));
        assert!(c.add_image("a.png", Size::new(f64::INFINITY, 10.0)).is_none());
        assert_eq!(c.history().len(), len);

        let stored = serde_json::to_value(c.document()).unwrap();
        let reloaded = load_or_blank(Some(&stored), 1080.0, 1080.0);
        assert_eq!(reloaded.objects.len(), 3);
    }

    #[test]
    fn non_finite_stroke_points_are_rejected() {
        let mut c = mount_blank();
        c.enable_drawing_mode();
        assert!(!c.set_brush(None, Some(f64::NAN)));
        let stroke = [Point::new(0.0, 0.0), Point::new(f64::NAN, 4.0)];
        assert_eq!(c.finish_stroke(&stroke), None);
        assert_eq!(c.document().objects.len(), 1);
    }

    #[test]
    fn non_finite_viewport_input_is_ignored() {
        let mut c = mount_blank();
        c.observe_container(0.0, Size::new(f64::NAN, 400.0));
        assert_eq!(c.viewport(), ViewportTransform::IDENTITY);
        c.observe_container(0.0, Size::new(500.0, 400.0));
        let fitted = c.viewport();
        assert!(!c.zoom_by(f64::NAN));
        assert_eq!(c.viewport(), fitted);
    }

    #[test]
    fn failed_undo_keeps_history_position() {
        let mut c = mount_blank();
        c.add_rect();
        c.history.record("{ not a document".into());
        c.set_fill("#ff0000");
        let index = c.history().index();
        assert!(!c.undo());
        assert_eq!(c.history().index(), index);
        assert_eq!(c.document().objects[1].base.fill.as_deref(), Some("#ff0000"));
        assert!(!c.can_redo());
    }

    #[test]
    fn failed_redo_keeps_history_position() {
        let mut c = mount_blank();
        c.add_rect();
        c.history.record("{ not a document".into());
        c.history.undo();
        let index = c.history().index();
        assert!(!c.redo());
        assert_eq!(c.history().index(), index);
        assert!(c.can_redo());
    }

    #[test]
    fn exports_through_scene() {
        let c = mount_blank();
        assert!(c.serialize(ExportFormat::Svg).unwrap().contains("viewBox"));
        assert!(c.serialize(ExportFormat::Jpeg).is_err());
    }
}
