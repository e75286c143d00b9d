//! WASM bridge for Storyframe: exposes a design session to the browser.
//!
//! Compiled via `wasm-pack build --target web`. Structured data crosses the
//! boundary as JSON strings. Time is the host's `performance.now()`, passed
//! into every call that can buffer an edit or fire a timer.
//!
//! Save requests are returned to JavaScript, which performs the HTTP write
//! and reports back through `complete_save`.

mod render2d;
mod scene;

pub use scene::CanvasScene;

use kurbo::{Point, Rect, Size};
use serde::de::DeserializeOwned;
use sf_core::config::EditorConfig;
use sf_core::design::{Design, Page};
use sf_core::model::{FontStyle, TextAlign};
use sf_editor::scene::ExportFormat;
use sf_editor::{DesignSession, Direction, PageCanvasController, SaveRequest, StoreError};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

/// One open design in the browser.
///
/// Each page gets its own `<canvas>`; all tool operations target the active
/// page.
#[wasm_bindgen]
pub struct SfDesign {
    session: DesignSession<CanvasScene>,
}

#[wasm_bindgen]
impl SfDesign {
    /// Open a design record (JSON). `config` is an optional partial
    /// `EditorConfig` JSON object.
    #[wasm_bindgen(constructor)]
    pub fn new(design_json: &str, config: Option<String>) -> Result<SfDesign, JsValue> {
        console_error_panic_hook_setup();
        console_log_setup();

        let design: Design = parse(design_json)?;
        let config = match config {
            Some(text) => EditorConfig::from_json(&text).map_err(to_js)?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            session: DesignSession::open(&design, config),
        })
    }

    // ─── Canvases ────────────────────────────────────────────────────────

    pub fn mount_page(&mut self, index: usize, canvas: HtmlCanvasElement) -> Result<bool, JsValue> {
        let scene = CanvasScene::new(canvas)?;
        Ok(self.session.mount_page(index, scene))
    }

    pub fn unmount_page(&mut self, now: f64, index: usize) -> bool {
        self.session.unmount_page(now, index)
    }

    /// Redraw every canvas with a pending redraw. Call once per animation
    /// frame; returns how many canvases were drawn.
    pub fn render(&mut self) -> usize {
        let mut drawn = 0;
        for (_, scene) in self.session.scenes_mut() {
            if scene.needs_render() {
                scene.draw();
                drawn += 1;
            }
        }
        drawn
    }

    /// Report the container size shared by all page canvases.
    pub fn observe_container(&mut self, now: f64, width: f64, height: f64) {
        self.session.observe_container(now, Size::new(width, height));
    }

    /// Advance timers. Returns a save request JSON when a debounced write
    /// is due.
    pub fn tick(&mut self, now: f64) -> Option<String> {
        self.session.tick(now).map(|req| request_json(&req))
    }

    /// Report the outcome of a save request. `error` is `None` on success.
    pub fn complete_save(&mut self, ticket: f64, error: Option<String>) -> bool {
        let result = match error {
            Some(message) => Err(StoreError::Transport(message)),
            None => Ok(()),
        };
        self.session.complete_save((ticket as u64).into(), result)
    }

    /// `{"state": "idle" | "pending" | "saving" | "saved" | "failed", ...}`
    pub fn save_status(&self) -> String {
        serde_json::to_string(self.session.save_status()).unwrap_or_default()
    }

    /// The design record as it stands, as JSON.
    pub fn design_json(&self) -> String {
        serde_json::to_string(&self.session.design_snapshot()).unwrap_or_default()
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    pub fn page_count(&self) -> usize {
        self.session.page_count()
    }

    pub fn active_page(&self) -> usize {
        self.session.active()
    }

    pub fn set_active_page(&mut self, index: usize) -> bool {
        self.session.set_active(index)
    }

    pub fn add_page(&mut self, now: f64) -> String {
        request_json(&self.session.add_page(now))
    }

    pub fn duplicate_page(&mut self, now: f64, index: usize) -> Option<String> {
        self.session.duplicate_page(now, index).map(|req| request_json(&req))
    }

    pub fn delete_page(&mut self, now: f64, index: usize) -> Option<String> {
        self.session.delete_page(now, index).map(|req| request_json(&req))
    }

    /// `up` moves toward the first page.
    pub fn move_page(&mut self, now: f64, index: usize, up: bool) -> Option<String> {
        let direction = if up { Direction::Up } else { Direction::Down };
        self.session.move_page(now, index, direction).map(|req| request_json(&req))
    }

    pub fn rename(&mut self, now: f64, name: &str) -> String {
        request_json(&self.session.rename(now, name))
    }

    pub fn change_size(&mut self, now: f64, width: f64, height: f64) -> Option<String> {
        self.session.change_size(now, width, height).map(|req| request_json(&req))
    }

    /// Replace the active page with a template page record (JSON).
    pub fn apply_template(&mut self, now: f64, page_json: &str) -> Result<bool, JsValue> {
        let template: Page = parse(page_json)?;
        Ok(self.session.apply_template(now, &template))
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> usize {
        self.session.zoom_in()
    }

    pub fn zoom_out(&mut self) -> usize {
        self.session.zoom_out()
    }

    pub fn zoom_to_fit(&mut self) -> usize {
        self.session.zoom_to_fit()
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self, now: f64) -> bool {
        self.session.undo(now)
    }

    pub fn redo(&mut self, now: f64) -> bool {
        self.session.redo(now)
    }

    pub fn can_undo(&self) -> bool {
        self.session.active_controller().is_some_and(PageCanvasController::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.session.active_controller().is_some_and(PageCanvasController::can_redo)
    }

    // ─── Adding objects ──────────────────────────────────────────────────

    /// Add a shape by name: `rect`, `soft-rect`, `circle`, `ellipse`,
    /// `triangle`, `inverse-triangle`. Returns the new object's index or -1.
    pub fn add_shape(&mut self, now: f64, kind: &str) -> i32 {
        let added = self.session.with_active(now, |c| match kind {
            "rect" => Some(c.add_rect()),
            "soft-rect" => Some(c.add_soft_rect()),
            "circle" => Some(c.add_circle()),
            "ellipse" => Some(c.add_ellipse()),
            "triangle" => Some(c.add_triangle()),
            "inverse-triangle" => Some(c.add_inverse_triangle()),
            _ => None,
        });
        index_or_minus_one(added.flatten())
    }

    pub fn add_text(&mut self, now: f64, text: &str) -> i32 {
        index_or_minus_one(self.session.with_active(now, |c| c.add_text(text)))
    }

    pub fn add_image(
        &mut self,
        now: f64,
        src: &str,
        natural_width: f64,
        natural_height: f64,
    ) -> i32 {
        let natural = Size::new(natural_width, natural_height);
        index_or_minus_one(self.session.with_active(now, |c| c.add_image(src, natural)).flatten())
    }

    // ─── Freehand ────────────────────────────────────────────────────────

    pub fn enable_drawing_mode(&mut self, now: f64) {
        self.session.with_active(now, |c| c.enable_drawing_mode());
    }

    pub fn disable_drawing_mode(&mut self, now: f64) {
        self.session.with_active(now, |c| c.disable_drawing_mode());
    }

    pub fn set_brush(&mut self, now: f64, color: Option<String>, width: Option<f64>) -> bool {
        self.session
            .with_active(now, |c| c.set_brush(color.as_deref(), width))
            .unwrap_or(false)
    }

    /// Finish a freehand stroke given as flat screen coordinates
    /// `[x0, y0, x1, y1, ...]`.
    pub fn finish_stroke(&mut self, now: f64, points: &[f64]) -> i32 {
        let points: Vec<Point> = points.chunks_exact(2).map(|p| Point::new(p[0], p[1])).collect();
        index_or_minus_one(self.session.with_active(now, |c| c.finish_stroke(&points)).flatten())
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select the topmost object under a screen point. Returns its index or -1.
    pub fn select_at(&mut self, now: f64, x: f64, y: f64) -> i32 {
        let point = Point::new(x, y);
        index_or_minus_one(self.session.with_active(now, |c| c.select_at(point)).flatten())
    }

    pub fn select_area(&mut self, now: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> usize {
        let area = Rect::new(x0, y0, x1, y1);
        self.session.with_active(now, |c| c.select_area(area)).unwrap_or(0)
    }

    pub fn clear_selection(&mut self, now: f64) -> bool {
        self.session.with_active(now, |c| c.clear_selection()).unwrap_or(false)
    }

    /// The first selected object as JSON, or `null`.
    pub fn selected_object(&self) -> String {
        let selected = self.session.active_controller().and_then(|c| c.selected_object());
        serde_json::to_string(&selected).unwrap_or_default()
    }

    // ─── Editing the selection ───────────────────────────────────────────

    pub fn set_fill(&mut self, now: f64, color: &str) -> bool {
        self.edit(now, |c| c.set_fill(color))
    }

    pub fn set_stroke(&mut self, now: f64, color: &str) -> bool {
        self.edit(now, |c| c.set_stroke(color))
    }

    pub fn set_stroke_width(&mut self, now: f64, width: f64) -> bool {
        self.edit(now, |c| c.set_stroke_width(width))
    }

    pub fn set_stroke_dash(&mut self, now: f64, dash: &[f64]) -> bool {
        self.edit(now, |c| c.set_stroke_dash(dash))
    }

    pub fn set_opacity(&mut self, now: f64, opacity: f64) -> bool {
        self.edit(now, |c| c.set_opacity(opacity))
    }

    pub fn set_font_family(&mut self, now: f64, family: &str) -> bool {
        self.edit(now, |c| c.set_font_family(family))
    }

    pub fn set_font_size(&mut self, now: f64, size: f64) -> bool {
        self.edit(now, |c| c.set_font_size(size))
    }

    pub fn set_font_weight(&mut self, now: f64, weight: u16) -> bool {
        self.edit(now, |c| c.set_font_weight(weight))
    }

    /// `normal` or `italic`.
    pub fn set_font_style(&mut self, now: f64, style: &str) -> Result<bool, JsValue> {
        let style: FontStyle = parse_name(style)?;
        Ok(self.edit(now, |c| c.set_font_style(style)))
    }

    /// `left`, `center`, `right`, or `justify`.
    pub fn set_text_align(&mut self, now: f64, align: &str) -> Result<bool, JsValue> {
        let align: TextAlign = parse_name(align)?;
        Ok(self.edit(now, |c| c.set_text_align(align)))
    }

    pub fn set_underline(&mut self, now: f64, on: bool) -> bool {
        self.edit(now, |c| c.set_underline(on))
    }

    pub fn set_linethrough(&mut self, now: f64, on: bool) -> bool {
        self.edit(now, |c| c.set_linethrough(on))
    }

    pub fn set_text(&mut self, now: f64, text: &str) -> bool {
        self.edit(now, |c| c.set_text(text))
    }

    pub fn set_image_filter(&mut self, now: f64, preset: &str) -> bool {
        self.edit(now, |c| c.set_image_filter(preset))
    }

    pub fn move_selected(&mut self, now: f64, dx: f64, dy: f64) -> bool {
        self.edit(now, |c| c.move_selected(dx, dy))
    }

    pub fn delete_selected(&mut self, now: f64) -> bool {
        self.edit(now, |c| c.delete_selected())
    }

    pub fn bring_forward(&mut self, now: f64) -> bool {
        self.edit(now, |c| c.bring_forward())
    }

    pub fn send_backward(&mut self, now: f64) -> bool {
        self.edit(now, |c| c.send_backward())
    }

    /// Start a drag; moves until `end_gesture` undo as one step.
    pub fn begin_gesture(&mut self, now: f64) {
        self.session.with_active(now, |c| c.begin_gesture());
    }

    pub fn end_gesture(&mut self, now: f64) {
        self.session.with_active(now, |c| c.end_gesture());
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Serialize the active page as `json`, `svg`, `png`, or `jpeg`. Raster
    /// formats return a data URL.
    pub fn export_page(&self, format: &str) -> Result<String, JsValue> {
        let format = ExportFormat::from_name(format)
            .ok_or_else(|| JsValue::from_str(&format!("unknown export format {format:?}")))?;
        let controller = self
            .session
            .active_controller()
            .ok_or_else(|| JsValue::from_str("active page is not mounted"))?;
        controller.serialize(format).map_err(to_js)
    }
}

impl SfDesign {
    fn edit(
        &mut self,
        now: f64,
        f: impl FnOnce(&mut PageCanvasController<CanvasScene>) -> bool,
    ) -> bool {
        self.session.with_active(now, f).unwrap_or(false)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn parse<T: DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(to_js)
}

/// Parse a lowercase enum name such as `"italic"`.
fn parse_name<T: DeserializeOwned>(name: &str) -> Result<T, JsValue> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).map_err(to_js)
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn request_json(req: &SaveRequest) -> String {
    serde_json::to_string(req).unwrap_or_default()
}

fn index_or_minus_one(index: Option<usize>) -> i32 {
    index.and_then(|i| i32::try_from(i).ok()).unwrap_or(-1)
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Storyframe WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// Route `log` records to the browser console. A second design opened on
/// the same page keeps the logger installed by the first.
fn console_log_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn enum_names_parse_lowercase() {
        let style: FontStyle = parse_name("italic").unwrap();
        assert_eq!(style, FontStyle::Italic);
        let align: TextAlign = parse_name("center").unwrap();
        assert_eq!(align, TextAlign::Center);
    }

    #[test]
    fn indices_cross_as_i32() {
        assert_eq!(index_or_minus_one(Some(3)), 3);
        assert_eq!(index_or_minus_one(None), -1);
    }

    #[test]
    fn logging_setup_tolerates_repeat_calls() {
        console_error_panic_hook_setup();
        console_log_setup();
        console_log_setup();
    }
}
