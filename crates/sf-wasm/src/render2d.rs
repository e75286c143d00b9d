//! Canvas2D renderer for elements documents.
//!
//! Draws one page to an HTML `<canvas>` through `CanvasRenderingContext2d`:
//! background, then every visible object in stacking order under the
//! viewport transform and workspace clip, then selection outlines on top.

use kurbo::Rect;
use sf_core::model::*;
use sf_core::viewport::ViewportTransform;
use std::cell::RefCell;
use std::collections::HashMap;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// Colors for the area around the page and for selection chrome.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub selection: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#E5E7EB",
            selection: "#3B82F6",
        }
    }
}

/// What to draw and how it is framed.
pub struct Frame<'a> {
    pub doc: &'a ElementsDocument,
    pub selection: &'a [usize],
    pub viewport: ViewportTransform,
    pub clip: Option<Rect>,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

/// Decoded images by URL. Images still loading are skipped and show up on
/// a later frame.
#[derive(Default)]
pub struct ImageCache {
    images: RefCell<HashMap<String, HtmlImageElement>>,
}

impl ImageCache {
    fn get(&self, src: &str, cross_origin: Option<&str>) -> Option<HtmlImageElement> {
        let mut images = self.images.borrow_mut();
        if let Some(img) = images.get(src) {
            return img.complete().then(|| img.clone());
        }
        let img = HtmlImageElement::new().ok()?;
        img.set_cross_origin(cross_origin);
        img.set_src(src);
        images.insert(src.to_string(), img);
        None
    }

    pub fn is_loading(&self) -> bool {
        self.images.borrow().values().any(|img| !img.complete())
    }
}

pub fn render_frame(
    ctx: &CanvasRenderingContext2d,
    frame: &Frame<'_>,
    theme: &CanvasTheme,
    images: &ImageCache,
) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, frame.canvas_width, frame.canvas_height);

    let [a, b, c, d, e, f] = frame.viewport.coeffs();
    let _ = ctx.set_transform(a, b, c, d, e, f);

    ctx.save();
    if let Some(clip) = frame.clip {
        ctx.begin_path();
        ctx.rect(clip.x0, clip.y0, clip.width(), clip.height());
        ctx.clip();
    }
    for obj in frame.doc.objects.iter().filter(|o| o.base.visible) {
        draw_object(ctx, obj, images);
    }
    ctx.restore();

    for obj in frame.selection.iter().filter_map(|&i| frame.doc.objects.get(i)) {
        draw_selection_outline(ctx, obj, frame.viewport.scale, theme);
    }
}

/// Draw the page alone at 1:1, with the workspace origin at (0, 0). Used
/// for raster export.
pub fn render_page(
    ctx: &CanvasRenderingContext2d,
    doc: &ElementsDocument,
    page: Rect,
    images: &ImageCache,
) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, -page.x0, -page.y0);
    ctx.clear_rect(page.x0, page.y0, page.width(), page.height());
    ctx.save();
    ctx.begin_path();
    ctx.rect(page.x0, page.y0, page.width(), page.height());
    ctx.clip();
    for obj in doc.objects.iter().filter(|o| o.base.visible) {
        draw_object(ctx, obj, images);
    }
    ctx.restore();
}

// ─── Objects ────────────────────────────────────────────────────────────

fn draw_object(ctx: &CanvasRenderingContext2d, obj: &SceneObject, images: &ImageCache) {
    let b = &obj.base;
    ctx.save();
    apply_transform(ctx, b);
    ctx.set_global_alpha(b.opacity.clamp(0.0, 1.0));
    apply_shadow(ctx, b);

    match &obj.shape {
        Shape::Rect { rx, ry } => {
            rounded_rect_path(ctx, 0.0, 0.0, b.width, b.height, rx.max(*ry));
            fill_and_stroke(ctx, b);
        }
        Shape::Circle { radius } => {
            ctx.begin_path();
            let _ = ctx.arc(*radius, *radius, *radius, 0.0, std::f64::consts::TAU);
            fill_and_stroke(ctx, b);
        }
        Shape::Ellipse { rx, ry } => {
            ctx.begin_path();
            let _ = ctx.ellipse(*rx, *ry, *rx, *ry, 0.0, 0.0, std::f64::consts::TAU);
            fill_and_stroke(ctx, b);
        }
        Shape::Triangle => {
            ctx.begin_path();
            ctx.move_to(b.width / 2.0, 0.0);
            ctx.line_to(b.width, b.height);
            ctx.line_to(0.0, b.height);
            ctx.close_path();
            fill_and_stroke(ctx, b);
        }
        Shape::Textbox(text) => draw_text(ctx, b, text),
        Shape::Image(img) => draw_image(ctx, b, img, images),
        Shape::Path { path } => {
            trace_path(ctx, path);
            fill_and_stroke(ctx, b);
        }
    }

    ctx.restore();
}

fn apply_transform(ctx: &CanvasRenderingContext2d, b: &ObjectBase) {
    let _ = ctx.translate(b.left, b.top);
    if b.angle != 0.0 {
        let _ = ctx.rotate(b.angle.to_radians());
    }
    let _ = ctx.scale(b.scale_x, b.scale_y);
    if b.flip_x || b.flip_y {
        let tx = if b.flip_x { b.width } else { 0.0 };
        let ty = if b.flip_y { b.height } else { 0.0 };
        let _ = ctx.translate(tx, ty);
        let _ = ctx.scale(
            if b.flip_x { -1.0 } else { 1.0 },
            if b.flip_y { -1.0 } else { 1.0 },
        );
    }
}

fn apply_shadow(ctx: &CanvasRenderingContext2d, b: &ObjectBase) {
    if let Some(shadow) = &b.shadow {
        ctx.set_shadow_color(&shadow.color);
        ctx.set_shadow_blur(shadow.blur);
        ctx.set_shadow_offset_x(shadow.offset_x);
        ctx.set_shadow_offset_y(shadow.offset_y);
    }
}

fn clear_shadow(ctx: &CanvasRenderingContext2d) {
    ctx.set_shadow_color("transparent");
    ctx.set_shadow_blur(0.0);
}

/// Fill then stroke the current path with the object's paint.
fn fill_and_stroke(ctx: &CanvasRenderingContext2d, b: &ObjectBase) {
    if let Some(fill) = &b.fill {
        ctx.set_fill_style_str(fill);
        ctx.fill();
    }
    clear_shadow(ctx);
    if let Some(stroke) = b.stroke.as_ref().filter(|_| b.stroke_width > 0.0) {
        ctx.set_stroke_style_str(stroke);
        ctx.set_line_width(b.stroke_width);
        ctx.set_line_cap("round");
        ctx.set_line_join("round");
        if let Some(dash) = b.stroke_dash_array.as_ref().filter(|d| !d.is_empty()) {
            let segments = js_sys::Array::new();
            for &n in dash.iter() {
                segments.push(&wasm_bindgen::JsValue::from_f64(n));
            }
            let _ = ctx.set_line_dash(&segments);
        }
        ctx.stroke();
    }
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    ctx.begin_path();
    if r == 0.0 {
        ctx.rect(x, y, w, h);
        return;
    }
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.quadratic_curve_to(x + w, y, x + w, y + r);
    ctx.line_to(x + w, y + h - r);
    ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
    ctx.line_to(x + r, y + h);
    ctx.quadratic_curve_to(x, y + h, x, y + h - r);
    ctx.line_to(x, y + r);
    ctx.quadratic_curve_to(x, y, x + r, y);
    ctx.close_path();
}

fn trace_path(ctx: &CanvasRenderingContext2d, path: &[PathCmd]) {
    ctx.begin_path();
    for cmd in path {
        match *cmd {
            PathCmd::MoveTo(x, y) => ctx.move_to(x, y),
            PathCmd::LineTo(x, y) => ctx.line_to(x, y),
            PathCmd::QuadTo(cx, cy, x, y) => ctx.quadratic_curve_to(cx, cy, x, y),
            PathCmd::CubicTo(a, b, c, d, x, y) => ctx.bezier_curve_to(a, b, c, d, x, y),
            PathCmd::Close => ctx.close_path(),
        }
    }
}

fn draw_text(ctx: &CanvasRenderingContext2d, b: &ObjectBase, text: &TextProps) {
    let style = match text.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };
    ctx.set_font(&format!(
        "{style} {} {}px {}",
        text.font_weight, text.font_size, text.font_family
    ));
    ctx.set_text_baseline("alphabetic");
    let (align, x) = match text.text_align {
        TextAlign::Left | TextAlign::Justify => ("left", 0.0),
        TextAlign::Center => ("center", b.width / 2.0),
        TextAlign::Right => ("right", b.width),
    };
    ctx.set_text_align(align);
    ctx.set_fill_style_str(b.fill.as_deref().unwrap_or("#000000"));

    let line_step = text.font_size * text.line_height;
    for (i, line) in text.text.lines().enumerate() {
        let y = text.font_size + line_step * i as f64;
        let _ = ctx.fill_text(line, x, y);
        if text.underline || text.linethrough {
            let width = ctx.measure_text(line).map(|m| m.width()).unwrap_or(0.0);
            let start = match text.text_align {
                TextAlign::Left | TextAlign::Justify => x,
                TextAlign::Center => x - width / 2.0,
                TextAlign::Right => x - width,
            };
            let thickness = (text.font_size / 15.0).max(1.0);
            if text.underline {
                ctx.fill_rect(start, y + thickness, width, thickness);
            }
            if text.linethrough {
                ctx.fill_rect(start, y - text.font_size * 0.3, width, thickness);
            }
        }
    }
}

fn draw_image(
    ctx: &CanvasRenderingContext2d,
    b: &ObjectBase,
    img: &ImageProps,
    images: &ImageCache,
) {
    let Some(element) = images.get(&img.src, img.cross_origin.as_deref()) else {
        return;
    };
    let filter = css_filter(&img.filters);
    if !filter.is_empty() {
        ctx.set_filter(&filter);
    }
    let _ =
        ctx.draw_image_with_html_image_element_and_dw_and_dh(&element, 0.0, 0.0, b.width, b.height);
}

/// CSS filter string for an image filter chain. Pixelate has no CSS
/// counterpart and is left out.
fn css_filter(filters: &[ImageFilter]) -> String {
    let parts: Vec<String> = filters
        .iter()
        .filter_map(|f| match f {
            ImageFilter::Grayscale => Some("grayscale(1)".to_string()),
            ImageFilter::Sepia => Some("sepia(1)".to_string()),
            ImageFilter::Invert => Some("invert(1)".to_string()),
            ImageFilter::Brightness { brightness } => {
                Some(format!("brightness({})", 1.0 + brightness))
            }
            ImageFilter::Contrast { contrast } => Some(format!("contrast({})", 1.0 + contrast)),
            ImageFilter::Saturation { saturation } => {
                Some(format!("saturate({})", 1.0 + saturation))
            }
            ImageFilter::Blur { blur } => Some(format!("blur({}px)", blur * 10.0)),
            ImageFilter::Pixelate { .. } => None,
        })
        .collect();
    parts.join(" ")
}

// ─── Chrome ─────────────────────────────────────────────────────────────

fn draw_selection_outline(
    ctx: &CanvasRenderingContext2d,
    obj: &SceneObject,
    scale: f64,
    theme: &CanvasTheme,
) {
    let bounds = sf_render::object_bounds(obj);
    ctx.save();
    ctx.set_stroke_style_str(theme.selection);
    // Constant on-screen width regardless of zoom.
    ctx.set_line_width(1.5 / scale.max(f64::EPSILON));
    ctx.stroke_rect(bounds.x0, bounds.y0, bounds.width(), bounds.height());
    ctx.restore();
}
