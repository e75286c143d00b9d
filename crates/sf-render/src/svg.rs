//! SVG export of one page.
//!
//! The workspace rectangle defines the viewBox, so the exported image has
//! the design's pixel dimensions and anything outside the page is clipped.
//! Image filters are not exported.

use kurbo::Rect;
use sf_core::model::{
    ElementsDocument, FontStyle, ObjectBase, PathCmd, SceneObject, Shape, TextAlign, TextProps,
};
use std::fmt::Write;

/// Fallback page size when a document has no workspace marker.
const FALLBACK_PAGE: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

pub fn render_svg(doc: &ElementsDocument) -> String {
    let page = doc.workspace_rect().unwrap_or_else(|| {
        log::warn!("exporting page without workspace marker; using fallback bounds");
        FALLBACK_PAGE
    });
    let (w, h) = (page.width(), page.height());

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         width=\"{w}\" height=\"{h}\" viewBox=\"{} {} {w} {h}\">",
        page.x0, page.y0
    );
    let _ = writeln!(
        svg,
        "  <defs><clipPath id=\"page\"><rect x=\"{}\" y=\"{}\" width=\"{w}\" height=\"{h}\"/></clipPath></defs>",
        page.x0, page.y0
    );
    svg.push_str("  <g clip-path=\"url(#page)\">\n");
    for obj in doc.objects.iter().filter(|o| o.base.visible) {
        render_object(&mut svg, obj);
    }
    svg.push_str("  </g>\n</svg>\n");
    svg
}

fn render_object(svg: &mut String, obj: &SceneObject) {
    let b = &obj.base;
    let _ = write!(svg, "    <g transform=\"{}\"{}>", transform_attr(b), style_attrs(b));

    match &obj.shape {
        Shape::Rect { rx, ry } => {
            let _ = write!(
                svg,
                "<rect width=\"{}\" height=\"{}\" rx=\"{rx}\" ry=\"{ry}\"/>",
                b.width, b.height
            );
        }
        Shape::Circle { radius } => {
            let _ = write!(svg, "<circle cx=\"{radius}\" cy=\"{radius}\" r=\"{radius}\"/>");
        }
        Shape::Ellipse { rx, ry } => {
            let _ = write!(svg, "<ellipse cx=\"{rx}\" cy=\"{ry}\" rx=\"{rx}\" ry=\"{ry}\"/>");
        }
        Shape::Triangle => {
            let _ = write!(
                svg,
                "<polygon points=\"{},0 {},{} 0,{}\"/>",
                b.width / 2.0,
                b.width,
                b.height,
                b.height
            );
        }
        Shape::Textbox(text) => render_text(svg, b, text),
        Shape::Image(img) => {
            let _ = write!(
                svg,
                "<image xlink:href=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\"/>",
                escape_xml(&img.src),
                b.width,
                b.height
            );
        }
        Shape::Path { path } => {
            let _ = write!(svg, "<path d=\"{}\"/>", path_data(path));
        }
    }

    svg.push_str("</g>\n");
}

fn transform_attr(b: &ObjectBase) -> String {
    let mut t = format!("translate({} {})", b.left, b.top);
    if b.angle != 0.0 {
        let _ = write!(t, " rotate({})", b.angle);
    }
    if b.scale_x != 1.0 || b.scale_y != 1.0 {
        let _ = write!(t, " scale({} {})", b.scale_x, b.scale_y);
    }
    if b.flip_x || b.flip_y {
        let tx = if b.flip_x { b.width } else { 0.0 };
        let ty = if b.flip_y { b.height } else { 0.0 };
        let sx = if b.flip_x { -1 } else { 1 };
        let sy = if b.flip_y { -1 } else { 1 };
        let _ = write!(t, " translate({tx} {ty}) scale({sx} {sy})");
    }
    t
}

fn style_attrs(b: &ObjectBase) -> String {
    let mut s = String::new();
    if let Some(fill) = &b.fill {
        let _ = write!(s, " fill=\"{}\"", escape_xml(fill));
    }
    if let Some(stroke) = b.stroke.as_ref().filter(|_| b.stroke_width > 0.0) {
        let _ = write!(
            s,
            " stroke=\"{}\" stroke-width=\"{}\"",
            escape_xml(stroke),
            b.stroke_width
        );
        if let Some(dash) = b.stroke_dash_array.as_ref().filter(|d| !d.is_empty()) {
            let joined: Vec<String> = dash.iter().map(f64::to_string).collect();
            let _ = write!(s, " stroke-dasharray=\"{}\"", joined.join(" "));
        }
    }
    if b.opacity < 1.0 {
        let _ = write!(s, " opacity=\"{}\"", b.opacity);
    }
    if let Some(shadow) = &b.shadow {
        // Approximated with a CSS drop-shadow filter.
        let _ = write!(
            s,
            " style=\"filter: drop-shadow({}px {}px {}px {})\"",
            shadow.offset_x,
            shadow.offset_y,
            shadow.blur,
            escape_xml(&shadow.color)
        );
    }
    s
}

fn render_text(svg: &mut String, b: &ObjectBase, text: &TextProps) {
    let (anchor, x) = match text.text_align {
        TextAlign::Left | TextAlign::Justify => ("start", 0.0),
        TextAlign::Center => ("middle", b.width / 2.0),
        TextAlign::Right => ("end", b.width),
    };
    let style = match text.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };
    let mut decoration = Vec::new();
    if text.underline {
        decoration.push("underline");
    }
    if text.linethrough {
        decoration.push("line-through");
    }
    let _ = write!(
        svg,
        "<text font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{style}\" text-anchor=\"{anchor}\"",
        escape_xml(&text.font_family),
        text.font_size,
        text.font_weight
    );
    if !decoration.is_empty() {
        let _ = write!(svg, " text-decoration=\"{}\"", decoration.join(" "));
    }
    svg.push('>');
    let line_step = text.font_size * text.line_height;
    for (i, line) in text.text.lines().enumerate() {
        let y = text.font_size + line_step * i as f64;
        let _ = write!(svg, "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>", escape_xml(line));
    }
    svg.push_str("</text>");
}

fn path_data(path: &[PathCmd]) -> String {
    let mut d = String::new();
    for cmd in path {
        if !d.is_empty() {
            d.push(' ');
        }
        match *cmd {
            PathCmd::MoveTo(x, y) => {
                let _ = write!(d, "M {x} {y}");
            }
            PathCmd::LineTo(x, y) => {
                let _ = write!(d, "L {x} {y}");
            }
            PathCmd::QuadTo(cx, cy, x, y) => {
                let _ = write!(d, "Q {cx} {cy} {x} {y}");
            }
            PathCmd::CubicTo(a, b, c, e, x, y) => {
                let _ = write!(d, "C {a} {b} {c} {e} {x} {y}");
            }
            PathCmd::Close => d.push('Z'),
        }
    }
    d
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sf_core::model::{ImageProps, ObjectBase};

    #[test]
    fn viewbox_matches_workspace() {
        let svg = render_svg(&ElementsDocument::blank(1080.0, 1350.0));
        assert!(svg.contains("viewBox=\"0 0 1080 1350\""));
        assert!(svg.contains("width=\"1080\" height=\"1350\""));
        assert!(svg.contains("clip-path=\"url(#page)\""));
    }

    #[test]
    fn text_is_escaped_and_split_into_lines() {
        let mut doc = ElementsDocument::blank(400.0, 400.0);
        doc.objects.push(SceneObject::new(
            ObjectBase::new(10.0, 10.0, 200.0, 80.0),
            Shape::Textbox(TextProps::new("Tom & <Jerry>\nchapter two", "Arial")),
        ));
        let svg = render_svg(&doc);
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert_eq!(svg.matches("<tspan").count(), 2);
    }

    #[test]
    fn hidden_objects_are_omitted() {
        let mut doc = ElementsDocument::blank(100.0, 100.0);
        let mut obj = SceneObject::new(
            ObjectBase::new(0.0, 0.0, 10.0, 10.0),
            Shape::Image(ImageProps {
                src: "https://cdn.example.com/a.png".into(),
                cross_origin: None,
                filters: Vec::new(),
            }),
        );
        obj.base.visible = false;
        doc.objects.push(obj);
        assert!(!render_svg(&doc).contains("<image"));
    }

    #[test]
    fn path_transform_and_dash() {
        let mut obj = SceneObject::new(
            ObjectBase::new(5.0, 6.0, 10.0, 10.0),
            Shape::Path {
                path: vec![PathCmd::MoveTo(0.0, 0.0), PathCmd::LineTo(10.0, 10.0), PathCmd::Close],
            },
        );
        obj.base.stroke = Some("#000".into());
        obj.base.stroke_width = 2.0;
        obj.base.stroke_dash_array = Some([4.0, 2.0].into_iter().collect());
        obj.base.angle = 45.0;
        let mut svg = String::new();
        render_object(&mut svg, &obj);
        assert!(svg.contains("translate(5 6) rotate(45)"));
        assert!(svg.contains("d=\"M 0 0 L 10 10 Z\""));
        assert!(svg.contains("stroke-dasharray=\"4 2\""));
    }
}
