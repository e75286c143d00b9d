//! Elements document model: the serialized scene of one design page.
//!
//! A page's canvas is stored as a versioned JSON object
//! `{ "version": "...", "objects": [...] }`. Each object is one drawable
//! primitive from a closed set (rect, circle, ellipse, triangle, textbox,
//! image, path), tagged by `"type"`, carrying shared geometry and style
//! fields plus its kind-specific fields. Array order is stacking order:
//! index 0 is painted first (bottom-most).
//!
//! The first object of every freshly created page is the workspace
//! rectangle: a non-selectable rect named `"clip"` sized to the design's
//! pixel dimensions. It marks the visible page bounds used for viewport
//! fitting, clipping, and export.

use kurbo::Rect;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

/// Version string written into every emitted document.
pub const DOCUMENT_VERSION: &str = "5.3.0";

/// `name` carried by the workspace bounds rectangle.
pub const WORKSPACE_NAME: &str = "clip";

/// Fill used for the workspace rectangle of new pages.
pub const WORKSPACE_FILL: &str = "#ffffff";

// ─── Document ────────────────────────────────────────────────────────────

/// The serialized canvas of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementsDocument {
    pub version: String,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl ElementsDocument {
    /// An empty document (no workspace rectangle).
    pub fn empty() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            objects: Vec::new(),
        }
    }

    /// A document holding only the workspace rectangle.
    pub fn blank(width: f64, height: f64) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            objects: vec![SceneObject::workspace(width, height)],
        }
    }

    /// The workspace bounds marker, if present.
    pub fn workspace(&self) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.is_workspace())
    }

    pub fn workspace_mut(&mut self) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.is_workspace())
    }

    /// Index of the workspace marker in stacking order.
    pub fn workspace_index(&self) -> Option<usize> {
        self.objects.iter().position(SceneObject::is_workspace)
    }

    /// The workspace rectangle in world coordinates, if the marker exists.
    pub fn workspace_rect(&self) -> Option<Rect> {
        self.workspace().map(SceneObject::rect)
    }

    /// Number of objects excluding the workspace marker.
    pub fn content_len(&self) -> usize {
        self.objects.iter().filter(|o| !o.is_workspace()).count()
    }
}

impl Default for ElementsDocument {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Objects ─────────────────────────────────────────────────────────────

/// One drawable primitive: shared fields plus the kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(flatten)]
    pub base: ObjectBase,
    #[serde(flatten)]
    pub shape: Shape,
}

impl SceneObject {
    pub fn new(base: ObjectBase, shape: Shape) -> Self {
        Self { base, shape }
    }

    /// The non-selectable workspace bounds rectangle for a `width × height` page.
    pub fn workspace(width: f64, height: f64) -> Self {
        let mut base = ObjectBase::new(0.0, 0.0, width, height);
        base.name = Some(WORKSPACE_NAME.to_string());
        base.fill = Some(WORKSPACE_FILL.to_string());
        base.selectable = false;
        base.has_controls = false;
        Self {
            base,
            shape: Shape::Rect { rx: 0.0, ry: 0.0 },
        }
    }

    pub fn is_workspace(&self) -> bool {
        self.base.name.as_deref() == Some(WORKSPACE_NAME)
    }

    /// Axis-aligned bounds in world coordinates (scale applied, rotation ignored).
    pub fn rect(&self) -> Rect {
        let b = &self.base;
        Rect::new(
            b.left,
            b.top,
            b.left + b.width * b.scale_x,
            b.top + b.height * b.scale_y,
        )
    }

    /// Short kind name as written in the `type` tag.
    pub fn kind_name(&self) -> &'static str {
        match self.shape {
            Shape::Rect { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Triangle => "triangle",
            Shape::Textbox(_) => "textbox",
            Shape::Image(_) => "image",
            Shape::Path { .. } => "path",
        }
    }
}

/// Geometry and style fields shared by every object kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "unit")]
    pub scale_x: f64,
    #[serde(default = "unit")]
    pub scale_y: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dash_array: Option<SmallVec<[f64; 4]>>,
    #[serde(default = "unit")]
    pub opacity: f64,
    #[serde(default = "enabled")]
    pub selectable: bool,
    #[serde(default = "enabled")]
    pub has_controls: bool,
    #[serde(default = "enabled")]
    pub visible: bool,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
}

fn unit() -> f64 {
    1.0
}

fn enabled() -> bool {
    true
}

impl ObjectBase {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            name: None,
            left,
            top,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            stroke_dash_array: None,
            opacity: 1.0,
            selectable: true,
            has_controls: true,
            visible: true,
            flip_x: false,
            flip_y: false,
            shadow: None,
        }
    }
}

/// Drop shadow attached to an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub color: String,
    #[serde(default)]
    pub blur: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// Kind-specific payload, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rect {
        #[serde(default)]
        rx: f64,
        #[serde(default)]
        ry: f64,
    },
    Circle {
        radius: f64,
    },
    Ellipse {
        rx: f64,
        ry: f64,
    },
    Triangle,
    Textbox(TextProps),
    Image(ImageProps),
    Path {
        path: Vec<PathCmd>,
    },
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Text box content and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub text: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// CSS numeric weight, 100..=900.
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub linethrough: bool,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> f64 {
    32.0
}

fn default_font_weight() -> u16 {
    400
}

fn default_line_height() -> f64 {
    1.16
}

impl TextProps {
    pub fn new(text: impl Into<String>, font_family: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: font_family.into(),
            font_size: default_font_size(),
            font_weight: default_font_weight(),
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
            underline: false,
            linethrough: false,
            line_height: default_line_height(),
        }
    }
}

/// A raster image referenced by URL, with its filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<String>,
    #[serde(default)]
    pub filters: Vec<ImageFilter>,
}

/// Image filters, applied in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImageFilter {
    Grayscale,
    Sepia,
    Invert,
    Brightness { brightness: f64 },
    Contrast { contrast: f64 },
    Saturation { saturation: f64 },
    Blur { blur: f64 },
    Pixelate { blocksize: f64 },
}

impl ImageFilter {
    /// Look up a filter preset by its sidebar name.
    pub fn preset(name: &str) -> Option<Self> {
        let filter = match name {
            "none" => return None,
            "grayscale" => Self::Grayscale,
            "sepia" => Self::Sepia,
            "invert" => Self::Invert,
            "brightness" => Self::Brightness { brightness: 0.05 },
            "contrast" => Self::Contrast { contrast: 0.3 },
            "saturation" => Self::Saturation { saturation: 0.7 },
            "blur" => Self::Blur { blur: 0.5 },
            "pixelate" => Self::Pixelate { blocksize: 4.0 },
            _ => return None,
        };
        Some(filter)
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// A single path command. On the wire each command is an array led by its
/// letter: `["M", x, y]`, `["Q", cx, cy, x, y]`, `["Z"]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),            // control, end
    CubicTo(f64, f64, f64, f64, f64, f64), // c1, c2, end
    Close,
}

impl PathCmd {
    pub fn letter(&self) -> &'static str {
        match self {
            PathCmd::MoveTo(..) => "M",
            PathCmd::LineTo(..) => "L",
            PathCmd::QuadTo(..) => "Q",
            PathCmd::CubicTo(..) => "C",
            PathCmd::Close => "Z",
        }
    }

    fn coords(&self) -> SmallVec<[f64; 6]> {
        match *self {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => SmallVec::from_slice(&[x, y]),
            PathCmd::QuadTo(cx, cy, x, y) => SmallVec::from_slice(&[cx, cy, x, y]),
            PathCmd::CubicTo(a, b, c, d, x, y) => SmallVec::from_slice(&[a, b, c, d, x, y]),
            PathCmd::Close => SmallVec::new(),
        }
    }

    fn from_parts(letter: &str, n: &[f64]) -> Option<Self> {
        match (letter, n) {
            ("M", &[x, y]) => Some(PathCmd::MoveTo(x, y)),
            ("L", &[x, y]) => Some(PathCmd::LineTo(x, y)),
            ("Q", &[cx, cy, x, y]) => Some(PathCmd::QuadTo(cx, cy, x, y)),
            ("C", &[a, b, c, d, x, y]) => Some(PathCmd::CubicTo(a, b, c, d, x, y)),
            ("Z" | "z", &[]) => Some(PathCmd::Close),
            _ => None,
        }
    }
}

impl Serialize for PathCmd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let coords = self.coords();
        let mut seq = serializer.serialize_seq(Some(coords.len() + 1))?;
        seq.serialize_element(self.letter())?;
        for c in &coords {
            seq.serialize_element(c)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PathCmd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathCmdVisitor;

        impl<'de> Visitor<'de> for PathCmdVisitor {
            type Value = PathCmd;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a path command array such as [\"L\", x, y]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PathCmd, A::Error> {
                let letter: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let mut coords: SmallVec<[f64; 6]> = SmallVec::new();
                while let Some(n) = seq.next_element::<f64>()? {
                    coords.push(n);
                }
                PathCmd::from_parts(&letter, &coords).ok_or_else(|| {
                    de::Error::custom(format!(
                        "path command {letter:?} with {} coordinates",
                        coords.len()
                    ))
                })
            }
        }

        deserializer.deserialize_seq(PathCmdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn workspace_is_first_and_not_selectable() {
        let doc = ElementsDocument::blank(1080.0, 1350.0);
        assert_eq!(doc.objects.len(), 1);
        let ws = &doc.objects[0];
        assert!(ws.is_workspace());
        assert!(!ws.base.selectable);
        assert_eq!(ws.rect(), Rect::new(0.0, 0.0, 1080.0, 1350.0));
        assert_eq!(doc.content_len(), 0);
    }

    #[test]
    fn object_wire_shape_is_flat() {
        let obj = SceneObject::new(
            ObjectBase::new(10.0, 20.0, 30.0, 40.0),
            Shape::Circle { radius: 15.0 },
        );
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["type"], json!("circle"));
        assert_eq!(value["left"], json!(10.0));
        assert_eq!(value["radius"], json!(15.0));
        assert_eq!(value["scaleX"], json!(1.0));
        assert!(value.get("name").is_none());
    }

    #[test]
    fn optional_fields_take_defaults() {
        let obj: SceneObject = serde_json::from_value(json!({
            "type": "textbox",
            "left": 1, "top": 2, "width": 300, "height": 40,
            "text": "Once upon a time"
        }))
        .unwrap();
        assert_eq!(obj.base.opacity, 1.0);
        assert!(obj.base.selectable);
        match obj.shape {
            Shape::Textbox(t) => {
                assert_eq!(t.font_family, "Arial");
                assert_eq!(t.font_weight, 400);
                assert_eq!(t.text_align, TextAlign::Left);
            }
            other => panic!("expected textbox, got {other:?}"),
        }
    }

    #[test]
    fn path_commands_use_array_form() {
        let cmds = vec![
            PathCmd::MoveTo(0.0, 0.0),
            PathCmd::QuadTo(5.0, 5.0, 10.0, 0.0),
            PathCmd::Close,
        ];
        let value = serde_json::to_value(&cmds).unwrap();
        assert_eq!(value, json!([["M", 0.0, 0.0], ["Q", 5.0, 5.0, 10.0, 0.0], ["Z"]]));
        let back: Vec<PathCmd> = serde_json::from_value(value).unwrap();
        assert_eq!(back, cmds);
    }

    #[test]
    fn path_command_arity_is_checked() {
        let err = serde_json::from_value::<PathCmd>(json!(["L", 1.0])).unwrap_err();
        assert!(err.to_string().contains("path command"));
    }

    #[test]
    fn filters_are_type_tagged() {
        let filters = vec![ImageFilter::Grayscale, ImageFilter::Blur { blur: 0.5 }];
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(value, json!([{"type": "Grayscale"}, {"type": "Blur", "blur": 0.5}]));
        assert_eq!(ImageFilter::preset("sepia"), Some(ImageFilter::Sepia));
        assert_eq!(ImageFilter::preset("none"), None);
    }
}
