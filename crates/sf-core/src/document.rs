//! Loading and emitting elements documents.
//!
//! Loading is lenient at the page boundary: `load_or_blank` never fails.
//! A document that cannot be parsed or validated is replaced by a blank
//! workspace, and a document without a workspace marker gets one inserted
//! beneath all other content.

use crate::error::DocumentError;
use crate::model::{ElementsDocument, SceneObject};
use kurbo::Rect;
use serde::Deserialize;
use serde_json::Value;

/// Parse an elements document from JSON text and validate its geometry.
pub fn parse_elements(text: &str) -> Result<ElementsDocument, DocumentError> {
    let doc: ElementsDocument = serde_json::from_str(text)?;
    validate(&doc)?;
    Ok(doc)
}

/// Parse an elements document from a JSON value.
///
/// Records written by older clients store the document double-encoded as a
/// JSON string; that form is accepted too.
pub fn elements_from_value(value: &Value) -> Result<ElementsDocument, DocumentError> {
    if let Value::String(text) = value {
        return parse_elements(text);
    }
    let doc = ElementsDocument::deserialize(value)?;
    validate(&doc)?;
    Ok(doc)
}

/// Emit the document as compact JSON text.
pub fn emit_elements(doc: &ElementsDocument) -> String {
    // Every field is a plain string, number, bool, or sequence; this cannot fail.
    serde_json::to_string(doc).unwrap_or_default()
}

/// Emit the document as a JSON value for embedding in a page record.
pub fn to_value(doc: &ElementsDocument) -> Value {
    serde_json::to_value(doc).unwrap_or(Value::Null)
}

/// Load a page's elements, falling back to a blank `width × height`
/// workspace when the stored value is absent or malformed.
pub fn load_or_blank(value: Option<&Value>, width: f64, height: f64) -> ElementsDocument {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return ElementsDocument::blank(width, height);
    };
    match elements_from_value(value) {
        Ok(mut doc) => {
            normalize_workspace(&mut doc, width, height);
            doc
        }
        Err(err) => {
            log::warn!("falling back to blank workspace: {err}");
            ElementsDocument::blank(width, height)
        }
    }
}

/// Make the workspace marker the bottom-most, non-selectable object sized
/// `width × height`, inserting one if absent. Returns whether anything changed.
pub fn normalize_workspace(doc: &mut ElementsDocument, width: f64, height: f64) -> bool {
    let Some(index) = doc.workspace_index() else {
        log::warn!("elements document has no workspace marker; inserting one");
        doc.objects.insert(0, SceneObject::workspace(width, height));
        return true;
    };
    let mut changed = false;
    if index != 0 {
        let ws = doc.objects.remove(index);
        doc.objects.insert(0, ws);
        changed = true;
    }
    let b = &mut doc.objects[0].base;
    if b.width != width || b.height != height || b.scale_x != 1.0 || b.scale_y != 1.0 {
        b.width = width;
        b.height = height;
        b.scale_x = 1.0;
        b.scale_y = 1.0;
        changed = true;
    }
    if b.selectable || b.has_controls {
        b.selectable = false;
        b.has_controls = false;
        changed = true;
    }
    changed
}

/// The workspace rectangle, or `MissingWorkspace` when the marker is
/// absent or has a non-positive size.
pub fn require_workspace(doc: &ElementsDocument) -> Result<Rect, DocumentError> {
    doc.workspace_rect()
        .filter(|r| r.width() > 0.0 && r.height() > 0.0)
        .ok_or(DocumentError::MissingWorkspace)
}

/// Check that every object carries finite, non-negative geometry.
pub fn validate(doc: &ElementsDocument) -> Result<(), DocumentError> {
    for (index, obj) in doc.objects.iter().enumerate() {
        let b = &obj.base;
        let kind = obj.kind_name();
        if ![b.left, b.top, b.width, b.height, b.scale_x, b.scale_y, b.angle]
            .iter()
            .all(|n| n.is_finite())
        {
            return Err(DocumentError::InvalidGeometry {
                index,
                kind,
                reason: "non-finite coordinate",
            });
        }
        if b.width < 0.0 || b.height < 0.0 {
            return Err(DocumentError::InvalidGeometry {
                index,
                kind,
                reason: "negative size",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectBase, Shape};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn emit_parse_roundtrip() {
        let mut doc = ElementsDocument::blank(800.0, 600.0);
        doc.objects.push(SceneObject::new(
            ObjectBase::new(100.0, 120.5, 50.0, 50.0),
            Shape::Ellipse { rx: 25.0, ry: 25.0 },
        ));
        let text = emit_elements(&doc);
        assert_eq!(parse_elements(&text).unwrap(), doc);
    }

    #[test]
    fn double_encoded_value_is_accepted() {
        let doc = ElementsDocument::blank(300.0, 200.0);
        let value = Value::String(emit_elements(&doc));
        assert_eq!(elements_from_value(&value).unwrap(), doc);
    }

    #[test]
    fn malformed_json_falls_back_to_blank() {
        let value = Value::String("{ not json".to_string());
        let doc = load_or_blank(Some(&value), 640.0, 480.0);
        assert_eq!(doc, ElementsDocument::blank(640.0, 480.0));
    }

    #[test]
    fn missing_geometry_falls_back_to_blank() {
        let value = json!({
            "version": "5.3.0",
            "objects": [{ "type": "rect", "left": 0, "top": 0 }]
        });
        assert!(elements_from_value(&value).is_err());
        let doc = load_or_blank(Some(&value), 100.0, 100.0);
        assert_eq!(doc.objects.len(), 1);
        assert!(doc.objects[0].is_workspace());
    }

    #[test]
    fn negative_size_is_rejected() {
        let value = json!({
            "version": "5.3.0",
            "objects": [{ "type": "rect", "left": 0, "top": 0, "width": -1, "height": 5 }]
        });
        let err = elements_from_value(&value).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidGeometry { index: 0, .. }));
    }

    #[test]
    fn workspace_is_resized_and_moved_to_bottom() {
        let mut doc = ElementsDocument::blank(100.0, 100.0);
        let ws = doc.objects.remove(0);
        doc.objects.push(SceneObject::new(
            ObjectBase::new(1.0, 1.0, 5.0, 5.0),
            Shape::Triangle,
        ));
        doc.objects.push(ws);
        assert!(normalize_workspace(&mut doc, 1080.0, 1920.0));
        assert!(doc.objects[0].is_workspace());
        assert_eq!(doc.objects[0].base.width, 1080.0);
        assert_eq!(doc.objects[0].base.height, 1920.0);
        assert!(!normalize_workspace(&mut doc, 1080.0, 1920.0));
    }

    #[test]
    fn zero_sized_workspace_is_missing() {
        let doc = ElementsDocument::blank(0.0, 500.0);
        assert!(matches!(require_workspace(&doc), Err(DocumentError::MissingWorkspace)));
        assert!(require_workspace(&ElementsDocument::empty()).is_err());
        assert!(require_workspace(&ElementsDocument::blank(5.0, 5.0)).is_ok());
    }

    #[test]
    fn absent_value_yields_blank() {
        assert_eq!(load_or_blank(None, 10.0, 20.0), ElementsDocument::blank(10.0, 20.0));
        assert_eq!(
            load_or_blank(Some(&Value::Null), 10.0, 20.0),
            ElementsDocument::blank(10.0, 20.0)
        );
    }

    #[test]
    fn workspace_marker_is_inserted_beneath_content() {
        let value = json!({
            "version": "5.3.0",
            "objects": [{ "type": "triangle", "left": 5, "top": 5, "width": 10, "height": 10 }]
        });
        let doc = load_or_blank(Some(&value), 200.0, 100.0);
        assert_eq!(doc.objects.len(), 2);
        assert!(doc.objects[0].is_workspace());
        assert_eq!(doc.objects[1].kind_name(), "triangle");
    }
}
