//! Hit testing: world point → object lookup.
//!
//! Walks the document back to front (last painted = topmost). The
//! workspace rectangle, hidden objects, and non-selectable objects are
//! never hit.

use kurbo::{Affine, Point, Rect};
use sf_core::model::{ElementsDocument, SceneObject};

/// World-space axis-aligned bounds of an object, including rotation
/// about its top-left origin.
pub fn object_bounds(obj: &SceneObject) -> Rect {
    let rect = obj.rect();
    if obj.base.angle == 0.0 {
        return rect;
    }
    let origin = Point::new(rect.x0, rect.y0);
    Affine::rotate_about(obj.base.angle.to_radians(), origin).transform_rect_bbox(rect)
}

fn pickable(obj: &SceneObject) -> bool {
    obj.base.visible && obj.base.selectable && !obj.is_workspace()
}

/// Index of the topmost pickable object containing `p`, if any.
pub fn hit_test(doc: &ElementsDocument, p: Point) -> Option<usize> {
    doc.objects
        .iter()
        .enumerate()
        .rev()
        .find(|(_, obj)| pickable(obj) && object_bounds(obj).contains(p))
        .map(|(i, _)| i)
}

/// Indices (in stacking order) of all pickable objects overlapping `area`.
/// Used for marquee selection.
pub fn hit_test_rect(doc: &ElementsDocument, area: Rect) -> Vec<usize> {
    let area = area.abs();
    doc.objects
        .iter()
        .enumerate()
        .filter(|(_, obj)| pickable(obj) && object_bounds(obj).overlaps(area))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sf_core::model::{ObjectBase, Shape};

    fn rect_at(x: f64, y: f64, w: f64, h: f64) -> SceneObject {
        SceneObject::new(ObjectBase::new(x, y, w, h), Shape::Rect { rx: 0.0, ry: 0.0 })
    }

    fn doc() -> ElementsDocument {
        let mut doc = ElementsDocument::blank(500.0, 500.0);
        doc.objects.push(rect_at(10.0, 10.0, 100.0, 100.0));
        doc.objects.push(rect_at(50.0, 50.0, 100.0, 100.0));
        doc
    }

    #[test]
    fn topmost_object_wins() {
        assert_eq!(hit_test(&doc(), Point::new(60.0, 60.0)), Some(2));
        assert_eq!(hit_test(&doc(), Point::new(20.0, 20.0)), Some(1));
    }

    #[test]
    fn workspace_is_never_hit() {
        assert_eq!(hit_test(&doc(), Point::new(400.0, 400.0)), None);
    }

    #[test]
    fn hidden_objects_are_skipped() {
        let mut d = doc();
        d.objects[2].base.visible = false;
        assert_eq!(hit_test(&d, Point::new(60.0, 60.0)), Some(1));
    }

    #[test]
    fn rotation_expands_bounds() {
        let mut obj = rect_at(0.0, 0.0, 100.0, 10.0);
        obj.base.angle = 90.0;
        let b = object_bounds(&obj);
        assert!((b.width() - 10.0).abs() < 1e-9);
        assert!((b.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn marquee_collects_overlapping() {
        let hits = hit_test_rect(&doc(), Rect::new(120.0, 120.0, 0.0, 0.0));
        assert_eq!(hits, vec![1, 2]);
        assert!(hit_test_rect(&doc(), Rect::new(300.0, 300.0, 310.0, 310.0)).is_empty());
    }

    #[test]
    fn marquee_skips_hidden_and_workspace() {
        let mut d = doc();
        d.objects[1].base.visible = false;
        let hits = hit_test_rect(&d, Rect::new(0.0, 0.0, 1000.0, 1000.0));
        assert_eq!(hits, vec![2]);
    }
}
