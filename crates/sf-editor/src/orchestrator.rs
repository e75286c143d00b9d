//! Page order, page identity, and the active-page pointer.
//!
//! Index bookkeeping lives here and nowhere else: every lifecycle operation
//! keeps `active` pointing at the same logical page unless that page is the
//! one being removed.

use serde_json::Value;
use sf_core::design::{Design, Page};
use sf_core::id::PageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward index 0.
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct MultiPageOrchestrator {
    pages: Vec<Page>,
    active: usize,
    width: f64,
    height: f64,
}

impl MultiPageOrchestrator {
    /// Take over the pages of `design`. A design without pages gets a blank
    /// one; an out-of-range current page is clamped.
    pub fn from_design(design: &Design) -> Self {
        let mut design = design.clone();
        design.normalize();
        Self {
            pages: design.pages,
            active: design.current_page,
            width: design.width,
            height: design.height,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn index_of(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|p| &p.id == id)
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// New pages are created at these dimensions.
    pub fn set_dimensions(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Append a blank page and make it active. Returns its index.
    pub fn add_page(&mut self) -> usize {
        self.pages.push(Page::blank(self.width, self.height));
        self.active = self.pages.len() - 1;
        log::debug!("added page {} at {}", self.pages[self.active].id, self.active);
        self.active
    }

    /// Deep-copy page `index` under a fresh id, right after the original.
    /// The active page stays the same logical page.
    pub fn duplicate_page(&mut self, index: usize) -> Option<usize> {
        let source = self.pages.get(index)?;
        let copy = Page {
            id: PageId::fresh(),
            elements: source.elements.clone(),
            thumbnail: source.thumbnail.clone(),
        };
        let at = index + 1;
        self.pages.insert(at, copy);
        if self.active > index {
            self.active += 1;
        }
        log::debug!("duplicated page {index} into {at}");
        Some(at)
    }

    /// Remove page `index`. Refused when it is the last remaining page or
    /// out of range.
    pub fn delete_page(&mut self, index: usize) -> bool {
        if self.pages.len() <= 1 || index >= self.pages.len() {
            return false;
        }
        let removed = self.pages.remove(index);
        if index == self.active {
            self.active = index.saturating_sub(1);
        } else if index < self.active {
            self.active -= 1;
        }
        log::debug!("deleted page {} at {index}; active is {}", removed.id, self.active);
        true
    }

    /// Swap page `index` with its neighbour. Returns the page's new index,
    /// or `None` at the boundary.
    pub fn move_page(&mut self, index: usize, direction: Direction) -> Option<usize> {
        if index >= self.pages.len() {
            return None;
        }
        let target = match direction {
            Direction::Up => index.checked_sub(1)?,
            Direction::Down => Some(index + 1).filter(|&t| t < self.pages.len())?,
        };
        self.pages.swap(index, target);
        if self.active == index {
            self.active = target;
        } else if self.active == target {
            self.active = index;
        }
        log::debug!("moved page {index} to {target}");
        Some(target)
    }

    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.active = index;
        true
    }

    /// Store a page's serialized elements.
    pub fn replace_elements(&mut self, index: usize, elements: Value) -> bool {
        match self.pages.get_mut(index) {
            Some(page) => {
                page.elements = elements;
                true
            }
            None => false,
        }
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sf_core::document::load_or_blank;
    use sf_core::id::DesignId;

    fn orchestrator(width: f64, height: f64) -> MultiPageOrchestrator {
        MultiPageOrchestrator::from_design(&Design::new(DesignId::new("d"), "", width, height))
    }

    fn three_pages() -> (MultiPageOrchestrator, Vec<PageId>) {
        let mut o = orchestrator(100.0, 100.0);
        o.add_page();
        o.add_page();
        let ids = o.pages().iter().map(|p| p.id.clone()).collect();
        (o, ids)
    }

    fn order(o: &MultiPageOrchestrator) -> Vec<PageId> {
        o.pages().iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn add_page_appends_blank_and_activates() {
        let mut o = orchestrator(640.0, 360.0);
        let i = o.add_page();
        assert_eq!(i, 1);
        assert_eq!(o.active(), 1);
        let doc = load_or_blank(Some(&o.pages()[1].elements), 1.0, 1.0);
        assert_eq!(doc.objects.len(), 1);
        let ws = &doc.objects[0];
        assert!(ws.is_workspace() && !ws.base.selectable);
        assert_eq!((ws.base.width, ws.base.height), (640.0, 360.0));
    }

    #[test]
    fn empty_design_gets_a_page() {
        let mut design = Design::new(DesignId::new("d"), "", 10.0, 10.0);
        design.pages.clear();
        design.current_page = 4;
        let o = MultiPageOrchestrator::from_design(&design);
        assert_eq!(o.page_count(), 1);
        assert_eq!(o.active(), 0);
    }

    #[test]
    fn delete_last_page_is_refused() {
        let mut o = orchestrator(10.0, 10.0);
        let before = order(&o);
        assert!(!o.delete_page(0));
        assert_eq!(order(&o), before);
        assert_eq!(o.active(), 0);
    }

    #[test]
    fn delete_active_falls_back_to_previous() {
        let (mut o, ids) = three_pages();
        o.set_active(2);
        assert!(o.delete_page(2));
        assert_eq!(o.active(), 1);
        assert_eq!(o.pages()[1].id, ids[1]);

        o.set_active(0);
        assert!(o.delete_page(0));
        assert_eq!(o.active(), 0);
        assert_eq!(order(&o), vec![ids[1].clone()]);
    }

    #[test]
    fn delete_before_active_shifts_down() {
        let (mut o, ids) = three_pages();
        o.set_active(2);
        assert!(o.delete_page(0));
        assert_eq!(o.active(), 1);
        assert_eq!(o.pages()[o.active()].id, ids[2]);
    }

    #[test]
    fn move_keeps_active_on_same_page() {
        let (mut o, ids) = three_pages();
        o.set_active(1);
        assert_eq!(o.move_page(1, Direction::Up), Some(0));
        assert_eq!(order(&o), vec![ids[1].clone(), ids[0].clone(), ids[2].clone()]);
        assert_eq!(o.active(), 0);

        // Moving a neighbour past the active page drags the index along.
        assert_eq!(o.move_page(1, Direction::Up), Some(0));
        assert_eq!(o.pages()[o.active()].id, ids[1]);
        assert_eq!(o.active(), 1);
    }

    #[test]
    fn move_at_boundary_is_noop() {
        let (mut o, ids) = three_pages();
        assert_eq!(o.move_page(0, Direction::Up), None);
        assert_eq!(o.move_page(2, Direction::Down), None);
        assert_eq!(o.move_page(7, Direction::Down), None);
        assert_eq!(order(&o), ids);
    }

    #[test]
    fn duplicate_inserts_after_and_keeps_active() {
        let (mut o, ids) = three_pages();
        o.set_active(2);
        assert_eq!(o.duplicate_page(0), Some(1));
        assert_eq!(o.page_count(), 4);
        assert_ne!(o.pages()[1].id, ids[0]);
        assert_eq!(o.pages()[1].elements, o.pages()[0].elements);
        assert_eq!(o.pages()[o.active()].id, ids[2]);
        assert_eq!(o.duplicate_page(9), None);
    }

    #[test]
    fn duplicate_is_deep_copy() {
        let (mut o, _) = three_pages();
        let original = o.pages()[0].elements.clone();
        let at = o.duplicate_page(0).unwrap();
        o.replace_elements(at, serde_json::json!({ "version": "5.3.0", "objects": [] }));
        assert_eq!(o.pages()[0].elements, original);
    }
}
