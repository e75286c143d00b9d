//! Live page controllers of one open design.
//!
//! Slots are aligned with page order: slot `i` holds the controller of page
//! `i` when that page's canvas is mounted. The registry is owned by a
//! `DesignSession`, so two open designs never share controllers.

use crate::controller::PageCanvasController;
use crate::scene::Scene;

pub struct ActiveEditorRegistry<S: Scene> {
    slots: Vec<Option<PageCanvasController<S>>>,
    current: usize,
}

impl<S: Scene> ActiveEditorRegistry<S> {
    /// A registry for `page_count` pages, none mounted.
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: (0..page_count).map(|_| None).collect(),
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Open an empty slot at `index`, shifting later slots.
    pub fn insert_slot(&mut self, index: usize) {
        let index = index.min(self.slots.len());
        self.slots.insert(index, None);
        if index <= self.current && self.slots.len() > 1 {
            self.current += 1;
        }
    }

    /// Place `controller` in slot `index`, returning the one it replaces.
    pub fn mount(
        &mut self,
        index: usize,
        controller: PageCanvasController<S>,
    ) -> Option<PageCanvasController<S>> {
        let slot = self.slots.get_mut(index)?;
        slot.replace(controller)
    }

    /// Take the controller out of slot `index`, leaving the slot empty.
    pub fn unmount(&mut self, index: usize) -> Option<PageCanvasController<S>> {
        self.slots.get_mut(index)?.take()
    }

    /// Remove slot `index` entirely, shifting later slots.
    pub fn remove(&mut self, index: usize) -> Option<PageCanvasController<S>> {
        if index >= self.slots.len() {
            return None;
        }
        let removed = self.slots.remove(index);
        if index < self.current || self.current >= self.slots.len() {
            self.current = self.current.saturating_sub(1);
        }
        removed
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        if a < self.slots.len() && b < self.slots.len() {
            self.slots.swap(a, b);
        }
    }

    pub fn get(&self, index: usize) -> Option<&PageCanvasController<S>> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PageCanvasController<S>> {
        self.slots.get_mut(index)?.as_mut()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The controller receiving tool operations, if its page is mounted.
    pub fn current(&self) -> Option<&PageCanvasController<S>> {
        self.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut PageCanvasController<S>> {
        self.get_mut(self.current)
    }

    pub fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    /// Every mounted controller with its page index.
    pub fn iter_live_mut(&mut self) -> impl Iterator<Item = (usize, &mut PageCanvasController<S>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|c| (i, c)))
    }

    /// Drop every controller and slot.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.current = 0;
    }
}
