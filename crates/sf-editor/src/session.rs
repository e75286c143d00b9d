//! One open design: pages, their live canvases, and autosave.
//!
//! `DesignSession` keeps three index spaces in lockstep: the page list of
//! the orchestrator, the slots of the editor registry, and the active-page
//! pointer. Edits made through a controller are drained into the page list
//! and buffered for autosave; structural page operations write at once.

use crate::autosave::{AutosavePipeline, SaveRequest, SaveStatus, WriteTicket};
use crate::controller::PageCanvasController;
use crate::orchestrator::{Direction, MultiPageOrchestrator};
use crate::registry::ActiveEditorRegistry;
use crate::scene::Scene;
use crate::store::StoreError;
use kurbo::Size;
use sf_core::config::EditorConfig;
use sf_core::design::{Design, DesignPatch, Page};
use sf_core::document::{load_or_blank, to_value};
use sf_core::id::DesignId;

pub struct DesignSession<S: Scene> {
    design_id: DesignId,
    name: String,
    is_public: bool,
    created_at: Option<String>,
    config: EditorConfig,
    pages: MultiPageOrchestrator,
    editors: ActiveEditorRegistry<S>,
    autosave: AutosavePipeline,
    container: Option<Size>,
}

impl<S: Scene> DesignSession<S> {
    pub fn open(design: &Design, config: EditorConfig) -> Self {
        let pages = MultiPageOrchestrator::from_design(design);
        let mut editors = ActiveEditorRegistry::new(pages.page_count());
        editors.set_current(pages.active());
        log::debug!("opened design {} with {} page(s)", design.id, pages.page_count());
        Self {
            design_id: design.id.clone(),
            name: design.name.clone(),
            is_public: design.is_public,
            created_at: design.created_at.clone(),
            autosave: AutosavePipeline::new(design.id.clone(), config.autosave_debounce_ms),
            config,
            pages,
            editors,
            container: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn design_id(&self) -> &DesignId {
        &self.design_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn pages(&self) -> &[Page] {
        self.pages.pages()
    }

    pub fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    pub fn active(&self) -> usize {
        self.pages.active()
    }

    pub fn dimensions(&self) -> (f64, f64) {
        self.pages.dimensions()
    }

    pub fn controller(&self, index: usize) -> Option<&PageCanvasController<S>> {
        self.editors.get(index)
    }

    pub fn active_controller(&self) -> Option<&PageCanvasController<S>> {
        self.editors.get(self.pages.active())
    }

    /// Mounted scenes with their page index, for hosts that drive drawing.
    pub fn scenes_mut(&mut self) -> impl Iterator<Item = (usize, &mut S)> {
        self.editors.iter_live_mut().map(|(i, c)| (i, c.scene_mut()))
    }

    pub fn save_status(&self) -> &SaveStatus {
        self.autosave.status()
    }

    /// The design record as it would be persisted now.
    pub fn design_snapshot(&self) -> Design {
        let (width, height) = self.pages.dimensions();
        Design {
            id: self.design_id.clone(),
            name: self.name.clone(),
            width,
            height,
            is_public: self.is_public,
            pages: self.pages.pages().to_vec(),
            current_page: self.pages.active(),
            created_at: self.created_at.clone(),
            updated_at: None,
        }
    }

    // ─── Canvas lifecycle ────────────────────────────────────────────────

    /// Mount a canvas for page `index`. It is fitted right away when the
    /// container size is already known.
    pub fn mount_page(&mut self, index: usize, scene: S) -> bool {
        let Some(page) = self.pages.page(index) else {
            return false;
        };
        let (width, height) = self.pages.dimensions();
        let mut controller = PageCanvasController::mount(page, width, height, scene, &self.config);
        if let Some(size) = self.container {
            controller.observe_container(0.0, size);
        }
        if self.editors.mount(index, controller).is_some() {
            log::debug!("page {index} remounted");
        }
        true
    }

    /// Unmount the canvas of page `index`, keeping its latest elements.
    pub fn unmount_page(&mut self, now: f64, index: usize) -> bool {
        self.collect_edits(now);
        self.editors.unmount(index).is_some()
    }

    /// Drop pending writes and every canvas. Buffered edits are not flushed.
    pub fn close(&mut self) {
        self.autosave.discard();
        self.editors.clear();
        log::debug!("closed design {}", self.design_id);
    }

    // ─── Editing the active page ─────────────────────────────────────────

    /// Run `f` on the active page's controller; its edits are buffered for
    /// autosave. `None` when the active page has no mounted canvas.
    pub fn with_active<R>(
        &mut self,
        now: f64,
        f: impl FnOnce(&mut PageCanvasController<S>) -> R,
    ) -> Option<R> {
        let controller = self.editors.get_mut(self.pages.active())?;
        let result = f(controller);
        self.collect_edits(now);
        Some(result)
    }

    pub fn undo(&mut self, now: f64) -> bool {
        self.with_active(now, |c| c.undo()).unwrap_or(false)
    }

    pub fn redo(&mut self, now: f64) -> bool {
        self.with_active(now, |c| c.redo()).unwrap_or(false)
    }

    /// Replace the active page's contents with a template page, resized to
    /// the design's dimensions.
    pub fn apply_template(&mut self, now: f64, template: &Page) -> bool {
        let (width, height) = self.pages.dimensions();
        let doc = load_or_blank(Some(&template.elements), width, height);
        self.with_active(now, |c| c.replace_elements(doc)).is_some()
    }

    /// Move edits out of the controllers into the page list.
    fn collect_edits(&mut self, now: f64) -> bool {
        let mut any = false;
        for (_, controller) in self.editors.iter_live_mut() {
            let Some(edit) = controller.take_edit() else {
                continue;
            };
            match self.pages.index_of(&edit.page_id) {
                Some(index) => {
                    self.pages.replace_elements(index, to_value(&edit.elements));
                    any = true;
                }
                None => log::warn!("dropping edit for unknown page {}", edit.page_id),
            }
        }
        if any {
            self.autosave.note_edit(now);
        }
        any
    }

    fn patch(&self, structural: bool) -> DesignPatch {
        let (width, height) = self.pages.dimensions();
        DesignPatch {
            name: None,
            width: Some(width),
            height: Some(height),
            pages: Some(self.pages.pages().to_vec()),
            current_page: structural.then(|| self.pages.active()),
        }
    }

    fn write_now(&mut self) -> SaveRequest {
        let patch = self.patch(true);
        self.autosave.write_now(patch)
    }

    // ─── Page lifecycle ──────────────────────────────────────────────────

    /// Clear the selection on the canvas of `index` and redraw it.
    fn deselect(&mut self, index: usize) {
        if let Some(controller) = self.editors.get_mut(index) {
            controller.clear_selection();
        }
    }

    pub fn add_page(&mut self, now: f64) -> SaveRequest {
        self.collect_edits(now);
        let previous = self.pages.active();
        self.deselect(previous);
        let index = self.pages.add_page();
        self.editors.insert_slot(index);
        self.editors.set_current(index);
        self.write_now()
    }

    pub fn duplicate_page(&mut self, now: f64, index: usize) -> Option<SaveRequest> {
        self.collect_edits(now);
        let at = self.pages.duplicate_page(index)?;
        self.editors.insert_slot(at);
        self.editors.set_current(self.pages.active());
        Some(self.write_now())
    }

    /// Delete page `index`. `None` when refused (last page or out of range).
    pub fn delete_page(&mut self, now: f64, index: usize) -> Option<SaveRequest> {
        self.collect_edits(now);
        if !self.pages.delete_page(index) {
            return None;
        }
        self.editors.remove(index);
        self.editors.set_current(self.pages.active());
        Some(self.write_now())
    }

    pub fn move_page(
        &mut self,
        now: f64,
        index: usize,
        direction: Direction,
    ) -> Option<SaveRequest> {
        self.collect_edits(now);
        let target = self.pages.move_page(index, direction)?;
        self.editors.swap(index, target);
        self.editors.set_current(self.pages.active());
        Some(self.write_now())
    }

    /// Make page `index` the target of tool operations. The previously
    /// active canvas loses its selection.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.pages.page_count() {
            return false;
        }
        let previous = self.pages.active();
        if previous != index {
            self.deselect(previous);
        }
        self.pages.set_active(index);
        self.editors.set_current(index);
        true
    }

    /// Rename the design. Written immediately, together with the pages.
    pub fn rename(&mut self, now: f64, name: &str) -> SaveRequest {
        self.collect_edits(now);
        self.name = name.to_string();
        let patch = DesignPatch {
            name: Some(self.name.clone()),
            ..self.patch(true)
        };
        self.autosave.write_now(patch)
    }

    /// Resize the design. Live canvases resize their workspace; stored
    /// pages are normalized to the new size. Written immediately.
    pub fn change_size(&mut self, now: f64, width: f64, height: f64) -> Option<SaveRequest> {
        let usable = |n: f64| n.is_finite() && n > 0.0;
        if !(usable(width) && usable(height)) || self.pages.dimensions() == (width, height) {
            log::debug!("design {}: ignoring resize to {width}x{height}", self.design_id);
            return None;
        }
        self.pages.set_dimensions(width, height);
        for (_, controller) in self.editors.iter_live_mut() {
            controller.change_size(width, height);
        }
        self.collect_edits(now);
        for index in 0..self.pages.page_count() {
            if self.editors.get(index).is_some() {
                continue;
            }
            if let Some(page) = self.pages.page_mut(index) {
                let doc = load_or_blank(Some(&page.elements), width, height);
                page.elements = to_value(&doc);
            }
        }
        Some(self.write_now())
    }

    // ─── Viewport fan-out ────────────────────────────────────────────────

    /// Zoom every live canvas in by one step. Returns how many changed.
    pub fn zoom_in(&mut self) -> usize {
        let step = self.config.zoom_step;
        self.editors
            .iter_live_mut()
            .map(|(_, c)| c.zoom_by(step))
            .filter(|&changed| changed)
            .count()
    }

    pub fn zoom_out(&mut self) -> usize {
        let step = -self.config.zoom_step;
        self.editors
            .iter_live_mut()
            .map(|(_, c)| c.zoom_by(step))
            .filter(|&changed| changed)
            .count()
    }

    pub fn zoom_to_fit(&mut self) -> usize {
        self.editors
            .iter_live_mut()
            .map(|(_, c)| c.fit())
            .filter(|&changed| changed)
            .count()
    }

    /// Report the shared container size to every live canvas.
    pub fn observe_container(&mut self, now: f64, size: Size) {
        self.container = Some(size);
        for (_, controller) in self.editors.iter_live_mut() {
            controller.observe_container(now, size);
        }
    }

    // ─── Timers and persistence ──────────────────────────────────────────

    /// Advance timers: apply debounced refits, drain edits, and hand out
    /// the debounced write once its quiet period has elapsed.
    pub fn tick(&mut self, now: f64) -> Option<SaveRequest> {
        for (_, controller) in self.editors.iter_live_mut() {
            controller.tick(now);
        }
        self.collect_edits(now);
        if !self.autosave.due(now) {
            return None;
        }
        let patch = self.patch(false);
        Some(self.autosave.issue(patch, false))
    }

    pub fn complete_save(&mut self, ticket: WriteTicket, result: Result<(), StoreError>) -> bool {
        self.autosave.complete(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use pretty_assertions::assert_eq;

    fn session(pages: usize) -> DesignSession<MemoryScene> {
        let mut design = Design::new(DesignId::new("d1"), "Poster", 1080.0, 1080.0);
        for _ in 1..pages {
            design.pages.push(Page::blank(1080.0, 1080.0));
        }
        let mut s = DesignSession::open(&design, EditorConfig::default());
        for i in 0..pages {
            s.mount_page(i, MemoryScene::new());
        }
        s
    }

    #[test]
    fn edits_are_buffered_then_written_once() {
        let mut s = session(1);
        s.with_active(0.0, |c| c.add_rect());
        s.with_active(100.0, |c| c.set_fill("#ff0000"));
        assert_eq!(s.save_status(), &SaveStatus::Pending);
        assert!(s.tick(599.0).is_none());
        let req = s.tick(600.0).expect("debounced write");
        assert!(!req.structural);
        assert_eq!(req.patch.current_page, None);
        assert!(s.tick(5000.0).is_none());
    }

    #[test]
    fn structural_ops_write_immediately() {
        let mut s = session(1);
        let req = s.add_page(0.0);
        assert!(req.structural);
        assert_eq!(req.patch.pages.as_ref().map(Vec::len), Some(2));
        assert_eq!(req.patch.current_page, Some(1));
        assert_eq!(s.active(), 1);
        assert!(s.active_controller().is_none(), "new page not mounted yet");
    }

    #[test]
    fn edit_before_structural_op_is_included() {
        let mut s = session(1);
        s.with_active(0.0, |c| c.add_circle());
        let req = s.duplicate_page(10.0, 0).unwrap();
        let pages = req.patch.pages.unwrap();
        assert_eq!(pages[0].elements, pages[1].elements);
        assert!(s.tick(10_000.0).is_none(), "buffered write was superseded");
    }

    #[test]
    fn delete_refused_on_single_page() {
        let mut s = session(1);
        assert!(s.delete_page(0.0, 0).is_none());
        assert_eq!(s.page_count(), 1);
    }

    #[test]
    fn set_active_clears_previous_selection() {
        let mut s = session(2);
        s.with_active(0.0, |c| c.add_rect());
        assert_eq!(s.controller(0).unwrap().selection().len(), 1);
        assert!(s.set_active(1));
        assert!(s.controller(0).unwrap().selection().is_empty());
        assert!(!s.set_active(9));
    }

    #[test]
    fn zoom_fans_out_to_live_canvases() {
        let mut s = session(3);
        s.observe_container(0.0, Size::new(500.0, 400.0));
        assert_eq!(s.zoom_in(), 3);
        s.unmount_page(0.0, 1);
        assert_eq!(s.zoom_out(), 2);
        assert_eq!(s.zoom_to_fit(), 2);
    }

    #[test]
    fn late_mount_is_fitted() {
        let mut design = Design::new(DesignId::new("d1"), "", 1080.0, 1080.0);
        design.pages.push(Page::blank(1080.0, 1080.0));
        let mut s: DesignSession<MemoryScene> =
            DesignSession::open(&design, EditorConfig::default());
        s.observe_container(0.0, Size::new(500.0, 400.0));
        s.mount_page(1, MemoryScene::new());
        let scale = s.controller(1).unwrap().viewport().scale;
        assert!((scale - 400.0 / 1080.0 * 0.85).abs() < 1e-12);
    }

    #[test]
    fn change_size_updates_unmounted_pages() {
        let mut s = session(2);
        s.unmount_page(0.0, 1);
        let req = s.change_size(0.0, 1080.0, 1920.0).unwrap();
        for page in req.patch.pages.unwrap() {
            let doc = load_or_blank(Some(&page.elements), 1.0, 1.0);
            assert_eq!(doc.objects[0].base.height, 1920.0);
        }
        assert_eq!(req.patch.height, Some(1920.0));
        assert!(s.change_size(0.0, 1080.0, 1920.0).is_none());
    }

    #[test]
    fn non_finite_edit_never_reaches_the_stored_page() {
        let mut s = session(1);
        s.with_active(0.0, |c| {
            c.add_rect();
            c.add_circle();
        });
        let changed = s.with_active(10.0, |c| c.set_opacity(f64::NAN));
        assert_eq!(changed, Some(false));
        let moved = s.with_active(20.0, |c| c.move_selected(f64::NAN, 0.0));
        assert_eq!(moved, Some(false));
        assert!(s.tick(10_000.0).is_some());
        let snapshot = s.design_snapshot();
        let stored = load_or_blank(Some(&snapshot.pages[0].elements), 1080.0, 1080.0);
        assert_eq!(stored.objects.len(), 3);
        assert!(s.change_size(20_000.0, f64::INFINITY, 1080.0).is_none());
        assert_eq!(s.dimensions(), (1080.0, 1080.0));
    }

    #[test]
    fn close_drops_pending_write() {
        let mut s = session(1);
        s.with_active(0.0, |c| c.add_triangle());
        s.close();
        assert!(s.tick(10_000.0).is_none());
        assert!(s.active_controller().is_none());
    }

    #[test]
    fn rename_carries_pages() {
        let mut s = session(1);
        let req = s.rename(0.0, "Banner");
        assert_eq!(req.patch.name.as_deref(), Some("Banner"));
        assert!(req.patch.pages.is_some());
        assert_eq!(s.design_snapshot().name, "Banner");
    }

    #[test]
    fn immediate_writes_carry_the_active_page() {
        let mut s = session(2);
        s.set_active(1);
        let renamed = s.rename(0.0, "Banner");
        assert!(renamed.structural);
        assert_eq!(renamed.patch.current_page, Some(1));
        let resized = s.change_size(0.0, 1080.0, 1920.0).unwrap();
        assert!(resized.structural);
        assert_eq!(resized.patch.current_page, Some(1));
    }
}
