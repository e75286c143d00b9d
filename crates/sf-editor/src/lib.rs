pub mod autosave;
pub mod controller;
pub mod debounce;
pub mod history;
pub mod orchestrator;
pub mod registry;
pub mod scene;
pub mod session;
pub mod store;

pub use autosave::{AutosavePipeline, SaveRequest, SaveStatus, WriteTicket, submit};
pub use controller::{PageCanvasController, PageEdit};
pub use history::HistoryManager;
pub use orchestrator::{Direction, MultiPageOrchestrator};
pub use registry::ActiveEditorRegistry;
pub use scene::{Brush, ExportError, ExportFormat, MemoryScene, Scene, Selection};
pub use session::DesignSession;
pub use store::{DesignStore, MemoryDesignStore, MemoryTemplateSource, StoreError, TemplateSource};
