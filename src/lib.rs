//! Hover/selection driven translation engine.
//!
//! The crate is a pure decision and caching layer between raw page input events
//! (pointer, keyboard, selection) and two thin I/O collaborators: a detect/translate
//! backend and a popup display. It owns the debounce state machine, the single-slot
//! translation cache with in-flight coalescing, and the popup positioning rules.

pub mod core;
pub mod shared;

pub use crate::core::backend::{GoogleTranslateBackend, TranslationBackend};
pub use crate::core::dispatch::Dispatcher;
pub use crate::core::engine::{Engine, EngineHandle};
pub use crate::core::page::{PageSurface, SelectionInfo, TextHit};
pub use crate::core::popup::PopupDisplay;
pub use crate::shared::error::{AppError, AppResult};
pub use crate::shared::settings::{
    JsonFileStore, LanguageMapping, MemoryStore, ModifierKey, Settings, SettingsStore,
};
