use std::time::Duration;

use crate::shared::settings::Settings;
use crate::shared::types::{Modifiers, Point};

/// The two independent debounce paths. At most one live timer per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Hover,
    Selection,
}

/// What the controller wants done. The engine executes these; the controller
/// itself never touches timers, network or the popup.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Replace any live timer of this kind with a fresh one. Firing must echo
    /// the generation back so stale timers are ignored.
    ArmTimer {
        kind: TimerKind,
        generation: u64,
        delay: Duration,
    },
    CancelTimer(TimerKind),
    /// Evaluate the span at the given pointer position. `force` bypasses the
    /// press-mode reuse branch, not the per-text cache.
    Evaluate { x: f64, y: f64, force: bool },
    /// Evaluate the active selection, anchored at its bounding box.
    EvaluateSelection,
    HidePopup,
    ClearCache,
}

/// Single-slot scheduled-task handle: arming bumps the generation so an
/// unexpired prior timer can never fire as current.
#[derive(Debug, Default)]
struct TimerSlot {
    generation: u64,
    armed: bool,
}

impl TimerSlot {
    fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.armed = true;
        self.generation
    }

    fn cancel(&mut self) {
        self.generation += 1;
        self.armed = false;
    }

    fn fire(&mut self, generation: u64) -> bool {
        if self.armed && generation == self.generation {
            self.armed = false;
            true
        } else {
            false
        }
    }
}

/// Transient per-page interaction state. Reset on pointer-leave and settings
/// change; never persisted.
#[derive(Debug, Default)]
pub struct InteractionState {
    pub is_key_pressed: bool,
    pub last_mouse: Point,
    hover: TimerSlot,
    selection: TimerSlot,
}

/// Converts raw pointer/keyboard/selection events into "translate span now" or
/// "suppress" decisions, per the configured mode.
pub struct TriggerController {
    settings: Settings,
    state: InteractionState,
}

impl TriggerController {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: InteractionState::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_key_pressed(&self) -> bool {
        self.state.is_key_pressed
    }

    pub fn last_mouse(&self) -> Point {
        self.state.last_mouse
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(self.settings.translation_delay)
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> Vec<Directive> {
        self.state.last_mouse = Point::new(x, y);

        if self.settings.press_to_translate {
            // Key gates everything; repositioning an existing result is allowed
            // without forcing a fresh request.
            return if self.state.is_key_pressed {
                vec![Directive::Evaluate { x, y, force: false }]
            } else {
                vec![Directive::HidePopup]
            };
        }

        let generation = self.state.hover.arm();
        vec![Directive::ArmTimer {
            kind: TimerKind::Hover,
            generation,
            delay: self.delay(),
        }]
    }

    /// `has_selection` is whether the page currently has a non-empty trimmed
    /// selection; the controller itself never reads the document.
    pub fn on_selection_change(&mut self, has_selection: bool) -> Vec<Directive> {
        if self.settings.press_to_translate {
            return Vec::new();
        }
        if !has_selection {
            // The armed selection timer, if any, is left running; its expiry is
            // harmless once the selection is gone.
            return vec![Directive::HidePopup];
        }
        let generation = self.state.selection.arm();
        vec![Directive::ArmTimer {
            kind: TimerKind::Selection,
            generation,
            delay: self.delay(),
        }]
    }

    pub fn on_key_down(&mut self, mods: Modifiers) -> Vec<Directive> {
        if !self.settings.press_to_translate || !self.settings.key_to_press.matches(&mods) {
            return Vec::new();
        }
        self.state.is_key_pressed = true;
        // The pointer may not have moved since the key went down; re-evaluate
        // at its last known position, forcing past any stale reuse.
        let Point { x, y } = self.state.last_mouse;
        vec![Directive::Evaluate { x, y, force: true }]
    }

    pub fn on_key_up(&mut self, mods: Modifiers) -> Vec<Directive> {
        if !self.settings.press_to_translate || !self.settings.key_to_press.matches(&mods) {
            return Vec::new();
        }
        self.state.is_key_pressed = false;
        self.state.hover.cancel();
        self.state.selection.cancel();
        vec![
            Directive::HidePopup,
            Directive::CancelTimer(TimerKind::Hover),
            Directive::CancelTimer(TimerKind::Selection),
            Directive::ClearCache,
        ]
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Directive> {
        self.state.hover.cancel();
        self.state.selection.cancel();
        let mut directives = vec![
            Directive::HidePopup,
            Directive::CancelTimer(TimerKind::Hover),
            Directive::CancelTimer(TimerKind::Selection),
        ];
        if self.settings.press_to_translate {
            self.state.is_key_pressed = false;
            directives.push(Directive::ClearCache);
        }
        directives
    }

    pub fn on_timer_fired(&mut self, kind: TimerKind, generation: u64) -> Vec<Directive> {
        let live = match kind {
            TimerKind::Hover => self.state.hover.fire(generation),
            TimerKind::Selection => self.state.selection.fire(generation),
        };
        if !live {
            return Vec::new();
        }
        match kind {
            TimerKind::Hover => {
                let Point { x, y } = self.state.last_mouse;
                vec![Directive::Evaluate { x, y, force: true }]
            }
            TimerKind::Selection => vec![Directive::EvaluateSelection],
        }
    }

    /// The single teardown path shared by settings reload: replace the
    /// configuration wholesale and reset all transient state.
    pub fn on_settings_changed(&mut self, settings: Settings) -> Vec<Directive> {
        self.settings = settings;
        self.state.is_key_pressed = false;
        self.state.hover.cancel();
        self.state.selection.cancel();
        vec![
            Directive::HidePopup,
            Directive::CancelTimer(TimerKind::Hover),
            Directive::CancelTimer(TimerKind::Selection),
            Directive::ClearCache,
        ]
    }
}
