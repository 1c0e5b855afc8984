use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::core::dispatch::Dispatcher;
use crate::core::extract;
use crate::core::page::PageSurface;
use crate::core::popup::PopupDisplay;
use crate::core::trigger::{Directive, TimerKind, TriggerController};
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::Settings;
use crate::shared::types::{InputEvent, Point, Span, SpanOrigin};

/// Popup offset from the pointer for word-under-cursor spans. Selection spans
/// are anchored by the selection rect instead and get no offset.
pub const POINTER_OFFSET_X: f64 = 15.0;
pub const POINTER_OFFSET_Y: f64 = -10.0;

enum EngineEvent {
    Input(InputEvent),
    TimerFired {
        kind: TimerKind,
        generation: u64,
    },
    TranslationReady {
        seq: u64,
        outcome: AppResult<Option<String>>,
        anchor: Point,
        origin: SpanOrigin,
    },
    Shutdown,
}

/// Handle for feeding page events into a running engine. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineHandle {
    pub fn event(&self, event: InputEvent) {
        let _ = self.tx.send(EngineEvent::Input(event));
    }

    pub fn pointer_move(&self, x: f64, y: f64) {
        self.event(InputEvent::PointerMove { x, y });
    }

    pub fn pointer_leave(&self) {
        self.event(InputEvent::PointerLeave);
    }

    pub fn key_down(&self, mods: crate::shared::types::Modifiers) {
        self.event(InputEvent::KeyDown(mods));
    }

    pub fn key_up(&self, mods: crate::shared::types::Modifiers) {
        self.event(InputEvent::KeyUp(mods));
    }

    pub fn selection_changed(&self) {
        self.event(InputEvent::SelectionChanged);
    }

    pub fn settings_changed(&self, settings: Settings) {
        self.event(InputEvent::SettingsChanged(settings));
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(EngineEvent::Shutdown);
    }
}

/// Owns the trigger controller, the dispatcher and the collaborators, and runs
/// the single-threaded cooperative event loop: input events in, popup calls
/// out. Timer and network work happens on spawned tasks that post completion
/// events back into the loop.
pub struct Engine {
    controller: TriggerController,
    dispatcher: Arc<Dispatcher>,
    page: Arc<dyn PageSurface>,
    popup: Arc<dyn PopupDisplay>,
    tx: mpsc::UnboundedSender<EngineEvent>,
    rx: mpsc::UnboundedReceiver<EngineEvent>,
    settings_rx: Option<watch::Receiver<Settings>>,
    hover_task: Option<JoinHandle<()>>,
    selection_task: Option<JoinHandle<()>>,
    /// Sequence number of the newest evaluation; late-arriving translations
    /// for older evaluations are discarded instead of displayed.
    eval_seq: u64,
    last_translation_position: Point,
}

impl Engine {
    pub fn new(
        settings: Settings,
        dispatcher: Arc<Dispatcher>,
        page: Arc<dyn PageSurface>,
        popup: Arc<dyn PopupDisplay>,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = EngineHandle { tx: tx.clone() };
        let engine = Self {
            controller: TriggerController::new(settings),
            dispatcher,
            page,
            popup,
            tx,
            rx,
            settings_rx: None,
            hover_task: None,
            selection_task: None,
            eval_seq: 0,
            last_translation_position: Point::default(),
        };
        (engine, handle)
    }

    /// Subscribe to a settings store change feed; each update replaces the
    /// configuration wholesale and resets transient state.
    pub fn watch_settings(&mut self, rx: watch::Receiver<Settings>) {
        self.settings_rx = Some(rx);
    }

    /// Where the last fresh translation was shown.
    pub fn last_translation_position(&self) -> Point {
        self.last_translation_position
    }

    pub async fn run(mut self) {
        if let Some(mut settings_rx) = self.settings_rx.take() {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                while settings_rx.changed().await.is_ok() {
                    let settings = settings_rx.borrow_and_update().clone();
                    let event = EngineEvent::Input(InputEvent::SettingsChanged(settings));
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            });
        }

        while let Some(event) = self.rx.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }

        self.cancel_timer(TimerKind::Hover);
        self.cancel_timer(TimerKind::Selection);
        debug!("engine stopped");
    }

    fn handle_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Shutdown => return false,
            EngineEvent::Input(input) => {
                let directives = match input {
                    InputEvent::PointerMove { x, y } => self.controller.on_pointer_move(x, y),
                    InputEvent::PointerLeave => self.controller.on_pointer_leave(),
                    InputEvent::KeyDown(mods) => self.controller.on_key_down(mods),
                    InputEvent::KeyUp(mods) => self.controller.on_key_up(mods),
                    InputEvent::SelectionChanged => {
                        let has_selection = self
                            .page
                            .selection()
                            .map(|s| !s.text.trim().is_empty())
                            .unwrap_or(false);
                        self.controller.on_selection_change(has_selection)
                    }
                    InputEvent::SettingsChanged(settings) => {
                        debug!("settings replaced, resetting interaction state");
                        self.controller.on_settings_changed(settings)
                    }
                };
                self.apply(directives);
            }
            EngineEvent::TimerFired { kind, generation } => {
                let directives = self.controller.on_timer_fired(kind, generation);
                self.apply(directives);
            }
            EngineEvent::TranslationReady {
                seq,
                outcome,
                anchor,
                origin,
            } => self.on_translation_ready(seq, outcome, anchor, origin),
        }
        true
    }

    fn apply(&mut self, directives: Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::ArmTimer {
                    kind,
                    generation,
                    delay,
                } => self.arm_timer(kind, generation, delay),
                Directive::CancelTimer(kind) => self.cancel_timer(kind),
                Directive::HidePopup => self.popup.hide(),
                Directive::ClearCache => self.dispatcher.clear(),
                Directive::Evaluate { x, y, force } => self.evaluate(x, y, force),
                Directive::EvaluateSelection => {
                    // The selection's bounding rectangle substitutes for the
                    // pointer; a selection gone by expiry is a no-op.
                    if let Some(selection) = self.page.selection() {
                        self.evaluate(selection.rect.left, selection.rect.bottom, false);
                    }
                }
            }
        }
    }

    fn timer_slot(&mut self, kind: TimerKind) -> &mut Option<JoinHandle<()>> {
        match kind {
            TimerKind::Hover => &mut self.hover_task,
            TimerKind::Selection => &mut self.selection_task,
        }
    }

    fn arm_timer(&mut self, kind: TimerKind, generation: u64, delay: Duration) {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(EngineEvent::TimerFired { kind, generation });
        });
        if let Some(previous) = self.timer_slot(kind).replace(task) {
            previous.abort();
        }
    }

    fn cancel_timer(&mut self, kind: TimerKind) {
        if let Some(task) = self.timer_slot(kind).take() {
            task.abort();
        }
    }

    fn evaluate(&mut self, x: f64, y: f64, force: bool) {
        let settings = self.controller.settings().clone();
        if settings.press_to_translate && !self.controller.is_key_pressed() {
            self.popup.hide();
            return;
        }

        let Some(span) = extract::span_at(self.page.as_ref(), x, y) else {
            debug!("no text to translate at ({:.0}, {:.0})", x, y);
            self.popup.hide();
            return;
        };

        // Press mode repositions an existing translation on pointer movement
        // without re-querying; the raw anchor is used here, without the
        // pointer offset applied to fresh and cached results.
        if settings.press_to_translate && !force {
            if let Some(existing) = self.dispatcher.last_result() {
                self.popup.show(&existing, span.anchor.x, span.anchor.y);
                return;
            }
        }

        if let Some(hit) = self.dispatcher.cached(&span.text) {
            let at = offset_anchor(span.origin, span.anchor);
            self.popup.show(&hit, at.x, at.y);
            return;
        }

        self.eval_seq += 1;
        let seq = self.eval_seq;
        let dispatcher = Arc::clone(&self.dispatcher);
        let tx = self.tx.clone();
        let Span {
            text,
            origin,
            anchor,
        } = span;
        tokio::spawn(async move {
            let outcome = dispatcher.request_translation(&text, &settings).await;
            let _ = tx.send(EngineEvent::TranslationReady {
                seq,
                outcome,
                anchor,
                origin,
            });
        });
    }

    fn on_translation_ready(
        &mut self,
        seq: u64,
        outcome: AppResult<Option<String>>,
        anchor: Point,
        origin: SpanOrigin,
    ) {
        match outcome {
            Err(AppError::ContextInvalidated) => {
                warn!("backend context invalidated, reloading content surface");
                self.page.reload();
            }
            Err(err) => warn!("translation request failed: {}", err),
            Ok(None) => debug!("backend yielded no translation, popup stays hidden"),
            Ok(Some(translation)) => {
                if seq != self.eval_seq {
                    debug!("discarding stale translation result");
                    return;
                }
                if self.controller.settings().press_to_translate
                    && !self.controller.is_key_pressed()
                {
                    debug!("key released before result arrived, not showing");
                    return;
                }
                let at = offset_anchor(origin, anchor);
                self.last_translation_position = at;
                self.popup.show(&translation, at.x, at.y);
            }
        }
    }
}

fn offset_anchor(origin: SpanOrigin, anchor: Point) -> Point {
    match origin {
        SpanOrigin::Pointer => Point::new(anchor.x + POINTER_OFFSET_X, anchor.y + POINTER_OFFSET_Y),
        SpanOrigin::Selection => anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_applies_to_pointer_spans_only() {
        let anchor = Point::new(100.0, 50.0);
        assert_eq!(
            offset_anchor(SpanOrigin::Pointer, anchor),
            Point::new(115.0, 40.0)
        );
        assert_eq!(offset_anchor(SpanOrigin::Selection, anchor), anchor);
    }
}
