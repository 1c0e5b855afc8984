//! Interactive demo: a one-line simulated page driven from stdin, translated
//! through the real Google endpoint.
//!
//! Commands: `move <x> <y>`, `leave`, `down`, `up`, `select <text>`, `clearsel`,
//! `hover`, `press`, `quit`. The page lays its sample text out at 8px per
//! character, so `move 40 10` points at the sixth character.

use std::sync::{Arc, Mutex};

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use hover_translate::core::page::{PageSurface, SelectionInfo, TextHit};
use hover_translate::core::popup::LogPopup;
use hover_translate::shared::types::{Modifiers, Rect};
use hover_translate::{
    AppResult, Dispatcher, Engine, EngineHandle, GoogleTranslateBackend, JsonFileStore, Settings,
    SettingsStore,
};

const CHAR_WIDTH: f64 = 8.0;
const SAMPLE_TEXT: &str = "bonjour le monde, guten Tag und hello-world";

struct SimPage {
    text: String,
    selection: Mutex<Option<String>>,
}

impl SimPage {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            selection: Mutex::new(None),
        }
    }

    fn set_selection(&self, text: Option<String>) {
        *self.selection.lock().unwrap_or_else(|p| p.into_inner()) = text;
    }
}

impl PageSurface for SimPage {
    fn selection(&self) -> Option<SelectionInfo> {
        let selection = self.selection.lock().unwrap_or_else(|p| p.into_inner());
        selection.as_ref().map(|text| SelectionInfo {
            text: text.clone(),
            rect: Rect {
                left: 0.0,
                top: 0.0,
                right: text.chars().count() as f64 * CHAR_WIDTH,
                bottom: 16.0,
            },
        })
    }

    fn hit_test(&self, x: f64, y: f64) -> Option<TextHit> {
        if !(0.0..=16.0).contains(&y) || x < 0.0 {
            return None;
        }
        let char_index = (x / CHAR_WIDTH) as usize;
        let offset = self
            .text
            .char_indices()
            .nth(char_index)
            .map(|(byte, _)| byte)?;
        Some(TextHit {
            text: self.text.clone(),
            offset,
        })
    }

    fn reload(&self) {
        info!("page reload requested");
    }
}

fn alt() -> Modifiers {
    Modifiers {
        alt: true,
        ..Modifiers::NONE
    }
}

fn handle_command(line: &str, handle: &EngineHandle, page: &SimPage) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("move") => {
            let x: f64 = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0.0);
            let y: f64 = parts.next().and_then(|v| v.parse().ok()).unwrap_or(8.0);
            handle.pointer_move(x, y);
        }
        Some("leave") => handle.pointer_leave(),
        Some("down") => handle.key_down(alt()),
        Some("up") => handle.key_up(alt()),
        Some("select") => {
            let text = parts.collect::<Vec<_>>().join(" ");
            page.set_selection(Some(text));
            handle.selection_changed();
        }
        Some("clearsel") => {
            page.set_selection(None);
            handle.selection_changed();
        }
        Some("hover") => handle.settings_changed(Settings {
            press_to_translate: false,
            ..Settings::default()
        }),
        Some("press") => handle.settings_changed(Settings::default()),
        Some("quit") => {
            handle.shutdown();
            return false;
        }
        Some(other) => println!("unknown command: {}", other),
        None => {}
    }
    true
}

#[tokio::main]
async fn main() -> AppResult<()> {
    env_logger::init();

    let store = match JsonFileStore::new() {
        Ok(store) => Some(store),
        Err(err) => {
            warn!("no config directory, using defaults: {}", err);
            None
        }
    };
    let settings = match &store {
        Some(store) => match store.load().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!("failed to load settings, using defaults: {}", err);
                Settings::default()
            }
        },
        None => Settings::default(),
    };

    let backend = Arc::new(GoogleTranslateBackend::new()?);
    let dispatcher = Arc::new(Dispatcher::new(backend));
    let page = Arc::new(SimPage::new(SAMPLE_TEXT));
    let popup = Arc::new(LogPopup);

    let (mut engine, handle) = Engine::new(settings, dispatcher, page.clone(), popup);
    if let Some(store) = &store {
        engine.watch_settings(store.subscribe());
    }
    let engine_task = tokio::spawn(engine.run());

    println!("page text: {:?}", SAMPLE_TEXT);
    println!("commands: move <x> <y> | leave | down | up | select <text> | clearsel | hover | press | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !handle_command(line.trim(), &handle, &page) {
            break;
        }
    }

    handle.shutdown();
    let _ = engine_task.await;
    Ok(())
}
