use log::debug;

/// Popup rendering collaborator. The engine only decides text and position;
/// it never renders.
pub trait PopupDisplay: Send + Sync {
    fn show(&self, text: &str, x: f64, y: f64);

    fn hide(&self);
}

/// Popup that only logs, for the demo binary and for hosts without a renderer.
#[derive(Debug, Default)]
pub struct LogPopup;

impl PopupDisplay for LogPopup {
    fn show(&self, text: &str, x: f64, y: f64) {
        debug!("popup show at ({:.0}, {:.0}): {}", x, y, text);
        println!("[popup @ {:.0},{:.0}] {}", x, y, text);
    }

    fn hide(&self) {
        debug!("popup hide");
    }
}
