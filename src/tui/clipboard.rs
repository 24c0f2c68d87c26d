use anyhow::{anyhow, Result};
use std::sync::mpsc::{self, Sender};
use std::sync::OnceLock;
use std::time::Duration;

// How long a clipboard owner stays alive so managers on X11/Wayland can read it.
const HOLD: Duration = Duration::from_secs(2);

static WORKER: OnceLock<Sender<String>> = OnceLock::new();

fn worker() -> &'static Sender<String> {
    WORKER.get_or_init(|| {
        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                match arboard::Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(text) {
                            tracing::warn!(error = %e, "clipboard write failed");
                            continue;
                        }
                        std::thread::sleep(HOLD);
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });
        tx
    })
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    worker()
        .send(text.to_string())
        .map_err(|_| anyhow!("clipboard worker stopped"))
}

/// Shorten long paths for the status line.
pub fn abbreviate(path: &str, max: usize) -> String {
    let count = path.chars().count();
    if count <= max {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - max.saturating_sub(3)).collect();
    format!("...{tail}")
}
