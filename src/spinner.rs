//! A minimal terminal spinner for long model calls.

use std::io::Write;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::events::Event;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

/// A terminal spinner that runs in a background task.
///
/// Writes to stderr so report output on stdout stays clean. The label can
/// be changed while spinning with [`Spinner::set_message`].
pub struct Spinner {
    handle: JoinHandle<()>,
    message: watch::Sender<String>,
    cancel: watch::Sender<bool>,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let (message_tx, message_rx) = watch::channel(message.to_string());

        let handle = tokio::spawn(async move {
            let mut i = 0;
            loop {
                let frame = FRAMES[i % FRAMES.len()];
                let message = message_rx.borrow().clone();
                // \x1b[2K clears the line
                eprint!("\x1b[2K\r{frame} {message}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                }
                i += 1;
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            message: message_tx,
            cancel: cancel_tx,
        }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let _ = self.message.send(message.into());
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }
}

/// Spinner label for a research milestone, if it changes the label.
pub fn progress_label(event: &Event) -> Option<String> {
    match event {
        Event::Ranking { top_n } => Some(format!("ranking cases (top {top_n})")),
        Event::Ranked { case_ids } => Some(format!("{} cases selected", case_ids.len())),
        Event::Summarizing {
            index,
            total,
            case_id,
        } => Some(format!("summarizing {case_id} ({index}/{total})")),
        Event::Writing => Some("writing report".to_string()),
        Event::Skipped { .. } | Event::Finished => None,
    }
}
