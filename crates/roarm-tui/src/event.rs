//! Event system: crossterm reader plus the three UI timers, running in a
//! background tokio task and delivered over an mpsc channel.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Events produced by the reader.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Terminal resized to (cols, rows).
    Resize(u16, u16),
    /// Redraw.
    Render,
    /// Check the link and sync control enablement.
    LinkPoll,
    /// Refresh the status bar.
    Status,
}

/// Timer periods for [`EventReader`].
#[derive(Debug, Clone, Copy)]
pub struct TickRates {
    pub render: Duration,
    pub link_poll: Duration,
    pub status: Duration,
}

/// Reads terminal events in a background task and sends them over a channel.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the background reader.
    pub fn new(rates: TickRates) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut event_stream = EventStream::new();
            let mut render_interval = tokio::time::interval(rates.render);
            let mut link_interval = tokio::time::interval(rates.link_poll);
            let mut status_interval = tokio::time::interval(rates.status);

            // Don't burst ticks after a slow dispatch
            render_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            link_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            status_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    () = task_cancel.cancelled() => break,

                    _ = link_interval.tick() => Event::LinkPoll,

                    _ = status_interval.tick() => Event::Status,

                    _ = render_interval.tick() => Event::Render,

                    Some(Ok(crossterm_event)) = event_stream.next() => {
                        match crossterm_event {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                Event::Key(key)
                            }
                            CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                            _ => continue,
                        }
                    }
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Next event, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
