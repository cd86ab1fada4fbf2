use std::io::{self, Stderr};
use std::thread::{self, ThreadId};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::debug;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Spinner frame rate for the loading indicator.
const TICK_RATE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    /// Only wakes the loop so the next frame uses the new size.
    Resize,
    Tick,
}

/// Merges terminal input and the animation tick into one channel.
pub struct Events {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    _tx: mpsc::UnboundedSender<AppEvent>,
}

impl Events {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let tx_input = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(next) = reader.next().await {
                let evt = match next {
                    Ok(evt) => evt,
                    Err(e) => {
                        debug!(error = %e, "terminal event read failed");
                        continue;
                    }
                };
                let app_event = match evt {
                    // Key release/repeat reports arrive on some terminals; only presses matter
                    Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
                    Event::Paste(text) => Some(AppEvent::Paste(text)),
                    Event::Resize(..) => Some(AppEvent::Resize),
                    _ => None,
                };

                if let Some(app_event) = app_event {
                    if tx_input.send(app_event).is_err() {
                        break;
                    }
                }
            }
        });

        let tx_tick = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_RATE);
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, _tx: tx }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(
        io::stderr(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(
        io::stderr(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
///
/// Must be called from the thread that drives the UI. Panics on other threads
/// (request tasks on runtime workers) are reported but leave the terminal alone,
/// since the event loop keeps running after them.
pub fn install_panic_hook() {
    let ui_thread = thread::current().id();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if owns_terminal(ui_thread) {
            let _ = restore();
        }
        original_hook(panic_info);
    }));
}

fn owns_terminal(ui_thread: ThreadId) -> bool {
    thread::current().id() == ui_thread
}
