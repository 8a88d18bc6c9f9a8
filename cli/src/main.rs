//! Binary entry point and terminal session management.
//!
//! The binary bridges [`backdesk_engine`] (state) and [`backdesk_tui`]
//! (rendering): a fixed-cadence loop drains keyboard input, advances the
//! app one tick, and redraws. Terminal state is managed RAII-style so
//! raw mode and the alternate screen are restored even on early returns.

use std::fs::{self, OpenOptions};
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use backdesk_engine::storage::data_dir;
use backdesk_engine::{App, BackdeskConfig};
use backdesk_tui::{draw, handle_key, Ui};

/// ~120 FPS; the spinner and OTP countdown want a steady cadence.
const FRAME_DURATION: Duration = Duration::from_millis(8);

/// Log to a file in the data directory. Writing to stdout or stderr
/// would corrupt the TUI, so when no file can be opened we log nowhere.
fn init_tracing(data_dir_override: Option<&std::path::Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    match open_log_file(data_dir_override) {
        Some((path, file)) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .with(env_filter)
                .init();
            tracing::info!(path = %path.display(), "logging initialized");
        }
        None => {
            tracing_subscriber::registry().with(env_filter).init();
        }
    }
}

fn open_log_file(data_dir_override: Option<&std::path::Path>) -> Option<(PathBuf, fs::File)> {
    let dir = data_dir(data_dir_override).join("logs");
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("backdesk.log");
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    Some((path, file))
}

/// RAII wrapper restoring raw mode and the alternate screen on drop.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }
        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                return Err(err.into());
            }
        };
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = BackdeskConfig::load()?.into_settings()?;
    init_tracing(settings.data_dir.as_deref());

    let mut app = App::new(settings)?;
    let mut ui = Ui::default();

    let mut session = TerminalSession::new()?;
    run(&mut session.terminal, &mut app, &mut ui).await
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    ui: &mut Ui,
) -> Result<()> {
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        frames.tick().await;

        // Drain the input queue without blocking the frame.
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                handle_key(app, ui, &key);
            }
        }
        if app.should_quit {
            return Ok(());
        }

        app.tick();
        terminal.draw(|frame| draw(frame, app, ui))?;
    }
}
