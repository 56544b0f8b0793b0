mod app;
mod input;
mod message;
mod ui;
mod watcher;

use crate::config::WatchConfig;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};

pub use app::{App, Prompt, PromptKind, FILTER_CYCLE};
pub use input::{dispatch, InputState};
pub use message::Message;
pub use watcher::IssueWatcher;

pub fn run(mut app: App, watch: &WatchConfig) -> Result<()> {
    if !std::io::IsTerminal::is_terminal(&io::stdout()) {
        anyhow::bail!("canopy requires an interactive terminal (use --print for plain output)");
    }

    let watcher = if watch.enabled {
        match IssueWatcher::new(app.issues_path(), Duration::from_millis(watch.poll_interval_ms)) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!("File watching disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let result = run_app(&mut terminal, &mut app, watcher.as_ref());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&IssueWatcher>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut input_state = InputState::new();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            match event::read()? {
                Event::Resize(width, height) => app.resize(width, height),
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let msg = dispatch(app, &mut input_state, key);
                    if app.update(msg)? {
                        return Ok(()); // Quit requested
                    }
                }
                _ => {}
            }
        }

        // Handle pending chord timeout (non-blocking)
        if input_state.has_timed_out() {
            input_state.clear();
        }

        if last_tick.elapsed() >= tick_rate {
            if watcher.is_some_and(IssueWatcher::poll) {
                app.update(Message::Reload)?;
            }
            last_tick = Instant::now();
        }
    }
}
