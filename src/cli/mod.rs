//! Terminal front end (Ratatui + Crossterm)
//! - Loads the goal store from the local key-value file
//! - Sets up terminal and runs the event loop

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::store::{FileKv, GoalStore};

pub mod input;
pub mod state;
pub mod ui;
pub mod util;

pub async fn run() -> Result<()> {
    let mut app = init_app().await?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key).await?;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.quit {
            break;
        }
    }

    disable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

pub async fn init_app() -> Result<state::App<FileKv>> {
    let store_path = std::env::var("SAVINGS_STORE_PATH")
        .unwrap_or_else(|_| "./savings_planner.json".to_string());

    let kv = FileKv::new(store_path);
    let store = GoalStore::load(kv).await?;

    Ok(state::App::new(store))
}
