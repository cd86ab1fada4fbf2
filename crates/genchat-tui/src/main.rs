use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use genchat_core::{ChatSession, GenerateClient, Persona};
use tracing::info;

mod app;
mod config;
mod handler;
mod logging;
mod markdown;
mod theme;
mod tui;
mod ui;

use app::App;
use config::{Config, Settings};
use theme::Theme;
use tui::{Events, Tui};

#[derive(Parser)]
#[command(name = "genchat")]
#[command(version, about = "Terminal chat client for a generative AI endpoint")]
struct Cli {
    /// Base URL of the generation service
    #[arg(short, long, env = "GENCHAT_ENDPOINT")]
    endpoint: Option<String>,
    /// Persona sent with each question (assistant, expert, friend)
    #[arg(short, long)]
    persona: Option<Persona>,
    /// Color theme (light, dark, green)
    #[arg(short, long)]
    theme: Option<Theme>,
    /// Increase log detail (-v, -vv); logs go to the genchat log directory
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.verbose)?;

    let config = Config::load().context("loading config file")?;
    let settings = Settings::resolve(cli.endpoint, cli.persona, cli.theme, &config)?;
    info!(
        endpoint = %settings.endpoint,
        persona = %settings.persona,
        theme = %settings.theme,
        "starting genchat"
    );

    let client = GenerateClient::new(&settings.endpoint);
    let session = ChatSession::new(Arc::new(client)).with_persona(settings.persona);
    let mut app = App::new(session, settings.theme, settings.endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init().context("initializing terminal")?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = Events::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            settled = app.session.settle(), if app.session.is_pending() => {
                if let Some(exchange) = settled {
                    app.on_settled(&exchange);
                }
            }
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event),
                None => break,
            },
        }
    }

    Ok(())
}
