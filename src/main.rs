//! pgcell - browse, filter and edit PostgreSQL table rows in the terminal
//!
//! This is the main entry point for the pgcell application.
//! The actual logic is in the library modules for better testability.

use std::io::{self, Stdout};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    EventStream,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use pgcell::app::{App, AppEvent};
use pgcell::config::SslMode;
use pgcell::config::settings::{Settings, load_settings, load_settings_from};
use pgcell::db::postgres::PostgresConnector;
use pgcell::dispatch::perform;
use pgcell::logging::{self, LoggingConfig};
use pgcell::ui::render::render;
use pgcell::workbench::Workbench;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Browse, filter and edit PostgreSQL table rows
#[derive(Debug, Parser)]
#[command(name = "pgcell", version, about)]
struct Cli {
    /// Database host
    #[arg(long)]
    host: Option<String>,

    /// Database port
    #[arg(long)]
    port: Option<u16>,

    /// Database name
    #[arg(long)]
    dbname: Option<String>,

    /// Database user (whose tables are listed)
    #[arg(long)]
    user: Option<String>,

    /// TLS mode: disable, prefer or require
    #[arg(long)]
    sslmode: Option<SslMode>,

    /// Settings file (default: ~/.pgcell/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long)]
    no_log: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        let connection = &mut settings.connection;
        if let Some(host) = &self.host {
            connection.host = host.clone();
        }
        if let Some(port) = self.port {
            connection.port = port;
        }
        if let Some(dbname) = &self.dbname {
            connection.database = dbname.clone();
        }
        if let Some(user) = &self.user {
            connection.user = user.clone();
        }
        if let Some(sslmode) = self.sslmode {
            connection.ssl_mode = sslmode;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => load_settings().context("failed to load settings")?,
    };
    cli.apply(&mut settings);

    let logging_config = if cli.no_log {
        LoggingConfig::disabled()
    } else {
        LoggingConfig::from_settings(&settings.logging)
    };
    let _log_guard = logging::init(&logging_config).context("failed to initialize logging")?;

    let password = std::env::var("PGPASSWORD").unwrap_or_default();
    let prefill = settings.connection.to_parameters(password);

    let mut app = App::new(&settings, prefill);
    let mut workbench = Workbench::new(PostgresConnector);

    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;
    let res = run(&mut terminal, &mut app, &mut workbench).await;

    workbench.shutdown().await;
    restore_terminal(terminal).context("failed to restore terminal")?;

    if let Err(e) = &res {
        tracing::error!(error = %e, "exiting with error");
    }
    Ok(res?)
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    workbench: &mut Workbench<PostgresConnector>,
) -> pgcell::Result<()> {
    let mut events = EventStream::new();

    while app.running {
        terminal.draw(|frame| render(frame, app))?;

        let Some(event) = AppEvent::from_terminal(events.next().await)? else {
            continue;
        };

        let action = app.handle_event(event);
        perform(action, app, workbench).await;
    }
    Ok(())
}

fn init_terminal() -> pgcell::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        );
        default_hook(info);
    }));

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Tui) -> pgcell::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;
    Ok(())
}
