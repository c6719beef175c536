//! Portal console - drives a portal session from stdin.
//!
//! ```text
//! stdin line -> parse_command() -> PortalSession::handle / on_wallet_changed
//!                                        |
//!                                        v
//!                               refresh_now() -> render(snapshot)
//! ```
//!
//! Quotes, gas, prices and balances come from in-process simulations priced
//! off the token list, so the console works offline.

mod commands;
mod render;
mod simulated;

use anyhow::{Context, Result};
use std::{
    fs::{self, File, OpenOptions},
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{Command, HELP, parse_command};
use portal_config::{PortalConfig, ResolvedConfig, TokenList, log_path_candidates};
use portal_engine::portal_core::{StableSet, StaticCatalog, WalletContext};
use portal_engine::{PortalSession, UserAction};
use portal_types::{Address, InputSide};
use render::render;

/// Address the console connects as.
fn console_wallet() -> Address {
    Address::repeat_byte(0xa1)
}

/// Opened log file plus the candidates that had to be skipped.
struct LogFile {
    path: PathBuf,
    file: File,
    skipped: Vec<String>,
}

fn open_log_file(candidates: &[PathBuf]) -> Option<LogFile> {
    let mut skipped = Vec::new();
    for path in candidates {
        let opened = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(path));
        match opened {
            Ok(file) => {
                return Some(LogFile {
                    path: path.clone(),
                    file,
                    skipped,
                });
            }
            Err(err) => skipped.push(format!("Cannot log to {}: {err}", path.display())),
        }
    }
    None
}

/// Records go to the first usable log file. Without one they are dropped so
/// they never land between console lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let Some(log) = open_log_file(&log_path_candidates()) else {
        registry.init();
        return;
    };
    registry
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log.file)))
        .init();
    tracing::info!(path = %log.path.display(), "Logging initialized");
    for reason in log.skipped {
        tracing::warn!("{reason}");
    }
}

fn load_config() -> ResolvedConfig {
    match PortalConfig::load() {
        Ok(config) => config.unwrap_or_default().resolve(),
        Err(err) => {
            tracing::warn!(path = %err.path().display(), %err, "Ignoring config");
            eprintln!("Warning: {err}; using defaults");
            ResolvedConfig::default()
        }
    }
}

fn load_token_list(config: &ResolvedConfig) -> Result<TokenList> {
    match &config.catalog_path {
        Some(path) => TokenList::load_from(path)
            .with_context(|| format!("loading token list {}", path.display())),
        None => TokenList::builtin().context("loading builtin token list"),
    }
}

/// Applies one command. Returns `false` when the console should exit.
async fn execute(
    session: &mut PortalSession,
    list: &TokenList,
    command: Command,
) -> Result<bool, String> {
    match command {
        Command::Quit => return Ok(false),
        Command::Empty => return Ok(true),
        Command::Help => {
            println!("{HELP}");
            return Ok(true);
        }
        Command::Show => {}
        Command::Action(action) => session.handle(action).map_err(|e| e.to_string())?,
        Command::Select { side, token } => {
            let id = token.resolve(list).map_err(|e| e.to_string())?;
            let action = match side {
                InputSide::Source => UserAction::SelectSource(id),
                InputSide::Destination => UserAction::SelectDestination(id),
            };
            session.handle(action).map_err(|e| e.to_string())?;
        }
        Command::Wallet(chain) => {
            let wallet = chain
                .map(|chain| WalletContext::connected(console_wallet(), chain))
                .unwrap_or_default();
            session.on_wallet_changed(wallet);
        }
    }

    if session.debouncer().is_armed() {
        session.refresh_now().await;
    }
    println!("{}", render(&session.snapshot()));
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config();
    let list = load_token_list(&config)?;
    let session = PortalSession::from_config(
        &config,
        Arc::new(StaticCatalog::from_list(&list)),
        Arc::new(StableSet::from_list(&list)),
        simulated::collaborators(&list),
    );
    let mut session = session.context("building the portal")?;

    println!("{}", render(&session.snapshot()));
    println!("type `help` for commands");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"portal> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let outcome = match parse_command(&line) {
            Ok(command) => execute(&mut session, &list, command).await,
            Err(err) => Err(err.to_string()),
        };
        match outcome {
            Ok(true) => {}
            Ok(false) => break,
            Err(message) => println!("error: {message}"),
        }
    }

    tracing::info!(
        generation = session.portal().generation().value(),
        "Console closed"
    );
    Ok(())
}
