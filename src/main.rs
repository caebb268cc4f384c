//! Command-line driver for the read-aloud engine.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Read a text file into an in-memory content tree.
//! - Play it through a simulated speech engine, printing one JSON snapshot
//!   per command or engine event.

use anyhow::{Context, Result, anyhow};
use read_aloud::config::load_config;
use read_aloud::content::MemoryTree;
use read_aloud::session::{ReadAloudSession, SessionCommand, SessionEvent};
use read_aloud::speech::{SimulatedSynthesizer, SpeechSynthesizer};
use read_aloud::voice::Voice;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let (text_path, locale) = parse_args()?;
    let mut config = load_config(Path::new("conf/config.toml"));
    if let Some(locale) = locale {
        config.locale = locale;
    }
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %text_path.display(),
        locale = %config.locale,
        rate = config.speech_rate,
        granularity = ?config.highlight_granularity,
        "Starting read aloud"
    );

    let text = fs::read_to_string(&text_path)
        .with_context(|| format!("Failed to read {}", text_path.display()))?;
    let tree = MemoryTree::from_paragraphs(&text, &config.locale)
        .context("Failed to build content tree")?;
    let handles = tree.text_handles().to_vec();
    let locale = config.locale.clone();
    let mut session = ReadAloudSession::new(config, tree, &handles, simulated_voices())
        .context("Failed to start read-aloud session")?;
    let mut engine = SimulatedSynthesizer::new(&locale, true);

    let mut event = session.apply_command(SessionCommand::Play);
    loop {
        engine.apply(&event.effects);
        print_event(&event)?;
        let Some(next) = engine.next_event() else {
            break;
        };
        event = session.handle_speech_event(next);
    }

    let finished = session.apply_command(SessionCommand::GetSnapshot);
    print_event(&finished)?;
    info!(
        utterances = engine.spoken().len(),
        state = ?finished.snapshot.state,
        "Read aloud complete"
    );
    Ok(())
}

fn print_event(event: &SessionEvent) -> Result<()> {
    let line = serde_json::to_string(&serde_json::json!({
        "action": event.action,
        "snapshot": event.snapshot,
    }))
    .context("Failed to serialize snapshot")?;
    println!("{line}");
    Ok(())
}

fn simulated_voices() -> Vec<Voice> {
    vec![
        Voice::new("Simulated English", "en-US").with_default(true),
        Voice::new("Simulated British English", "en-GB"),
        Voice::new("Simulated French", "fr-FR"),
        Voice::new("Simulated German", "de-DE"),
        Voice::new("Simulated Greek", "el-GR"),
        Voice::new("Simulated Japanese", "ja-JP"),
    ]
}

fn parse_args() -> Result<(PathBuf, Option<String>)> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow!("Usage: read-aloud <text-file> [locale]"))?;

    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.as_path().display()));
    }
    Ok((path, args.next()))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
