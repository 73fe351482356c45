// パス: src/bin/lua_console.rs
// 役割: Binary entrypoint that runs the console on its worker thread
// 意図: Offer a standalone executable with the same lifecycle a host would use
// 関連ファイル: src/session.rs, src/config.rs, src/logging.rs
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Parser;
use luaconsole::logging::{self, LogLevel};
use luaconsole::{spawn_console, ConsoleConfig, NoHost};

/// Interactive Lua console
#[derive(Parser, Debug)]
#[command(name = "lua-console")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Script executed once at startup
    #[arg(long, value_name = "FILE")]
    init_script: Option<PathBuf>,

    /// Number of commands kept in history
    #[arg(long, value_name = "N")]
    history_capacity: Option<usize>,

    /// Maximum accepted line length (terminator included)
    #[arg(long, value_name = "BYTES")]
    max_line_length: Option<usize>,

    /// Prompt text
    #[arg(long)]
    prompt: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase diagnostic logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// 設定ファイルを読み込み、CLI 引数で上書きする。
    fn into_config(self) -> Result<ConsoleConfig> {
        let mut config = match &self.config {
            Some(path) => ConsoleConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => ConsoleConfig::default(),
        };
        if let Some(path) = self.init_script {
            config.init_script = path;
        }
        if let Some(capacity) = self.history_capacity {
            config.history_capacity = capacity;
        }
        if let Some(max) = self.max_line_length {
            config.max_line_length = max;
        }
        if let Some(prompt) = self.prompt {
            config.prompt = prompt;
        }
        config.color = config.color && !self.no_color && io::stdout().is_terminal();
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init_with_level(LogLevel::from_verbosity(args.verbose));
    let config = args.into_config()?;

    let (unload_tx, unload_rx) = mpsc::channel();
    let handle = spawn_console(config, NoHost, move |report| {
        let _ = unload_tx.send(report);
    })
    .context("Failed to start console")?;

    let report = unload_rx
        .recv()
        .context("console finished without an unload signal")?;
    let _ = handle.join();

    Ok(match report {
        Some(report) if report.is_clean() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
