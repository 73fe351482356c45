// パス: src/session.rs
// 役割: Session lifecycle, console worker thread, and the one-shot unload signal
// 意図: Create and destroy the engine exactly once around one REPL run
// 関連ファイル: src/repl/cmd.rs, src/engine.rs, src/bin/lua_console.rs
//! 1 セッションの開始から終了まで。
//!
//! 順序: エンジン生成 → 初期化スクリプト → REPL → エンジン破棄 → アンロード通知。
//! エンジン生成の失敗だけが致命的で、その場合は REPL に入らず後始末へ進む。

use std::io::{self, Write};
use std::path::Path;
use std::thread::{self, JoinHandle};

use crate::config::ConsoleConfig;
use crate::engine::{HostBridge, LuaEngine, ScriptEngine};
use crate::errors::{ConsoleError, EngineError, ScriptError};
use crate::repl::cmd::{ConsoleSession, ExitReason};
use crate::repl::line_editor::{stdin_line_source, LineSource};
use crate::repl::printer::Printer;
use crate::script::execute_file;

/// 初期化スクリプトの読み込み結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Loaded,
    /// ファイルが見つからなかった（機能制限モード）。
    Missing,
    /// スクリプトがエラーを送出した（機能制限モード）。
    Failed,
    /// エンジンが無いため試行しなかった。
    Skipped,
}

/// セッション終了時の要約。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub init: InitStatus,
    pub exit: ExitReason,
}

impl SessionReport {
    /// 利用者の操作（終了コマンドまたは入力終端）で終わったかどうか。
    pub fn is_clean(&self) -> bool {
        matches!(self.exit, ExitReason::Command | ExitReason::EndOfInput)
    }
}

/// 1 セッションを実行する。
///
/// `create_engine` はこのスレッド上で一度だけ呼ばれ、生成されたエンジンは戻る前に一度だけ破棄される。
pub fn run_session<E, F, S, W>(
    config: &ConsoleConfig,
    create_engine: F,
    input: S,
    out: W,
) -> SessionReport
where
    E: ScriptEngine,
    F: FnOnce() -> Result<E, EngineError>,
    S: LineSource,
    W: Write,
{
    let mut printer = Printer::new(out, config.color);
    tracing::info!(init_script = %config.init_script.display(), "console session starting");

    let mut engine = match create_engine() {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(error = %err, "script engine could not be created");
            let _ = printer.error(&format!("FATAL: Failed to create Lua state: {}", err));
            let _ = printer.info("Shutting down console...");
            let _ = printer.flush();
            return SessionReport {
                init: InitStatus::Skipped,
                exit: ExitReason::EngineUnavailable,
            };
        }
    };

    let _ = printer.info(&format!("{} initialized", engine.version()));
    let init = match load_init_script(&mut engine, &mut printer, &config.init_script) {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!(error = %e, "console output failed during init");
            InitStatus::Skipped
        }
    };

    let mut session = ConsoleSession::new(engine, input, printer, config);
    let exit = session.run().unwrap_or_else(|e| {
        tracing::error!(error = %e, "console output failed");
        ExitReason::OutputError
    });

    let (engine, input, mut printer) = session.into_parts();
    let _ = printer.info("Shutting down console...");
    drop(engine);
    drop(input);
    let _ = printer.flush();
    tracing::info!(?exit, ?init, "console session finished");
    SessionReport { init, exit }
}

/// 初期化スクリプトを実行する。失敗しても致命的ではなく、機能制限モードで続行する。
pub fn load_init_script<E, W>(
    engine: &mut E,
    printer: &mut Printer<W>,
    path: &Path,
) -> io::Result<InitStatus>
where
    E: ScriptEngine,
    W: Write,
{
    printer.info(&format!("Loading initialization script: {}", path.display()))?;
    let status = match execute_file(engine, path) {
        Ok(()) => {
            printer.success("\u{2713} Initialization complete\n")?;
            tracing::info!(path = %path.display(), "init script loaded");
            return Ok(InitStatus::Loaded);
        }
        Err(ScriptError::NotFound { source, .. }) => {
            tracing::warn!(path = %path.display(), error = %source, "init script not found");
            printer.error(&format!(
                "Error: Cannot find init script '{}'",
                path.display()
            ))?;
            printer.warn(
                "Make sure the lua/ directory is in the same location as the console executable.",
            )?;
            InitStatus::Missing
        }
        Err(ScriptError::Failed { message }) => {
            tracing::warn!(path = %path.display(), %message, "init script failed");
            printer.error(&format!("Failed to load {}: {}", path.display(), message))?;
            InitStatus::Failed
        }
    };
    printer.error("Failed to load initialization script")?;
    printer.warn("Console will start with limited functionality")?;
    printer.plain("You can still execute Lua commands manually.\n")?;
    Ok(status)
}

/// コンソールスレッドの終了を待つためのハンドル。
#[derive(Debug)]
pub struct ConsoleHandle {
    watcher: JoinHandle<()>,
}

impl ConsoleHandle {
    /// アンロード通知が発行されるまで待つ。
    pub fn join(self) -> thread::Result<()> {
        self.watcher.join()
    }

    pub fn is_finished(&self) -> bool {
        self.watcher.is_finished()
    }
}

/// 任意のセッション処理を専用スレッドで走らせ、終了後に別スレッドから `on_unload` を一度だけ呼ぶ。
///
/// `on_unload` はコンソールスレッドの join 後に呼ばれる。コンソールスレッドが panic した場合は `None`。
pub fn spawn_session<T, U>(task: T, on_unload: U) -> Result<ConsoleHandle, ConsoleError>
where
    T: FnOnce() -> SessionReport + Send + 'static,
    U: FnOnce(Option<SessionReport>) + Send + 'static,
{
    let watcher = thread::Builder::new()
        .name("lua-console-unload".into())
        .spawn(move || {
            let report = match thread::Builder::new()
                .name("lua-console".into())
                .spawn(task)
            {
                Ok(worker) => worker.join().ok(),
                Err(e) => {
                    tracing::error!(error = %e, "console thread could not be started");
                    None
                }
            };
            tracing::info!(clean = report.map(|r| r.is_clean()), "issuing unload signal");
            on_unload(report);
        })
        .map_err(ConsoleError::Spawn)?;
    Ok(ConsoleHandle { watcher })
}

/// 標準入出力と Lua を使うコンソールを起動する。
pub fn spawn_console<H, U>(
    config: ConsoleConfig,
    host: H,
    on_unload: U,
) -> Result<ConsoleHandle, ConsoleError>
where
    H: HostBridge + 'static,
    U: FnOnce(Option<SessionReport>) + Send + 'static,
{
    config.validate()?;
    spawn_session(
        move || {
            let input = stdin_line_source();
            let stdout = io::stdout();
            run_session(&config, || LuaEngine::with_host(&host), input, stdout.lock())
        },
        on_unload,
    )
}
