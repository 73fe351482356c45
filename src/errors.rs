//! エラー型の定義（エンジン / スクリプト実行 / コンソール全体）。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// エンジンがメッセージを返さなかった場合に表示する固定文言。
pub const UNKNOWN_ERROR: &str = "(unknown error)";

/// スクリプトエンジン内部で発生した失敗。メッセージは任意。
#[derive(Debug, Clone, Error)]
#[error("{}", .message.as_deref().unwrap_or(UNKNOWN_ERROR))]
pub struct EngineError {
    message: Option<String>,
}

impl EngineError {
    /// メッセージ付きのエラーを構築する。空白のみのメッセージは「無し」として扱う。
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::unknown()
        } else {
            Self {
                message: Some(message),
            }
        }
    }

    /// メッセージを持たないエラーを構築する。
    pub fn unknown() -> Self {
        Self { message: None }
    }

    /// 表示用メッセージ。無ければプレースホルダを返す。
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(UNKNOWN_ERROR)
    }

    pub fn has_message(&self) -> bool {
        self.message.is_some()
    }
}

impl From<mlua::Error> for EngineError {
    fn from(err: mlua::Error) -> Self {
        match describe_lua_error(&err) {
            Some(message) => Self::new(message),
            None => Self::unknown(),
        }
    }
}

/// mlua が実行時エラーの本文に付け足すトレースバックの見出し。
const TRACEBACK_MARKER: &str = "\nstack traceback:";

/// mlua のエラーから人間向けの本文を取り出す。コールバック由来のものは原因まで辿る。
///
/// 表示するのはエラー値そのものだけで、トレースバックは落とす。
fn describe_lua_error(err: &mlua::Error) -> Option<String> {
    let text = match err {
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::RuntimeError(message) | mlua::Error::MemoryError(message) => message.clone(),
        mlua::Error::CallbackError { cause, .. } => return describe_lua_error(cause),
        other => other.to_string(),
    };
    let body = match text.find(TRACEBACK_MARKER) {
        Some(pos) => &text[..pos],
        None => text.as_str(),
    };
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// スクリプト実行アダプタが返すエラー。セッションを終了させることはない。
#[derive(Debug, Error)]
pub enum ScriptError {
    /// ファイルを開けなかった。エンジンは呼ばれていない。
    #[error("file not found: {}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// エンジンが構文エラーまたは実行時エラーを報告した。
    #[error("{message}")]
    Failed { message: String },
}

impl From<EngineError> for ScriptError {
    fn from(err: EngineError) -> Self {
        ScriptError::Failed {
            message: err.message().to_string(),
        }
    }
}

/// コンソール全体（設定・I/O・エンジン生成）で発生しうるエラー種別。
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("設定ファイルを読み込めません: {} ({source})", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("設定ファイルの形式が不正です: {} ({source})", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("設定値が不正です: {0}")]
    InvalidConfig(String),
    #[error("Failed to create Lua state: {0}")]
    Engine(#[from] EngineError),
    #[error("コンソールスレッドを起動できません: {0}")]
    Spawn(#[source] io::Error),
}
