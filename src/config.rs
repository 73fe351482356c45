// パス: src/config.rs
// 役割: Console settings with defaults, JSON loading, and validation
// 意図: Keep every tunable of the session in one explicit value
// 関連ファイル: src/session.rs, src/bin/lua_console.rs, src/repl/cmd.rs
//! コンソールの設定値。JSON ファイルから読み込み、CLI 引数で上書きされる。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;

/// 起動時に一度だけ読み込まれる初期化スクリプトの既定パス。
pub const DEFAULT_INIT_SCRIPT: &str = "lua/init.lua";
/// 履歴バッファの既定容量。
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
/// 1 行入力の既定上限（終端文字を除くバイト数は `max_line_length - 1` 未満）。
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;
/// 既定のプロンプト文字列。
pub const DEFAULT_PROMPT: &str = "lua> ";

/// 1 セッション分の設定。各フィールドは省略時に既定値を使う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    pub init_script: PathBuf,
    pub history_capacity: usize,
    pub max_line_length: usize,
    pub prompt: String,
    pub color: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            init_script: PathBuf::from(DEFAULT_INIT_SCRIPT),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            prompt: DEFAULT_PROMPT.to_string(),
            color: true,
        }
    }
}

impl ConsoleConfig {
    /// JSON 文字列から設定を構築し、検証まで行う。
    pub fn from_json_str(src: &str, origin: &Path) -> Result<Self, ConsoleError> {
        let config: Self =
            serde_json::from_str(src).map_err(|source| ConsoleError::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// JSON 設定ファイルを読み込む。
    pub fn from_json_file(path: &Path) -> Result<Self, ConsoleError> {
        let src = fs::read_to_string(path).map_err(|source| ConsoleError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&src, path)
    }

    /// 値の範囲を検証する。
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.history_capacity == 0 {
            return Err(ConsoleError::InvalidConfig(
                "history_capacity は 1 以上である必要があります".into(),
            ));
        }
        // 上限 1 では 1 文字も受け付けられない。
        if self.max_line_length < 2 {
            return Err(ConsoleError::InvalidConfig(
                "max_line_length は 2 以上である必要があります".into(),
            ));
        }
        Ok(())
    }
}
