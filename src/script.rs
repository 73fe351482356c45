// パス: src/script.rs
// 役割: Adapter translating engine results into displayable outcomes
// 意図: Keep engine failures inside the adapter so the loop never crashes
// 関連ファイル: src/engine.rs, src/repl/cmd.rs, src/session.rs
//! スクリプト実行アダプタ。
//!
//! エンジンのエラーはここで所有文字列へ変換され、エンジン側に未処理の値を残さない。

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::engine::ScriptEngine;
use crate::errors::{EngineError, ScriptError};

/// 対話入力に付けるチャンク名。
pub const CONSOLE_CHUNK: &str = "=console";

/// 1 行分のソースを即時評価する。
pub fn execute_source<E: ScriptEngine + ?Sized>(
    engine: &mut E,
    source: &[u8],
) -> Result<(), ScriptError> {
    engine.exec_chunk(source, CONSOLE_CHUNK).map_err(|err| {
        tracing::debug!(error = %err, "script failed");
        ScriptError::from(err)
    })
}

/// ファイルを読み込んで実行する。開けない場合はエンジンを呼ばずに `NotFound` を返す。
pub fn execute_file<E: ScriptEngine + ?Sized>(
    engine: &mut E,
    path: &Path,
) -> Result<(), ScriptError> {
    let mut file = File::open(path).map_err(|source| ScriptError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|err| ScriptError::from(EngineError::new(err.to_string())))?;
    let chunk_name = format!("@{}", path.display());
    engine.exec_chunk(&bytes, &chunk_name).map_err(|err| {
        tracing::debug!(error = %err, path = %path.display(), "script file failed");
        ScriptError::from(err)
    })
}
