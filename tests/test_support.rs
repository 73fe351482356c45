// パス: tests/test_support.rs
// 役割: 統合テスト共通の補助関数を提供する
// 意図: 実 Lua エンジンでのセッション実行と出力取得を一元化する
// 関連ファイル: tests/console_session.rs, tests/history_buffer.rs, tests/line_input.rs
#![allow(dead_code)]
use std::io::Cursor;
use std::path::{Path, PathBuf};

use luaconsole::repl::StreamReader;
use luaconsole::{run_session, ConsoleConfig, LuaEngine, SessionReport};

/// テスト用の設定（色なし、指定の初期化スクリプト）。
pub fn config_with_init(init_script: impl Into<PathBuf>) -> ConsoleConfig {
    ConsoleConfig {
        init_script: init_script.into(),
        color: false,
        ..ConsoleConfig::default()
    }
}

/// バイト列入力から読み取る入力源を作る。
pub fn scripted_input(input: &[u8]) -> StreamReader<Cursor<Vec<u8>>> {
    StreamReader::new(Cursor::new(input.to_vec()))
}

/// 実 Lua エンジンで 1 セッションを走らせ、要約と出力全文を返す。
pub fn run_lua_session(config: &ConsoleConfig, input: &str) -> (SessionReport, String) {
    run_lua_session_bytes(config, input.as_bytes())
}

/// UTF-8 に限らない入力で 1 セッションを走らせる。
pub fn run_lua_session_bytes(config: &ConsoleConfig, input: &[u8]) -> (SessionReport, String) {
    let mut out = Vec::new();
    let report = run_session(config, LuaEngine::new, scripted_input(input), &mut out);
    (report, String::from_utf8_lossy(&out).into_owned())
}

/// 初期化スクリプトを一時ディレクトリへ書き出し、そのパスを返す。
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script fixture");
    path
}
