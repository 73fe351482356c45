// パス: src/repl/mod.rs
// 役割: REPL module facade and re-exports
// 意図: Expose the loop, input sources, and history without leaking internals
// 関連ファイル: src/repl/cmd.rs, src/session.rs, src/bin/lua_console.rs
//! コンソールの対話部分を構成するモジュール群をまとめたファサード。
//!
//! - `cmd`: メインループと組み込みコマンドの振り分け
//! - `history`: 容量付きのコマンド履歴
//! - `line_editor`: 上限付きの 1 行入力
//! - `printer`: ユーザー向けの表示ロジック

pub mod cmd;
pub mod history;
pub mod line_editor;
pub mod printer;

pub use cmd::{
    dispatch_builtin, is_exit_command, trim_line, ConsoleSession, Dispatch, ExitReason, Flow,
};
pub use history::HistoryBuffer;
pub use line_editor::{stdin_line_source, LineSource, ReadOutcome, StreamReader};
pub use printer::{Printer, Tone};
