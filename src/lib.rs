// パス: src/lib.rs
// 役割: Crate root wiring modules and exports
// 意図: Expose the session entry points and the seams used by hosts and tests
// 関連ファイル: src/session.rs, src/repl/mod.rs, src/engine.rs
//! 対話型 Lua コンソール
//!
//! 目的:
//! - ホストプロセス内の専用スレッドで Lua の REPL を提供する。
//! - 入力・履歴・組み込みコマンド・スクリプト実行を小さな部品に分け、個別にテストできるようにする。
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - グローバル状態は持たず、セッションが履歴とエンジンを所有する。
//! - ホスト固有の機能（メモリアクセス等）は `HostBridge` 経由で外から注入する。
#![allow(unexpected_cfgs)]
#![cfg_attr(coverage, feature(coverage_attribute))]

pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod repl;
pub mod script;
pub mod session;

pub use crate::config::ConsoleConfig;
pub use crate::engine::{HostBridge, LuaEngine, NoHost, ScriptEngine};
pub use crate::errors::*;
pub use crate::session::{
    run_session, spawn_console, spawn_session, ConsoleHandle, InitStatus, SessionReport,
};
