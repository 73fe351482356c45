// パス: tests/console_session.rs
// 役割: End-to-end sessions against the embedded Lua engine
// 意図: Verify loop ordering, error isolation, and init-script handling with real Lua
// 関連ファイル: src/session.rs, src/repl/cmd.rs, tests/test_support.rs
mod test_support;

use luaconsole::repl::ExitReason;
use luaconsole::InitStatus;
use test_support::{config_with_init, run_lua_session, run_lua_session_bytes, write_script};

#[test]
/// 初期化スクリプトで定義した関数を対話入力から呼べることを確認する。
fn init_script_definitions_are_available() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(
        dir.path(),
        "init.lua",
        "function greet(name) print('hello ' .. name) end\nready = true\n",
    );
    let (report, out) = run_lua_session(
        &config_with_init(&init),
        "assert(ready)\ngreet('console')\nexit\n",
    );
    assert_eq!(report.init, InitStatus::Loaded);
    assert_eq!(report.exit, ExitReason::Command);
    assert!(out.contains("initialized"));
    assert!(out.contains("Initialization complete"));
    assert!(!out.contains("Lua error"));
}

#[test]
/// スクリプトエラー後もセッションが続き、状態が保たれることを検証する。
fn runtime_error_does_not_end_session() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(dir.path(), "init.lua", "");
    let (report, out) = run_lua_session(
        &config_with_init(&init),
        "counter = 1\nerror('first failure')\nlocal = 1\ncounter = counter + 1\nassert(counter == 2, 'state lost')\nquit\n",
    );
    assert_eq!(report.exit, ExitReason::Command);
    assert!(out.contains("first failure"));
    assert_eq!(out.matches("Lua error:").count(), 2);
    assert!(!out.contains("state lost"));
}

#[test]
/// 実行時エラーはメッセージ 1 行だけが表示され、直後に次のプロンプトが続くことを確認する。
fn runtime_error_prints_single_line() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(dir.path(), "init.lua", "");
    let (_, out) = run_lua_session(&config_with_init(&init), "error('kaboom')\nexit\n");
    assert!(out.contains("Lua error: console:1: kaboom\nlua> "));
    assert!(!out.contains("stack traceback"));
}

#[test]
/// Latin-1 のバイトを含む対話入力が置換されずに Lua の文字列へ入ることを検証する。
fn latin1_input_reaches_lua_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(dir.path(), "init.lua", "");
    let (report, out) = run_lua_session_bytes(
        &config_with_init(&init),
        b"city = 'M\xFCnchen'\nassert(#city == 7 and city:byte(2) == 0xFC, 'bytes changed')\nq\n",
    );
    assert_eq!(report.exit, ExitReason::Command);
    assert!(!out.contains("Lua error"));
}

#[test]
/// `lua cls` は組み込みを迂回してエンジンへ渡り、未定義の名前としてエラーになることを確認する。
fn lua_prefix_routes_to_engine() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(dir.path(), "init.lua", "");
    let (_, out) = run_lua_session(&config_with_init(&init), "cls\nlua cls\nlua x = 5\nlua assert(x == 5)\n");
    assert!(out.contains("\x1b[2J"));
    assert_eq!(out.matches("Lua error:").count(), 1);
}

#[test]
/// 初期化スクリプトが無くても機能制限モードで起動することを検証する。
fn missing_init_script_starts_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("lua").join("init.lua");
    let (report, out) = run_lua_session(&config_with_init(&missing), "x = 1\n");
    assert_eq!(report.init, InitStatus::Missing);
    assert_eq!(report.exit, ExitReason::EndOfInput);
    assert!(report.is_clean());
    assert!(out.contains("Cannot find init script"));
    assert!(out.contains("You can still execute Lua commands manually."));
}

#[test]
/// 初期化スクリプトの構文エラーが報告され、REPL は続行することを確認する。
fn broken_init_script_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(dir.path(), "init.lua", "function broken(\n");
    let (report, out) = run_lua_session(&config_with_init(&init), "assert(1 + 1 == 2)\nq\n");
    assert_eq!(report.init, InitStatus::Failed);
    assert_eq!(report.exit, ExitReason::Command);
    assert!(out.contains("Failed to load"));
    assert!(out.contains("Console will start with limited functionality"));
    assert!(!out.contains("Lua error"));
}

#[test]
/// 履歴表示に終了コマンドが含まれず、連続重複が畳まれることを検証する。
fn history_listing_through_session() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(dir.path(), "init.lua", "");
    let (_, out) = run_lua_session(
        &config_with_init(&init),
        "a = 1\na = 1\nb = 2\nhistory\n",
    );
    assert!(out.contains("Command History:\n  1: a = 1\n  2: b = 2\n  3: history\n"));
}

#[test]
/// 長すぎる行はコマンドとして扱われず、次の行から再開することを確認する。
fn overlong_line_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let init = write_script(dir.path(), "init.lua", "");
    let mut config = config_with_init(&init);
    config.max_line_length = 16;
    let long = format!("x = '{}'", "z".repeat(40));
    let (_, out) = run_lua_session(&config, &format!("{}\nhistory\n", long));
    assert!(out.contains("Input too long! Maximum 15 characters."));
    assert!(out.contains("Command History:\n  1: history\n"));
    assert!(!out.contains("zzz"));
}

#[test]
/// 同梱の初期化スクリプトが読み込めて `help()` を提供することを確認する。
fn bundled_init_script_defines_help() {
    let init = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("lua/init.lua");
    let (report, out) = run_lua_session(
        &config_with_init(&init),
        "assert(type(help) == 'function')\nexit\n",
    );
    assert_eq!(report.init, InitStatus::Loaded);
    assert!(!out.contains("Lua error"));
}
