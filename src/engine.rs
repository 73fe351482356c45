// パス: src/engine.rs
// 役割: Scripting engine seam and the mlua-backed Lua implementation
// 意図: Let the REPL drive any engine while production uses embedded Lua
// 関連ファイル: src/script.rs, src/session.rs, src/errors.rs
//! スクリプトエンジンの抽象と、mlua による Lua 実装。
//!
//! エンジンはコンソールスレッドが排他的に所有する。`Lua` は `Send` ではないため、
//! 生成はコンソールスレッド上でファクトリ経由で行う。

use mlua::{Lua, LuaOptions, StdLib, Table, Value, Variadic};

use crate::errors::EngineError;

/// ソースを 1 チャンクとして即時実行できるエンジン。
pub trait ScriptEngine {
    /// `source` を `chunk_name` という名前のチャンクとして実行する。
    ///
    /// ソースはバイト列のまま渡す。UTF-8 でない文字列リテラルもそのままエンジンに届く。
    fn exec_chunk(&mut self, source: &[u8], chunk_name: &str) -> Result<(), EngineError>;

    /// 起動時に表示するエンジン名とバージョン。
    fn version(&self) -> String;
}

impl<E: ScriptEngine + ?Sized> ScriptEngine for Box<E> {
    fn exec_chunk(&mut self, source: &[u8], chunk_name: &str) -> Result<(), EngineError> {
        (**self).exec_chunk(source, chunk_name)
    }

    fn version(&self) -> String {
        (**self).version()
    }
}

/// ホストプロセス固有の機能（メモリアクセスや関数呼び出しなど）を注入する口。
///
/// 実装はクレート外から与えられる。初期化スクリプトより前に一度だけ呼ばれる。
pub trait HostBridge: Send {
    fn install(&self, lua: &Lua) -> mlua::Result<()>;
}

/// 何も追加しないホスト。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl HostBridge for NoHost {
    fn install(&self, _lua: &Lua) -> mlua::Result<()> {
        Ok(())
    }
}

/// 組み込み Lua インタプリタ。
pub struct LuaEngine {
    lua: Lua,
}

impl LuaEngine {
    /// 標準ライブラリと `console` テーブルを読み込んだ状態を構築する。
    pub fn new() -> Result<Self, EngineError> {
        Self::with_host(&NoHost)
    }

    /// `host` の追加機能を組み込んだ状態を構築する。
    pub fn with_host(host: &dyn HostBridge) -> Result<Self, EngineError> {
        let lua = Lua::new_with(StdLib::ALL_SAFE, LuaOptions::default())?;
        install_console_library(&lua)?;
        host.install(&lua)?;
        tracing::debug!("lua state created");
        Ok(Self { lua })
    }

    /// 内部の `Lua` への参照。テストやホスト実装からの検査用。
    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}

impl ScriptEngine for LuaEngine {
    fn exec_chunk(&mut self, source: &[u8], chunk_name: &str) -> Result<(), EngineError> {
        self.lua
            .load(source)
            .set_name(chunk_name)
            .exec()
            .map_err(EngineError::from)
    }

    fn version(&self) -> String {
        self.lua
            .globals()
            .get::<_, String>("_VERSION")
            .unwrap_or_else(|_| "Lua".to_string())
    }
}

/// `console.version` と `console.log(...)` を登録する。
fn install_console_library(lua: &Lua) -> mlua::Result<()> {
    let console: Table = lua.create_table()?;
    console.set("version", env!("CARGO_PKG_VERSION"))?;

    let log_fn = lua.create_function(|_, args: Variadic<Value>| {
        let mut parts = Vec::with_capacity(args.len());
        for value in args.iter() {
            let text = match value {
                Value::Nil => "nil".to_string(),
                Value::Boolean(b) => b.to_string(),
                Value::Integer(i) => i.to_string(),
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.to_str()?.to_string(),
                other => format!("{:?}", other),
            };
            parts.push(text);
        }
        tracing::info!(target: "lua", "{}", parts.join("\t"));
        Ok(())
    })?;
    console.set("log", log_fn)?;

    lua.globals().set("console", console)
}
