// パス: src/repl/cmd.rs
// 役割: REPL loop, exit detection, and built-in command dispatch
// 意図: Drive one line at a time from input to the script engine
// 関連ファイル: src/script.rs, src/repl/history.rs, src/repl/printer.rs
//! コンソールの REPL ループと組み込みコマンドの振り分けを担当するモジュール。
//!
//! 1 回の反復は「読む → trim → 終了判定 → 履歴記録 → 組み込み判定 → 実行」の順で進む。
//! 終了コマンドは履歴記録より前に判定するため、履歴に残ることはない。

use std::io::{self, Write};

use crate::config::ConsoleConfig;
use crate::engine::ScriptEngine;
use crate::script::execute_source;

use super::history::HistoryBuffer;
use super::line_editor::{LineSource, ReadOutcome};
use super::printer::Printer;

/// セッションを終了させる入力。
pub const EXIT_COMMANDS: [&[u8]; 3] = [b"exit", b"quit", b"q"];

/// 明示的にスクリプトとして実行させるための接頭辞。
pub const SCRIPT_PREFIX: &[u8] = b"lua ";

/// trim 済みの入力が終了コマンドかどうか。
pub fn is_exit_command(command: &[u8]) -> bool {
    EXIT_COMMANDS.contains(&command)
}

/// 行の前後にある空白（C の `isspace` と同じ 6 種）を取り除く。
pub fn trim_line(line: &[u8]) -> &[u8] {
    let is_space = |b: &u8| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c);
    let start = line.iter().position(|b| !is_space(b)).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !is_space(b)).map_or(start, |pos| pos + 1);
    &line[start..end]
}

/// 組み込みコマンド判定の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// `cls` / `clear`
    Clear,
    /// `history`
    History,
    /// エンジンへ渡すソース。`lua ` 接頭辞は取り除かれている。
    PassThrough(&'a [u8]),
}

/// trim 済み・非空のコマンドを組み込みコマンドとスクリプトに振り分ける。
///
/// 完全一致の判定が先に行われるため、`lua cls` は画面消去ではなく `cls` というソースになる。
pub fn dispatch_builtin(command: &[u8]) -> Dispatch<'_> {
    match command {
        b"cls" | b"clear" => Dispatch::Clear,
        b"history" => Dispatch::History,
        _ => Dispatch::PassThrough(command.strip_prefix(SCRIPT_PREFIX).unwrap_or(command)),
    }
}

/// 1 行処理後にループを続けるかどうか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// ループが終了した理由。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` / `quit` / `q`
    Command,
    /// 入力ストリームが閉じられた。
    EndOfInput,
    /// 入力ストリームが回復不能なエラーを返した。
    InputError,
    /// コンソールへの書き込みに失敗した。
    OutputError,
    /// エンジンを生成できず、ループに入らなかった。
    EngineUnavailable,
}

/// 1 セッション分の REPL 状態。エンジン・入力源・出力・履歴をまとめて所有する。
pub struct ConsoleSession<E, S, W> {
    engine: E,
    input: S,
    printer: Printer<W>,
    history: HistoryBuffer,
    prompt: String,
    max_line_length: usize,
}

impl<E, S, W> ConsoleSession<E, S, W>
where
    E: ScriptEngine,
    S: LineSource,
    W: Write,
{
    pub fn new(engine: E, input: S, printer: Printer<W>, config: &ConsoleConfig) -> Self {
        Self {
            engine,
            input,
            printer,
            history: HistoryBuffer::new(config.history_capacity),
            prompt: config.prompt.clone(),
            max_line_length: config.max_line_length,
        }
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// セッションを分解する。エンジンの破棄は呼び出し側が一度だけ行う。
    pub fn into_parts(self) -> (E, S, Printer<W>) {
        (self.engine, self.input, self.printer)
    }

    /// 終了コマンドか入力終端まで REPL を回す。
    pub fn run(&mut self) -> io::Result<ExitReason> {
        self.printer.ready()?;
        loop {
            self.printer.prompt(&self.prompt)?;
            let outcome =
                self.input
                    .read_line(&self.prompt, self.max_line_length, &mut self.history);
            match outcome {
                Ok(ReadOutcome::Line(line)) => {
                    if self.process_line(&line)? == Flow::Exit {
                        self.printer.success("Goodbye!")?;
                        return Ok(ExitReason::Command);
                    }
                }
                Ok(ReadOutcome::TooLong) => {
                    self.printer.error(&format!(
                        "Input too long! Maximum {} characters.",
                        self.max_line_length.saturating_sub(1)
                    ))?;
                }
                Ok(ReadOutcome::Interrupted) => {
                    self.printer.warn("Input interrupted.")?;
                }
                Ok(ReadOutcome::Eof) => {
                    self.printer.warn("\nEnd of input reached. Exiting...")?;
                    return Ok(ExitReason::EndOfInput);
                }
                Err(e) => {
                    tracing::error!(error = %e, "console input failed");
                    self.printer.error(&format!("Input error: {}", e))?;
                    return Ok(ExitReason::InputError);
                }
            }
        }
    }

    /// 1 行分の入力を処理する。スクリプトの失敗は表示して継続する。
    ///
    /// 入力はバイト列のままエンジンへ渡す。履歴には表示用の文字列として残す。
    pub fn process_line(&mut self, line: &[u8]) -> io::Result<Flow> {
        let command = trim_line(line);
        if command.is_empty() {
            return Ok(Flow::Continue);
        }
        if is_exit_command(command) {
            return Ok(Flow::Exit);
        }

        self.history.record(&String::from_utf8_lossy(command));

        match dispatch_builtin(command) {
            Dispatch::Clear => self.printer.clear_screen()?,
            Dispatch::History => self.printer.history(&self.history)?,
            Dispatch::PassThrough(source) => {
                if let Err(err) = execute_source(&mut self.engine, source) {
                    self.printer.error(&format!("Lua error: {}", err))?;
                }
            }
        }
        Ok(Flow::Continue)
    }
}
