// パス: src/repl/printer.rs
// 役割: Colored console output for prompts, results, and the history listing
// 意図: Keep every user-facing message format in one place
// 関連ファイル: src/repl/cmd.rs, src/session.rs, src/repl/history.rs
//! コンソールへの表示を集約したモジュール。

use std::io::{self, Write};

use owo_colors::OwoColorize;

use super::history::HistoryBuffer;

/// 画面消去とカーソルの左上移動。
const CLEAR_SEQUENCE: &str = "\x1b[2J\x1b[1;1H";

/// メッセージの種類。色の選択にのみ使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Error,
    Success,
    Info,
    Warning,
}

/// 文字列に種類ごとの色を付ける。`color` が偽ならそのまま返す。
pub fn paint(tone: Tone, text: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match tone {
        Tone::Error => text.bright_red().to_string(),
        Tone::Success => text.bright_green().to_string(),
        Tone::Info => text.bright_blue().to_string(),
        Tone::Warning => text.bright_yellow().to_string(),
    }
}

/// コンソール出力先。色の有無を保持する。
pub struct Printer<W> {
    out: W,
    color: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// 種類付きの 1 行を書き出す。
    pub fn line(&mut self, tone: Tone, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", paint(tone, text, self.color))
    }

    /// 色を付けずに 1 行を書き出す。
    pub fn plain(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.line(Tone::Error, text)
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        self.line(Tone::Success, text)
    }

    pub fn info(&mut self, text: &str) -> io::Result<()> {
        self.line(Tone::Info, text)
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        self.line(Tone::Warning, text)
    }

    /// 改行なしでプロンプトを表示し、即座に反映させる。
    pub fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        write!(self.out, "{}", paint(Tone::Success, prompt, self.color))?;
        self.out.flush()
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.out.write_all(CLEAR_SEQUENCE.as_bytes())?;
        self.out.flush()
    }

    /// 履歴を `  1: cmd` 形式で一覧表示する。
    pub fn history(&mut self, history: &HistoryBuffer) -> io::Result<()> {
        self.info("Command History:")?;
        for (idx, entry) in history.list() {
            writeln!(self.out, "{:3}: {}", idx, entry)?;
        }
        Ok(())
    }

    /// 準備完了の案内を表示する。
    pub fn ready(&mut self) -> io::Result<()> {
        let c = self.color;
        writeln!(
            self.out,
            "{}Type {} for commands, {} to clear, {} to quit.\n",
            paint(Tone::Success, "Console ready. ", c),
            paint(Tone::Info, "help()", c),
            paint(Tone::Info, "cls", c),
            paint(Tone::Info, "exit", c),
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
