// パス: src/repl/history.rs
// 役割: Bounded command history with consecutive-duplicate suppression
// 意図: Give the loop and the line editor one shared, explicit history value
// 関連ファイル: src/repl/cmd.rs, src/repl/line_editor.rs, src/repl/printer.rs
//! 容量付きのコマンド履歴。

use std::collections::VecDeque;

/// 受理したコマンドを挿入順に保持する履歴バッファ。
///
/// - 直前のエントリと同じコマンドは追加しない（古い重複は残す）。
/// - 容量に達したら最古のエントリを捨ててから追加する。
/// - `cursor` は上下キーによる履歴移動の位置で、追加のたびに末尾の次へ戻る。
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<String>,
    capacity: usize,
    cursor: usize,
}

impl HistoryBuffer {
    /// 容量 `capacity` の空バッファを作る。容量 0 は 1 として扱う。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// コマンドを記録する。空白のみ・直前と同一の入力は無視する。
    pub fn record(&mut self, command: &str) {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.entries.back().map(|s| s.as_str()) == Some(trimmed) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(trimmed.to_string());
        self.cursor = self.entries.len();
    }

    /// 1 始まりの番号付きで履歴を列挙する。
    pub fn list(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx + 1, entry.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 指定インデックス（0 始まり）のエントリ。
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|s| s.as_str())
    }

    /// 現在のカーソル位置。`len()` は「最新の次」を表す。
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// カーソルを最新エントリの次へ戻す。
    pub fn reset_cursor(&mut self) {
        self.cursor = self.entries.len();
    }

    /// 1 つ古いエントリへ移動する。最古で止まる。
    pub fn previous(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.get(self.cursor)
    }

    /// 1 つ新しいエントリへ移動する。最新を越えたら `None` を返す。
    pub fn next(&mut self) -> Option<&str> {
        if self.cursor >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.get(self.cursor)
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}
