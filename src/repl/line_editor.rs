// パス: src/repl/line_editor.rs
// 役割: Bounded line input from streams and an interactive raw-mode editor
// 意図: Enforce the per-line length limit and resynchronise on overflow
// 関連ファイル: src/repl/cmd.rs, src/repl/history.rs, src/session.rs
use std::io::{self, BufRead, IsTerminal};

use super::history::HistoryBuffer;

/// 1 行読み取りの結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// 終端文字を含まない 1 行。入力のバイト列をそのまま保持する。
    Line(Vec<u8>),
    /// 上限に達した行。物理行の残りは読み捨て済み。
    TooLong,
    /// 読み取りが割り込まれた（Ctrl-C など）。
    Interrupted,
    /// 入力ストリームが閉じられた。
    Eof,
}

/// REPL が 1 行ずつ入力を受け取るための抽象。
pub trait LineSource {
    /// 1 行を読み取る。`prompt` は表示済みのプロンプト本文で、再描画の桁計算にのみ使う。
    ///
    /// 終端文字より前の入力が `max_length - 1` バイトに達した行は `TooLong` になる。
    fn read_line(
        &mut self,
        prompt: &str,
        max_length: usize,
        history: &mut HistoryBuffer,
    ) -> io::Result<ReadOutcome>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(
        &mut self,
        prompt: &str,
        max_length: usize,
        history: &mut HistoryBuffer,
    ) -> io::Result<ReadOutcome> {
        (**self).read_line(prompt, max_length, history)
    }
}

/// 標準入力に適した入力源を選ぶ。端末なら行編集、そうでなければストリーム読み取り。
pub fn stdin_line_source() -> Box<dyn LineSource> {
    let stdin = io::stdin();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        if stdin.is_terminal() {
            return Box::new(LineEditor::new());
        }
    }
    tracing::debug!(terminal = stdin.is_terminal(), "using buffered stdin reader");
    Box::new(StreamReader::new(stdin.lock()))
}

/// `BufRead` から行を読む入力源。行の保存量は上限で打ち切る。
pub struct StreamReader<R> {
    reader: R,
}

impl<R: BufRead> StreamReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_bounded(&mut self, max_length: usize) -> io::Result<ReadOutcome> {
        let limit = max_length.saturating_sub(1);
        let mut line: Vec<u8> = Vec::new();
        let mut saw_input = false;
        loop {
            let (terminated, used) = {
                let available = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                        if line.is_empty() {
                            return Ok(ReadOutcome::Interrupted);
                        }
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if available.is_empty() {
                    if !saw_input {
                        return Ok(ReadOutcome::Eof);
                    }
                    // 終端文字の無い最終行。
                    return Ok(classify(line, limit));
                }
                saw_input = true;
                match available.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        line.extend_from_slice(&available[..pos]);
                        (true, pos + 1)
                    }
                    None => {
                        line.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };
            self.reader.consume(used);
            if terminated {
                return Ok(classify(line, limit));
            }
            // 末尾の '\r' を除いても上限に届くので、残りを捨てて打ち切る。
            if line.len() > limit {
                self.discard_rest_of_line()?;
                return Ok(ReadOutcome::TooLong);
            }
        }
    }

    /// 次の改行（または EOF）まで読み捨てる。
    fn discard_rest_of_line(&mut self) -> io::Result<()> {
        loop {
            let (found, used) = {
                let available = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if available.is_empty() {
                    return Ok(());
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(pos) => (true, pos + 1),
                    None => (false, available.len()),
                }
            };
            self.reader.consume(used);
            if found {
                return Ok(());
            }
        }
    }
}

/// 読み取ったバイト列を行または上限超過に分類する。
///
/// CRLF の '\r' は終端文字の一部として扱い、長さに数えない。
fn classify(mut line: Vec<u8>, limit: usize) -> ReadOutcome {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    if line.len() >= limit {
        return ReadOutcome::TooLong;
    }
    ReadOutcome::Line(line)
}

impl<R: BufRead> LineSource for StreamReader<R> {
    fn read_line(
        &mut self,
        _prompt: &str,
        max_length: usize,
        _history: &mut HistoryBuffer,
    ) -> io::Result<ReadOutcome> {
        self.read_bounded(max_length)
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use raw::LineEditor;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod raw {
    use std::io::{self, Read, Write};

    use super::{LineSource, ReadOutcome};
    use crate::repl::history::HistoryBuffer;

    /// 端末を Raw モードにして 1 行を編集する対話用入力源。
    #[derive(Debug, Default)]
    pub struct LineEditor;

    impl LineEditor {
        pub fn new() -> Self {
            Self
        }
    }

    impl LineSource for LineEditor {
        #[allow(unexpected_cfgs)]
        #[cfg_attr(coverage, coverage(off))]
        fn read_line(
            &mut self,
            prompt: &str,
            max_length: usize,
            history: &mut HistoryBuffer,
        ) -> io::Result<ReadOutcome> {
            let _raw = RawMode::new()?;
            let mut stdout = io::stdout();
            let stdin = io::stdin();
            let mut stdin = stdin.lock();
            let width = prompt.chars().count();
            let mut session = EditorSession::new(history, max_length);
            loop {
                let mut byte = [0u8; 1];
                if stdin.read(&mut byte)? == 0 {
                    return Ok(ReadOutcome::Eof);
                }
                match interpret_action(byte[0], &mut stdin)? {
                    EditAction::Submit => {
                        write!(stdout, "\r\n")?;
                        stdout.flush()?;
                        return Ok(session.finish());
                    }
                    EditAction::Interrupt => {
                        write!(stdout, "^C\r\n")?;
                        stdout.flush()?;
                        return Ok(ReadOutcome::Interrupted);
                    }
                    EditAction::Eof => {
                        if session.is_empty() {
                            write!(stdout, "\r\n")?;
                            stdout.flush()?;
                            return Ok(ReadOutcome::Eof);
                        }
                    }
                    action => {
                        if session.apply(action) {
                            refresh_line(&mut stdout, width, session.buffer(), session.cursor())?;
                        }
                    }
                }
            }
        }
    }

    /// 先頭バイトと後続バイトから UTF-8 の 1 文字を復元する。
    pub(super) fn read_utf8_char<R: Read>(first: u8, reader: &mut R) -> io::Result<Option<char>> {
        let width = match first {
            0x00..=0x7f => 1,
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return Ok(None),
        };
        let mut buf = [0u8; 4];
        buf[0] = first;
        for idx in 1..width {
            reader.read_exact(&mut buf[idx..idx + 1])?;
        }
        match std::str::from_utf8(&buf[..width]) {
            Ok(s) => Ok(s.chars().next()),
            Err(_) => Ok(None),
        }
    }

    /// 読み取った制御シーケンスを内部の編集操作へ写像する。
    pub(super) fn interpret_action<R: Read>(first: u8, reader: &mut R) -> io::Result<EditAction> {
        match first {
            b'\n' | b'\r' => Ok(EditAction::Submit),
            0x01 => Ok(EditAction::Home),
            0x03 => Ok(EditAction::Interrupt),
            0x04 => Ok(EditAction::Eof),
            0x05 => Ok(EditAction::End),
            0x15 => Ok(EditAction::ClearLine),
            0x7f | 0x08 => Ok(EditAction::DeleteLeft),
            0x1b => {
                let mut seq = [0u8; 2];
                if reader.read_exact(&mut seq[..1]).is_err() || seq[0] != b'[' {
                    return Ok(EditAction::Ignore);
                }
                if reader.read_exact(&mut seq[1..2]).is_err() {
                    return Ok(EditAction::Ignore);
                }
                Ok(match seq[1] {
                    b'A' => EditAction::HistoryPrev,
                    b'B' => EditAction::HistoryNext,
                    b'C' => EditAction::MoveRight,
                    b'D' => EditAction::MoveLeft,
                    b'H' => EditAction::Home,
                    b'F' => EditAction::End,
                    _ => EditAction::Ignore,
                })
            }
            _ => match read_utf8_char(first, reader)? {
                Some(ch) if !ch.is_control() => Ok(EditAction::InsertChar(ch)),
                _ => Ok(EditAction::Ignore),
            },
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum EditAction {
        Submit,
        Interrupt,
        Eof,
        DeleteLeft,
        ClearLine,
        MoveLeft,
        MoveRight,
        Home,
        End,
        HistoryPrev,
        HistoryNext,
        InsertChar(char),
        Ignore,
    }

    /// 1 回の `read_line` の間だけ生きる編集状態。
    pub(super) struct EditorSession<'a> {
        buffer: Vec<char>,
        cursor: usize,
        limit: usize,
        overflow: bool,
        saved_current: Option<Vec<char>>,
        history: &'a mut HistoryBuffer,
    }

    impl<'a> EditorSession<'a> {
        pub(super) fn new(history: &'a mut HistoryBuffer, max_length: usize) -> Self {
            history.reset_cursor();
            Self {
                buffer: Vec::new(),
                cursor: 0,
                limit: max_length.saturating_sub(1),
                overflow: false,
                saved_current: None,
                history,
            }
        }

        pub(super) fn buffer(&self) -> &[char] {
            &self.buffer
        }

        pub(super) fn cursor(&self) -> usize {
            self.cursor
        }

        pub(super) fn is_empty(&self) -> bool {
            self.buffer.is_empty()
        }

        fn byte_len(&self) -> usize {
            self.buffer.iter().map(|c| c.len_utf8()).sum()
        }

        /// 編集操作を適用し、再描画が必要なら `true` を返す。
        pub(super) fn apply(&mut self, action: EditAction) -> bool {
            match action {
                EditAction::InsertChar(ch) => self.insert_char(ch),
                EditAction::DeleteLeft => self.delete_left(),
                EditAction::ClearLine => self.clear(),
                EditAction::MoveLeft => self.move_to(self.cursor.checked_sub(1)),
                EditAction::MoveRight => self.move_to(Some(self.cursor + 1)),
                EditAction::Home => self.move_to(Some(0)),
                EditAction::End => self.move_to(Some(self.buffer.len())),
                EditAction::HistoryPrev => self.history_prev(),
                EditAction::HistoryNext => self.history_next(),
                EditAction::Submit
                | EditAction::Interrupt
                | EditAction::Eof
                | EditAction::Ignore => false,
            }
        }

        fn insert_char(&mut self, ch: char) -> bool {
            // 上限に達した行は送信時に TooLong として捨てる。
            if self.overflow {
                return false;
            }
            self.buffer.insert(self.cursor, ch);
            self.cursor += 1;
            if self.byte_len() >= self.limit {
                self.overflow = true;
            }
            true
        }

        fn delete_left(&mut self) -> bool {
            if self.cursor == 0 {
                return false;
            }
            self.cursor -= 1;
            self.buffer.remove(self.cursor);
            self.overflow = self.byte_len() >= self.limit;
            true
        }

        fn clear(&mut self) -> bool {
            if self.buffer.is_empty() {
                return false;
            }
            self.buffer.clear();
            self.cursor = 0;
            self.overflow = false;
            true
        }

        fn move_to(&mut self, target: Option<usize>) -> bool {
            match target {
                Some(pos) if pos <= self.buffer.len() && pos != self.cursor => {
                    self.cursor = pos;
                    true
                }
                _ => false,
            }
        }

        fn history_prev(&mut self) -> bool {
            let at_end = self.history.cursor() == self.history.len();
            let Some(entry) = self.history.previous().map(|s| s.chars().collect::<Vec<_>>())
            else {
                return false;
            };
            if at_end {
                self.saved_current = Some(std::mem::take(&mut self.buffer));
            }
            self.replace_buffer(entry);
            true
        }

        fn history_next(&mut self) -> bool {
            if self.history.cursor() >= self.history.len() {
                return false;
            }
            let entry = match self.history.next() {
                Some(s) => s.chars().collect(),
                None => self.saved_current.take().unwrap_or_default(),
            };
            self.replace_buffer(entry);
            true
        }

        fn replace_buffer(&mut self, entry: Vec<char>) {
            self.buffer = entry;
            self.cursor = self.buffer.len();
            self.overflow = self.byte_len() >= self.limit;
        }

        pub(super) fn finish(self) -> ReadOutcome {
            if self.overflow {
                return ReadOutcome::TooLong;
            }
            ReadOutcome::Line(self.buffer.into_iter().collect::<String>().into_bytes())
        }
    }

    /// プロンプトの直後から行を再描画し、カーソルを編集位置へ戻す。
    fn refresh_line<W: Write>(
        writer: &mut W,
        prompt_width: usize,
        buffer: &[char],
        cursor: usize,
    ) -> io::Result<()> {
        let rendered: String = buffer.iter().collect();
        write!(writer, "\r")?;
        if prompt_width > 0 {
            write!(writer, "\x1b[{}C", prompt_width)?;
        }
        write!(writer, "{}\x1b[K", rendered)?;
        if buffer.len() > cursor {
            write!(writer, "\x1b[{}D", buffer.len() - cursor)?;
        }
        writer.flush()
    }

    /// Raw モードへの切り替えと復帰を担う RAII ガード。
    struct RawMode {
        original: Termios,
    }

    impl RawMode {
        #[allow(unexpected_cfgs)]
        #[cfg_attr(coverage, coverage(off))]
        fn new() -> io::Result<Self> {
            let mut termios = Termios::default();
            if unsafe { tcgetattr(STDIN_FD, &mut termios as *mut _) } != 0 {
                return Err(io::Error::last_os_error());
            }
            let mut raw = termios;
            unsafe {
                cfmakeraw(&mut raw as *mut _);
            }
            if unsafe { tcsetattr(STDIN_FD, TCSANOW, &raw as *const _) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { original: termios })
        }
    }

    impl Drop for RawMode {
        #[allow(unexpected_cfgs)]
        #[cfg_attr(coverage, coverage(off))]
        fn drop(&mut self) {
            unsafe {
                let _ = tcsetattr(STDIN_FD, TCSANOW, &self.original as *const _);
            }
        }
    }

    const STDIN_FD: i32 = 0;
    const TCSANOW: i32 = 0;
    const NCCS: usize = 32;

    /// Linux の `termios` を写した構造体。
    #[repr(C)]
    #[derive(Clone, Copy)]
    struct Termios {
        c_iflag: u32,
        c_oflag: u32,
        c_cflag: u32,
        c_lflag: u32,
        c_line: u8,
        c_cc: [u8; NCCS],
        c_ispeed: u32,
        c_ospeed: u32,
    }

    impl Default for Termios {
        fn default() -> Self {
            Self {
                c_iflag: 0,
                c_oflag: 0,
                c_cflag: 0,
                c_lflag: 0,
                c_line: 0,
                c_cc: [0; NCCS],
                c_ispeed: 0,
                c_ospeed: 0,
            }
        }
    }

    extern "C" {
        fn tcgetattr(fd: i32, termios: *mut Termios) -> i32;
        fn tcsetattr(fd: i32, optional_actions: i32, termios: *const Termios) -> i32;
        fn cfmakeraw(termios: *mut Termios);
    }
}

#[cfg(test)]
mod tests {
    use super::{LineSource, ReadOutcome, StreamReader};
    use crate::repl::history::HistoryBuffer;
    use std::io::{BufReader, Cursor};

    fn read_all(input: &str, max_length: usize) -> Vec<ReadOutcome> {
        let mut reader = StreamReader::new(Cursor::new(input.as_bytes().to_vec()));
        let mut history = HistoryBuffer::new(4);
        let mut out = Vec::new();
        loop {
            let outcome = reader.read_line("> ", max_length, &mut history).unwrap();
            let done = outcome == ReadOutcome::Eof;
            out.push(outcome);
            if done {
                break;
            }
        }
        out
    }

    fn line(s: &str) -> ReadOutcome {
        ReadOutcome::Line(s.as_bytes().to_vec())
    }

    #[test]
    /// 終端文字が取り除かれ、CRLF も同様に扱われることを確認する。
    fn reads_lines_without_terminators() {
        assert_eq!(
            read_all("a = 1\nprint(a)\r\n", 16),
            vec![line("a = 1"), line("print(a)"), ReadOutcome::Eof]
        );
    }

    #[test]
    /// 終端文字の無い最終行も 1 行として返ることを検証する。
    fn final_line_without_newline() {
        assert_eq!(read_all("tail", 16), vec![line("tail"), ReadOutcome::Eof]);
        assert_eq!(read_all("", 16), vec![ReadOutcome::Eof]);
    }

    #[test]
    /// 上限ちょうどの入力が TooLong と判定されることを確認する。
    fn line_at_limit_is_too_long() {
        // max_length 8 なら受理できるのは 6 バイトまで。
        assert_eq!(read_all("abcdef\n", 8), vec![line("abcdef"), ReadOutcome::Eof]);
        assert_eq!(read_all("abcdefg\n", 8), vec![ReadOutcome::TooLong, ReadOutcome::Eof]);
        assert_eq!(read_all("abcdefg", 8), vec![ReadOutcome::TooLong, ReadOutcome::Eof]);
        assert_eq!(read_all("abcdef\r\n", 8), vec![line("abcdef"), ReadOutcome::Eof]);
    }

    #[test]
    /// 超過行の残りが読み捨てられ、次の行から正しく再開することを検証する。
    fn overflow_discards_rest_of_physical_line() {
        let long = "x".repeat(50);
        let input = format!("{}\nnext\n", long);
        assert_eq!(
            read_all(&input, 8),
            vec![ReadOutcome::TooLong, line("next"), ReadOutcome::Eof]
        );
    }

    #[test]
    /// 小さな内部バッファでも分割読み取りで同じ結果になることを確認する。
    fn small_buffer_reads_match() {
        let long = "y".repeat(40);
        let input = format!("ok\n{}\nafter\n", long);
        let mut reader = StreamReader::new(BufReader::with_capacity(3, Cursor::new(input)));
        let mut history = HistoryBuffer::new(4);
        let mut next = || reader.read_line("", 10, &mut history).unwrap();
        assert_eq!(next(), line("ok"));
        assert_eq!(next(), ReadOutcome::TooLong);
        assert_eq!(next(), line("after"));
        assert_eq!(next(), ReadOutcome::Eof);
    }

    #[test]
    /// UTF-8 でないバイトも置換せずにそのまま返すことを確認する。
    fn non_utf8_bytes_are_kept() {
        let mut reader = StreamReader::new(Cursor::new(b"s = 'M\xFCnchen'\r\n".to_vec()));
        let mut history = HistoryBuffer::new(1);
        assert_eq!(
            reader.read_line("", 32, &mut history).unwrap(),
            ReadOutcome::Line(b"s = 'M\xFCnchen'".to_vec())
        );
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    mod editor {
        use super::super::raw::{interpret_action, read_utf8_char, EditAction, EditorSession};
        use crate::repl::history::HistoryBuffer;
        use crate::repl::line_editor::ReadOutcome;
        use std::io::Cursor;

        fn type_text(session: &mut EditorSession<'_>, text: &str) {
            for ch in text.chars() {
                session.apply(EditAction::InsertChar(ch));
            }
        }

        #[test]
        /// マルチバイト文字が 1 文字として復元されることを確認する。
        fn utf8_char_is_decoded() {
            let bytes = "é".as_bytes();
            let mut rest = Cursor::new(bytes[1..].to_vec());
            assert_eq!(read_utf8_char(bytes[0], &mut rest).unwrap(), Some('é'));
            let mut empty = Cursor::new(Vec::new());
            assert_eq!(read_utf8_char(0xff, &mut empty).unwrap(), None);
        }

        #[test]
        /// 矢印キーや制御文字が編集操作へ写像されることを検証する。
        fn escape_sequences_map_to_actions() {
            let mut seq = Cursor::new(b"[A".to_vec());
            assert_eq!(interpret_action(0x1b, &mut seq).unwrap(), EditAction::HistoryPrev);
            let mut seq = Cursor::new(b"[D".to_vec());
            assert_eq!(interpret_action(0x1b, &mut seq).unwrap(), EditAction::MoveLeft);
            let mut none = Cursor::new(Vec::new());
            assert_eq!(interpret_action(b'\r', &mut none).unwrap(), EditAction::Submit);
            assert_eq!(interpret_action(0x03, &mut none).unwrap(), EditAction::Interrupt);
            assert_eq!(interpret_action(0x04, &mut none).unwrap(), EditAction::Eof);
            assert_eq!(interpret_action(b'x', &mut none).unwrap(), EditAction::InsertChar('x'));
        }

        #[test]
        /// 挿入とカーソル移動、左削除が期待どおりに働くことを確認する。
        fn editing_inserts_at_cursor() {
            let mut history = HistoryBuffer::new(4);
            let mut session = EditorSession::new(&mut history, 64);
            type_text(&mut session, "prnt");
            session.apply(EditAction::MoveLeft);
            session.apply(EditAction::MoveLeft);
            session.apply(EditAction::InsertChar('i'));
            assert_eq!(session.finish(), ReadOutcome::Line(b"print".to_vec()));

            let mut session = EditorSession::new(&mut history, 64);
            type_text(&mut session, "abc");
            session.apply(EditAction::DeleteLeft);
            session.apply(EditAction::Home);
            session.apply(EditAction::InsertChar('>'));
            assert_eq!(session.finish(), ReadOutcome::Line(b">ab".to_vec()));
        }

        #[test]
        /// 上下キーで履歴を辿り、最新の次で入力途中の行が戻ることを検証する。
        fn history_navigation_restores_draft() {
            let mut history = HistoryBuffer::new(4);
            history.record("first");
            history.record("second");
            let mut session = EditorSession::new(&mut history, 64);
            type_text(&mut session, "dra");
            assert!(session.apply(EditAction::HistoryPrev));
            assert_eq!(session.buffer().iter().collect::<String>(), "second");
            assert!(session.apply(EditAction::HistoryPrev));
            assert!(!session.apply(EditAction::HistoryPrev));
            assert_eq!(session.buffer().iter().collect::<String>(), "first");
            assert!(session.apply(EditAction::HistoryNext));
            assert!(session.apply(EditAction::HistoryNext));
            assert_eq!(session.buffer().iter().collect::<String>(), "dra");
            assert!(!session.apply(EditAction::HistoryNext));
        }

        #[test]
        /// 上限に達した行は送信時に TooLong になることを確認する。
        fn editor_enforces_limit() {
            let mut history = HistoryBuffer::new(4);
            let mut session = EditorSession::new(&mut history, 4);
            type_text(&mut session, "ab");
            assert_eq!(session.finish(), ReadOutcome::Line(b"ab".to_vec()));

            let mut session = EditorSession::new(&mut history, 4);
            type_text(&mut session, "abcdef");
            assert_eq!(session.buffer().len(), 3);
            assert_eq!(session.finish(), ReadOutcome::TooLong);
        }

        #[test]
        /// 上限に達した後でも左削除で上限未満へ戻せば 1 行として送信できることを検証する。
        fn delete_left_recovers_from_limit() {
            let mut history = HistoryBuffer::new(4);
            let mut session = EditorSession::new(&mut history, 4);
            type_text(&mut session, "abc");
            assert!(!session.apply(EditAction::InsertChar('d')));
            assert!(session.apply(EditAction::DeleteLeft));
            assert!(session.apply(EditAction::InsertChar('z')));
            assert_eq!(session.buffer().iter().collect::<String>(), "abz");
            assert!(session.apply(EditAction::DeleteLeft));
            assert_eq!(session.finish(), ReadOutcome::Line(b"ab".to_vec()));
        }
    }
}
