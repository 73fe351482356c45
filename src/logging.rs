//! 診断ログの初期化。
//!
//! コンソール利用者向けの表示（プロンプトやエラー）はログではなくコンソールへ直接書き出す。
//! ここで扱うのは stderr へ流れる `tracing` イベントのみ。

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

/// ログの詳細度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// `-v` の回数から詳細度を決める。0 回は警告以上のみ。
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }
}

/// stderr 向けの subscriber を登録する。既に登録済みなら何もしない。
pub fn init_with_level(level: LogLevel) {
    let filter = LevelFilter::from_level(level.into());
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_level(true)
        .compact()
        .with_filter(filter);

    // ホスト側が先に subscriber を設定している場合はそちらを優先する。
    let _ = Registry::default().with(layer).try_init();
}
