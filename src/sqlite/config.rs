use std::time::Duration;

use clap::ValueEnum;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExecutorOptions;
use crate::error::SqlParamsError;
use crate::executor::Executor;

use super::worker::SqliteConnection;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Text encoding of a new `SQLite` database file.
///
/// Only takes effect before the first table is created; an existing
/// database keeps its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16le,
    Utf16be,
}

impl TextEncoding {
    fn pragma_value(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16le => "UTF-16le",
            TextEncoding::Utf16be => "UTF-16be",
        }
    }
}

/// Options for opening a `SQLite` connection.
///
/// ```rust
/// use sql_params::prelude::*;
///
/// let opts = SqliteOptions::from_json(r#"{"db_path":":memory:","text_encoding":"utf16le"}"#)
///     .unwrap();
/// assert_eq!(opts.text_encoding, TextEncoding::Utf16le);
/// assert_eq!(opts.busy_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub text_encoding: TextEncoding,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            text_encoding: TextEncoding::default(),
        }
    }

    /// Parse options from a JSON object. Missing optional fields take defaults.
    ///
    /// # Errors
    /// Returns `SqlParamsError::ConfigError` for malformed JSON or unknown values.
    pub fn from_json(json: &str) -> Result<Self, SqlParamsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Open the database on a blocking thread and hand it to a new worker.
    ///
    /// # Errors
    /// Returns `TransportError` if the file cannot be opened, or the `SQLite`
    /// error raised while applying the pragmas.
    pub async fn open(&self) -> Result<SqliteConnection, SqlParamsError> {
        let opts = self.clone();
        let conn = tokio::task::spawn_blocking(move || open_blocking(&opts))
            .await
            .map_err(|err| {
                SqlParamsError::TransportError(format!("SQLite open task failed: {err}"))
            })??;
        SqliteConnection::new(conn)
    }

    /// Open the database and wrap it in an [`Executor`].
    ///
    /// # Errors
    /// Same as [`open`](Self::open).
    pub async fn connect(&self, options: ExecutorOptions) -> Result<Executor, SqlParamsError> {
        let conn = self.open().await?;
        Ok(Executor::new(conn, options))
    }
}

fn open_blocking(opts: &SqliteOptions) -> Result<Connection, SqlParamsError> {
    let conn = Connection::open_with_flags(&opts.db_path, OpenFlags::default()).map_err(|err| {
        SqlParamsError::TransportError(format!("cannot open {}: {err}", opts.db_path))
    })?;
    conn.busy_timeout(Duration::from_millis(opts.busy_timeout_ms))?;
    conn.execute_batch(&format!(
        "PRAGMA encoding = '{}';",
        opts.text_encoding.pragma_value()
    ))?;
    debug!(
        db_path = %opts.db_path,
        encoding = opts.text_encoding.pragma_value(),
        "opened SQLite database"
    );
    Ok(conn)
}

/// Fluent builder for [`SqliteOptions`].
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn text_encoding(mut self, encoding: TextEncoding) -> Self {
        self.opts.text_encoding = encoding;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open the database and wrap it in an [`Executor`].
    ///
    /// # Errors
    /// See [`SqliteOptions::open`].
    pub async fn connect(self, options: ExecutorOptions) -> Result<Executor, SqlParamsError> {
        self.finish().connect(options).await
    }
}
