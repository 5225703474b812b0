// SQLite backend: one rusqlite connection per worker thread.
//
// - config: open options and the connect helpers
// - params: value conversion at the rusqlite boundary
// - query: statement execution and error classification
// - worker: the thread, its command channel, and the `Connection` impl

pub mod config;
mod params;
mod query;
mod worker;

pub use config::{SqliteOptions, SqliteOptionsBuilder, TextEncoding};
pub use worker::SqliteConnection;
