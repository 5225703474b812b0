mod channel;
mod connection;
mod dispatcher;
mod manager;

pub use connection::SqliteConnection;
