mod command;
mod connection_string;
mod handler;
mod mysql;

use async_trait::async_trait;
pub use toolbelt_core::Result;

pub use command::{Parameter, PreparedCommand, SqlValue};
pub use connection_string::{connection_string, parse_connection_string};
pub use handler::{HandlerOptions, MySqlHandler};
pub use mysql::MySqlAdapter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// One database connection that is opened and closed around each command.
#[async_trait]
pub trait DbAdapter: Send {
    async fn open(&mut self) -> Result<()>;
    async fn execute_non_query(&mut self, command: &PreparedCommand) -> Result<u64>;
    /// Must leave the adapter `Closed`, even when the connection is broken.
    async fn close(&mut self);
    fn state(&self) -> ConnectionState;
}
