use tokio::runtime::Runtime;
use toolbelt_core::{ConnectionProfile, SslMode};

use crate::{
    ConnectionState, DbAdapter, MySqlAdapter, PreparedCommand, Result, SqlValue,
    connection_string::connection_string,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct HandlerOptions {
    /// Defaults to `SslMode::None`.
    pub ssl_mode: SslMode,
}

/// Blocking helper that prepares commands and runs them as non-queries.
///
/// The handler owns a single connection. Every execution opens it, runs the
/// command and closes it again, also when the command fails. Executions take
/// `&mut self`, so callers sharing a handler across threads must serialize
/// access themselves (for example behind a `Mutex`).
pub struct MySqlHandler<A: DbAdapter = MySqlAdapter> {
    adapter: A,
    runtime: Runtime,
}

impl MySqlHandler<MySqlAdapter> {
    pub fn new(profile: &ConnectionProfile, options: HandlerOptions) -> Result<Self> {
        tracing::debug!(
            server = profile.server(),
            database = profile.database(),
            ssl_mode = %options.ssl_mode,
            "Creating MySQL handler."
        );
        Self::with_adapter(MySqlAdapter::new(profile, &options)?)
    }

    /// The connection string equivalent to `profile` and `options`.
    pub fn connection_string(profile: &ConnectionProfile, options: HandlerOptions) -> String {
        connection_string(profile, options.ssl_mode)
    }
}

impl<A: DbAdapter> MySqlHandler<A> {
    pub fn with_adapter(adapter: A) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { adapter, runtime })
    }

    pub fn prepare(&self, sql: impl Into<String>) -> PreparedCommand {
        PreparedCommand::new(sql)
    }

    /// Prepares `sql` and binds each `(name, value)` pair as a named parameter.
    pub fn prepare_with<N, V, I>(
        &self,
        sql: impl Into<String>,
        bindings: I,
    ) -> Result<PreparedCommand>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<SqlValue>,
    {
        PreparedCommand::with_bindings(sql, bindings)
    }

    pub fn execute(&mut self, sql: impl Into<String>) -> Result<u64> {
        let command = self.prepare(sql);
        self.execute_command(&command)
    }

    /// Returns the number of affected rows.
    pub fn execute_command(&mut self, command: &PreparedCommand) -> Result<u64> {
        let Self { adapter, runtime } = self;
        runtime.block_on(async move {
            adapter.open().await?;
            tracing::debug!(
                parameters = command.parameters().len(),
                "Executing non-query: {}",
                command.sql()
            );
            let outcome = adapter.execute_non_query(command).await;
            adapter.close().await;
            match &outcome {
                Ok(affected) => tracing::debug!(affected, "Non-query finished."),
                Err(err) => tracing::debug!("Non-query failed: {err}"),
            }
            outcome
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.adapter.state()
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}
