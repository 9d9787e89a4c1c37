//! In-memory driver whose responses are scripted per command text.
//!
//! It counts lifecycle calls and models transactional writes (staged until commit,
//! dropped on rollback), so executor behavior can be checked without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::command::{Command, Executed};
use crate::driver::{Connection, Connector};
use crate::error::DriverError;
use crate::results::DataSet;

/// What the scripted driver does when it receives a given command text.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub rows_affected: u64,
    pub return_value: Option<i32>,
    pub data: DataSet,
    pub error: Option<String>,
    pub writes: Vec<String>,
    pub hang: bool,
}

impl Response {
    #[must_use]
    pub fn rows(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn data(data: DataSet) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Fail with a driver error carrying `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Never complete.
    #[must_use]
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_return_value(mut self, code: i32) -> Self {
        self.return_value = Some(code);
        self
    }

    /// Record `keys` as written rows when the command runs.
    #[must_use]
    pub fn writing<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writes = keys.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: HashMap<String, Response>,
    committed: Vec<String>,
    executed: Vec<String>,
    opens: usize,
    closes: usize,
    begins: usize,
    commits: usize,
    rollbacks: usize,
    fail_open: bool,
    fail_close: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

/// Connector for the scripted driver. Clones share their script and counters.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<Mutex<ScriptState>>,
}

fn lock(state: &Mutex<ScriptState>) -> MutexGuard<'_, ScriptState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ScriptedConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose text is `text` with `response`.
    #[must_use]
    pub fn respond(self, text: impl Into<String>, response: Response) -> Self {
        lock(&self.state).responses.insert(text.into(), response);
        self
    }

    #[must_use]
    pub fn fail_open(self) -> Self {
        lock(&self.state).fail_open = true;
        self
    }

    #[must_use]
    pub fn fail_close(self) -> Self {
        lock(&self.state).fail_close = true;
        self
    }

    #[must_use]
    pub fn fail_commit(self) -> Self {
        lock(&self.state).fail_commit = true;
        self
    }

    #[must_use]
    pub fn fail_rollback(self) -> Self {
        lock(&self.state).fail_rollback = true;
        self
    }

    #[must_use]
    pub fn opens(&self) -> usize {
        lock(&self.state).opens
    }

    #[must_use]
    pub fn closes(&self) -> usize {
        lock(&self.state).closes
    }

    #[must_use]
    pub fn begins(&self) -> usize {
        lock(&self.state).begins
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        lock(&self.state).commits
    }

    #[must_use]
    pub fn rollbacks(&self) -> usize {
        lock(&self.state).rollbacks
    }

    /// Rows that were written outside a transaction or by a committed one.
    #[must_use]
    pub fn committed_writes(&self) -> Vec<String> {
        lock(&self.state).committed.clone()
    }

    /// Command texts in the order they were received.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        lock(&self.state).executed.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn open(&self) -> Result<ScriptedConnection, DriverError> {
        let mut state = lock(&self.state);
        state.opens += 1;
        if state.fail_open {
            return Err(DriverError::ConnectionError("scripted open failure".into()));
        }
        Ok(ScriptedConnection {
            state: Arc::clone(&self.state),
            in_transaction: false,
            staged: Vec::new(),
        })
    }

    fn connection_string(&self) -> &str {
        "scripted://memory"
    }
}

/// Connection of the scripted driver.
#[derive(Debug)]
pub struct ScriptedConnection {
    state: Arc<Mutex<ScriptState>>,
    in_transaction: bool,
    staged: Vec<String>,
}

impl ScriptedConnection {
    async fn run(&mut self, command: &Command) -> Result<Response, DriverError> {
        let response = {
            let mut state = lock(&self.state);
            state.executed.push(command.text().to_string());
            state.responses.get(command.text()).cloned()
        };
        let response = response.ok_or_else(|| {
            DriverError::ExecutionError(format!("no scripted response for '{}'", command.text()))
        })?;

        if response.hang {
            std::future::pending::<()>().await;
        }
        if let Some(message) = &response.error {
            return Err(DriverError::ExecutionError(message.clone()));
        }

        if self.in_transaction {
            self.staged.extend(response.writes.iter().cloned());
        } else {
            lock(&self.state).committed.extend(response.writes.iter().cloned());
        }
        Ok(response)
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute_non_query(
        &mut self,
        command: &Command,
    ) -> Result<Executed<u64>, DriverError> {
        let response = self.run(command).await?;
        Ok(Executed::new(response.rows_affected, response.return_value))
    }

    async fn execute_query(&mut self, command: &Command) -> Result<Executed<DataSet>, DriverError> {
        let response = self.run(command).await?;
        Ok(Executed::new(response.data, response.return_value))
    }

    async fn begin_transaction(&mut self) -> Result<(), DriverError> {
        lock(&self.state).begins += 1;
        self.in_transaction = true;
        self.staged.clear();
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.commits += 1;
        if state.fail_commit {
            return Err(DriverError::ExecutionError("scripted commit failure".into()));
        }
        state.committed.append(&mut self.staged);
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.rollbacks += 1;
        self.staged.clear();
        self.in_transaction = false;
        if state.fail_rollback {
            return Err(DriverError::ExecutionError("scripted rollback failure".into()));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.closes += 1;
        if state.fail_close {
            return Err(DriverError::ConnectionError("scripted close failure".into()));
        }
        Ok(())
    }
}
