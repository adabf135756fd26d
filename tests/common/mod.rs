//! Shared in-memory fake driver for engine tests: scripted results,
//! recorded statements, and acquire/release tracking.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;

use sql_conduit::{
    Connection, ConnectionFactory, ConnectionMetadata, DriverError, ExecuteResult, Row, SqlValue,
    Statement,
};

/// What the fake backend does for one acquired connection.
#[derive(Clone)]
pub enum Script {
    Rows(Vec<Row>),
    RowsThenError(Vec<Row>, DriverError),
    Updated(u64),
    Fail(DriverError),
}

/// One statement as the driver saw it.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub sql: String,
    pub binds: Vec<(usize, SqlValue)>,
}

pub struct FakeFactory {
    metadata: ConnectionMetadata,
    scripts: Mutex<VecDeque<Script>>,
    pub recorded: Arc<Mutex<Vec<Recorded>>>,
    pub metadata_calls: AtomicUsize,
    pub acquired: AtomicUsize,
    pub released: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(product: &str, scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            metadata: ConnectionMetadata::new(product, "1.0"),
            scripts: Mutex::new(scripts.into()),
            recorded: Arc::new(Mutex::new(Vec::new())),
            metadata_calls: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn recorded_sql(&self) -> Vec<String> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.sql.clone())
            .collect()
    }
}

#[async_trait]
impl ConnectionFactory for FakeFactory {
    fn metadata(&self) -> ConnectionMetadata {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata.clone()
    }

    async fn acquire(&self) -> Result<Box<dyn Connection>, DriverError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DriverError::new("no scripted result left"))?;
        Ok(Box::new(FakeConnection {
            script: Some(script),
            recorded: self.recorded.clone(),
            _release: ReleaseGuard(self.released.clone()),
        }))
    }
}

// Counts connection drops, which is the engine's release path.
struct ReleaseGuard(Arc<AtomicUsize>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeConnection {
    script: Option<Script>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    _release: ReleaseGuard,
}

#[async_trait]
impl Connection for FakeConnection {
    fn create_statement(&mut self, sql: &str) -> Result<Box<dyn Statement>, DriverError> {
        let script = self
            .script
            .take()
            .ok_or_else(|| DriverError::new("statement already created on this connection"))?;
        Ok(Box::new(FakeStatement {
            sql: sql.to_string(),
            binds: Vec::new(),
            script,
            recorded: self.recorded.clone(),
        }))
    }
}

struct FakeStatement {
    sql: String,
    binds: Vec<(usize, SqlValue)>,
    script: Script,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

#[async_trait]
impl Statement for FakeStatement {
    fn bind(&mut self, index: usize, value: SqlValue) -> Result<(), DriverError> {
        self.binds.push((index, value));
        Ok(())
    }

    async fn execute(self: Box<Self>) -> Result<ExecuteResult, DriverError> {
        self.recorded.lock().unwrap().push(Recorded {
            sql: self.sql.clone(),
            binds: self.binds.clone(),
        });
        match self.script {
            Script::Rows(rows) => Ok(ExecuteResult::Rows(
                stream::iter(rows.into_iter().map(Ok)).boxed(),
            )),
            Script::RowsThenError(rows, error) => {
                let items: Vec<Result<Row, DriverError>> = rows
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(error)))
                    .collect();
                Ok(ExecuteResult::Rows(stream::iter(items).boxed()))
            }
            Script::Updated(count) => Ok(ExecuteResult::RowsUpdated(count)),
            Script::Fail(error) => Err(error),
        }
    }
}

/// Build a row from column names and values.
pub fn row(columns: &[&str], values: Vec<SqlValue>) -> Row {
    Row::new(
        Arc::new(columns.iter().map(ToString::to_string).collect()),
        values,
    )
}
