// TestDependencies - mock database for tests
//
// Records every statement it is handed and replays queued responses in order.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::traits::{BaseDatabase, Row};
use crate::common::{ColumnDef, RecordError, Statement};

#[derive(Debug, Clone)]
enum MockResponse {
    Row(Option<Row>),
    Affected(u64),
    Failure(String),
}

#[derive(Default)]
struct MockState {
    responses: VecDeque<MockResponse>,
    statements: Vec<Statement>,
}

/// Mock database handle.
///
/// With an empty queue, fetches find no row and executes affect zero rows.
#[derive(Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a row for the next fetch. Pairs are (column, value).
    pub fn with_row(self, pairs: &[(&str, &str)]) -> Self {
        let row = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.push(MockResponse::Row(Some(row)));
        self
    }

    /// Queue an empty fetch result.
    pub fn with_no_row(self) -> Self {
        self.push(MockResponse::Row(None));
        self
    }

    /// Queue an affected-row count for the next execute.
    pub fn with_affected(self, rows: u64) -> Self {
        self.push(MockResponse::Affected(rows));
        self
    }

    /// Queue a database failure for the next call of either kind.
    pub fn with_failure(self, message: &str) -> Self {
        self.push(MockResponse::Failure(message.to_string()));
        self
    }

    /// Every statement received so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    /// Inlined SQL of every statement received so far.
    pub fn executed_sql(&self) -> Vec<String> {
        self.lock().statements.iter().map(Statement::inline).collect()
    }

    fn push(&self, response: MockResponse) {
        self.lock().responses.push_back(response);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next(&self, statement: &Statement) -> Option<MockResponse> {
        let mut state = self.lock();
        state.statements.push(statement.clone());
        state.responses.pop_front()
    }
}

fn failure(message: String) -> RecordError {
    RecordError::Database(sqlx::Error::Protocol(message))
}

#[async_trait]
impl BaseDatabase for MockDatabase {
    async fn fetch_optional(
        &self,
        statement: &Statement,
        columns: &[ColumnDef],
    ) -> Result<Option<Row>, RecordError> {
        match self.next(statement) {
            None => Ok(None),
            Some(MockResponse::Row(row)) => Ok(row.map(|mut row| {
                row.retain(|name, _| columns.iter().any(|c| &c.name == name));
                row
            })),
            Some(MockResponse::Failure(message)) => Err(failure(message)),
            Some(MockResponse::Affected(_)) => {
                Err(failure("mock expected a fetch but an execute was queued".to_string()))
            }
        }
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, RecordError> {
        match self.next(statement) {
            None => Ok(0),
            Some(MockResponse::Affected(rows)) => Ok(rows),
            Some(MockResponse::Failure(message)) => Err(failure(message)),
            Some(MockResponse::Row(_)) => {
                Err(failure("mock expected an execute but a fetch was queued".to_string()))
            }
        }
    }
}
