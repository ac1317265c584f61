// Database connection lifecycle

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::error::IoError;

/// Result set of a query, column names in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Connection-providing collaborator shared by the store and the sink.
pub trait Connector {
    fn open(&mut self) -> Result<(), IoError>;
    fn close(&mut self) -> Result<(), IoError>;
    fn is_open(&self) -> bool;
    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows, IoError>;
    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, IoError>;
    fn execute_batch(&self, sql: &str) -> Result<(), IoError>;
}

/// SQLite file (or in-memory) database.
pub struct SqliteConnector {
    path: Option<PathBuf>,
    conn: Option<Connection>,
}

impl SqliteConnector {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            conn: None,
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None, conn: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<&Connection, IoError> {
        self.conn.as_ref().ok_or(IoError::NotConnected)
    }
}

impl Connector for SqliteConnector {
    fn open(&mut self) -> Result<(), IoError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let conn = match &self.path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| IoError::File {
                        path: parent.display().to_string(),
                        message: e.to_string(),
                    })?;
                }
                Connection::open(path)?
            }
            None => Connection::open_in_memory()?,
        };
        log::debug!(
            "opened database {}",
            self.path.as_deref().map_or(":memory:".into(), |p| p.display().to_string())
        );
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) -> Result<(), IoError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| IoError::from(e))?;
            log::debug!("closed database");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows, IoError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width).map(|i| row.get::<_, Value>(i)).collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Rows { columns, rows })
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize, IoError> {
        Ok(self.conn()?.execute(sql, params_from_iter(params.iter()))?)
    }

    fn execute_batch(&self, sql: &str) -> Result<(), IoError> {
        Ok(self.conn()?.execute_batch(sql)?)
    }
}
