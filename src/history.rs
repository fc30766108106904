//! Session query history.
//!
//! Successful question/SQL/result triples, oldest first, bounded by a
//! configurable capacity. Lives only as long as the session.

use std::collections::VecDeque;
use std::time::SystemTime;

use crate::db::QueryResult;

/// One successfully answered request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    /// The natural-language request (or the SQL itself for `/sql`).
    pub question: String,
    /// The SQL that was executed.
    pub sql: String,
    /// The result table.
    pub result: QueryResult,
    pub recorded_at: SystemTime,
}

/// Bounded history of successful queries.
#[derive(Debug, Clone, Default)]
pub struct QueryHistory {
    records: VecDeque<QueryRecord>,
    /// Maximum number of records; 0 = unbounded.
    capacity: usize,
}

impl QueryHistory {
    /// Creates an unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history holding at most `capacity` records (0 = unbounded).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest one when full.
    pub fn record(
        &mut self,
        question: impl Into<String>,
        sql: impl Into<String>,
        result: QueryResult,
    ) {
        if self.capacity > 0 && self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(QueryRecord {
            question: question.into(),
            sql: sql.into(),
            result,
            recorded_at: SystemTime::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueryRecord> {
        self.records.iter()
    }

    /// Records in display order, most recent first.
    pub fn iter_recent_first(&self) -> impl Iterator<Item = &QueryRecord> {
        self.records.iter().rev()
    }

    /// The most recent record.
    pub fn latest(&self) -> Option<&QueryRecord> {
        self.records.back()
    }
}
