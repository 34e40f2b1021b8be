//! Cursor pager over the admin log stream.
use crate::api::{AdminApiClient, ApiResult, LogEntry, LogsQuery};
use std::sync::Arc;

pub struct LogFeed {
    client: Arc<AdminApiClient>,
    limit: u32,
    entries: Vec<LogEntry>,
    next_cursor: Option<String>,
    error: Option<String>,
}

impl LogFeed {
    pub fn new(client: Arc<AdminApiClient>, limit: u32) -> Self {
        Self {
            client,
            limit,
            entries: Vec::new(),
            next_cursor: None,
            error: None,
        }
    }

    /// Replace the entries with the first page. Returns the page size.
    pub async fn load_initial(&mut self) -> ApiResult<usize> {
        self.error = None;
        let query = LogsQuery {
            limit: Some(self.limit),
            cursor: None,
        };
        match self.client.fetch_admin_logs(&query).await {
            Ok(page) => {
                let count = page.items.len();
                self.entries = page.items;
                self.next_cursor = page.next_cursor;
                Ok(count)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Append the next page. A no-op returning 0 when there is no cursor.
    pub async fn load_more(&mut self) -> ApiResult<usize> {
        let Some(cursor) = self.next_cursor.clone() else {
            return Ok(0);
        };
        self.error = None;
        let query = LogsQuery {
            limit: Some(self.limit),
            cursor: Some(cursor),
        };
        match self.client.fetch_admin_logs(&query).await {
            Ok(page) => {
                let count = page.items.len();
                self.entries.extend(page.items);
                self.next_cursor = page.next_cursor;
                Ok(count)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
