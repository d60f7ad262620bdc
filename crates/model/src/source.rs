use serde::{Deserialize, Serialize};

/// One table to migrate. Immutable once a run starts.
///
/// `query` overrides the default full-table scan; it must embed a stable
/// ordering of its own and must not end in a `LIMIT` clause (the MySQL
/// page cursor wraps it as a derived table). `timestamp_column`, when
/// present, doubles as the deterministic ordering key used by the scan
/// and by validation sampling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableSource {
    pub table: String,

    #[serde(default)]
    pub query: Option<String>,

    #[serde(default)]
    pub timestamp_column: Option<String>,
}

impl TableSource {
    pub fn new(table: impl Into<String>) -> Self {
        TableSource {
            table: table.into(),
            query: None,
            timestamp_column: None,
        }
    }

    /// Ordering key for the default scan and for validation sampling:
    /// the timestamp column when configured, else the first column by
    /// ordinal.
    pub fn order_key(&self) -> &str {
        self.timestamp_column.as_deref().unwrap_or("1")
    }

    /// The effective extraction query.
    pub fn select_query(&self) -> String {
        match &self.query {
            Some(q) => q.clone(),
            None => format!(
                "SELECT * FROM {} ORDER BY {}",
                self.table,
                self.order_key()
            ),
        }
    }

    pub fn count_query(&self) -> String {
        format!("SELECT COUNT(*) FROM ({}) AS src_count", self.select_query())
    }

    /// Bounded sample in the same deterministic order the default scan
    /// uses, so the sample lines up with the head of the destination
    /// batch concatenation.
    pub fn sample_query(&self, sample_size: usize) -> String {
        format!(
            "SELECT * FROM ({}) AS src_sample ORDER BY {} LIMIT {}",
            self.select_query(),
            self.order_key(),
            sample_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scan_orders_by_first_column() {
        let t = TableSource::new("orders");
        assert_eq!(t.select_query(), "SELECT * FROM orders ORDER BY 1");
    }

    #[test]
    fn timestamp_column_becomes_the_order_key() {
        let mut t = TableSource::new("events");
        t.timestamp_column = Some("created_at".into());
        assert_eq!(
            t.sample_query(10),
            "SELECT * FROM (SELECT * FROM events ORDER BY created_at) AS src_sample \
             ORDER BY created_at LIMIT 10"
        );
    }

    #[test]
    fn explicit_query_wins_over_default_scan() {
        let mut t = TableSource::new("orders");
        t.query = Some("SELECT id, total FROM orders WHERE total > 0 ORDER BY id".into());
        assert!(t.count_query().starts_with("SELECT COUNT(*) FROM (SELECT id, total"));
    }
}
