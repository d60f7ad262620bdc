use crate::records::row::RowData;
use chrono::{DateTime, Utc};

/// A bounded chunk of rows extracted from one table and written as a
/// single destination object. Batches are numbered sequentially from 0
/// per table; the object key is derived from (table, index) so a retried
/// batch overwrites rather than duplicates.
#[derive(Debug, Clone)]
pub struct Batch {
    pub table: String,
    pub index: u32,
    pub columns: Vec<String>,
    pub rows: Vec<RowData>,
    pub ts: DateTime<Utc>,
}

impl Batch {
    pub fn new(table: &str, index: u32, columns: Vec<String>, rows: Vec<RowData>) -> Self {
        Batch {
            table: table.to_string(),
            index,
            columns,
            rows,
            ts: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn object_key(&self) -> String {
        object_key(&self.table, self.index)
    }
}

/// Destination key for batch `index` of `table`. Zero padding keeps a
/// lexicographic listing aligned with batch order.
pub fn object_key(table: &str, index: u32) -> String {
    format!("{table}/batch_{index:05}.csv")
}

/// Key prefix under which every batch object of `table` lives.
pub fn key_prefix(table: &str) -> String {
    format!("{table}/")
}

/// Recovers the batch index from an object key produced by
/// [`object_key`]. Foreign keys under the prefix yield `None`.
pub fn parse_index(key: &str) -> Option<u32> {
    let file = key.rsplit('/').next()?;
    let stem = file.strip_prefix("batch_")?.strip_suffix(".csv")?;
    stem.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_parse() {
        let key = object_key("orders", 42);
        assert_eq!(key, "orders/batch_00042.csv");
        assert_eq!(parse_index(&key), Some(42));
    }

    #[test]
    fn foreign_keys_are_rejected() {
        assert_eq!(parse_index("orders/_manifest.json"), None);
        assert_eq!(parse_index("orders/batch_x.csv"), None);
    }

    #[test]
    fn padded_keys_list_in_batch_order() {
        let mut keys: Vec<String> = (0..12).map(|i| object_key("t", i)).collect();
        let sorted = keys.clone();
        keys.sort();
        assert_eq!(keys, sorted);
    }
}
