use crate::{
    error::SourceError,
    source::{RowCursor, SourceConnection},
};
use async_trait::async_trait;
use model::{
    core::value::Value,
    records::row::{Field, RowData},
};
use std::collections::VecDeque;

/// In-process source over an inline dataset, used by dry runs, demo
/// plans and the integration suite. It understands the query shapes the
/// engine issues (a `SELECT COUNT(*)` wrapper and a trailing `LIMIT`)
/// and serves rows in insertion order, which is its deterministic scan
/// order.
#[derive(Debug, Clone)]
pub struct MemorySource {
    entity: String,
    columns: Vec<String>,
    rows: Vec<RowData>,
}

impl MemorySource {
    pub fn new(entity: &str, columns: Vec<String>, rows: Vec<RowData>) -> Self {
        MemorySource {
            entity: entity.to_string(),
            columns,
            rows,
        }
    }

    /// Builds a source from JSON scalars, the form inline datasets take
    /// in migration plans.
    pub fn from_json_rows(
        entity: &str,
        columns: Vec<String>,
        rows: &[Vec<serde_json::Value>],
    ) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                let fields = columns
                    .iter()
                    .zip(row.iter())
                    .map(|(name, value)| Field::new(name.clone(), Value::from_json(value)))
                    .collect();
                RowData::new(entity, fields)
            })
            .collect();
        MemorySource::new(entity, columns, rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
impl SourceConnection for MemorySource {
    async fn execute<'a>(
        &'a mut self,
        query: &str,
    ) -> Result<Box<dyn RowCursor + Send + 'a>, SourceError> {
        let upper = query.trim().to_uppercase();

        if upper.starts_with("SELECT COUNT(") {
            let row = RowData::new(
                &self.entity,
                vec![Field::new("count", Value::Uint(self.rows.len() as u64))],
            );
            return Ok(Box::new(MemoryCursor {
                columns: vec!["count".to_string()],
                rows: VecDeque::from(vec![row]),
            }));
        }

        let mut rows = self.rows.clone();
        if let Some(limit) = trailing_limit(&upper) {
            rows.truncate(limit);
        }
        Ok(Box::new(MemoryCursor {
            columns: self.columns.clone(),
            rows: VecDeque::from(rows),
        }))
    }
}

fn trailing_limit(upper_query: &str) -> Option<usize> {
    let (_, tail) = upper_query.rsplit_once(" LIMIT ")?;
    tail.trim().parse::<usize>().ok()
}

struct MemoryCursor {
    columns: Vec<String>,
    rows: VecDeque<RowData>,
}

#[async_trait]
impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn fetch(&mut self, max_rows: usize) -> Result<Vec<RowData>, SourceError> {
        let take = max_rows.min(self.rows.len());
        Ok(self.rows.drain(..take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> MemorySource {
        MemorySource::from_json_rows(
            "people",
            vec!["id".into(), "name".into()],
            &[
                vec![serde_json::json!(1), serde_json::json!("ada")],
                vec![serde_json::json!(2), serde_json::json!("grace")],
                vec![serde_json::json!(3), serde_json::json!("edsger")],
            ],
        )
    }

    #[tokio::test]
    async fn fetch_drains_in_insertion_order() {
        let mut source = people();
        let mut cursor = source.execute("SELECT * FROM people ORDER BY 1").await.unwrap();
        assert_eq!(cursor.columns(), ["id", "name"]);

        let first = cursor.fetch(2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].get_value("name"), Value::String("ada".into()));

        assert_eq!(cursor.fetch(2).await.unwrap().len(), 1);
        assert!(cursor.fetch(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_queries_return_a_single_count_row() {
        let mut source = people();
        let mut cursor = source
            .execute("SELECT COUNT(*) FROM (SELECT * FROM people) AS src_count")
            .await
            .unwrap();
        let rows = cursor.fetch(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_value("count").as_u64(), Some(3));
    }

    #[tokio::test]
    async fn trailing_limit_bounds_the_result() {
        let mut source = people();
        let mut cursor = source
            .execute("SELECT * FROM (SELECT * FROM people) AS s ORDER BY 1 LIMIT 2")
            .await
            .unwrap();
        assert_eq!(cursor.fetch(10).await.unwrap().len(), 2);
    }
}
