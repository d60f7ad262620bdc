use crate::{
    error::SourceError,
    source::{RowCursor, SourceConnection},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use model::{
    core::value::Value,
    records::row::{Field, RowData},
};
use mysql_async::{Conn, Opts, Row, prelude::Queryable};
use std::collections::VecDeque;
use tracing::warn;

/// MySQL source. The server offers no forward-only cursor over an
/// arbitrary query, so `execute` pages through a derived table with
/// `LIMIT offset, n` windows; the supplied query therefore must not
/// carry a trailing `LIMIT` of its own and should embed a stable
/// ordering.
pub struct MySqlSource {
    conn: Conn,
}

impl MySqlSource {
    pub async fn connect(url: &str) -> Result<Self, SourceError> {
        let opts = Opts::from_url(url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        let conn = Conn::new(opts).await?;
        Ok(MySqlSource { conn })
    }
}

#[async_trait]
impl SourceConnection for MySqlSource {
    async fn execute<'a>(
        &'a mut self,
        query: &str,
    ) -> Result<Box<dyn RowCursor + Send + 'a>, SourceError> {
        // Prefetch a single-row head page so the column names exist
        // before the first fetch, as they do for a real cursor.
        let probe: Vec<Row> = self.conn.query(page_query(query, 0, 1)).await?;
        let columns: Vec<String> = probe
            .first()
            .map(|row| {
                row.columns_ref()
                    .iter()
                    .map(|c| c.name_str().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let mut head = VecDeque::with_capacity(probe.len());
        for row in &probe {
            head.push_back(row_to_data(row));
        }

        let done = head.is_empty();
        let offset = head.len();
        Ok(Box::new(MySqlRowCursor {
            conn: &mut self.conn,
            query: query.to_string(),
            columns,
            head,
            offset,
            done,
        }))
    }
}

struct MySqlRowCursor<'a> {
    conn: &'a mut Conn,
    query: String,
    columns: Vec<String>,
    head: VecDeque<RowData>,
    offset: usize,
    done: bool,
}

#[async_trait]
impl RowCursor for MySqlRowCursor<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn fetch(&mut self, max_rows: usize) -> Result<Vec<RowData>, SourceError> {
        let mut out = Vec::with_capacity(max_rows);
        while out.len() < max_rows {
            match self.head.pop_front() {
                Some(row) => out.push(row),
                None => break,
            }
        }

        while out.len() < max_rows && !self.done {
            let want = max_rows - out.len();
            let rows: Vec<Row> = self
                .conn
                .query(page_query(&self.query, self.offset, want))
                .await?;
            if rows.len() < want {
                self.done = true;
            }
            self.offset += rows.len();
            for row in &rows {
                out.push(row_to_data(row));
            }
        }

        Ok(out)
    }
}

fn page_query(query: &str, offset: usize, limit: usize) -> String {
    format!("SELECT * FROM ({query}) AS page LIMIT {offset}, {limit}")
}

fn row_to_data(row: &Row) -> RowData {
    let columns = row.columns_ref();
    let mut fields = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value = match row.as_ref(idx) {
            Some(raw) => convert(raw),
            None => Value::Null,
        };
        fields.push(Field::new(column.name_str().into_owned(), value));
    }
    RowData::new("", fields)
}

fn convert(raw: &mysql_async::Value) -> Value {
    use mysql_async::Value as My;
    match raw {
        My::NULL => Value::Null,
        My::Int(v) => Value::Int(*v),
        My::UInt(v) => Value::Uint(*v),
        My::Float(v) => Value::Float(*v as f64),
        My::Double(v) => Value::Float(*v),
        My::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::String(text.to_string()),
            Err(_) => Value::Bytes(bytes.clone()),
        },
        My::Date(y, m, d, h, min, s, us) => {
            match NaiveDate::from_ymd_opt(*y as i32, *m as u32, *d as u32) {
                Some(date) if *h == 0 && *min == 0 && *s == 0 && *us == 0 => Value::Date(date),
                Some(date) => date
                    .and_hms_micro_opt(*h as u32, *min as u32, *s as u32, *us)
                    .map(|dt| Value::Timestamp(dt.and_utc()))
                    .unwrap_or(Value::Null),
                None => {
                    warn!("Invalid MySQL date value");
                    Value::Null
                }
            }
        }
        My::Time(neg, days, h, m, s, us) => {
            let sign = if *neg { "-" } else { "" };
            let hours = u32::from(*h) + days * 24;
            Value::String(format!("{sign}{hours:02}:{m:02}:{s:02}.{us:06}"))
        }
    }
}
