use crate::{
    error::SourceError,
    source::{RowCursor, SourceConnection},
};
use async_trait::async_trait;
use model::{
    core::value::Value,
    records::row::{Field, RowData},
};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tokio_postgres::{Client, Config, NoTls, Row, Transaction, config::SslMode};
use tracing::{error, warn};
use uuid::Uuid;

/// PostgreSQL source backed by a server-side cursor: each `execute`
/// opens a transaction, declares a `NO SCROLL` cursor over the query and
/// pages through it with `FETCH FORWARD`. Dropping the cursor rolls the
/// transaction back and releases the server cursor.
pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    pub async fn connect(url: &str) -> Result<Self, SourceError> {
        let client = connect_client(url).await?;
        Ok(PostgresSource { client })
    }
}

#[async_trait]
impl SourceConnection for PostgresSource {
    async fn execute<'a>(
        &'a mut self,
        query: &str,
    ) -> Result<Box<dyn RowCursor + Send + 'a>, SourceError> {
        let tx = self.client.transaction().await?;

        // Prepare first: the statement descriptor carries the column
        // names before any row is fetched.
        let statement = tx.prepare(query).await?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let name = format!("cur_{}", Uuid::new_v4().simple());
        tx.batch_execute(&format!("DECLARE {name} NO SCROLL CURSOR FOR {query}"))
            .await?;

        Ok(Box::new(PgRowCursor { tx, name, columns }))
    }
}

struct PgRowCursor<'a> {
    tx: Transaction<'a>,
    name: String,
    columns: Vec<String>,
}

#[async_trait]
impl RowCursor for PgRowCursor<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn fetch(&mut self, max_rows: usize) -> Result<Vec<RowData>, SourceError> {
        let sql = format!("FETCH FORWARD {max_rows} FROM {}", self.name);
        let rows = self.tx.query(sql.as_str(), &[]).await?;
        rows.iter().map(row_to_data).collect()
    }
}

fn row_to_data(row: &Row) -> Result<RowData, SourceError> {
    let mut fields = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = convert(row, idx, column.type_().name())?;
        fields.push(Field::new(column.name(), value));
    }
    Ok(RowData::new("", fields))
}

fn convert(row: &Row, idx: usize, type_name: &str) -> Result<Value, SourceError> {
    let value = match type_name {
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(Value::Boolean),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| Value::Int(v as i64)),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| Value::Int(v as i64)),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::Float(v as f64)),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        "numeric" => row
            .try_get::<_, Option<Decimal>>(idx)?
            .and_then(|d| d.to_f64())
            .map(Value::Float),
        "text" | "varchar" | "bpchar" | "name" => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::String)
        }
        "date" => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)?
            .map(Value::Date),
        "timestamp" => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map(|v| Value::Timestamp(v.and_utc())),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(Value::Timestamp),
        "uuid" => row.try_get::<_, Option<Uuid>>(idx)?.map(Value::Uuid),
        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(Value::Json),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        other => {
            // Best effort for exotic types; anything that won't decode
            // as text becomes NULL.
            let text = row.try_get::<_, Option<String>>(idx).ok().flatten();
            if text.is_none() {
                warn!(column_type = other, "Unsupported Postgres column type");
            }
            text.map(Value::String)
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

pub(crate) async fn connect_client(url: &str) -> Result<Client, SourceError> {
    let config = url
        .parse::<Config>()
        .map_err(|e| SourceError::InvalidUrl(e.to_string()))?;

    match config.get_ssl_mode() {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config.clone()).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

async fn connect_with_tls(config: Config) -> Result<Client, SourceError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

async fn connect_without_tls(config: Config) -> Result<Client, SourceError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}
