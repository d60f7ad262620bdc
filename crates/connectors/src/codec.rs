use crate::error::CodecError;
use bytes::Bytes;
use model::records::batch::Batch;

/// CSV encoding of one batch object: a header record with the column
/// names followed by one record per row, every scalar rendered through
/// `Value::to_field`. The validator relies on that shared rendering for
/// its string-normalized comparison.
pub fn encode_batch(batch: &Batch) -> Result<Bytes, CodecError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&batch.columns)?;
    for row in &batch.rows {
        let record: Vec<String> = batch
            .columns
            .iter()
            .map(|column| row.get_value(column).to_field())
            .collect();
        writer.write_record(&record)?;
    }
    let buf = writer
        .into_inner()
        .map_err(|e| CodecError::Malformed(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// One decoded batch object.
#[derive(Debug, Clone)]
pub struct DecodedObject {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn decode_object(bytes: &[u8]) -> Result<DecodedObject, CodecError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(DecodedObject { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::value::Value,
        records::row::{Field, RowData},
    };

    fn orders_batch() -> Batch {
        let rows = vec![
            RowData::new(
                "orders",
                vec![
                    Field::new("id", Value::Int(1)),
                    Field::new("name", Value::String("A".into())),
                ],
            ),
            RowData::new(
                "orders",
                vec![
                    Field::new("id", Value::Int(2)),
                    Field::new("name", Value::Null),
                ],
            ),
        ];
        Batch::new("orders", 0, vec!["id".into(), "name".into()], rows)
    }

    #[test]
    fn encoded_object_carries_header_and_rows() {
        let bytes = encode_batch(&orders_batch()).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert_eq!(text, "id,name\n1,A\n2,\n");
    }

    #[test]
    fn decoding_recovers_columns_and_row_count() {
        let bytes = encode_batch(&orders_batch()).unwrap();
        let decoded = decode_object(&bytes).unwrap();
        assert_eq!(decoded.columns, vec!["id", "name"]);
        assert_eq!(decoded.rows.len(), 2);
        assert_eq!(decoded.rows[0], vec!["1", "A"]);
    }

    #[test]
    fn decoding_rejects_ragged_records() {
        let err = decode_object(b"a,b\n1\n").unwrap_err();
        assert!(matches!(err, CodecError::Csv(_)));
    }
}
