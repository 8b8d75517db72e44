//! Shard Writer (C8): materializes the graph/evidence tables as
//! Parquet files with deterministic row ordering.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array, Int64Array, Int8Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::collections::HashMap;

use crate::error::CompileError;
use crate::model::{Claim, Entity, Provenance, Span, StreamEvidence};

fn write_batch(path: &Path, schema: Arc<Schema>, columns: Vec<ArrayRef>) -> Result<(), CompileError> {
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

pub fn write_entities(entities: &[Entity], path: &Path) -> Result<(), CompileError> {
    if entities.is_empty() {
        return Ok(());
    }
    let mut rows = entities.to_vec();
    rows.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

    let schema = Arc::new(Schema::new(vec![
        Field::new("entity_id", DataType::Utf8, false),
        Field::new("namespace", DataType::Utf8, false),
        Field::new("label", DataType::Utf8, false),
        Field::new("type", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|e| e.entity_id.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|e| e.namespace.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|e| e.label.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|e| e.r#type.as_str()))),
    ];
    write_batch(path, schema, columns)
}

pub fn write_claims(claims: &[Claim], path: &Path) -> Result<(), CompileError> {
    if claims.is_empty() {
        return Ok(());
    }
    let mut rows = claims.to_vec();
    rows.sort_by(|a, b| a.claim_id.cmp(&b.claim_id));

    let schema = Arc::new(Schema::new(vec![
        Field::new("claim_id", DataType::Utf8, false),
        Field::new("subject", DataType::Utf8, false),
        Field::new("predicate", DataType::Utf8, false),
        Field::new("object", DataType::Utf8, false),
        Field::new("object_type", DataType::Utf8, false),
        Field::new("tier", DataType::Int8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.claim_id.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.subject.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.predicate.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.object.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.object_type.as_str()))),
        Arc::new(Int8Array::from_iter_values(rows.iter().map(|c| c.tier))),
    ];
    write_batch(path, schema, columns)
}

pub fn write_provenance(prov: &[Provenance], path: &Path) -> Result<(), CompileError> {
    if prov.is_empty() {
        return Ok(());
    }
    let mut rows = prov.to_vec();
    rows.sort_by(|a, b| a.provenance_id.cmp(&b.provenance_id));

    let schema = Arc::new(Schema::new(vec![
        Field::new("provenance_id", DataType::Utf8, false),
        Field::new("claim_id", DataType::Utf8, false),
        Field::new("span_id", DataType::Utf8, false),
        Field::new("source_hash", DataType::Utf8, false),
        Field::new("byte_start", DataType::Int64, false),
        Field::new("byte_end", DataType::Int64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.provenance_id.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.claim_id.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.span_id.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.source_hash.as_str()))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|p| p.byte_start))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|p| p.byte_end))),
    ];
    write_batch(path, schema, columns)
}

/// Deduplicate spans by `span_id`, keeping first occurrence, then sort
/// for deterministic output.
pub fn write_spans(spans: &[Span], path: &Path) -> Result<(), CompileError> {
    let mut seen: HashMap<&str, &Span> = HashMap::new();
    for s in spans {
        seen.entry(s.span_id.as_str()).or_insert(s);
    }
    let mut rows: Vec<Span> = seen.into_values().cloned().collect();
    if rows.is_empty() {
        return Ok(());
    }
    rows.sort_by(|a, b| a.span_id.cmp(&b.span_id));

    let schema = Arc::new(Schema::new(vec![
        Field::new("span_id", DataType::Utf8, false),
        Field::new("source_hash", DataType::Utf8, false),
        Field::new("byte_start", DataType::Int64, false),
        Field::new("byte_end", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|s| s.span_id.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|s| s.source_hash.as_str()))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|s| s.byte_start))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|s| s.byte_end))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|s| s.text.as_str()))),
    ];
    write_batch(path, schema, columns)
}

/// `streams.parquet` is omitted entirely when there is no stream
/// evidence (§4.8).
pub fn write_streams(evidence: &[StreamEvidence], path: &Path) -> Result<(), CompileError> {
    if evidence.is_empty() {
        return Ok(());
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("frame_id", DataType::Int32, false),
        Field::new("stream", DataType::Utf8, false),
        Field::new("file", DataType::Utf8, false),
        Field::new("offset", DataType::Int64, false),
        Field::new("length", DataType::Int32, false),
        Field::new("status", DataType::Utf8, false),
        Field::new("content_hash", DataType::Utf8, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from_iter_values(evidence.iter().map(|e| e.frame_id))),
        Arc::new(StringArray::from_iter_values(evidence.iter().map(|e| e.stream.as_str()))),
        Arc::new(StringArray::from_iter_values(evidence.iter().map(|e| e.file.as_str()))),
        Arc::new(Int64Array::from_iter_values(evidence.iter().map(|e| e.offset))),
        Arc::new(Int32Array::from_iter_values(evidence.iter().map(|e| e.length))),
        Arc::new(StringArray::from_iter_values(evidence.iter().map(|e| e.status.as_str()))),
        Arc::new(StringArray::from_iter(evidence.iter().map(|e| e.content_hash.as_deref()))),
    ];
    write_batch(path, schema, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dedups_spans_by_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spans.parquet");
        let spans = vec![
            Span { span_id: "s_1".into(), source_hash: "h".into(), byte_start: 0, byte_end: 1, text: "a".into() },
            Span { span_id: "s_1".into(), source_hash: "h".into(), byte_start: 0, byte_end: 1, text: "a".into() },
            Span { span_id: "s_2".into(), source_hash: "h".into(), byte_start: 1, byte_end: 2, text: "b".into() },
        ];
        write_spans(&spans, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn skips_empty_streams_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("streams.parquet");
        write_streams(&[], &path).unwrap();
        assert!(!path.exists());
    }
}
