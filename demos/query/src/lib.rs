//! Zero-copy query surface over a compiled Shard, grounded on the
//! teacher's `Vault`: mount the graph/evidence Parquet files as DuckDB
//! views and join across them the same way. This demo does not
//! verify the Shard first — pair it with `axm-verify` in front of any
//! real deployment.

use std::path::Path;
use std::sync::Mutex;

use duckdb::{params, Connection};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("missing required file: {0}")]
    MissingFile(String),
    #[error("database error: {0}")]
    Database(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinedClaim {
    pub claim_id: String,
    pub subject_label: String,
    pub subject_id: String,
    pub predicate: String,
    pub object: String,
    pub object_id: String,
    pub object_type: String,
    pub tier: i8,
    pub evidence: String,
    pub source_hash: String,
    pub byte_start: i64,
    pub byte_end: i64,
}

pub struct ShardView {
    conn: Mutex<Connection>,
}

impl ShardView {
    /// Mount a Shard's graph/ and evidence/ Parquet files as DuckDB
    /// views over an in-memory connection.
    pub fn mount(shard_path: &Path) -> Result<Self, QueryError> {
        let required = [
            "graph/claims.parquet",
            "graph/entities.parquet",
            "graph/provenance.parquet",
            "evidence/spans.parquet",
        ];
        for file in required {
            if !shard_path.join(file).exists() {
                return Err(QueryError::MissingFile(file.to_string()));
            }
        }

        let conn = Connection::open_in_memory().map_err(|e| QueryError::Database(e.to_string()))?;
        let mount_sql = format!(
            r#"
            CREATE OR REPLACE VIEW claims AS SELECT * FROM read_parquet('{}');
            CREATE OR REPLACE VIEW entities AS SELECT * FROM read_parquet('{}');
            CREATE OR REPLACE VIEW provenance AS SELECT * FROM read_parquet('{}');
            CREATE OR REPLACE VIEW spans AS SELECT * FROM read_parquet('{}');
            "#,
            shard_path.join("graph/claims.parquet").to_string_lossy(),
            shard_path.join("graph/entities.parquet").to_string_lossy(),
            shard_path.join("graph/provenance.parquet").to_string_lossy(),
            shard_path.join("evidence/spans.parquet").to_string_lossy(),
        );
        conn.execute_batch(&mount_sql)
            .map_err(|e| QueryError::Database(e.to_string()))?;

        Ok(ShardView { conn: Mutex::new(conn) })
    }

    /// Search claims whose subject label, object, or predicate contain
    /// `search_term` (case-insensitive), joined with provenance and
    /// span text where available.
    pub fn search(&self, search_term: &str, limit: i32) -> Result<Vec<JoinedClaim>, QueryError> {
        let conn = self.conn.lock().unwrap();
        let sql = r#"
            SELECT
                c.claim_id,
                subj.label as subject_label,
                subj.entity_id as subject_id,
                c.predicate,
                CASE WHEN c.object_type = 'entity' THEN COALESCE(obj.label, c.object) ELSE c.object END as object,
                CASE WHEN c.object_type = 'entity' THEN COALESCE(obj.entity_id, '') ELSE '' END as object_id,
                c.object_type,
                c.tier,
                COALESCE(s.text, '') as evidence,
                COALESCE(p.source_hash, '') as source_hash,
                COALESCE(p.byte_start, -1) as byte_start,
                COALESCE(p.byte_end, -1) as byte_end
            FROM claims c
            JOIN entities subj ON c.subject = subj.entity_id
            LEFT JOIN entities obj ON c.object = obj.entity_id AND c.object_type = 'entity'
            LEFT JOIN provenance p ON c.claim_id = p.claim_id
            LEFT JOIN spans s ON p.source_hash = s.source_hash
                AND p.byte_start = s.byte_start
                AND p.byte_end = s.byte_end
            WHERE (
                subj.label ILIKE ?
                OR (c.object_type = 'entity' AND obj.label ILIKE ?)
                OR (c.object_type != 'entity' AND c.object ILIKE ?)
                OR c.predicate ILIKE ?
            )
            ORDER BY c.tier ASC, c.claim_id
            LIMIT ?
        "#;

        let mut stmt = conn.prepare(sql).map_err(|e| QueryError::Database(e.to_string()))?;
        let pattern = format!("%{search_term}%");
        let rows = stmt
            .query_map(params![&pattern, &pattern, &pattern, &pattern, limit], |row| {
                Ok(JoinedClaim {
                    claim_id: row.get(0)?,
                    subject_label: row.get(1)?,
                    subject_id: row.get(2)?,
                    predicate: row.get(3)?,
                    object: row.get(4)?,
                    object_id: row.get(5)?,
                    object_type: row.get(6)?,
                    tier: row.get(7)?,
                    evidence: row.get(8)?,
                    source_hash: row.get(9)?,
                    byte_start: row.get(10)?,
                    byte_end: row.get(11)?,
                })
            })
            .map_err(|e| QueryError::Database(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| QueryError::Database(e.to_string()))?);
        }
        Ok(results)
    }
}
