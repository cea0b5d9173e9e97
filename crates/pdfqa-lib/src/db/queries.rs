#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::collections::HashMap;

use anyhow::Context;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::corpus::document::DocumentMetadata;
use crate::pipeline::chunker::Chunk;

/// Build record stored alongside the chunks in `index_meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    /// Digest of the corpus and build parameters the index was built from.
    pub fingerprint: String,
    pub model_id: String,
    pub dimension: usize,
    pub chunk_count: usize,
    /// RFC 3339 timestamp of the build.
    pub built_at: String,
}

/// Insert one chunk with its embedding.
pub fn insert_chunk(conn: &Connection, chunk: &Chunk, embedding: &[f32]) -> anyhow::Result<()> {
    let meta = &chunk.metadata;
    conn.execute(
        "INSERT INTO chunks (id, source_name, page_number, chunk_index, start_offset, text,
                             header, title, author, subject, creation_date, mod_date, embedding)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            chunk.id as i64,
            meta.source_name,
            meta.page_number,
            chunk.chunk_index as i64,
            chunk.start as i64,
            chunk.text,
            chunk.header,
            meta.title,
            meta.author,
            meta.subject,
            meta.creation_date,
            meta.mod_date,
            encode_embedding(embedding),
        ],
    )
    .with_context(|| format!("Failed to insert chunk {}", chunk.id))?;
    Ok(())
}

/// Load every chunk and its embedding, ordered by chunk id.
pub fn load_chunks(conn: &Connection) -> anyhow::Result<Vec<(Chunk, Vec<f32>)>> {
    let mut stmt = conn.prepare(
        "SELECT id, source_name, page_number, chunk_index, start_offset, text, header,
                title, author, subject, creation_date, mod_date, embedding
         FROM chunks
         ORDER BY id ASC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let chunk = Chunk {
                id: row.get::<_, i64>(0)? as usize,
                chunk_index: row.get::<_, i64>(3)? as usize,
                start: row.get::<_, i64>(4)? as usize,
                text: row.get(5)?,
                header: row.get(6)?,
                metadata: DocumentMetadata {
                    source_name: row.get(1)?,
                    page_number: row.get(2)?,
                    title: row.get(7)?,
                    author: row.get(8)?,
                    subject: row.get(9)?,
                    creation_date: row.get(10)?,
                    mod_date: row.get(11)?,
                },
            };
            let blob: Vec<u8> = row.get(12)?;
            Ok((chunk, blob))
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load chunks")?;

    let chunks = rows
        .into_iter()
        .map(|(chunk, blob)| {
            let embedding = decode_embedding(&blob)
                .with_context(|| format!("Chunk {} has a malformed embedding", chunk.id))?;
            Ok((chunk, embedding))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    debug!(chunk_count = chunks.len(), "Loaded chunks");
    Ok(chunks)
}

/// Write the build record, replacing any previous values.
pub fn write_meta(conn: &Connection, meta: &IndexMeta) -> anyhow::Result<()> {
    let entries = [
        ("fingerprint", meta.fingerprint.clone()),
        ("model_id", meta.model_id.clone()),
        ("dimension", meta.dimension.to_string()),
        ("chunk_count", meta.chunk_count.to_string()),
        ("built_at", meta.built_at.clone()),
    ];
    for (key, value) in entries {
        conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .with_context(|| format!("Failed to write index meta '{key}'"))?;
    }
    Ok(())
}

/// Read the build record. Returns `None` when no build has completed.
pub fn read_meta(conn: &Connection) -> anyhow::Result<Option<IndexMeta>> {
    let mut stmt = conn.prepare("SELECT key, value FROM index_meta")?;
    let values: HashMap<String, String> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()
        .context("Failed to read index meta")?;

    let Some(fingerprint) = values.get("fingerprint").cloned() else {
        return Ok(None);
    };
    let number = |key: &str| -> anyhow::Result<usize> {
        values
            .get(key)
            .with_context(|| format!("index meta is missing '{key}'"))?
            .parse()
            .with_context(|| format!("index meta '{key}' is not a number"))
    };

    Ok(Some(IndexMeta {
        fingerprint,
        model_id: values.get("model_id").cloned().unwrap_or_default(),
        dimension: number("dimension")?,
        chunk_count: number("chunk_count")?,
        built_at: values.get("built_at").cloned().unwrap_or_default(),
    }))
}

/// Serialize an embedding as little-endian `f32`s.
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn decode_embedding(blob: &[u8]) -> anyhow::Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        anyhow::bail!("embedding blob length {} is not a multiple of 4", blob.len());
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
