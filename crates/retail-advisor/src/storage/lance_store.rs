use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator,
    StringArray, UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use lancedb::query::{ExecutableQuery, QueryBase};
use std::path::Path;
use std::sync::Arc;

use crate::types::ChunkRecord;

/// One LanceDB database per responder, holding a single `documents` table.
pub struct LanceStore {
    db: lancedb::Connection,
    dimension: usize,
    table_name: String,
}

impl LanceStore {
    pub async fn open(path: &Path, dimension: usize) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create index folder {}", path.display()))?;
        let uri = path.to_string_lossy().to_string();
        let db = lancedb::connect(&uri)
            .execute()
            .await
            .with_context(|| format!("Failed to connect to LanceDB at {}", uri))?;

        Ok(Self {
            db,
            dimension,
            table_name: "documents".to_string(),
        })
    }

    fn schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("doc_id", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("row", DataType::UInt32, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension as i32,
                ),
                true,
            ),
            Field::new("metadata_json", DataType::Utf8, false),
            Field::new("created_at", DataType::Int64, false),
        ]))
    }

    async fn has_table(&self) -> Result<bool> {
        let names = self.db.table_names().execute().await?;
        Ok(names.contains(&self.table_name))
    }

    /// True when a previously built, non-empty index is present.
    pub async fn exists(&self) -> Result<bool> {
        if !self.has_table().await? {
            return Ok(false);
        }
        Ok(self.count().await? > 0)
    }

    /// Replace the table contents with `chunks`.
    pub async fn create_or_replace(&self, chunks: Vec<ChunkRecord>) -> Result<usize> {
        if self.has_table().await? {
            self.db
                .drop_table(&self.table_name, &[])
                .await
                .context("Failed to drop stale documents table")?;
        }

        let len = chunks.len();
        let schema = self.schema();
        let batch = self.to_record_batch(&chunks, schema.clone())?;
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
        self.db
            .create_table(&self.table_name, Box::new(batches))
            .execute()
            .await
            .context("Failed to create documents table")?;

        tracing::debug!("Inserted {} chunks into LanceDB", len);
        Ok(len)
    }

    fn to_record_batch(&self, chunks: &[ChunkRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        let doc_ids: Vec<&str> = chunks.iter().map(|c| c.doc_id.as_str()).collect();
        let chunk_indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let sources: Vec<&str> = chunks.iter().map(|c| c.source.as_str()).collect();
        let rows: Vec<u32> = chunks.iter().map(|c| c.row).collect();
        let metadata_jsons: Vec<&str> = chunks.iter().map(|c| c.metadata_json.as_str()).collect();
        let created_ats: Vec<i64> = chunks.iter().map(|c| c.created_at).collect();

        if let Some(bad) = chunks.iter().find(|c| c.vector.len() != self.dimension) {
            anyhow::bail!(
                "Chunk {} has {} dimensions, index expects {}",
                bad.id,
                bad.vector.len(),
                self.dimension
            );
        }

        // Build FixedSizeListArray for vectors
        let flat_vectors: Vec<f32> = chunks.iter().flat_map(|c| c.vector.iter().copied()).collect();
        let values = Float32Array::from(flat_vectors);
        let vector_field = Field::new("item", DataType::Float32, true);
        let vector_array = FixedSizeListArray::try_new(
            Arc::new(vector_field),
            self.dimension as i32,
            Arc::new(values) as Arc<dyn Array>,
            None,
        )
        .with_context(|| format!("Vectors do not match index dimension {}", self.dimension))?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)) as Arc<dyn Array>,
                Arc::new(StringArray::from(doc_ids)),
                Arc::new(UInt32Array::from(chunk_indices)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(sources)),
                Arc::new(UInt32Array::from(rows)),
                Arc::new(vector_array) as Arc<dyn Array>,
                Arc::new(StringArray::from(metadata_jsons)),
                Arc::new(Int64Array::from(created_ats)),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    pub async fn vector_search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let table = self.db.open_table(&self.table_name).execute().await?;

        let results = table
            .query()
            .nearest_to(query)?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .context("LanceDB vector search failed")?;

        let batches: Vec<RecordBatch> = futures::TryStreamExt::try_collect(results).await?;
        let mut hits = extract_hits_from_batches(&batches);
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[cfg(test)]
    pub(crate) async fn delete_all(&self) -> Result<()> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        table.delete("row >= 0").await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        let count = table.count_rows(None).await?;
        Ok(count)
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub source: String,
    pub row: u32,
    pub score: f32,
}

fn extract_hits_from_batches(batches: &[RecordBatch]) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for batch in batches {
        let ids = batch.column_by_name("id").and_then(|c| c.as_any().downcast_ref::<StringArray>());
        let texts = batch.column_by_name("text").and_then(|c| c.as_any().downcast_ref::<StringArray>());
        let sources = batch.column_by_name("source").and_then(|c| c.as_any().downcast_ref::<StringArray>());
        let rows = batch.column_by_name("row").and_then(|c| c.as_any().downcast_ref::<UInt32Array>());
        let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        let (Some(ids), Some(texts), Some(sources)) = (ids, texts, sources) else {
            continue;
        };

        for i in 0..batch.num_rows() {
            let score = distances.map(|d| (1.0 - d.value(i)).max(0.0)).unwrap_or(0.0);

            hits.push(SearchHit {
                id: ids.value(i).to_string(),
                text: texts.value(i).to_string(),
                source: sources.value(i).to_string(),
                row: rows.map(|r| r.value(i)).unwrap_or(0),
                score,
            });
        }
    }
    hits
}
