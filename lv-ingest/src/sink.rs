//! Upsert sink
//!
//! Persists one album's drafts as a batch. Uniqueness of `song_name` and
//! `url` is checked before the insert, not enforced by the table, so two
//! batches racing on the same song can both land; the reconciler cleans up.

use crate::error::SinkError;
use lv_common::config::ConflictPolicy;
use lv_common::db::songs;
use lv_common::{KeyField, SongDraft};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Result of a successful batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkOutcome {
    pub inserted: usize,
    /// Records left out because they were already known
    pub skipped: usize,
}

#[derive(Clone)]
pub struct UpsertSink {
    db: SqlitePool,
    policy: ConflictPolicy,
}

impl UpsertSink {
    pub fn new(db: SqlitePool, policy: ConflictPolicy) -> Self {
        Self { db, policy }
    }

    /// Insert a batch
    ///
    /// With [`ConflictPolicy::DropBatch`] any collision (with a stored song
    /// or within the batch) rejects the whole batch with
    /// [`SinkError::ConstraintViolation`] and nothing is written.
    /// With [`ConflictPolicy::SkipRecord`] colliding records are left out.
    pub async fn upsert(&self, drafts: &[SongDraft]) -> Result<SinkOutcome, SinkError> {
        if drafts.is_empty() {
            return Ok(SinkOutcome::default());
        }

        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut seen_urls: HashSet<&str> = HashSet::new();
        let mut accepted: Vec<SongDraft> = Vec::with_capacity(drafts.len());
        let mut skipped = 0;

        for draft in drafts {
            let conflict = if !seen_names.insert(draft.song_name.as_str()) {
                Some(KeyField::SongName)
            } else if !seen_urls.insert(draft.url.as_str()) {
                Some(KeyField::Url)
            } else {
                songs::find_conflict(&self.db, draft).await?
            };

            match (conflict, self.policy) {
                (None, _) => accepted.push(draft.clone()),
                (Some(field), ConflictPolicy::DropBatch) => {
                    return Err(SinkError::ConstraintViolation {
                        field,
                        value: draft.key(field).to_string(),
                    });
                }
                (Some(field), ConflictPolicy::SkipRecord) => {
                    tracing::debug!(key = %field, value = %draft.key(field), "Skipping known song");
                    skipped += 1;
                }
            }
        }

        let inserted = if accepted.is_empty() {
            0
        } else {
            songs::insert_songs(&self.db, &accepted).await?
        };

        tracing::debug!(inserted, skipped, "Batch stored");
        Ok(SinkOutcome { inserted, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv_common::db::init_memory_database;

    fn draft(name: &str, url: &str) -> SongDraft {
        SongDraft {
            song_name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    async fn stored_count(pool: &SqlitePool) -> i64 {
        songs::count_songs(pool, None).await.unwrap()
    }

    #[tokio::test]
    async fn test_known_song_name_drops_batch() {
        let pool = init_memory_database().await.unwrap();
        let sink = UpsertSink::new(pool.clone(), ConflictPolicy::DropBatch);

        let first = sink.upsert(&[draft("A", "u1"), draft("B", "u2")]).await.unwrap();
        assert_eq!(first.inserted, 2);

        let err = sink
            .upsert(&[draft("C", "u3"), draft("A", "u9")])
            .await
            .unwrap_err();
        match err {
            SinkError::ConstraintViolation { field, value } => {
                assert_eq!(field, KeyField::SongName);
                assert_eq!(value, "A");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stored_count(&pool).await, 2);
    }

    #[tokio::test]
    async fn test_skip_record_keeps_new_songs() {
        let pool = init_memory_database().await.unwrap();
        let sink = UpsertSink::new(pool.clone(), ConflictPolicy::SkipRecord);

        sink.upsert(&[draft("A", "u1")]).await.unwrap();
        let outcome = sink
            .upsert(&[draft("A", "u1"), draft("B", "u1"), draft("C", "u3")])
            .await
            .unwrap();

        assert_eq!(outcome, SinkOutcome { inserted: 1, skipped: 2 });
        assert_eq!(stored_count(&pool).await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_within_batch() {
        let pool = init_memory_database().await.unwrap();

        let sink = UpsertSink::new(pool.clone(), ConflictPolicy::DropBatch);
        assert!(matches!(
            sink.upsert(&[draft("A", "u1"), draft("A2", "u1")]).await,
            Err(SinkError::ConstraintViolation { field: KeyField::Url, .. })
        ));
        assert_eq!(stored_count(&pool).await, 0);

        let sink = UpsertSink::new(pool.clone(), ConflictPolicy::SkipRecord);
        let outcome = sink.upsert(&[draft("A", "u1"), draft("A", "u2")]).await.unwrap();
        assert_eq!(outcome, SinkOutcome { inserted: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let pool = init_memory_database().await.unwrap();
        let sink = UpsertSink::new(pool, ConflictPolicy::DropBatch);
        assert_eq!(sink.upsert(&[]).await.unwrap(), SinkOutcome::default());
    }
}
