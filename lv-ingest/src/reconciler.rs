//! Duplicate reconciler
//!
//! Restores "at most one song per `song_name` and per `url`" after the fact.
//! For each key the first stored song of a group is kept and the rest are
//! deleted. Liked-song references to a deleted song are moved onto the
//! kept one, so users do not silently lose likes.
//!
//! The grouping is a snapshot: songs inserted by a concurrent crawl after
//! it was taken are picked up by the next pass.

use crate::report::{DuplicateGroup, ReconcileReport};
use lv_common::db::songs;
use lv_common::{KeyField, Result};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct Reconciler {
    db: SqlitePool,
}

impl Reconciler {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// One pass over every unique key
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        for field in KeyField::ALL {
            self.reconcile_key(field, &mut report).await?;
        }

        tracing::info!(
            groups = report.groups.len(),
            removed = report.total_removed,
            "Duplicate reconciliation finished"
        );
        Ok(report)
    }

    async fn reconcile_key(&self, field: KeyField, report: &mut ReconcileReport) -> Result<()> {
        let groups = songs::duplicate_groups(&self.db, field).await?;
        tracing::debug!(key = %field, groups = groups.len(), "Duplicate groups found");

        for group in groups {
            let Some((keep, remove)) = group.ids.split_first() else {
                continue;
            };

            let mut tx = self.db.begin().await?;
            let moved = songs::repoint_liked_songs(&mut *tx, remove, *keep).await?;
            let removed = songs::delete_songs(&mut *tx, remove).await?;
            tx.commit().await?;

            tracing::info!(
                key = %field,
                value = %group.value,
                removed,
                likes_moved = moved,
                "Removed duplicates"
            );

            report.total_removed += removed;
            report.groups.push(DuplicateGroup {
                key: field,
                value: group.value,
                removed,
            });
        }

        Ok(())
    }
}
