//! Activity audit trail.
//!
//! Writes are fire-and-forget: a failed audit insert is logged server-side
//! and never fails the request that triggered it. Reads go through the same
//! scope filters as every other tenant entity. A background sweeper enforces
//! the configured retention window.

use std::time::Duration;

use bson::{doc, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::Collection;

use crate::config::AuditConfig;
use crate::db::Store;
use crate::error::ApiError;
use crate::models::{AuditLogEntry, User};

/// Actor id recorded for entries produced by the platform itself.
const SYSTEM_ACTOR: &str = "system";

#[derive(Clone)]
pub struct AuditLogger {
    collection: Collection<AuditLogEntry>,
}

impl AuditLogger {
    pub fn new(store: &Store) -> Self {
        Self {
            collection: store.audit_logs(),
        }
    }

    /// Record an action performed by an authenticated user.
    ///
    /// Returns immediately; the insert completes on a background task.
    pub fn record(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: &str,
        user: &User,
        company_id: Option<String>,
        changes: Document,
    ) {
        self.spawn_insert(AuditLogEntry::new(
            entity_type,
            entity_id,
            action,
            user.id.clone(),
            user.name.clone(),
            company_id,
            changes,
        ));
    }

    /// Record an action with no human actor, e.g. self-service registration.
    pub fn record_system(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: &str,
        company_id: Option<String>,
        changes: Document,
    ) {
        self.spawn_insert(AuditLogEntry::new(
            entity_type,
            entity_id,
            action,
            SYSTEM_ACTOR.to_string(),
            "System".to_string(),
            company_id,
            changes,
        ));
    }

    fn spawn_insert(&self, entry: AuditLogEntry) {
        let collection = self.collection.clone();
        tokio::spawn(async move {
            if let Err(err) = collection.insert_one(&entry, None).await {
                tracing::warn!(
                    entity_type = %entry.entity_type,
                    entity_id = %entry.entity_id,
                    action = %entry.action,
                    "audit log write failed: {}",
                    err
                );
            }
        });
    }

    /// Fetch entries matching `scope_filter`, newest first.
    pub async fn query(
        &self,
        mut scope_filter: Document,
        entity_type: Option<String>,
        limit: i64,
        max_limit: i64,
    ) -> Result<Vec<AuditLogEntry>, ApiError> {
        if let Some(entity_type) = entity_type {
            scope_filter.insert("entity_type", entity_type);
        }

        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .limit(limit.clamp(1, max_limit))
            .build();

        let entries = self
            .collection
            .find(scope_filter, options)
            .await?
            .try_collect()
            .await?;
        Ok(entries)
    }

    /// Delete entries older than `cutoff` across all tenants.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, ApiError> {
        // Timestamps are stored as RFC 3339 strings, which order
        // lexicographically at this precision.
        let cutoff = cutoff.to_rfc3339_opts(SecondsFormat::Micros, true);
        let result = self
            .collection
            .delete_many(doc! { "timestamp": { "$lt": &cutoff } }, None)
            .await?;
        if result.deleted_count > 0 {
            tracing::info!(deleted = result.deleted_count, %cutoff, "purged expired audit entries");
        }
        Ok(result.deleted_count)
    }
}

/// Periodically purge entries past the retention window. Runs until the
/// process exits; a failed sweep is retried on the next tick.
pub async fn run_retention_sweeper(logger: AuditLogger, config: AuditConfig) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
    tracing::info!(
        retention_days = config.retention_days,
        interval_secs = config.sweep_interval_secs,
        "audit retention sweeper started"
    );
    loop {
        ticker.tick().await;
        let cutoff = Utc::now() - chrono::Duration::days(config.retention_days);
        if let Err(err) = logger.purge_older_than(cutoff).await {
            tracing::error!("audit retention sweep failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_entries_carry_the_reserved_actor() {
        let entry = AuditLogEntry::new(
            "company",
            "c-1",
            "registered",
            SYSTEM_ACTOR.to_string(),
            "System".to_string(),
            Some("c-1".to_string()),
            doc! { "name": "Acme" },
        );
        assert_eq!(entry.user_id, "system");
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn rfc3339_cutoffs_order_lexicographically() {
        let older = Utc::now() - chrono::Duration::days(31);
        let newer = Utc::now();
        let a = older.to_rfc3339_opts(SecondsFormat::Micros, true);
        let b = newer.to_rfc3339_opts(SecondsFormat::Micros, true);
        assert!(a < b);
    }
}
