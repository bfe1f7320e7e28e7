//! Routine catalog use-case service.
//!
//! # Responsibility
//! - Fetch the routine catalog, logging non-fatal decode skips.
//! - Answer and record per-user purchases idempotently.
//!
//! # Invariants
//! - A user's purchased-routine set only grows; no refund surface exists.
//! - Re-purchasing returns the original purchase record unchanged.

use crate::model::routine::{Purchase, RoutineTask};
use crate::repo::catalog_repo::{CatalogRepository, CatalogResult, RoutineCatalog};
use chrono::Utc;
use log::warn;
use std::collections::HashSet;

/// Catalog service facade for one user session.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
    user_id: String,
}

impl<R: CatalogRepository> CatalogService<R> {
    /// Creates a service for the given user over a repository implementation.
    pub fn new(repo: R, user_id: impl Into<String>) -> Self {
        Self {
            repo,
            user_id: user_id.into(),
        }
    }

    /// Fetches all routines; individually malformed records are skipped and
    /// reported in the returned catalog (and logged here).
    pub fn fetch_routines(&self) -> CatalogResult<RoutineCatalog> {
        let catalog = self.repo.list_routines()?;
        for warning in &catalog.warnings {
            warn!(
                "event=routine_decode_skipped module=catalog status=warn routine_id={} reason={}",
                warning.routine_id, warning.reason
            );
        }
        Ok(catalog)
    }

    /// Fetches the ids of routines this user has purchased; empty when none.
    pub fn purchased_ids(&self) -> CatalogResult<HashSet<String>> {
        self.repo.list_purchases(&self.user_id)
    }

    /// Whether `routine_id` is in a previously fetched purchased-id set.
    pub fn is_purchased(&self, purchased: &HashSet<String>, routine_id: &str) -> bool {
        purchased.contains(routine_id)
    }

    /// Purchases a routine at the current time; idempotent per pair.
    pub fn purchase(&self, routine_id: &str) -> CatalogResult<Purchase> {
        self.purchase_at(routine_id, Utc::now().timestamp())
    }

    /// Purchases a routine with an explicit purchase instant.
    ///
    /// Repeated calls for the same routine return the original record; the
    /// backing write is an upsert keyed by the `(user, routine)` pair.
    pub fn purchase_at(&self, routine_id: &str, purchase_date: i64) -> CatalogResult<Purchase> {
        let purchase = Purchase {
            user_id: self.user_id.clone(),
            routine_id: routine_id.to_string(),
            purchase_date,
        };
        self.repo.record_purchase(&purchase)
    }

    /// Appends one task template to an existing routine.
    pub fn add_task(&self, routine_id: &str, task: &RoutineTask) -> CatalogResult<()> {
        self.repo.append_task(routine_id, task)
    }
}
