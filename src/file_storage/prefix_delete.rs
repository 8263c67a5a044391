//! # Recursive Prefix Deletion
//!
//! Removes every object whose key starts with a prefix by alternating one
//! list call and one batch delete until the listing has no continuation
//! token.
//!
//! Guarantees:
//! - On success no key under the prefix remains, placeholders included
//!   (modulo concurrent writers, which are not isolated).
//! - On failure the error carries how many objects were already removed.
//! - Pages are processed strictly in order; each list call depends on the
//!   token of the previous one.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::backend::{ListRequest, ObjectStore, MAX_DELETE_BATCH};
use super::errors::StorageError;
use crate::observability::Event;

/// Result of a completed prefix deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixDeleteOutcome {
    pub deleted_count: u64,
    /// List calls issued
    pub pages: usize,
}

/// A prefix deletion that stopped early
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prefix delete stopped after removing {deleted_count} objects: {source}")]
pub struct PrefixDeleteError {
    /// Objects removed before the failure
    pub deleted_count: u64,
    #[source]
    pub source: StorageError,
}

/// Recursive prefix deleter
#[derive(Debug, Clone)]
pub struct PrefixDeleter {
    store: Arc<dyn ObjectStore>,
    max_pages: Option<usize>,
}

impl PrefixDeleter {
    /// Create an unbounded deleter
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            max_pages: None,
        }
    }

    /// Stop with [`StorageError::PageLimitExceeded`] after `max_pages` list calls
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Delete every object whose key starts with `prefix`
    pub async fn delete_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<PrefixDeleteOutcome, PrefixDeleteError> {
        if prefix.is_empty() {
            return Err(PrefixDeleteError {
                deleted_count: 0,
                source: StorageError::EmptyPrefix,
            });
        }

        info!(event = %Event::PrefixDeleteStart, prefix, "deleting prefix");

        let mut continuation_token: Option<String> = None;
        let mut deleted_count: u64 = 0;
        let mut pages = 0usize;

        loop {
            if self.max_pages.is_some_and(|max| pages >= max) {
                return Err(self.fail(prefix, deleted_count, StorageError::PageLimitExceeded(pages)));
            }

            let request = ListRequest::recursive(prefix).with_token(continuation_token.take());
            let page = match self.store.list_objects(&request).await {
                Ok(page) => page,
                Err(e) => return Err(self.fail(prefix, deleted_count, e)),
            };
            pages += 1;

            let keys = page.keys();
            for batch in keys.chunks(MAX_DELETE_BATCH) {
                if let Err(e) = self.store.delete_objects(batch).await {
                    return Err(self.fail(prefix, deleted_count, e));
                }
                deleted_count += batch.len() as u64;
                debug!(
                    event = %Event::PrefixDeleteBatch,
                    prefix,
                    page = pages,
                    batch = batch.len(),
                    deleted_count,
                );
            }

            match page.next_continuation_token {
                Some(token) if !token.is_empty() => continuation_token = Some(token),
                _ => break,
            }
        }

        info!(
            event = %Event::PrefixDeleteComplete,
            prefix,
            deleted_count,
            pages,
            "prefix deleted"
        );

        Ok(PrefixDeleteOutcome {
            deleted_count,
            pages,
        })
    }

    fn fail(&self, prefix: &str, deleted_count: u64, source: StorageError) -> PrefixDeleteError {
        warn!(
            event = %Event::PrefixDeleteFailed,
            prefix,
            deleted_count,
            error = %source,
            "prefix delete stopped"
        );
        PrefixDeleteError {
            deleted_count,
            source,
        }
    }
}
