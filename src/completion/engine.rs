/*!
 * Completion engine
 *
 * Core completion logic responsible for:
 * - Classifying the input before the cursor
 * - Gathering candidates from the dialect and the metadata cache
 * - Filtering, deduplicating and sorting them
 */

use super::context::{detect_context, table_names_in_input, CompletionContext};
use super::metadata::MetadataCache;
use super::suggestion::Completion;
use super::tokenizer::last_incomplete_word;
use crate::database::Dialect;
use crate::error::Error;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::debug;

pub struct CompletionEngine {
    cache: Arc<MetadataCache>,
    dialect: Arc<dyn Dialect>,
    runtime: Handle,
    timeout: Duration,
}

impl CompletionEngine {
    pub fn new(
        cache: Arc<MetadataCache>,
        dialect: Arc<dyn Dialect>,
        runtime: Handle,
        timeout: Duration,
    ) -> Self {
        Self {
            cache,
            dialect,
            runtime,
            timeout,
        }
    }

    /// Blocking entry point for the line editor. `pos` is a byte offset.
    /// Must be called from outside the runtime.
    pub fn complete_line(&self, line: &str, pos: usize) -> Completion {
        let input = line.get(..pos).unwrap_or(line);
        self.runtime.block_on(self.complete(input))
    }

    /// Complete the word at the end of `input`. Metadata lookups share one
    /// deadline; a failed or slow source contributes no candidates.
    pub async fn complete(&self, input: &str) -> Completion {
        let prefix = last_incomplete_word(input);
        let deadline = Instant::now() + self.timeout;

        let candidates = match detect_context(input) {
            CompletionContext::Table => self.tables(deadline).await,
            CompletionContext::Database => self.databases(deadline).await,
            CompletionContext::Column => {
                let mut candidates = self.columns(input, deadline).await;
                candidates.extend(self.keywords());
                candidates
            }
            CompletionContext::KeywordOrTable => {
                let mut candidates = self.keywords();
                candidates.extend(self.tables(deadline).await);
                candidates
            }
        };

        Completion::new(filter_candidates(prefix, candidates), prefix.chars().count())
    }

    fn keywords(&self) -> Vec<String> {
        self.dialect.keywords().iter().map(|k| k.to_string()).collect()
    }

    async fn tables(&self, deadline: Instant) -> Vec<String> {
        match self.cache.tables(deadline).await {
            Ok(tables) => tables.to_vec(),
            Err(e) => {
                debug!(error = %e, "table candidates unavailable");
                Vec::new()
            }
        }
    }

    async fn databases(&self, deadline: Instant) -> Vec<String> {
        match self.cache.databases(deadline).await {
            Ok(databases) => databases.to_vec(),
            Err(e) => {
                debug!(error = %e, "database candidates unavailable");
                Vec::new()
            }
        }
    }

    /// Columns of the tables named in the input, or of every table when
    /// none are named.
    async fn columns(&self, input: &str, deadline: Instant) -> Vec<String> {
        let tables = table_names_in_input(input);
        if tables.is_empty() {
            return match self.cache.all_columns(deadline).await {
                Ok(columns) => columns,
                Err(e) => {
                    debug!(error = %e, "column candidates unavailable");
                    Vec::new()
                }
            };
        }

        let mut names = Vec::new();
        for table in &tables {
            match self.cache.columns(table, deadline).await {
                Ok(columns) => names.extend(columns.iter().map(|c| c.name.clone())),
                Err(e @ Error::Timeout(_)) => {
                    debug!(%table, error = %e, "column lookup out of time");
                    break;
                }
                Err(e) => debug!(%table, error = %e, "column candidates unavailable"),
            }
        }
        names
    }
}

/// Keep candidates starting with `prefix` (ignoring case), drop
/// case-insensitive duplicates keeping the first spelling, and sort.
pub fn filter_candidates(prefix: &str, candidates: Vec<String>) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    let mut seen = HashSet::new();
    let mut matches: Vec<String> = candidates
        .into_iter()
        .filter(|c| {
            let lower = c.to_lowercase();
            lower.starts_with(&prefix) && seen.insert(lower)
        })
        .collect();
    matches.sort();
    matches
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
