/*!
 * Database metadata cache
 *
 * Read-through TTL cache in front of a `MetadataProvider`:
 * - table list, per-table columns and database list expire independently
 * - expiry is checked lazily on access, there is no eviction task
 * - lookups take the read lock; a miss takes the write lock and re-checks
 *   before fetching, so concurrent callers never fetch the same entry twice
 * - failures are returned to the caller and never cached
 * - no fetch starts after the caller's deadline; one already running
 *   finishes in the background and is cached
 */

use crate::database::{ColumnInfo, MetadataProvider};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct Entry<T> {
    value: Arc<T>,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn live(&self, now: Instant) -> Option<Arc<T>> {
        (now < self.expires_at).then(|| Arc::clone(&self.value))
    }
}

#[derive(Default)]
struct CacheState {
    tables: Option<Entry<Vec<String>>>,
    columns: HashMap<String, Entry<Vec<ColumnInfo>>>,
    databases: Option<Entry<Vec<String>>>,
}

pub struct MetadataCache {
    provider: Arc<dyn MetadataProvider>,
    ttl: Duration,
    state: Arc<RwLock<CacheState>>,
}

impl MetadataCache {
    pub fn new(provider: Arc<dyn MetadataProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn tables(&self, deadline: Instant) -> Result<Arc<Vec<String>>> {
        self.read_through(
            "tables",
            deadline,
            |state, now| state.tables.as_ref().and_then(|e| e.live(now)),
            |state, entry| state.tables = Some(entry),
            |provider| provider.list_tables(),
        )
        .await
    }

    pub async fn columns(&self, table: &str, deadline: Instant) -> Result<Arc<Vec<ColumnInfo>>> {
        let store_key = table.to_string();
        let fetch_key = table.to_string();
        self.read_through(
            "columns",
            deadline,
            |state, now| state.columns.get(table).and_then(|e| e.live(now)),
            move |state, entry| {
                state.columns.insert(store_key, entry);
            },
            move |provider| provider.list_columns(&fetch_key),
        )
        .await
    }

    pub async fn databases(&self, deadline: Instant) -> Result<Arc<Vec<String>>> {
        self.read_through(
            "databases",
            deadline,
            |state, now| state.databases.as_ref().and_then(|e| e.live(now)),
            |state, entry| state.databases = Some(entry),
            |provider| provider.list_databases(),
        )
        .await
    }

    /// Column names across every known table, first occurrence first.
    /// Tables whose columns cannot be fetched are skipped; once the deadline
    /// passes the remaining tables are not looked at.
    pub async fn all_columns(&self, deadline: Instant) -> Result<Vec<String>> {
        let tables = self.tables(deadline).await?;
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for table in tables.iter() {
            match self.columns(table, deadline).await {
                Ok(columns) => {
                    for column in columns.iter() {
                        if seen.insert(column.name.clone()) {
                            names.push(column.name.clone());
                        }
                    }
                }
                Err(e @ Error::Timeout(_)) => {
                    debug!(%table, error = %e, "column union stopped at deadline");
                    break;
                }
                Err(e) => debug!(%table, error = %e, "skipping table in column union"),
            }
        }
        Ok(names)
    }

    /// Drop every entry so the next access of each kind refetches.
    pub async fn reload(&self) {
        let mut state = self.state.write().await;
        *state = CacheState::default();
        debug!("metadata cache cleared");
    }

    async fn read_through<T, L, S, F>(
        &self,
        what: &'static str,
        deadline: Instant,
        lookup: L,
        store: S,
        fetch: F,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        L: Fn(&CacheState, Instant) -> Option<Arc<T>>,
        S: FnOnce(&mut CacheState, Entry<T>) + Send + 'static,
        F: FnOnce(&dyn MetadataProvider) -> Result<T> + Send + 'static,
    {
        let budget = deadline.saturating_duration_since(Instant::now());
        tokio::time::timeout_at(deadline, self.fill(what, deadline, budget, lookup, store, fetch))
            .await
            .map_err(|_| Error::Timeout(budget))?
    }

    async fn fill<T, L, S, F>(
        &self,
        what: &'static str,
        deadline: Instant,
        budget: Duration,
        lookup: L,
        store: S,
        fetch: F,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        L: Fn(&CacheState, Instant) -> Option<Arc<T>>,
        S: FnOnce(&mut CacheState, Entry<T>) + Send + 'static,
        F: FnOnce(&dyn MetadataProvider) -> Result<T> + Send + 'static,
    {
        if let Some(value) = lookup(&*self.state.read().await, Instant::now()) {
            return Ok(value);
        }

        let mut state = Arc::clone(&self.state).write_owned().await;
        // Another caller may have filled the entry while we waited.
        if let Some(value) = lookup(&*state, Instant::now()) {
            debug!(what, "metadata filled by concurrent fetch");
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout(budget));
        }

        debug!(what, "metadata cache miss, fetching");
        let provider = Arc::clone(&self.provider);
        let ttl = self.ttl;
        // The task owns the write guard, so a caller that stops waiting
        // still gets the result cached for the next lookup.
        let task = tokio::spawn(async move {
            let value = tokio::task::spawn_blocking(move || fetch(&*provider))
                .await?
                .map_err(|e| Error::metadata(what, e))?;
            let value = Arc::new(value);
            store(
                &mut *state,
                Entry {
                    value: Arc::clone(&value),
                    expires_at: Instant::now() + ttl,
                },
            );
            Ok::<_, Error>(value)
        });
        task.await?
    }
}
