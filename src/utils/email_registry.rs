use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

use crate::store::{Store, StoreError};

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Fast answers to "is this email already registered?" for signup.
///
/// The cuckoo filter gives a definite *no*; the moka cache gives a definite
/// *yes* for recently seen emails. Everything else falls through to the store.
/// The unique index on `users.email` stays authoritative.
pub struct EmailRegistry {
    filter: RwLock<CuckooFilter<String>>,
    /// true => email is TAKEN (only taken emails are stored)
    taken: Cache<String, bool>,
}

impl Default for EmailRegistry {
    fn default() -> Self {
        Self::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)
    }
}

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl EmailRegistry {
    pub fn new(capacity: usize, false_positive_rate: f64) -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(capacity, false_positive_rate)),
            taken: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(86_400)) // 24h TTL
                .build(),
        }
    }

    /// false => definitely not registered
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    pub async fn mark_taken(&self, email: &str) {
        let email = normalize(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
        self.taken.insert(email, true).await;
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_available(&self, email: &str, store: &dyn Store) -> Result<bool, StoreError> {
        // 1️⃣ Cuckoo filter: fast negative
        if !self.might_exist(email) {
            return Ok(true);
        }

        // 2️⃣ Moka cache: fast positive
        if self.taken.get(&normalize(email)).await.unwrap_or(false) {
            return Ok(false);
        }

        // 3️⃣ Store fallback
        Ok(!store.email_exists(&normalize(email)).await?)
    }

    fn insert_batch(&self, emails: &[String]) {
        let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
        for email in emails {
            filter.add(email);
        }
    }

    /// Loads every registered email into the filter, streaming in batches.
    /// Users created in the last `recent_days` days also go into the cache.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize, recent_days: u32) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT email, created_at >= NOW() - INTERVAL ? DAY
            FROM users
            "#,
        )
        .bind(recent_days)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;
        let mut recent = 0usize;

        while let Some(row) = stream.next().await {
            let (email, is_recent) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            let email = normalize(&email);

            if is_recent != 0 {
                self.taken.insert(email.clone(), true).await;
                recent += 1;
            }

            batch.push(email);
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        log::info!(
            "Email registry warmup complete: {} users, {} recent (last {} days)",
            total,
            recent,
            recent_days
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::NewUser;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn unknown_email_is_available_without_store_hit() {
        let registry = EmailRegistry::new(1_000, 0.001);
        let store = MemoryStore::new();
        assert!(!registry.might_exist("new@example.com"));
        assert!(registry.is_available("new@example.com", &store).await.unwrap());
    }

    #[tokio::test]
    async fn marked_email_is_taken_regardless_of_case() {
        let registry = EmailRegistry::new(1_000, 0.001);
        let store = MemoryStore::new();
        registry.mark_taken("Ada@Example.com").await;

        assert!(registry.might_exist("ada@example.com"));
        assert!(!registry.is_available(" ada@example.com ", &store).await.unwrap());
    }

    #[tokio::test]
    async fn store_decides_when_cache_is_cold() {
        let registry = EmailRegistry::new(1_000, 0.001);
        let store = MemoryStore::new();
        store
            .register_user(NewUser {
                email: "ada@example.com".into(),
                password_hash: "x".into(),
                name: "Ada".into(),
            })
            .await
            .unwrap();

        // filter knows the email but the cache entry is gone
        registry.mark_taken("ada@example.com").await;
        registry.taken.invalidate("ada@example.com").await;

        assert!(!registry.is_available("ada@example.com", &store).await.unwrap());
    }
}
