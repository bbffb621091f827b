//! Contrat des fournisseurs de cache et cache en mémoire
//!
//! Le dispatcher consulte un [`CacheProvider`] avant tout appel réseau et lui
//! confie en tâche de fond chaque issue de niveau domaine : un résultat
//! normalisé ou une erreur rapportée par le service. Le cache est purement
//! consultatif : une erreur de lecture vaut un défaut de cache, une erreur
//! d'écriture est journalisée puis ignorée.
//!
//! La fraîcheur des entrées est décidée par le fournisseur à partir des
//! en-têtes de la réponse (voir [`freshness`]).

use crate::envelope::Payload;
use crate::error::{ApiError, Result};
use crate::identity::CallIdentity;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache as MokaCache;
use reqwest::header::{CACHE_CONTROL, HeaderMap};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Issue d'un appel conservée en cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachedOutcome {
    /// Résultat déjà normalisé
    Payload(Payload),
    /// Erreur rapportée par le service (cache négatif)
    Error(ApiError),
}

/// Fournisseur de cache partagé entre les appels concurrents
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Retourne l'issue mémorisée pour cet appel, `None` en cas de défaut
    async fn lookup(&self, identity: &CallIdentity) -> Result<Option<CachedOutcome>>;

    /// Mémorise une issue ; appelé en tâche de fond, le résultat n'est jamais
    /// remonté à l'appelant d'origine
    async fn store(
        &self,
        identity: &CallIdentity,
        outcome: CachedOutcome,
        headers: &HeaderMap,
    ) -> Result<()>;
}

/// Durée de vie d'une réponse d'après ses en-têtes
///
/// - `Cache-Control: no-store` ou `no-cache` : ne pas stocker (`None`)
/// - `Cache-Control: max-age=N` : N secondes (`None` si N = 0)
/// - sinon : `default_ttl`
pub fn freshness(headers: &HeaderMap, default_ttl: Duration) -> Option<Duration> {
    for value in headers.get_all(CACHE_CONTROL) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for directive in value.split(',') {
            let directive = directive.trim().to_ascii_lowercase();
            if directive == "no-store" || directive == "no-cache" {
                return None;
            }
            if let Some(seconds) = directive.strip_prefix("max-age=") {
                return match seconds.trim_matches('"').parse::<u64>() {
                    Ok(0) => None,
                    Ok(seconds) => Some(Duration::from_secs(seconds)),
                    Err(_) => Some(default_ttl),
                };
            }
        }
    }
    Some(default_ttl)
}

// ============ Sans cache ============

/// Fournisseur qui ne mémorise rien
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl CacheProvider for NoCache {
    async fn lookup(&self, _identity: &CallIdentity) -> Result<Option<CachedOutcome>> {
        Ok(None)
    }

    async fn store(
        &self,
        _identity: &CallIdentity,
        _outcome: CachedOutcome,
        _headers: &HeaderMap,
    ) -> Result<()> {
        Ok(())
    }
}

// ============ Cache mémoire ============

#[derive(Debug, Clone)]
struct Entry {
    outcome: CachedOutcome,
    ttl: Duration,
}

/// Expiration propre à chaque entrée
struct EntryExpiry;

impl Expiry<CallIdentity, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CallIdentity,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    /// Un nouveau stockage repart du TTL de la nouvelle réponse
    fn expire_after_update(
        &self,
        _key: &CallIdentity,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache en mémoire borné, avec TTL par entrée
#[derive(Clone)]
pub struct MemoryCache {
    entries: MokaCache<CallIdentity, Entry>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Crée un cache avec les paramètres par défaut
    pub fn new() -> Self {
        Self::with_capacity(
            crate::config::DEFAULT_CACHE_CAPACITY,
            Duration::from_secs(crate::config::DEFAULT_CACHE_TTL_SECS),
        )
    }

    /// Crée un cache avec une capacité et un TTL par défaut spécifiques
    pub fn with_capacity(max_capacity: u64, default_ttl: Duration) -> Self {
        Self {
            entries: MokaCache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryExpiry)
                .build(),
            default_ttl,
        }
    }

    /// Nombre d'entrées vivantes
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    /// Vide le cache
    pub async fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheProvider for MemoryCache {
    async fn lookup(&self, identity: &CallIdentity) -> Result<Option<CachedOutcome>> {
        Ok(self.entries.get(identity).await.map(|entry| entry.outcome))
    }

    async fn store(
        &self,
        identity: &CallIdentity,
        outcome: CachedOutcome,
        headers: &HeaderMap,
    ) -> Result<()> {
        let Some(ttl) = freshness(headers, self.default_ttl) else {
            debug!("Response for {} is not cacheable", identity.method());
            return Ok(());
        };

        self.entries
            .insert(identity.clone(), Entry { outcome, ttl })
            .await;
        Ok(())
    }
}
