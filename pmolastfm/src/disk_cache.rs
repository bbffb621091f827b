//! Cache disque des réponses de l'API Last.fm
//!
//! Chaque appel est stocké dans un fichier JSON dont le nom est l'empreinte
//! SHA1 de son identité : `{cache_dir}/{sha1}.json`. Le fichier contient
//! l'issue (résultat normalisé ou erreur du service) et sa date d'expiration.
//! Une entrée expirée est supprimée à la lecture et vaut un défaut de cache.

use crate::cache::{CacheProvider, CachedOutcome, freshness};
use crate::error::{LastFmError, Result};
use crate::identity::CallIdentity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info};

/// Enregistrement sérialisé sur disque
#[derive(Debug, Serialize, Deserialize)]
struct DiskRecord {
    /// Clé canonique, pour inspection manuelle des fichiers
    key: String,
    stored_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    outcome: CachedOutcome,
}

impl DiskRecord {
    fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Cache disque pour les réponses JSON normalisées
pub struct DiskCache {
    /// Répertoire de cache
    cache_dir: PathBuf,
    /// TTL des réponses sans directive `max-age`
    default_ttl: Duration,
}

impl DiskCache {
    /// Crée un nouveau cache disque
    ///
    /// # Arguments
    ///
    /// * `cache_dir` - Répertoire où stocker les fichiers cachés
    /// * `default_ttl` - Durée de vie par défaut des entrées
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use pmolastfm::disk_cache::DiskCache;
    /// use std::time::Duration;
    ///
    /// let cache = DiskCache::new(".pmomusic/cache/lastfm", Duration::from_secs(3600))?;
    /// # Ok::<(), pmolastfm::LastFmError>(())
    /// ```
    pub fn new<P: AsRef<Path>>(cache_dir: P, default_ttl: Duration) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();

        if !cache_dir.exists() {
            std::fs::create_dir_all(&cache_dir)?;
            info!("Created cache directory: {}", cache_dir.display());
        }

        Ok(Self {
            cache_dir,
            default_ttl,
        })
    }

    /// Construit le chemin du fichier d'un appel
    fn cache_path(&self, identity: &CallIdentity) -> PathBuf {
        self.cache_dir.join(format!("{}.json", identity.digest()))
    }

    /// Supprime les entrées expirées, retourne le nombre de fichiers supprimés
    pub async fn purge_expired(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let expired = match fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice::<DiskRecord>(&bytes)
                    .map(|record| record.is_expired())
                    .unwrap_or(true),
                Err(_) => false,
            };

            if expired {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }

        debug!("Purged {} expired cache files", removed);
        Ok(removed)
    }

    /// Supprime tous les fichiers de cache
    pub async fn clear(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                fs::remove_file(&path).await?;
            }
        }

        info!("Cleared all cache files in {}", self.cache_dir.display());
        Ok(())
    }

    /// Retourne le nombre de fichiers en cache
    pub async fn count(&self) -> Result<usize> {
        let mut count = 0;
        let mut entries = fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("json") {
                count += 1;
            }
        }

        Ok(count)
    }
}

#[async_trait]
impl CacheProvider for DiskCache {
    async fn lookup(&self, identity: &CallIdentity) -> Result<Option<CachedOutcome>> {
        let path = self.cache_path(identity);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let record: DiskRecord = serde_json::from_slice(&bytes).map_err(|e| {
            LastFmError::Cache(format!("corrupt cache file {}: {}", path.display(), e))
        })?;

        if record.is_expired() {
            debug!("Cache expired: {}", path.display());
            let _ = fs::remove_file(&path).await;
            return Ok(None);
        }

        Ok(Some(record.outcome))
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

        let stored_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| LastFmError::Cache(format!("TTL out of range: {}", e)))?;
        let record = DiskRecord {
            key: identity.canonical_key(),
            stored_at,
            expires_at: stored_at + ttl,
            outcome,
        };

        let path = self.cache_path(identity);
        let bytes = serde_json::to_vec(&record)?;
        let dir = self.cache_dir.clone();
        let target = path.clone();

        // Un fichier temporaire propre à chaque écriture, renommé atomiquement
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&target).map_err(|e| LastFmError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| LastFmError::Cache(format!("store task failed: {}", e)))??;

        debug!("Saved cache to {}", path.display());
        Ok(())
    }
}
