//! Configuration du client Last.fm
//!
//! La configuration est lue depuis un fichier YAML puis surchargée par des
//! variables d'environnement préfixées par `PMOLASTFM__`. Les segments du
//! chemin sont séparés par `__` :
//!
//! ```text
//! PMOLASTFM__API_KEY=xxxxxxxx
//! PMOLASTFM__CACHE__BACKEND=disk
//! PMOLASTFM__CACHE__DIRECTORY=/var/cache/lastfm
//! ```
//!
//! ## Exemple de fichier
//!
//! ```yaml
//! api_key: "xxxxxxxx"
//! api_secret: "yyyyyyyy"
//! timeout_secs: 20
//! cache:
//!   backend: memory
//!   capacity: 2000
//!   default_ttl_secs: 600
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const ENV_PREFIX: &str = "PMOLASTFM__";

pub const DEFAULT_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_CACHE_DIR: &str = ".pmomusic/cache/lastfm";

/// Moteur de cache à utiliser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    None,
    #[default]
    Memory,
    Disk,
}

impl std::str::FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(CacheBackend::None),
            "memory" => Ok(CacheBackend::Memory),
            "disk" => Ok(CacheBackend::Disk),
            other => Err(anyhow!("Unknown cache backend: {}", other)),
        }
    }
}

/// Paramètres du cache des réponses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Nombre maximal d'entrées (cache mémoire)
    pub capacity: u64,
    /// TTL appliqué quand la réponse ne porte pas de `Cache-Control: max-age`
    pub default_ttl_secs: u64,
    /// Répertoire du cache disque
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            capacity: DEFAULT_CACHE_CAPACITY,
            default_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            directory: None,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
    }
}

/// Configuration complète du client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastFmConfig {
    pub api_key: String,
    /// Secret partagé, nécessaire pour signer les appels authentifiés
    pub api_secret: Option<String>,
    /// Clé de session d'un utilisateur authentifié
    pub session_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub cache: CacheConfig,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: None,
            session_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("PMOMusic-lastfm/", env!("CARGO_PKG_VERSION")).to_string(),
            cache: CacheConfig::default(),
        }
    }
}

impl LastFmConfig {
    /// Crée une configuration minimale avec une clé d'API
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Parse une configuration YAML ; les clés absentes prennent leur valeur par défaut
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid Last.fm configuration")
    }

    /// Charge un fichier YAML puis applique les surcharges d'environnement
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let mut config = Self::from_yaml_str(&yaml)?;
        config.apply_overrides(std::env::vars())?;
        info!("Loaded Last.fm configuration from {}", path.display());
        Ok(config)
    }

    /// Configuration par défaut surchargée par l'environnement
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(std::env::vars())?;
        Ok(config)
    }

    /// Applique des surcharges `PMOLASTFM__CHEMIN=valeur`
    ///
    /// Les variables sans le préfixe sont ignorées ; une clé inconnue ou une
    /// valeur invalide est une erreur.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(path) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let path = path.to_ascii_lowercase();
            let value = value.into();
            debug!(key = %path, "Applying environment override");

            match path.as_str() {
                "api_key" => self.api_key = value,
                "api_secret" => self.api_secret = non_empty(value),
                "session_key" => self.session_key = non_empty(value),
                "base_url" => self.base_url = value,
                "timeout_secs" => self.timeout_secs = parse_number(&path, &value)?,
                "user_agent" => self.user_agent = value,
                "cache__backend" => self.cache.backend = value.parse()?,
                "cache__capacity" => self.cache.capacity = parse_number(&path, &value)?,
                "cache__default_ttl_secs" => {
                    self.cache.default_ttl_secs = parse_number(&path, &value)?
                }
                "cache__directory" => self.cache.directory = non_empty(value).map(PathBuf::from),
                other => return Err(anyhow!("Unknown configuration key: {}", other)),
            }
        }
        Ok(())
    }

    /// Vérifie que la configuration permet d'interroger l'API
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("Last.fm API key is not configured"));
        }
        if self.session_key.is_some() && self.api_secret.is_none() {
            return Err(anyhow!("A session key requires the API secret"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid number for {}: {:?}", key, value))
}
