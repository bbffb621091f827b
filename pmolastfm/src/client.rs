//! Client principal pour interagir avec l'API Last.fm
//!
//! Ce module traduit les arguments typés de chaque méthode en paramètres de
//! l'API, puis délègue au [`Dispatcher`] (cache, transport, décodage).

use crate::api::LastFmApi;
use crate::cache::{CacheProvider, MemoryCache, NoCache};
use crate::config::{CacheBackend, LastFmConfig};
use crate::disk_cache::DiskCache;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::identity::Params;
use crate::models::*;
use crate::transport::Transport;
use std::sync::Arc;
use tracing::info;

/// Artiste à interroger : le MBID l'emporte sur le nom s'il est renseigné
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistRef {
    pub name: String,
    pub mbid: String,
}

impl ArtistRef {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn by_mbid(mbid: impl Into<String>) -> Self {
        Self {
            mbid: mbid.into(),
            ..Default::default()
        }
    }

    fn add_to(&self, params: &mut Params) {
        if !self.mbid.is_empty() {
            params.insert("mbid".to_string(), self.mbid.clone());
        } else {
            params.insert("artist".to_string(), self.name.clone());
        }
    }
}

/// Titre à interroger : le MBID l'emporte sur le couple artiste/titre
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRef {
    pub artist: String,
    pub name: String,
    pub mbid: String,
}

impl TrackRef {
    pub fn by_name(artist: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn by_mbid(mbid: impl Into<String>) -> Self {
        Self {
            mbid: mbid.into(),
            ..Default::default()
        }
    }

    fn add_to(&self, params: &mut Params) {
        if !self.mbid.is_empty() {
            params.insert("mbid".to_string(), self.mbid.clone());
        } else {
            params.insert("artist".to_string(), self.artist.clone());
            params.insert("track".to_string(), self.name.clone());
        }
    }
}

fn autocorrect_param(params: &mut Params, autocorrect: bool) {
    let flag = if autocorrect { "1" } else { "0" };
    params.insert("autocorrect".to_string(), flag.to_string());
}

fn params<const N: usize>(pairs: [(&str, String); N]) -> Params {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Client Last.fm haut-niveau avec cache
#[derive(Clone)]
pub struct LastFmClient {
    dispatcher: Dispatcher,
}

impl LastFmClient {
    /// Crée un client HTTP avec le cache décrit par la configuration
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use pmolastfm::{LastFmClient, LastFmConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = LastFmClient::new(&LastFmConfig::with_api_key("xxxx"))?;
    ///     let recent = client.get_recent_tracks("RJ", 10).await?;
    ///     if let Some(track) = recent.now_playing() {
    ///         println!("Now playing: {} - {}", track.artist.name, track.name);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn new(config: &LastFmConfig) -> Result<Self> {
        let transport = Arc::new(LastFmApi::from_config(config)?);

        let cache: Arc<dyn CacheProvider> = match config.cache.backend {
            CacheBackend::None => Arc::new(NoCache),
            CacheBackend::Memory => Arc::new(MemoryCache::with_capacity(
                config.cache.capacity,
                config.cache.default_ttl(),
            )),
            CacheBackend::Disk => Arc::new(DiskCache::new(
                config.cache.directory(),
                config.cache.default_ttl(),
            )?),
        };

        info!(
            "Creating Last.fm client ({:?} cache) for {}",
            config.cache.backend, config.base_url
        );

        Ok(Self::with_providers(transport, cache))
    }

    /// Crée un client depuis la configuration de l'environnement
    pub fn from_env() -> Result<Self> {
        Self::new(&LastFmConfig::from_env()?)
    }

    /// Crée un client avec un transport et un cache fournis
    pub fn with_providers(transport: Arc<dyn Transport>, cache: Arc<dyn CacheProvider>) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport, cache),
        }
    }

    /// Retourne le dispatcher sous-jacent
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // ============ Utilisateurs ============

    /// Titres récents d'un utilisateur
    ///
    /// `tracks` contient le titre en cours d'écoute éventuel et jusqu'à
    /// `limit` scrobbles ; [`RecentTracks::now_playing`] désigne le premier.
    pub async fn get_recent_tracks(&self, user: &str, limit: u32) -> Result<RecentTracks> {
        let params = params([
            ("user", user.to_string()),
            ("extended", "1".to_string()),
            ("limit", limit.to_string()),
        ]);
        self.dispatcher.query("user.getRecentTracks", params).await
    }

    /// Profil d'un utilisateur
    pub async fn get_user_info(&self, user: &str) -> Result<User> {
        let params = params([("user", user.to_string())]);
        self.dispatcher.query("user.getInfo", params).await
    }

    /// Compare les goûts de deux utilisateurs
    pub async fn compare_taste(&self, user1: &str, user2: &str) -> Result<Tasteometer> {
        let params = params([
            ("type1", "user".to_string()),
            ("type2", "user".to_string()),
            ("value1", user1.to_string()),
            ("value2", user2.to_string()),
        ]);
        self.dispatcher.query("tasteometer.compare", params).await
    }

    /// Jusqu'à `limit` voisins musicaux d'un utilisateur
    pub async fn get_user_neighbours(&self, user: &str, limit: u32) -> Result<Neighbours> {
        let params = params([("user", user.to_string()), ("limit", limit.to_string())]);
        self.dispatcher.query("user.getNeighbours", params).await
    }

    /// Jusqu'à `limit` artistes les plus écoutés sur une période
    pub async fn get_user_top_artists(
        &self,
        user: &str,
        period: Period,
        limit: u32,
    ) -> Result<TopArtists> {
        let params = params([
            ("user", user.to_string()),
            ("period", period.as_str().to_string()),
            ("limit", limit.to_string()),
        ]);
        self.dispatcher.query("user.getTopArtists", params).await
    }

    // ============ Artistes ============

    /// Informations sur un artiste
    ///
    /// Avec un nom d'utilisateur, `stats.userplaycount` est renseigné.
    pub async fn get_artist_info(
        &self,
        artist: &ArtistRef,
        user: Option<&str>,
        autocorrect: bool,
    ) -> Result<ArtistInfo> {
        let mut params = Params::new();
        autocorrect_param(&mut params, autocorrect);
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            params.insert("username".to_string(), user.to_string());
        }
        artist.add_to(&mut params);
        self.dispatcher.query("artist.getInfo", params).await
    }

    /// Tags les plus utilisés pour un artiste
    pub async fn get_artist_top_tags(
        &self,
        artist: &ArtistRef,
        autocorrect: bool,
    ) -> Result<TopTags> {
        let mut params = Params::new();
        autocorrect_param(&mut params, autocorrect);
        artist.add_to(&mut params);
        self.dispatcher.query("artist.getTopTags", params).await
    }

    // ============ Titres ============

    /// Informations sur un titre
    ///
    /// Avec un nom d'utilisateur, `userplaycount` et `userloved` sont renseignés.
    pub async fn get_track_info(
        &self,
        track: &TrackRef,
        user: Option<&str>,
        autocorrect: bool,
    ) -> Result<TrackInfo> {
        let mut params = Params::new();
        autocorrect_param(&mut params, autocorrect);
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            params.insert("username".to_string(), user.to_string());
        }
        track.add_to(&mut params);
        self.dispatcher.query("track.getInfo", params).await
    }

    /// Tags les plus utilisés pour un titre
    pub async fn get_track_top_tags(&self, track: &TrackRef, autocorrect: bool) -> Result<TopTags> {
        let mut params = Params::new();
        autocorrect_param(&mut params, autocorrect);
        track.add_to(&mut params);
        self.dispatcher.query("track.getTopTags", params).await
    }
}
