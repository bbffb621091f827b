//! # pmolastfm - Client Last.fm pour PMOMusic
//!
//! Cette crate fournit un client Rust typé pour l'API de consultation de
//! Last.fm (version 2.0, réponses XML), avec un cache des réponses
//! normalisées.
//!
//! ## Vue d'ensemble
//!
//! `pmolastfm` permet d'accéder aux fonctionnalités de Last.fm :
//! - Titres récents d'un utilisateur, y compris le titre en cours d'écoute
//! - Profil, voisins musicaux et artistes favoris d'un utilisateur
//! - Comparaison des goûts de deux utilisateurs (tasteometer)
//! - Informations et tags d'un artiste ou d'un titre
//! - Cache des réponses (mémoire ou disque), y compris des erreurs du service
//!
//! ## Architecture
//!
//! Chaque appel suit le même chemin :
//!
//! 1. [`LastFmClient`] traduit ses arguments en paramètres de l'API ;
//! 2. le [`Dispatcher`] consulte le [`CacheProvider`] ;
//! 3. en cas de défaut, le [`Transport`] interroge le service ;
//! 4. l'[`Envelope`] est décodée, le résultat est normalisé ([`Normalize`])
//!    puis confié au cache en tâche de fond.
//!
//! ## Structure des modules
//!
//! ```text
//! pmolastfm/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # Client Last.fm principal
//! │   ├── dispatch.rs         # Cache, transport, décodage, normalisation
//! │   ├── models.rs           # Structures de données
//! │   ├── normalize.rs        # Dates, durées et périodes typées
//! │   ├── envelope.rs         # Enveloppe <lfm> des réponses
//! │   ├── identity.rs         # Identité d'un appel (clé de cache)
//! │   ├── transport.rs        # Contrat du transport
//! │   ├── api/
//! │   │   ├── mod.rs          # Transport HTTP
//! │   │   └── signing.rs      # Signature des requêtes
//! │   ├── cache.rs            # Contrat du cache et cache mémoire
//! │   ├── disk_cache.rs       # Cache disque
//! │   ├── config.rs           # Configuration
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmolastfm::{LastFmClient, LastFmConfig, Period};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = LastFmClient::new(&LastFmConfig::with_api_key("xxxx"))?;
//!
//!     let recent = client.get_recent_tracks("RJ", 10).await?;
//!     if let Some(track) = recent.now_playing() {
//!         println!("Now playing: {} - {}", track.artist.name, track.name);
//!     }
//!     for track in recent.scrobbles() {
//!         println!("{:?} {} - {}", track.played_at, track.artist.name, track.name);
//!     }
//!
//!     let top = client.get_user_top_artists("RJ", Period::OneMonth, 5).await?;
//!     for artist in top.artists {
//!         println!("{} ({})", artist.name, artist.playcount);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! La configuration se lit depuis un fichier YAML ([`LastFmConfig::load`])
//! ou depuis l'environnement ([`LastFmConfig::from_env`]), avec des
//! variables préfixées par `PMOLASTFM__` :
//!
//! ```yaml
//! api_key: xxxx
//! timeout_secs: 30
//! cache:
//!   backend: disk
//!   directory: .pmomusic/cache/lastfm
//!   default_ttl_secs: 3600
//! ```
//!
//! ## Cache
//!
//! La durée de vie d'une entrée suit l'en-tête `Cache-Control` de la réponse
//! (`max-age`, `no-store`, `no-cache`) ou, à défaut, `default_ttl_secs`.
//! Les erreurs du service (utilisateur inconnu, paramètres invalides...) sont
//! mises en cache comme les résultats ; les erreurs réseau ou de décodage ne
//! le sont jamais.
//!
//! ## Gestion des erreurs
//!
//! ```rust,ignore
//! use pmolastfm::{ApiError, LastFmError};
//!
//! match client.get_user_info("ghost").await {
//!     Ok(user) => println!("{} scrobbles", user.playcount),
//!     Err(LastFmError::Api(e)) if e.code == ApiError::INVALID_PARAMETERS => {
//!         println!("Unknown user: {}", e.message)
//!     }
//!     Err(e) if e.is_transport() => println!("Network error: {}", e),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod disk_cache;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod models;
pub mod normalize;
pub mod transport;

pub use api::LastFmApi;
pub use cache::{CacheProvider, CachedOutcome, MemoryCache, NoCache};
pub use client::{ArtistRef, LastFmClient, TrackRef};
pub use config::{CacheBackend, CacheConfig, LastFmConfig};
pub use disk_cache::DiskCache;
pub use dispatch::Dispatcher;
pub use envelope::{Envelope, Payload, Response};
pub use error::{ApiError, LastFmError, NormalizeError, Result};
pub use identity::{CallIdentity, Params};
pub use models::{
    ArtistInfo, Neighbours, Period, RecentTracks, Tasteometer, TopArtists, TopTags, Track,
    TrackInfo, User,
};
pub use normalize::Normalize;
pub use transport::{Transport, TransportResponse};
