//! Structures de données pour les réponses Last.fm
//!
//! Chaque structure est désérialisée directement depuis le XML de l'API
//! (attributs préfixés par `@`, texte par `$text`). Les champs dérivés
//! (dates, durées, période) ne figurent pas dans le XML : ils sont remplis
//! par [`crate::normalize::Normalize`] après décodage et sont conservés tels
//! quels par les caches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ============ Période ============

/// Période de calcul des classements utilisateur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Period {
    Overall = 1,
    OneWeek,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Period {
    /// Table de correspondance période ↔ jeton de l'API
    const WIRE_TOKENS: [(Period, &'static str); 6] = [
        (Period::Overall, "overall"),
        (Period::OneWeek, "7day"),
        (Period::OneMonth, "1month"),
        (Period::ThreeMonths, "3month"),
        (Period::SixMonths, "6month"),
        (Period::OneYear, "12month"),
    ];

    /// Jeton envoyé à l'API (`"7day"`, `"overall"`, ...)
    pub fn as_str(self) -> &'static str {
        Self::WIRE_TOKENS
            .iter()
            .find(|(period, _)| *period == self)
            .map(|(_, token)| *token)
            .unwrap_or("overall")
    }

    /// Retrouve la période depuis un jeton de l'API, `None` si inconnu
    pub fn from_wire(token: &str) -> Option<Self> {
        Self::WIRE_TOKENS
            .iter()
            .find(|(_, wire)| *wire == token)
            .map(|(period, _)| *period)
    }

    /// Valeur entière de la période
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Types communs ============

/// Tailles d'images connues
pub const SMALL_IMAGE_SIZE: &str = "small";
pub const MEDIUM_IMAGE_SIZE: &str = "medium";
pub const LARGE_IMAGE_SIZE: &str = "large";
pub const EXTRA_LARGE_IMAGE_SIZE: &str = "extralarge";

/// Image (`<image size="small">url</image>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "@size", default)]
    pub size: String,
    #[serde(rename = "$text", default)]
    pub url: String,
}

/// Recherche l'URL d'une image d'une taille donnée
pub fn image_url<'a>(images: &'a [Image], size: &str) -> Option<&'a str> {
    images
        .iter()
        .find(|image| image.size == size && !image.url.is_empty())
        .map(|image| image.url.as_str())
}

/// Artiste tel qu'il apparaît dans les listes (titres récents, classements)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    #[serde(rename = "@rank", default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub name: String,
    /// Toujours 0, sauf dans le résultat de `user.getTopArtists`
    #[serde(default)]
    pub playcount: u64,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
}

/// Album résumé d'un titre récent (`<album mbid="...">Nom</album>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackAlbum {
    #[serde(rename = "@mbid", default)]
    pub mbid: String,
    #[serde(rename = "$text", default)]
    pub name: String,
}

/// Date brute au format compact (`<date uts="1287654321">20 Oct 2010, 09:45</date>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LfmDate {
    #[serde(rename = "@uts", default)]
    pub uts: i64,
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// Texte encyclopédique (wiki d'un titre, biographie d'un artiste)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wiki {
    /// Date brute, format `02 Jan 2006, 15:04`
    #[serde(rename = "published", default)]
    pub raw_published: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,

    /// Dérivé de `raw_published`
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

// ============ user.getRecentTracks ============

/// Titre écouté (ou en cours d'écoute)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "@nowplaying", default)]
    pub now_playing: bool,
    #[serde(default)]
    pub artist: Artist,
    #[serde(default)]
    pub loved: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub album: TrackAlbum,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
    #[serde(rename = "date", default)]
    pub raw_date: Option<LfmDate>,

    /// Instant d'écoute, dérivé de `raw_date`
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
}

/// Titres récents d'un utilisateur
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentTracks {
    #[serde(rename = "@user", default)]
    pub user: String,
    #[serde(rename = "@total", default)]
    pub total: u32,
    #[serde(rename = "@page", default)]
    pub page: u32,
    #[serde(rename = "@totalPages", default)]
    pub total_pages: u32,
    #[serde(rename = "track", default)]
    pub tracks: Vec<Track>,

    /// Index dans `tracks` du titre en cours d'écoute
    #[serde(default)]
    pub(crate) now_playing_index: Option<usize>,
}

impl RecentTracks {
    /// Titre en cours d'écoute : l'élément même de `tracks`, pas une copie
    pub fn now_playing(&self) -> Option<&Track> {
        self.now_playing_index.and_then(|i| self.tracks.get(i))
    }

    /// Accès mutable au titre en cours d'écoute
    pub fn now_playing_mut(&mut self) -> Option<&mut Track> {
        self.now_playing_index.and_then(|i| self.tracks.get_mut(i))
    }

    /// Position du titre en cours d'écoute dans `tracks`
    pub fn now_playing_index(&self) -> Option<usize> {
        self.now_playing_index
    }

    /// Titres effectivement scrobblés (hors lecture en cours)
    pub fn scrobbles(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|track| !track.now_playing)
    }
}

// ============ user.getInfo ============

/// Date d'inscription (`<registered unixtime="1037793040">2002-11-20 11:50</registered>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registered {
    #[serde(rename = "@unixtime", default)]
    pub unixtime: String,
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// Profil utilisateur
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "realname", default)]
    pub real_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub subscriber: u32,
    #[serde(default)]
    pub playcount: u64,
    #[serde(default)]
    pub playlists: u32,
    #[serde(default)]
    pub bootstrap: u32,
    #[serde(rename = "registered", default)]
    pub raw_registered: Option<Registered>,

    /// Dérivé de `raw_registered`
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

// ============ tasteometer.compare ============

/// Entrée nommée (utilisateur comparé, artiste commun)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonArtists {
    #[serde(rename = "@matches", default)]
    pub matches: u32,
    #[serde(rename = "artist", default)]
    pub artists: Vec<NamedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasteResult {
    /// Entre 0.0 et 1.0
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub artists: CommonArtists,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasteInput {
    #[serde(rename = "user", default)]
    pub users: Vec<NamedEntry>,
}

/// Comparaison des goûts de deux utilisateurs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tasteometer {
    #[serde(default)]
    pub result: TasteResult,
    #[serde(default)]
    pub input: TasteInput,
}

impl Tasteometer {
    /// Utilisateurs comparés
    pub fn users(&self) -> Vec<&str> {
        self.input.users.iter().map(|u| u.name.as_str()).collect()
    }

    pub fn score(&self) -> f64 {
        self.result.score
    }

    /// Courte liste (5 au plus) des artistes communs avec la plus forte affinité
    pub fn artists(&self) -> Vec<&str> {
        self.result
            .artists
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect()
    }
}

// ============ user.getNeighbours ============

/// Voisin musical : utilisateur au score de comparaison élevé
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Neighbour {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
    #[serde(rename = "match", default)]
    pub similarity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Neighbours {
    #[serde(rename = "@user", default)]
    pub user: String,
    #[serde(rename = "user", default)]
    pub neighbours: Vec<Neighbour>,
}

// ============ user.getTopArtists ============

/// Artistes les plus écoutés d'un utilisateur sur une période
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopArtists {
    #[serde(rename = "@user", default)]
    pub user: String,
    /// Jeton brut de la période (`"7day"`, ...)
    #[serde(rename = "@type", default)]
    pub raw_period: String,
    #[serde(rename = "@total", default)]
    pub total: u32,
    #[serde(rename = "@page", default)]
    pub page: u32,
    #[serde(rename = "@totalPages", default)]
    pub total_pages: u32,
    #[serde(rename = "artist", default)]
    pub artists: Vec<Artist>,

    /// Dérivé de `raw_period`, `None` si le jeton est inconnu
    #[serde(default)]
    pub period: Option<Period>,
}

// ============ artist.getInfo ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistStats {
    #[serde(default)]
    pub listeners: u64,
    #[serde(default)]
    pub playcount: u64,
    /// Présent uniquement si un nom d'utilisateur a été fourni
    #[serde(default)]
    pub userplaycount: Option<u64>,
}

/// Informations détaillées sur un artiste
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub streamable: u32,
    #[serde(default)]
    pub ontour: u32,
    #[serde(default)]
    pub stats: ArtistStats,
    #[serde(default)]
    pub bio: Option<Wiki>,
}

// ============ track.getInfo ============

/// Album détaillé d'un titre (`<album position="3">...</album>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumInfo {
    #[serde(rename = "@position", default)]
    pub track_no: Option<u32>,
    #[serde(default)]
    pub artist: String,
    #[serde(rename = "title", default)]
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
}

/// Informations détaillées sur un titre
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
    /// Durée brute en millisecondes
    #[serde(rename = "duration", default)]
    pub raw_duration: String,
    #[serde(default)]
    pub listeners: u64,
    #[serde(default)]
    pub playcount: u64,
    #[serde(default)]
    pub artist: Artist,
    #[serde(default)]
    pub album: Option<AlbumInfo>,
    #[serde(default)]
    pub userplaycount: Option<u64>,
    #[serde(default)]
    pub userloved: Option<bool>,
    #[serde(default)]
    pub wiki: Option<Wiki>,

    /// Dérivé de `raw_duration`
    #[serde(default)]
    pub length: Option<Duration>,
}

// ============ *.getTopTags ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub url: String,
}

/// Tags les plus utilisés pour un artiste ou un titre
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopTags {
    #[serde(rename = "@artist", default)]
    pub artist: String,
    #[serde(rename = "@track", default)]
    pub track: String,
    #[serde(rename = "tag", default)]
    pub tags: Vec<Tag>,
}
