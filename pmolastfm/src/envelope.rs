//! Décodage de l'enveloppe XML des réponses Last.fm
//!
//! Toutes les réponses ont la forme :
//!
//! ```xml
//! <lfm status="ok">
//!   <recenttracks user="RJ" total="3">...</recenttracks>
//! </lfm>
//! ```
//!
//! ou, en cas d'erreur rapportée par le service :
//!
//! ```xml
//! <lfm status="failed">
//!   <error code="6">User not found</error>
//! </lfm>
//! ```
//!
//! Le décodeur ne dépend pas de la méthode appelée : il produit une
//! [`Envelope`], soit une erreur, soit exactement un [`Payload`]. Un nœud
//! d'erreur de code non nul l'emporte toujours sur un nœud de résultat.

use crate::error::{ApiError, LastFmError, Result};
use crate::models::*;
use crate::normalize::Normalize;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Nœud `<error code="...">message</error>`
#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(rename = "@code", default)]
    code: i32,
    #[serde(rename = "$text", default)]
    message: String,
}

/// Racine `<lfm>` réduite au nœud d'erreur, les résultats sont ignorés
#[derive(Debug, Deserialize)]
struct LfmErrorNode {
    #[serde(default)]
    error: Option<WireError>,
}

/// Racine `<lfm>` : une option par forme de résultat connue
#[derive(Debug, Deserialize)]
struct LfmStatus {
    #[serde(rename = "@status", default)]
    status: String,
    #[serde(default)]
    recenttracks: Option<RecentTracks>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    comparison: Option<Tasteometer>,
    #[serde(default)]
    neighbours: Option<Neighbours>,
    #[serde(default)]
    topartists: Option<TopArtists>,
    #[serde(default)]
    artist: Option<ArtistInfo>,
    #[serde(default)]
    track: Option<TrackInfo>,
    #[serde(default)]
    toptags: Option<TopTags>,
}

impl LfmStatus {
    fn into_payloads(self) -> Vec<Payload> {
        [
            self.recenttracks.map(Payload::RecentTracks),
            self.user.map(Payload::User),
            self.comparison.map(Payload::Tasteometer),
            self.neighbours.map(Payload::Neighbours),
            self.topartists.map(Payload::TopArtists),
            self.artist.map(Payload::ArtistInfo),
            self.track.map(Payload::TrackInfo),
            self.toptags.map(Payload::TopTags),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Résultat typé d'une réponse, une variante par forme de résultat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    RecentTracks(RecentTracks),
    User(User),
    Tasteometer(Tasteometer),
    Neighbours(Neighbours),
    TopArtists(TopArtists),
    ArtistInfo(ArtistInfo),
    TrackInfo(TrackInfo),
    TopTags(TopTags),
}

impl Payload {
    /// Nom du nœud XML d'où provient ce résultat
    pub fn node_name(&self) -> &'static str {
        match self {
            Payload::RecentTracks(_) => RecentTracks::NODE,
            Payload::User(_) => User::NODE,
            Payload::Tasteometer(_) => Tasteometer::NODE,
            Payload::Neighbours(_) => Neighbours::NODE,
            Payload::TopArtists(_) => TopArtists::NODE,
            Payload::ArtistInfo(_) => ArtistInfo::NODE,
            Payload::TrackInfo(_) => TrackInfo::NODE,
            Payload::TopTags(_) => TopTags::NODE,
        }
    }
}

/// Enveloppe décodée : une erreur du service ou un résultat, jamais les deux
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Error(ApiError),
    Payload(Payload),
}

/// Type de résultat pouvant transiter par le dispatcher
pub trait Response: Normalize + Clone + Send + Sync + 'static {
    /// Nom du nœud XML portant ce résultat
    const NODE: &'static str;

    fn into_payload(self) -> Payload;

    /// Extrait la variante attendue, rend le payload intact sinon
    fn from_payload(payload: Payload) -> std::result::Result<Self, Payload>;
}

macro_rules! impl_response {
    ($ty:ident, $node:literal) => {
        impl Response for $ty {
            const NODE: &'static str = $node;

            fn into_payload(self) -> Payload {
                Payload::$ty(self)
            }

            fn from_payload(payload: Payload) -> std::result::Result<Self, Payload> {
                match payload {
                    Payload::$ty(value) => Ok(value),
                    other => Err(other),
                }
            }
        }
    };
}

impl_response!(RecentTracks, "recenttracks");
impl_response!(User, "user");
impl_response!(Tasteometer, "comparison");
impl_response!(Neighbours, "neighbours");
impl_response!(TopArtists, "topartists");
impl_response!(ArtistInfo, "artist");
impl_response!(TrackInfo, "track");
impl_response!(TopTags, "toptags");

/// Décode le corps XML d'une réponse
///
/// # Errors
///
/// - [`LastFmError::XmlParse`] si le XML est invalide, ou si un nœud de
///   résultat ne correspond pas à sa forme sans erreur de service
/// - [`LastFmError::Envelope`] si aucun résultat, ou plusieurs, sont présents
///   sans erreur de service
pub fn decode(body: &[u8]) -> Result<Envelope> {
    // Le nœud d'erreur est lu seul d'abord : un résultat mal formé à côté
    // d'une erreur de service ne doit pas la masquer.
    let head: LfmErrorNode = quick_xml::de::from_reader(body)?;
    if let Some(error) = head.error.filter(|e| e.code != 0) {
        debug!("Envelope carries service error {}", error.code);
        return Ok(Envelope::Error(ApiError::new(error.code, &error.message)));
    }

    let status: LfmStatus = quick_xml::de::from_reader(body)?;

    let lfm_status = status.status.clone();
    let mut payloads = status.into_payloads().into_iter();
    match (payloads.next(), payloads.next()) {
        (Some(payload), None) => Ok(Envelope::Payload(payload)),
        (None, _) => Err(LastFmError::Envelope(format!(
            "no result node (status {:?})",
            lfm_status
        ))),
        (Some(first), Some(second)) => Err(LastFmError::Envelope(format!(
            "several result nodes: <{}> and <{}>",
            first.node_name(),
            second.node_name()
        ))),
    }
}
