//! Gestion des erreurs pour le client Last.fm

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type Result personnalisé pour pmolastfm
pub type Result<T> = std::result::Result<T, LastFmError>;

/// Erreurs possibles lors d'un appel à l'API Last.fm
#[derive(Error, Debug)]
pub enum LastFmError {
    /// Erreur HTTP (connexion, timeout, lecture du corps)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Réponse HTTP avec un statut non-2xx
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Erreur de parsing XML
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::de::DeError),

    /// Enveloppe XML bien formée mais inattendue
    #[error("Malformed response envelope: {0}")]
    Envelope(String),

    /// Champ date/durée impossible à interpréter
    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Erreur rapportée par le service Last.fm lui-même
    #[error("Last.fm API error (code {}): {}", .0.code, .0.message)]
    Api(#[from] ApiError),

    /// Erreur d'un fournisseur de cache
    #[error("Cache error: {0}")]
    Cache(String),

    /// Erreur d'entrée/sortie
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur de sérialisation JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl LastFmError {
    /// Crée une erreur HTTP depuis un code de statut et le corps de la réponse
    pub fn from_status_code(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Retourne l'erreur Last.fm si c'est une erreur de domaine
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            LastFmError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Vérifie si l'erreur vient du transport (et n'a donc pas été mise en cache)
    pub fn is_transport(&self) -> bool {
        matches!(self, LastFmError::Http(_) | LastFmError::Status { .. })
    }
}

/// Erreur rapportée par le service (`<error code="...">message</error>`)
///
/// Le code `0` est réservé et signifie « pas d'erreur » : il n'est jamais
/// remonté à l'appelant.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

impl ApiError {
    pub const INVALID_PARAMETERS: i32 = 6;
    pub const OPERATION_FAILED: i32 = 8;
    pub const TEMPORARILY_UNAVAILABLE: i32 = 16;
    pub const RATE_LIMIT_EXCEEDED: i32 = 29;

    /// Crée une erreur en nettoyant le texte brut du nœud XML
    pub fn new(code: i32, message: impl AsRef<str>) -> Self {
        Self {
            code,
            message: message
                .as_ref()
                .trim_matches(|c| c == '\n' || c == ' ')
                .to_string(),
        }
    }

    /// Vérifie si l'erreur est une erreur de rate limiting
    pub fn is_rate_limit(&self) -> bool {
        self.code == Self::RATE_LIMIT_EXCEEDED
    }

    /// Vérifie si l'erreur est transitoire côté service
    pub fn is_temporary(&self) -> bool {
        matches!(
            self.code,
            Self::OPERATION_FAILED | Self::TEMPORARILY_UNAVAILABLE
        )
    }

    /// Vérifie si la requête a été rejetée pour des paramètres invalides
    pub fn is_invalid_parameters(&self) -> bool {
        self.code == Self::INVALID_PARAMETERS
    }
}

/// Erreurs de normalisation post-décodage
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("invalid epoch timestamp for {field}: {value}")]
    Timestamp { field: &'static str, value: String },

    #[error("invalid date for {field}: {value:?}")]
    Date {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid duration for {field}: {value:?}")]
    Duration {
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_trims_message() {
        let err = ApiError::new(6, "\n  User not found \n");
        assert_eq!(err.message, "User not found");
        assert_eq!(err.to_string(), "User not found");
        assert!(err.is_invalid_parameters());
    }

    #[test]
    fn test_api_error_classification() {
        assert!(ApiError::new(29, "slow down").is_rate_limit());
        assert!(ApiError::new(16, "later").is_temporary());
        assert!(!ApiError::new(6, "bad").is_temporary());
    }

    #[test]
    fn test_error_kinds() {
        let err = LastFmError::from_status_code(503, "unavailable");
        assert!(err.is_transport());
        assert!(err.as_api_error().is_none());

        let err = LastFmError::from(ApiError::new(6, "No user"));
        assert!(!err.is_transport());
        assert_eq!(err.as_api_error().map(|e| e.code), Some(6));
    }
}
