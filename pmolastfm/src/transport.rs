//! Contrat du fournisseur de transport
//!
//! Le dispatcher ne connaît pas HTTP : il confie la méthode et les paramètres
//! à un [`Transport`] et reçoit le corps de la réponse avec ses en-têtes.
//! L'authentification, la signature, les timeouts et les éventuels retries
//! relèvent de l'implémentation (voir [`crate::api::LastFmApi`]).

use crate::error::Result;
use crate::identity::Params;
use async_trait::async_trait;
use reqwest::header::HeaderMap;

/// Réponse brute d'un appel réussi au niveau transport
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub body: Vec<u8>,
    /// En-têtes de la réponse, transmis au cache pour sa politique de fraîcheur
    pub headers: HeaderMap,
}

impl TransportResponse {
    pub fn new(body: impl Into<Vec<u8>>, headers: HeaderMap) -> Self {
        Self {
            body: body.into(),
            headers,
        }
    }
}

/// Exécute un appel API
///
/// Les erreurs retournées sont des erreurs de transport (connexion, statut
/// non-2xx) : elles ne sont jamais mises en cache.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(&self, method: &str, params: &Params) -> Result<TransportResponse>;
}
