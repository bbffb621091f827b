//! Dispatcher des requêtes : cache, transport, décodage, normalisation
//!
//! Pour chaque appel :
//!
//! 1. consulte le cache (un résultat ou une erreur mémorisés sont rendus
//!    immédiatement, sans accès réseau ni normalisation) ;
//! 2. sinon appelle le transport, décode l'enveloppe, normalise le résultat ;
//! 3. confie l'issue (résultat normalisé ou erreur du service) au cache dans
//!    une tâche détachée, avec une copie indépendante de la valeur rendue.
//!
//! Les erreurs de transport, de décodage et de normalisation ne sont jamais
//! mises en cache. Deux appels identiques concurrents peuvent tous deux
//! atteindre le réseau.

use crate::cache::{CacheProvider, CachedOutcome, NoCache};
use crate::envelope::{self, Envelope, Response};
use crate::error::{LastFmError, Result};
use crate::identity::{CallIdentity, Params};
use crate::normalize::Normalize;
use crate::transport::Transport;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Orchestration d'un appel API
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheProvider>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<dyn CacheProvider>) -> Self {
        Self { transport, cache }
    }

    /// Dispatcher sans cache
    pub fn uncached(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, Arc::new(NoCache))
    }

    /// Retourne une référence au cache
    pub fn cache(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.cache)
    }

    /// Exécute un appel et retourne son résultat normalisé
    ///
    /// # Errors
    ///
    /// - [`LastFmError::Api`] : erreur rapportée par le service, éventuellement
    ///   lue depuis le cache
    /// - [`LastFmError::Http`] / [`LastFmError::Status`] : échec du transport
    /// - [`LastFmError::XmlParse`] / [`LastFmError::Envelope`] : réponse illisible
    /// - [`LastFmError::Normalize`] : date ou durée invalide dans le résultat
    pub async fn query<T: Response>(&self, method: &str, params: Params) -> Result<T> {
        let identity = CallIdentity::new(method, params);

        if let Some(outcome) = self.cached::<T>(&identity).await {
            return outcome;
        }

        let response = self
            .transport
            .invoke(identity.method(), identity.params())
            .await?;

        match envelope::decode(&response.body)? {
            Envelope::Error(error) => {
                debug!("{} returned service error {}", identity.method(), error.code);
                self.store_in_background(
                    identity,
                    CachedOutcome::Error(error.clone()),
                    response.headers,
                );
                Err(LastFmError::Api(error))
            }
            Envelope::Payload(payload) => {
                let mut value = T::from_payload(payload).map_err(|other| {
                    LastFmError::Envelope(format!(
                        "{} expected <{}>, got <{}>",
                        identity.method(),
                        T::NODE,
                        other.node_name()
                    ))
                })?;

                if let Err(err) = value.normalize() {
                    warn!("Cannot normalize {} response: {}", identity.method(), err);
                    return Err(err.into());
                }

                self.store_in_background(
                    identity,
                    CachedOutcome::Payload(value.clone().into_payload()),
                    response.headers,
                );
                Ok(value)
            }
        }
    }

    /// Consulte le cache ; `None` signifie qu'il faut interroger le réseau
    async fn cached<T: Response>(&self, identity: &CallIdentity) -> Option<Result<T>> {
        match self.cache.lookup(identity).await {
            Ok(Some(CachedOutcome::Payload(payload))) => match T::from_payload(payload) {
                Ok(value) => {
                    debug!("{} found in cache", identity.canonical_key());
                    Some(Ok(value))
                }
                Err(other) => {
                    warn!(
                        "Cached <{}> for {} does not match <{}>, ignoring",
                        other.node_name(),
                        identity.canonical_key(),
                        T::NODE
                    );
                    None
                }
            },
            Ok(Some(CachedOutcome::Error(error))) => {
                debug!(
                    "{} found in cache as error {}",
                    identity.canonical_key(),
                    error.code
                );
                Some(Err(LastFmError::Api(error)))
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Cache lookup failed for {}: {}", identity.canonical_key(), err);
                None
            }
        }
    }

    /// Stocke l'issue dans une tâche détachée, sans jamais bloquer l'appelant
    fn store_in_background(
        &self,
        identity: CallIdentity,
        outcome: CachedOutcome,
        headers: HeaderMap,
    ) {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            if let Err(err) = cache.store(&identity, outcome, &headers).await {
                warn!("Cache store failed for {}: {}", identity.canonical_key(), err);
            }
        });
    }
}
