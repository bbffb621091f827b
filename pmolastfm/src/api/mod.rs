//! Couche d'accès HTTP à l'API Last.fm
//!
//! [`LastFmApi`] est l'implémentation de [`Transport`] utilisée en
//! production : une requête GET sur le point d'entrée unique de l'API, avec
//! la méthode et les paramètres en query string.

pub mod signing;

use crate::config::LastFmConfig;
use crate::error::{LastFmError, Result};
use crate::identity::Params;
use crate::transport::{Transport, TransportResponse};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Client API bas-niveau pour communiquer avec Last.fm
pub struct LastFmApi {
    /// Client HTTP
    client: Client,
    /// Point d'entrée de l'API
    base_url: String,
    /// Clé d'API de l'application
    api_key: String,
    /// Secret partagé pour la signature
    api_secret: Option<String>,
    /// Clé de session utilisateur
    session_key: Option<String>,
}

impl LastFmApi {
    /// Crée une nouvelle instance de l'API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&LastFmConfig::with_api_key(api_key))
    }

    /// Crée une instance depuis la configuration
    pub fn from_config(config: &LastFmConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            session_key: config.session_key.clone(),
        })
    }

    /// Remplace le point d'entrée (serveur de test, proxy)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Définit la session d'un utilisateur authentifié
    pub fn set_session(&mut self, session_key: String, api_secret: String) {
        self.session_key = Some(session_key);
        self.api_secret = Some(api_secret);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Vérifie si les requêtes seront signées
    pub fn is_authenticated(&self) -> bool {
        self.session_key.is_some() && self.api_secret.is_some()
    }

    /// Construit la query string complète d'un appel
    fn build_query(&self, method: &str, params: &Params) -> Params {
        let mut query = params.clone();
        query.insert("method".to_string(), method.to_string());
        query.insert("api_key".to_string(), self.api_key.clone());

        if let (Some(session_key), Some(secret)) = (&self.session_key, &self.api_secret) {
            query.insert("sk".to_string(), session_key.clone());
            let signature = signing::sign_params(&query, secret);
            query.insert("api_sig".to_string(), signature);
        }

        query
    }
}

#[async_trait]
impl Transport for LastFmApi {
    async fn invoke(&self, method: &str, params: &Params) -> Result<TransportResponse> {
        let query = self.build_query(method, params);

        debug!("GET {} method={} with {} params", self.base_url, method, params.len());

        let response = self.client.get(&self.base_url).query(&query).send().await?;
        let status = response.status();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("HTTP error ({}) for {}", status.as_u16(), method);
            return Err(LastFmError::from_status_code(status.as_u16(), body));
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse::new(body.to_vec(), headers))
    }
}
