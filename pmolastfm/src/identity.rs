//! Identité d'un appel API : nom de méthode + paramètres
//!
//! C'est la clé sous laquelle les fournisseurs de cache rangent leurs entrées.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// Paramètres d'un appel, triés par nom pour une sérialisation déterministe
pub type Params = BTreeMap<String, String>;

/// Caractères non réservés (RFC 3986) laissés tels quels dans la clé
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Identité d'un appel (méthode, paramètres)
///
/// L'ordre d'insertion des paramètres n'a pas d'influence sur l'égalité,
/// le hash ou la clé canonique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallIdentity {
    method: String,
    params: Params,
}

impl CallIdentity {
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Construit une identité depuis une liste de paires clé/valeur
    pub fn from_pairs<K, V, I>(method: impl Into<String>, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let params = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(method, params)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Clé canonique lisible : `method?a=1&b=2`, valeurs percent-encodées
    pub fn canonical_key(&self) -> String {
        let mut key = self.method.clone();
        for (i, (name, value)) in self.params.iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            key.push_str(&escape(name));
            key.push('=');
            key.push_str(&escape(value));
        }
        key
    }

    /// Empreinte SHA1 (hex) de la clé canonique, utilisable comme nom de fichier
    pub fn digest(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.canonical_key().as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn escape(input: &str) -> String {
    utf8_percent_encode(input, KEY_ENCODE_SET).to_string()
}
