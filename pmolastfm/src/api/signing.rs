//! Signature MD5 des requêtes Last.fm
//!
//! Les méthodes authentifiées exigent un paramètre `api_sig` : le MD5 de tous
//! les paramètres triés par nom, concaténés sous la forme `nomvaleur`, suivis
//! du secret partagé. `format` et `callback` ne sont pas signés.

use md5::{Digest, Md5};
use std::collections::BTreeMap;

/// Paramètres exclus de la signature
const UNSIGNED_PARAMS: [&str; 2] = ["format", "callback"];

/// Calcule `api_sig` pour un ensemble de paramètres
///
/// # Arguments
///
/// * `params` - Paramètres de la requête, `method` et `api_key` compris
/// * `secret` - Secret partagé de l'application
///
/// # Returns
///
/// Signature MD5 hexadécimale (minuscules)
pub fn sign_params(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut hasher = Md5::new();

    for (name, value) in params {
        if UNSIGNED_PARAMS.contains(&name.as_str()) {
            continue;
        }
        hasher.update(name.as_bytes());
        hasher.update(value.as_bytes());
    }
    hasher.update(secret.as_bytes());

    format!("{:x}", hasher.finalize())
}
