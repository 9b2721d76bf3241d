//! Secret registry: one bearer token per sync root.

use crate::key::RootKey;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Raw registry shape as it appears in configuration: `appId -> rootId -> token`.
pub type SecretMap = BTreeMap<String, BTreeMap<String, String>>;

type TokenDigest = [u8; 32];

/// Read-only mapping from (appId, rootId) to the root's secret token.
///
/// Only SHA-256 digests of the tokens are retained.
#[derive(Clone, Default)]
pub struct SecretRegistry {
    roots: HashMap<RootKey, TokenDigest>,
}

impl SecretRegistry {
    /// Build a registry from the configured secret map.
    ///
    /// Every appId/rootId must be a valid key segment and every token must be
    /// non-empty.
    pub fn from_secrets(secrets: &SecretMap) -> crate::Result<Self> {
        let mut roots = HashMap::new();
        for (app_id, app_roots) in secrets {
            for (root_id, token) in app_roots {
                let root = RootKey::parse(app_id, root_id).map_err(|e| {
                    crate::Error::InvalidRegistry(format!("{app_id}/{root_id}: {e}"))
                })?;
                if token.trim().is_empty() {
                    return Err(crate::Error::InvalidRegistry(format!(
                        "{app_id}/{root_id}: token cannot be empty"
                    )));
                }
                roots.insert(root, digest(token));
            }
        }
        Ok(Self { roots })
    }

    /// Check a presented bearer token against the root's secret.
    ///
    /// Unknown roots never verify.
    pub fn verify(&self, app_id: &str, root_id: &str, presented: &str) -> bool {
        let Ok(root) = RootKey::parse(app_id, root_id) else {
            return false;
        };
        self.verify_root(&root, presented)
    }

    /// Same as [`verify`](Self::verify) for an already parsed root.
    pub fn verify_root(&self, root: &RootKey, presented: &str) -> bool {
        match self.roots.get(root) {
            Some(expected) => constant_time_eq(expected, &digest(presented)),
            None => false,
        }
    }

    /// Number of registered roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl fmt::Debug for SecretRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRegistry")
            .field("roots", &self.roots.len())
            .finish()
    }
}

fn digest(token: &str) -> TokenDigest {
    Sha256::digest(token.as_bytes()).into()
}

fn constant_time_eq(a: &TokenDigest, b: &TokenDigest) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
