use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::types::{Actor, LinkShare, Permission};

type HmacSha256 = Hmac<Sha256>;

const SHARE_TOKEN_PREFIX: &str = "trellis-share";
const SHARE_TOKEN_TYPE: &str = "link_share";
const SECRET_BYTES: usize = 32;

/// Claims carried by a link-share bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareClaims {
    pub typ: String,
    pub share_id: i64,
    pub project_id: i64,
    pub permission: Permission,
    pub shared_by_id: i64,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

impl ShareClaims {
    #[must_use]
    pub fn into_actor(self) -> Actor {
        Actor::LinkShare {
            share_id: self.share_id,
            project_id: self.project_id,
            permission: self.permission,
        }
    }
}

/// Turns link shares into bearer tokens and bearer tokens back into actors.
pub trait SessionSigner: Send + Sync {
    fn issue(&self, share: &LinkShare) -> Result<String>;
    fn verify_actor(&self, raw: &str) -> Result<Actor>;
}

/// Signs and verifies link-share bearer tokens with HMAC-SHA256.
///
/// Tokens look like `trellis-share.<claims>.<signature>`, both parts
/// base64url without padding.
pub struct ShareTokenSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl ShareTokenSigner {
    #[must_use]
    pub fn new(key: Vec<u8>, ttl_secs: i64) -> Self {
        Self {
            key,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Builds a signer from a hex-encoded secret as written by `generate_secret`.
    pub fn from_hex(secret: &str, ttl_secs: i64) -> Result<Self> {
        let key = hex::decode(secret.trim())
            .map_err(|e| Error::Config(format!("invalid share token secret: {e}")))?;
        if key.len() < SECRET_BYTES {
            return Err(Error::Config(format!(
                "share token secret must be at least {SECRET_BYTES} bytes"
            )));
        }
        Ok(Self::new(key, ttl_secs))
    }

    /// Returns a fresh hex-encoded signing secret.
    #[must_use]
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill(&mut bytes);
        hex::encode(bytes)
    }

    #[must_use]
    pub fn is_share_token(raw: &str) -> bool {
        raw.starts_with(SHARE_TOKEN_PREFIX) && raw[SHARE_TOKEN_PREFIX.len()..].starts_with('.')
    }

    pub fn sign(&self, claims: &ShareClaims) -> Result<String> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| Error::Config(format!("failed to encode share claims: {e}")))?;
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let signature =
            URL_SAFE_NO_PAD.encode(self.mac(encoded.as_bytes())?.finalize().into_bytes());
        Ok(format!("{SHARE_TOKEN_PREFIX}.{encoded}.{signature}"))
    }

    /// Verifies signature, type and expiry and returns the claims.
    pub fn verify(&self, raw: &str) -> Result<ShareClaims> {
        let mut parts = raw.split('.');
        let (Some(SHARE_TOKEN_PREFIX), Some(encoded), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidTokenFormat);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Error::InvalidTokenFormat)?;
        self.mac(encoded.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| Error::Unauthorized)?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| Error::InvalidTokenFormat)?;
        let claims: ShareClaims =
            serde_json::from_slice(&payload).map_err(|_| Error::InvalidTokenFormat)?;

        if claims.typ != SHARE_TOKEN_TYPE {
            return Err(Error::InvalidTokenFormat);
        }
        if claims.exp < Utc::now().timestamp() {
            return Err(Error::TokenExpired);
        }

        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| Error::Config(format!("invalid share token secret: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

impl SessionSigner for ShareTokenSigner {
    /// Issues a token for `share` expiring after the configured TTL.
    fn issue(&self, share: &LinkShare) -> Result<String> {
        let claims = ShareClaims {
            typ: SHARE_TOKEN_TYPE.to_string(),
            share_id: share.id,
            project_id: share.project_id,
            permission: share.permission,
            shared_by_id: share.shared_by_id,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    fn verify_actor(&self, raw: &str) -> Result<Actor> {
        self.verify(raw).map(ShareClaims::into_actor)
    }
}
