//! Push-notification authentication.
//!
//! The sender holds an Ed25519 keypair generated at startup and publishes
//! the public half as a JWKS document. Each webhook delivery carries an
//! EdDSA JWT whose claims bind the exact request body (SHA-256 digest) and
//! issue time. The receiver resolves the key by `kid` from JWKS fetched
//! over HTTP and verifies header-against-body before acting.
//!
//! Verification failures feed a counter; a fixed 60-second timer re-fetches
//! the key set whenever the counter is non-zero, which heals the cache
//! after the sender restarts with a rotated key. There is no nonce
//! tracking, so replay within the token age window is not detected.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use a2a_proto::{A2aError, A2aResult};

/// Header carrying the push-notification token.
pub const AUTH_HEADER: &str = "authorization";

/// Scheme prefix on the auth header value.
pub const AUTH_HEADER_PREFIX: &str = "Bearer ";

/// How often the receiver re-checks its failure counter.
pub const JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Maximum accepted age of a delivery token.
const MAX_TOKEN_AGE_SECS: i64 = 300;

/// JWT claims binding a delivery to its body and issue time.
#[derive(Debug, Serialize, Deserialize)]
struct PushClaims {
    iat: i64,
    request_body_sha256: String,
}

fn body_digest(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ── Sender ───────────────────────────────────────────────────

/// Signs outgoing push notifications.
pub struct PushNotificationSenderAuth {
    encoding_key: EncodingKey,
    kid: String,
    public_jwk: serde_json::Value,
}

impl std::fmt::Debug for PushNotificationSenderAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushNotificationSenderAuth")
            .field("kid", &self.kid)
            .finish()
    }
}

impl PushNotificationSenderAuth {
    /// Generate a fresh Ed25519 keypair.
    pub fn generate() -> A2aResult<Self> {
        let signing = SigningKey::generate(&mut rand::rngs::OsRng);
        let verifying = signing.verifying_key();

        let x = URL_SAFE_NO_PAD.encode(verifying.as_bytes());
        let kid = body_digest(verifying.as_bytes());
        let pkcs8 = signing
            .to_pkcs8_der()
            .map_err(|e| A2aError::internal(format!("failed to encode signing key: {e}")))?;
        let encoding_key = EncodingKey::from_ed_der(pkcs8.as_bytes());

        let public_jwk = serde_json::json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "alg": "EdDSA",
            "use": "sig",
            "kid": kid,
            "x": x,
        });

        info!(kid = %kid, "Push-notification signing key generated");
        Ok(Self {
            encoding_key,
            kid,
            public_jwk,
        })
    }

    /// Key id of the active signing key.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The public key set document to serve at the JWKS endpoint.
    pub fn jwks(&self) -> serde_json::Value {
        serde_json::json!({ "keys": [self.public_jwk] })
    }

    /// Sign a raw payload body, returning the JWT.
    pub fn sign(&self, body: &[u8]) -> A2aResult<String> {
        let claims = PushClaims {
            iat: Utc::now().timestamp(),
            request_body_sha256: body_digest(body),
        };
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| A2aError::internal(format!("failed to sign push notification: {e}")))
    }

    /// Full `Authorization` header value for a payload body.
    pub fn bearer(&self, body: &[u8]) -> A2aResult<String> {
        Ok(format!("{AUTH_HEADER_PREFIX}{}", self.sign(body)?))
    }
}

// ── Receiver ─────────────────────────────────────────────────

/// Verifies incoming push notifications against a cached JWKS.
pub struct PushNotificationReceiverAuth {
    jwks_urls: Vec<String>,
    http: reqwest::Client,
    keys: RwLock<Vec<Jwk>>,
    verify_failures: AtomicU32,
}

impl std::fmt::Debug for PushNotificationReceiverAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushNotificationReceiverAuth")
            .field("jwks_urls", &self.jwks_urls)
            .field("failures", &self.verify_failures.load(Ordering::Relaxed))
            .finish()
    }
}

impl PushNotificationReceiverAuth {
    /// Receiver loading keys from the given JWKS URLs.
    pub fn new(jwks_urls: Vec<String>) -> Self {
        Self {
            jwks_urls,
            http: reqwest::Client::new(),
            keys: RwLock::new(Vec::new()),
            verify_failures: AtomicU32::new(0),
        }
    }

    /// Fetch every configured JWKS URL and replace the cached key set.
    pub async fn load_jwks(&self) -> A2aResult<()> {
        let mut keys = Vec::new();
        for url in &self.jwks_urls {
            let set: JwkSet = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| A2aError::transport(format!("failed to fetch JWKS from {url}: {e}")))?
                .json()
                .await
                .map_err(|e| A2aError::transport(format!("invalid JWKS document at {url}: {e}")))?;
            keys.extend(set.keys);
        }
        info!(count = keys.len(), "JWKS loaded");
        self.replace_keys(keys);
        Ok(())
    }

    /// Load a key set from a verbatim JWKS JSON document.
    pub fn load_jwks_json(&self, json: &str) -> A2aResult<()> {
        let set: JwkSet = serde_json::from_str(json)?;
        self.replace_keys(set.keys);
        Ok(())
    }

    fn replace_keys(&self, keys: Vec<Jwk>) {
        if let Ok(mut guard) = self.keys.write() {
            *guard = keys;
        }
    }

    /// Verify a delivery's auth header against its raw body. Failures are
    /// counted for the background JWKS refresh.
    pub fn verify(&self, auth_header: &str, body: &[u8]) -> bool {
        match self.verify_inner(auth_header, body) {
            Ok(()) => true,
            Err(e) => {
                self.verify_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Push notification verification failed");
                false
            }
        }
    }

    fn verify_inner(&self, auth_header: &str, body: &[u8]) -> A2aResult<()> {
        let token = auth_header
            .strip_prefix(AUTH_HEADER_PREFIX)
            .ok_or_else(|| A2aError::invalid_params("missing Bearer prefix on auth header"))?;

        let header = decode_header(token)
            .map_err(|e| A2aError::invalid_params(format!("malformed token header: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| A2aError::invalid_params("token header carries no kid"))?;

        let jwk = {
            let keys = self
                .keys
                .read()
                .map_err(|_| A2aError::internal("JWKS cache lock poisoned"))?;
            keys.iter()
                .find(|k| k.common.key_id.as_deref() == Some(kid.as_str()))
                .cloned()
                .ok_or_else(|| A2aError::invalid_params(format!("no JWKS entry for kid {kid}")))?
        };

        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| A2aError::internal(format!("unusable JWKS entry: {e}")))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<PushClaims>(token, &decoding_key, &validation)
            .map_err(|e| A2aError::invalid_params(format!("signature verification failed: {e}")))?;

        if data.claims.request_body_sha256 != body_digest(body) {
            return Err(A2aError::invalid_params("payload digest mismatch"));
        }
        let age = Utc::now().timestamp() - data.claims.iat;
        if !(0..=MAX_TOKEN_AGE_SECS).contains(&age) {
            return Err(A2aError::invalid_params("token outside accepted age window"));
        }
        Ok(())
    }

    /// Number of verification failures since the last successful reload.
    pub fn failure_count(&self) -> u32 {
        self.verify_failures.load(Ordering::Relaxed)
    }

    /// Background timer: whenever verifications have failed since the last
    /// tick, re-fetch the JWKS (the sender may have rotated its key) and
    /// reset the counter.
    pub fn spawn_refresh_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let auth = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(JWKS_REFRESH_INTERVAL);
            interval.tick().await; // first tick is immediate
            loop {
                interval.tick().await;
                if auth.failure_count() == 0 {
                    continue;
                }
                match auth.load_jwks().await {
                    Ok(()) => auth.verify_failures.store(0, Ordering::Relaxed),
                    Err(e) => error!(error = %e, "JWKS reload failed"),
                }
            }
        })
    }
}
