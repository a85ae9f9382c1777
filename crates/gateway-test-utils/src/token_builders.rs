//! Session token forging for negative tests.
//!
//! `ForgedTokenBuilder` produces tokens the gateway must reject: wrong
//! secret, wrong algorithm, expired, wrong issuer, missing claims. It starts
//! from a well-formed claim set signed with [`TEST_SIGNING_SECRET`], so a
//! test changes exactly one thing.

use crate::TEST_SIGNING_SECRET;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::Ed25519KeyPair;
use serde_json::{json, Map, Value};

/// Builder for session tokens with arbitrary claims, algorithm and key.
#[derive(Debug, Clone)]
pub struct ForgedTokenBuilder {
    claims: Map<String, Value>,
    secret: String,
}

impl Default for ForgedTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ForgedTokenBuilder {
    /// Claims for user `10001`, valid for one hour from now.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        let claims = json!({
            "user_id": "10001",
            "email": "ada@example.com",
            "name": "Ada Lovelace",
            "iat": now,
            "nbf": now,
            "exp": now + 3600,
            "iss": "brainiac-backend",
        });

        Self {
            claims: claims.as_object().cloned().unwrap_or_default(),
            secret: TEST_SIGNING_SECRET.to_string(),
        }
    }

    pub fn subject(self, user_id: &str) -> Self {
        self.claim("user_id", json!(user_id))
    }

    /// Set `iat` and `nbf` to `timestamp`.
    pub fn issued_at(self, timestamp: i64) -> Self {
        self.claim("iat", json!(timestamp))
            .claim("nbf", json!(timestamp))
    }

    pub fn not_before(self, timestamp: i64) -> Self {
        self.claim("nbf", json!(timestamp))
    }

    pub fn expires_at(self, timestamp: i64) -> Self {
        self.claim("exp", json!(timestamp))
    }

    pub fn issuer(self, issuer: &str) -> Self {
        self.claim("iss", json!(issuer))
    }

    /// Set an arbitrary claim.
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Remove a claim.
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// HMAC secret used by the `sign_hs*` methods.
    pub fn secret(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    fn sign_hmac(&self, alg: Algorithm) -> String {
        encode(
            &Header::new(alg),
            &self.claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .expect("HMAC signing should succeed")
    }

    /// Sign with HS256 (the gateway's algorithm).
    pub fn sign_hs256(&self) -> String {
        self.sign_hmac(Algorithm::HS256)
    }

    /// Sign with HS512 using the same secret.
    pub fn sign_hs512(&self) -> String {
        self.sign_hmac(Algorithm::HS512)
    }

    /// Sign with a freshly generated Ed25519 key.
    pub fn sign_eddsa(&self) -> String {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).expect("Ed25519 key generation");
        encode(
            &Header::new(Algorithm::EdDSA),
            &self.claims,
            &EncodingKey::from_ed_der(pkcs8.as_ref()),
        )
        .expect("EdDSA signing should succeed")
    }

    /// Unsecured token: `alg: none` and an empty signature.
    pub fn unsigned(&self) -> String {
        format!("{}.", self.header_and_payload(r#"{"alg":"none","typ":"JWT"}"#))
    }

    /// Token with a hand-written header and a junk signature.
    pub fn with_raw_header(&self, header_json: &str) -> String {
        format!(
            "{}.{}",
            self.header_and_payload(header_json),
            URL_SAFE_NO_PAD.encode(b"not-a-real-signature")
        )
    }

    fn header_and_payload(&self, header_json: &str) -> String {
        let payload = serde_json::to_vec(&self.claims).expect("claims serialize");
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }
}
