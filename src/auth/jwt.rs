//! JWT token codec
//! Issues and decodes signed, time-bounded claims sets (access + refresh tokens)

use crate::{config::SecurityConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Role name carried by tokens whose user has no role
pub const DEFAULT_ROLE: &str = "guest";

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Token class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Global permission flags of the role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPermissions {
    #[serde(rename = "r_all", default)]
    pub read_all: bool,
    #[serde(rename = "w_all", default)]
    pub write_all: bool,
}

/// CRUD flags for a single resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermissions {
    #[serde(rename = "r", default)]
    pub read: bool,
    #[serde(rename = "w", default)]
    pub write: bool,
    #[serde(rename = "d", default)]
    pub delete: bool,
}

/// Claims supplied by the caller at issue time.
///
/// Registered claims (`jti`, `iat`, `exp`, `type`) are stamped by the codec.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClaimsPayload {
    #[serde(rename = "sub")]
    pub subject: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "role", skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,

    #[serde(rename = "g_perms", skip_serializing_if = "Option::is_none")]
    pub global_permissions: Option<GlobalPermissions>,

    #[serde(rename = "access", skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_access: BTreeMap<String, ResourcePermissions>,
}

impl ClaimsPayload {
    /// Payload carrying nothing but the subject (used for refresh tokens)
    pub fn subject_only(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }
}

/// Decoded and verified claims set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(rename = "sub")]
    pub subject: String,

    /// Email, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Role name, "guest" when absent
    #[serde(rename = "role", default = "default_role")]
    pub role_name: String,

    #[serde(rename = "g_perms", default)]
    pub global_permissions: GlobalPermissions,

    #[serde(rename = "access", default)]
    pub resource_access: BTreeMap<String, ResourcePermissions>,

    /// JWT ID, the unit of revocation
    #[serde(rename = "jti", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,

    /// Expiration (unix seconds)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Issued at (unix seconds)
    #[serde(rename = "iat", default)]
    pub issued_at: i64,

    #[serde(rename = "type")]
    pub token_kind: TokenKind,
}

impl Claims {
    /// Seconds until expiry, zero or negative once expired
    pub fn remaining_ttl_secs(&self) -> i64 {
        self.expires_at - Utc::now().timestamp()
    }
}

/// Wire form: caller payload plus registered claims
#[derive(Serialize)]
struct EncodedClaims<'a> {
    #[serde(flatten)]
    payload: &'a ClaimsPayload,
    jti: String,
    iat: i64,
    exp: i64,
    #[serde(rename = "type")]
    token_kind: TokenKind,
}

/// Token pair response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64, // seconds until access token expires
}

/// JWT codec
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_exp_secs: u64,
    refresh_token_exp_secs: u64,
}

impl TokenCodec {
    /// Create codec from security config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        let secret = config.jwt_secret.expose_secret();

        // Ensure secret is at least 32 bytes for HMAC
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        let algorithm = parse_algorithm(&config.jwt_algorithm)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            access_token_exp_secs: config.access_token_exp_secs,
            refresh_token_exp_secs: config.refresh_token_exp_secs,
        })
    }

    /// Default lifetime for a token kind
    pub fn default_ttl(&self, kind: TokenKind) -> Duration {
        let secs = match kind {
            TokenKind::Access => self.access_token_exp_secs,
            TokenKind::Refresh => self.refresh_token_exp_secs,
        };
        Duration::seconds(secs as i64)
    }

    /// Sign a payload as a token of the given kind
    pub fn issue(
        &self,
        payload: &ClaimsPayload,
        kind: TokenKind,
        ttl_override: Option<Duration>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + ttl_override.unwrap_or_else(|| self.default_ttl(kind));

        let claims = EncodedClaims {
            payload,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            token_kind: kind,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode {:?} token: {:?}", kind, e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Access token with the full payload plus a refresh token carrying only `sub`
    pub fn issue_pair(&self, payload: &ClaimsPayload) -> Result<TokenPair, AppError> {
        let access_token = self.issue(payload, TokenKind::Access, None)?;
        let refresh_token = self.issue(
            &ClaimsPayload::subject_only(payload.subject.clone()),
            TokenKind::Refresh,
            None,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.access_token_exp_secs,
        })
    }

    /// Verify signature and expiry, then decode the claims
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AppError::Expired
                }
                _ => {
                    tracing::debug!("Token validation failed: {:?}", e);
                    AppError::InvalidToken
                }
            })
    }
}

fn parse_algorithm(name: &str) -> Result<Algorithm, AppError> {
    match name.to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AppError::Config(format!("Unsupported JWT algorithm: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_security() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: Secret::new("test_secret_key_32_characters_long!".to_string()),
            jwt_algorithm: "HS256".to_string(),
            access_token_exp_secs: 1800,
            refresh_token_exp_secs: 604800,
            password_min_length: 8,
            password_require_uppercase: true,
            password_require_lowercase: true,
            password_require_digit: true,
            password_require_special: true,
            password_hash_memory_kib: 1024,
            password_hash_iterations: 1,
            password_hash_parallelism: 1,
        }
    }

    fn user_payload() -> ClaimsPayload {
        let mut access = BTreeMap::new();
        access.insert(
            "orders".to_string(),
            ResourcePermissions {
                read: true,
                write: true,
                delete: false,
            },
        );
        ClaimsPayload {
            subject: Uuid::new_v4().to_string(),
            email: Some("a@b.com".to_string()),
            role_name: Some("user".to_string()),
            global_permissions: Some(GlobalPermissions::default()),
            resource_access: access,
        }
    }

    #[test]
    fn test_issue_and_decode_access_token() {
        let codec = TokenCodec::from_config(&test_security()).unwrap();
        let payload = user_payload();

        let token = codec.issue(&payload, TokenKind::Access, None).unwrap();
        let claims = codec.decode(&token).unwrap();

        assert_eq!(claims.subject, payload.subject);
        assert_eq!(claims.role_name, "user");
        assert_eq!(claims.token_kind, TokenKind::Access);
        assert_eq!(claims.expires_at - claims.issued_at, 1800);
        assert!(claims.resource_access["orders"].write);
        assert!(!claims.token_id.unwrap().is_empty());
    }

    #[test]
    fn test_refresh_default_ttl_is_seven_days() {
        let codec = TokenCodec::from_config(&test_security()).unwrap();
        let token = codec
            .issue(&ClaimsPayload::subject_only("u1"), TokenKind::Refresh, None)
            .unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.expires_at - claims.issued_at, 7 * 24 * 3600);
        assert_eq!(claims.role_name, DEFAULT_ROLE);
        assert!(claims.resource_access.is_empty());
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let codec = TokenCodec::from_config(&test_security()).unwrap();
        let token = codec
            .issue(&user_payload(), TokenKind::Access, Some(Duration::seconds(-10)))
            .unwrap();

        assert!(matches!(codec.decode(&token), Err(AppError::Expired)));
    }

    #[test]
    fn test_invalid_token_fails() {
        let codec = TokenCodec::from_config(&test_security()).unwrap();
        assert!(matches!(codec.decode("invalid_token"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let codec = TokenCodec::from_config(&test_security()).unwrap();
        let mut other = test_security();
        other.jwt_secret = Secret::new("another_secret_key_also_32_chars_long".to_string());
        let foreign = TokenCodec::from_config(&other).unwrap();

        let token = foreign.issue(&user_payload(), TokenKind::Access, None).unwrap();
        assert!(matches!(codec.decode(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = test_security();
        config.jwt_secret = Secret::new("short".to_string());
        assert!(TokenCodec::from_config(&config).is_err());
    }
}
