//! Signed access tokens.
//!
//! Wire format: `b64url(header) "." b64url(claims) "." b64url(hmac)` without
//! padding, where the HMAC-SHA256 covers the first two encoded segments.
//! Timestamps inside the claims are Unix milliseconds.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha256;

use super::{AuthError, TokenError};
use crate::config::{AuthSettings, ConfigError};
use crate::models::auth::{TokenClaims, TokenHeader};

type HmacSha256 = Hmac<Sha256>;

const ALG: &str = "HS256";
const TYP: &str = "JWT";

/// Current time in Unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Issues and checks tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    encoded_header: String,
    validity: Duration,
    refresh_limit: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("validity", &self.validity)
            .field("refresh_limit", &self.refresh_limit)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Result<Self, ConfigError> {
        if settings.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        let mac = HmacSha256::new_from_slice(settings.secret.as_bytes())
            .map_err(|_| ConfigError::MissingSecret)?;
        let header = TokenHeader {
            alg: ALG.to_string(),
            typ: TYP.to_string(),
        };
        let header_json = serde_json::to_vec(&header).map_err(|e| ConfigError::InvalidValue {
            key: "token header",
            value: e.to_string(),
        })?;

        Ok(Self {
            mac,
            encoded_header: URL_SAFE_NO_PAD.encode(header_json),
            validity: settings.token_validity,
            refresh_limit: settings.refresh_limit,
        })
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn refresh_limit(&self) -> Duration {
        self.refresh_limit
    }

    /// Issue a token for `id` valid from now.
    pub fn issue(&self, id: i64, is_admin: bool) -> Result<String, AuthError> {
        self.issue_at(id, is_admin, now_ms())
    }

    /// Issue a token as if the current time were `now` (ms).
    ///
    /// Tokens carry no nonce: the same subject, flag and millisecond always
    /// yield the same bytes. Callers wanting a distinct token must let the
    /// clock advance.
    pub fn issue_at(&self, id: i64, is_admin: bool, now: i64) -> Result<String, AuthError> {
        let claims = TokenClaims {
            id,
            is_admin,
            iat: now,
            exp: now + self.validity.num_milliseconds(),
        };
        self.encode(&claims)
    }

    /// Serialize and sign arbitrary claims.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let claims_json = serde_json::to_vec(claims)
            .map_err(|e| AuthError::Internal(format!("token claims encode: {e}")))?;
        let encoded_claims = URL_SAFE_NO_PAD.encode(claims_json);
        let signature = self.sign(&self.encoded_header, &encoded_claims);
        Ok(format!("{}.{encoded_claims}.{signature}", self.encoded_header))
    }

    /// Parse a token and check its signature. Expiry is not checked.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let parsed_header: TokenHeader = decode_segment(header)?;
        if parsed_header.alg != ALG {
            return Err(TokenError::Malformed);
        }
        let parsed_claims: TokenClaims = decode_segment(claims)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::BadSignature)?;
        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        Ok(parsed_claims)
    }

    /// Decode and reject tokens past their expiry.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, now_ms())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        let claims = self.decode(token)?;
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Whether a token issued at `claims.iat` may still be exchanged at `now`.
    pub fn within_refresh_window(&self, claims: &TokenClaims, now: i64) -> bool {
        now - claims.iat <= self.refresh_limit.num_milliseconds()
    }

    fn sign(&self, encoded_header: &str, encoded_claims: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(encoded_header.as_bytes());
        mac.update(b".");
        mac.update(encoded_claims.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthSettings::new("test-secret").unwrap()).unwrap()
    }

    fn segments(token: &str) -> Vec<String> {
        token.split('.').map(str::to_string).collect()
    }

    #[test]
    fn header_is_hs256_jwt() {
        let token = codec().issue_at(1, false, NOW).unwrap();
        let header = URL_SAFE_NO_PAD.decode(&segments(&token)[0]).unwrap();
        assert_eq!(header, br#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn claims_use_wire_names() {
        let token = codec().issue_at(42, true, NOW).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(&segments(&token)[1]).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["isAdmin"], true);
        assert_eq!(json["iat"], NOW);
        assert_eq!(json["exp"], NOW + 15 * 60 * 1000);
    }

    #[test]
    fn issued_token_round_trips() {
        let codec = codec();
        let token = codec.issue_at(7, true, NOW).unwrap();
        let claims = codec.verify_at(&token, NOW + 1).unwrap();
        assert_eq!(
            claims,
            TokenClaims {
                id: 7,
                is_admin: true,
                iat: NOW,
                exp: NOW + codec.validity().num_milliseconds(),
            }
        );
    }

    #[test]
    fn tokens_differ_only_once_the_clock_moves() {
        let codec = codec();
        let first = codec.issue_at(7, false, NOW).unwrap();
        assert_eq!(codec.issue_at(7, false, NOW).unwrap(), first);
        assert_ne!(codec.issue_at(7, false, NOW + 1).unwrap(), first);
    }

    #[test]
    fn token_is_not_padded() {
        let token = codec().issue_at(7, false, NOW).unwrap();
        assert!(!token.contains('='));
        assert_eq!(segments(&token).len(), 3);
    }

    #[test]
    fn token_expires_at_exp() {
        let codec = codec();
        let token = codec.issue_at(7, false, NOW).unwrap();
        let exp = NOW + codec.validity().num_milliseconds();
        assert!(codec.verify_at(&token, exp - 1).is_ok());
        assert_eq!(codec.verify_at(&token, exp), Err(TokenError::Expired));
    }

    #[test]
    fn zero_validity_is_immediately_expired() {
        let mut settings = AuthSettings::new("test-secret").unwrap();
        settings.token_validity = Duration::zero();
        let codec = TokenCodec::new(&settings).unwrap();
        let token = codec.issue_at(7, false, NOW).unwrap();
        assert_eq!(codec.verify_at(&token, NOW), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let codec = codec();
        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
        assert_eq!(codec.decode("abc.def"), Err(TokenError::Malformed));
        assert_eq!(codec.decode("a.b.c.d"), Err(TokenError::Malformed));
    }

    #[test]
    fn garbage_claims_are_malformed() {
        let codec = codec();
        let parts = segments(&codec.issue_at(7, false, NOW).unwrap());
        let token = format!("{}.{}.{}", parts[0], "!!not-base64!!", parts[2]);
        assert_eq!(codec.decode(&token), Err(TokenError::Malformed));

        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        let token = format!("{}.{}.{}", parts[0], not_json, parts[2]);
        assert_eq!(codec.decode(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn foreign_algorithm_is_malformed() {
        let codec = codec();
        let parts = segments(&codec.issue_at(7, false, NOW).unwrap());
        let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let token = format!("{none_header}.{}.{}", parts[1], parts[2]);
        assert_eq!(codec.decode(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn any_signature_character_change_is_rejected() {
        let codec = codec();
        let token = codec.issue_at(7, false, NOW).unwrap();
        let parts = segments(&token);
        let signature: Vec<char> = parts[2].chars().collect();

        for i in 0..signature.len() {
            let mut mutated = signature.clone();
            mutated[i] = if mutated[i] == 'A' { 'B' } else { 'A' };
            let mutated: String = mutated.into_iter().collect();
            let forged = format!("{}.{}.{mutated}", parts[0], parts[1]);
            assert_eq!(
                codec.verify_at(&forged, NOW),
                Err(TokenError::BadSignature),
                "position {i}"
            );
        }
    }

    #[test]
    fn re_encoded_claims_without_resigning_are_rejected() {
        let codec = codec();
        let parts = segments(&codec.issue_at(7, false, NOW).unwrap());
        let escalated = TokenClaims {
            id: 7,
            is_admin: true,
            iat: NOW,
            exp: NOW + 1_000_000,
        };
        let forged_claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&escalated).unwrap());
        let forged = format!("{}.{forged_claims}.{}", parts[0], parts[2]);
        assert_eq!(codec.verify_at(&forged, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = codec().issue_at(7, false, NOW).unwrap();
        let other = TokenCodec::new(&AuthSettings::new("another-secret").unwrap()).unwrap();
        assert_eq!(other.verify_at(&token, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn refresh_window_counts_from_iat() {
        let codec = codec();
        let claims = codec.verify_at(&codec.issue_at(7, false, NOW).unwrap(), NOW).unwrap();
        let limit = codec.refresh_limit().num_milliseconds();
        assert!(codec.within_refresh_window(&claims, NOW + limit));
        assert!(!codec.within_refresh_window(&claims, NOW + limit + 1));
    }

    #[test]
    fn empty_secret_is_refused() {
        let settings = AuthSettings {
            secret: String::new(),
            ..AuthSettings::new("x").unwrap()
        };
        assert!(matches!(
            TokenCodec::new(&settings),
            Err(ConfigError::MissingSecret)
        ));
    }
}
