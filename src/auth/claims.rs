//! Access-token claims and the role derived from them

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Claims read from the JWT payload. The signature is not checked; the
/// backend remains the authority, this only drives what the client shows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the payload segment of a JWT. `None` for anything malformed.
pub fn decode_claims(token: &str) -> Option<AccessClaims> {
    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    // Some issuers keep the padding; the no-pad engine rejects it.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Access token payload is not valid claims JSON: {}", e);
            None
        }
    }
}

/// User role as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Chief,
    Manager,
    Admin,
    Director,
    Worker,
    Other(String),
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s {
            "chief" => Self::Chief,
            "Manager" | "manager" => Self::Manager,
            "admin" => Self::Admin,
            "director" => Self::Director,
            "Worker" | "worker" => Self::Worker,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Chief => "chief",
            Self::Manager => "Manager",
            Self::Admin => "admin",
            Self::Director => "director",
            Self::Worker => "Worker",
            Self::Other(s) => s,
        }
    }

    /// Landing page after login: chiefs get their own dashboard.
    pub fn home_route(&self) -> &'static str {
        match self {
            Self::Chief => "/chief",
            _ => "/employee",
        }
    }

    /// Managers see the staff and project administration sections.
    pub fn can_manage(&self) -> bool {
        matches!(self, Self::Chief | Self::Manager | Self::Admin | Self::Director)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role carried in the access token, if any.
pub fn role_from_token(token: &str) -> Option<Role> {
    decode_claims(token)?.role.as_deref().map(Role::parse)
}

#[cfg(test)]
pub(crate) fn fake_jwt(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_from_token() {
        let token = fake_jwt(&json!({"user_id": 7, "role": "chief", "exp": 1_700_000_000}));
        assert_eq!(role_from_token(&token), Some(Role::Chief));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_token_without_role() {
        let token = fake_jwt(&json!({"user_id": 7}));
        assert!(decode_claims(&token).is_some());
        assert_eq!(role_from_token(&token), None);
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(decode_claims("A1").is_none());
        assert!(decode_claims("a.b").is_none());
        assert!(decode_claims("a.!!!.c").is_none());
        assert!(decode_claims("a.b.c.d").is_none());
        let not_json = format!("x.{}.y", URL_SAFE_NO_PAD.encode("hello"));
        assert!(decode_claims(&not_json).is_none());
    }

    #[test]
    fn test_home_route() {
        assert_eq!(Role::parse("chief").home_route(), "/chief");
        assert_eq!(Role::parse("Manager").home_route(), "/employee");
        assert_eq!(Role::parse("somebody").home_route(), "/employee");
        assert!(Role::Manager.can_manage());
        assert!(!Role::Worker.can_manage());
        assert_eq!(Role::parse("intern").to_string(), "intern");
    }
}
