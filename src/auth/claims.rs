use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Access tokens authenticate API calls; refresh tokens only buy new pairs
/// at `/auth/refresh`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Registered JWT claims plus the token kind. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn issue(user_id: Uuid, kind: TokenKind, ttl: Duration, issuer: &str, audience: &str) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as usize;
        Self {
            sub: user_id,
            iat: now,
            exp: now.saturating_add(ttl.as_secs() as usize),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"access\"");
        assert_eq!(
            serde_json::from_str::<TokenKind>("\"refresh\"").unwrap(),
            TokenKind::Refresh
        );
        assert!(serde_json::from_str::<TokenKind>("\"admin\"").is_err());
    }

    #[test]
    fn issue_sets_expiry_from_ttl() {
        let id = Uuid::new_v4();
        let c = Claims::issue(id, TokenKind::Refresh, Duration::from_secs(3600), "recipebox", "web");
        assert_eq!(c.sub, id);
        assert_eq!(c.exp - c.iat, 3600);
        assert_eq!(c.iss, "recipebox");
        assert_eq!(c.aud, "web");
        assert_eq!(c.kind, TokenKind::Refresh);
    }
}
