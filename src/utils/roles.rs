// src/utils/roles.rs

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Resolved authorization role for an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Participant => "participant",
        }
    }

    fn parse(value: &str) -> Role {
        if value == "admin" { Role::Admin } else { Role::Participant }
    }
}

/// Resolves the role for a user id.
///
/// The profile row is authoritative. If the profile lookup errors or finds
/// no row, the legacy `role` key in the users metadata bag is consulted.
/// If neither yields a value the caller is a participant. This is the single
/// place the fallback chain lives; every authorization decision goes through
/// here. Lookup failures never propagate to the caller.
pub async fn resolve_role(pool: &PgPool, user_id: i64) -> Role {
    let profile_role: Result<Option<(String,)>, sqlx::Error> =
        sqlx::query_as("SELECT role FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await;

    match profile_role {
        Ok(Some((role,))) => return Role::parse(&role),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Profile lookup failed for user {}: {:?}", user_id, e);
        }
    }

    let metadata_role: Result<Option<(Option<String>,)>, sqlx::Error> =
        sqlx::query_as("SELECT metadata->>'role' FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await;

    match metadata_role {
        Ok(Some((Some(role),))) => Role::parse(&role),
        _ => Role::Participant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_admin() {
        assert_eq!(Role::parse("admin"), Role::Admin);
    }

    #[test]
    fn parse_anything_else_is_participant() {
        assert_eq!(Role::parse("participant"), Role::Participant);
        assert_eq!(Role::parse("user"), Role::Participant);
        assert_eq!(Role::parse(""), Role::Participant);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::Participant.as_str(), "participant");
    }
}
