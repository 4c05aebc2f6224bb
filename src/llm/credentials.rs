use std::env;
use std::fmt;

use crate::core::errors::CredentialError;

pub const API_KEY_ENV: &str = "GROQ_API_KEY";
pub const API_KEY_PREFIX: &str = "gsk_";

/// Hosted-API credential that passed the prefix check. The key is never
/// sent anywhere to verify it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Missing);
        }
        if !trimmed.starts_with(API_KEY_PREFIX) {
            return Err(CredentialError::BadFormat(API_KEY_PREFIX));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Environment variable first, then the configured value.
    pub fn resolve(configured: Option<&str>) -> Result<Self, CredentialError> {
        let from_env = env::var(API_KEY_ENV).ok().filter(|v| !v.trim().is_empty());
        match from_env.as_deref().or(configured) {
            Some(raw) => Self::parse(raw),
            None => Err(CredentialError::Missing),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}****)", API_KEY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefixed_keys_only() {
        assert_eq!(ApiKey::parse("  gsk_abc123 ").unwrap().expose(), "gsk_abc123");
        assert_eq!(ApiKey::parse(""), Err(CredentialError::Missing));
        assert_eq!(ApiKey::parse("   "), Err(CredentialError::Missing));
        assert_eq!(
            ApiKey::parse("sk-openai"),
            Err(CredentialError::BadFormat(API_KEY_PREFIX))
        );
    }

    #[test]
    fn debug_output_hides_the_key() {
        let key = ApiKey::parse("gsk_supersecret").unwrap();
        assert!(!format!("{:?}", key).contains("supersecret"));
    }
}
