//! Authorization interfaces.
//!
//! This crate does not perform token verification itself — that belongs to
//! an external HTTP layer, sitting in a web framework rather than the
//! storage layer. What the store needs from a caller is just the decoded
//! identity and scope set, captured here so call sites can be typed against
//! it without this crate depending on a JWT/OIDC crate.

use std::collections::HashSet;

/// The authenticated caller of an operation, as decoded by an external token
/// verifier from a bearer token's `sub` and `scope` claims.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub subject: Option<String>,
    pub scopes: HashSet<String>,
}

impl AuthContext {
    pub fn new(subject: Option<String>, scopes: HashSet<String>) -> Self {
        Self { subject, scopes }
    }

    /// True only if every scope in `required` is present among the
    /// caller's granted scopes.
    pub fn has_scopes(&self, required: &[&str]) -> bool {
        required.iter().all(|s| self.scopes.contains(*s))
    }
}

/// Verifies a bearer token and produces an [`AuthContext`]. Implemented by
/// the external HTTP layer; this crate ships no implementation, only the
/// seam.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, bearer_token: &str) -> Result<AuthContext, crate::error::StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_scopes_requires_all() {
        let ctx = AuthContext::new(
            Some("user1".to_string()),
            ["a", "b"].into_iter().map(String::from).collect(),
        );
        assert!(ctx.has_scopes(&["a", "b"]));
        assert!(!ctx.has_scopes(&["a", "c"]));
    }
}
