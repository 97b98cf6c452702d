//! Capability scope handling.
//!
//! [`AuthScopes`] is used twice in the handshake: once for the scopes the app
//! requests in the authorization redirect, and once for the scopes the host
//! actually granted, as reported by the credential exchange.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// An ordered set of capability scopes.
///
/// Scopes are kept sorted so the rendered `scope` parameter is stable.
/// A `write_x` scope implies `read_x` (and `unauthenticated_write_x` implies
/// `unauthenticated_read_x`); implied scopes take part in [`covers`] but are
/// not added to the rendered list, so the authorization URL carries exactly
/// what was configured.
///
/// [`covers`]: AuthScopes::covers
///
/// # Example
///
/// ```rust
/// use shop_handshake::AuthScopes;
///
/// let granted: AuthScopes = "write_products, read_orders".parse().unwrap();
/// assert_eq!(granted.to_string(), "read_orders,write_products");
///
/// let needed: AuthScopes = "read_products".parse().unwrap();
/// assert!(granted.covers(&needed));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if every scope in `other` is held here, directly or
    /// through an implied scope.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other
            .scopes
            .iter()
            .all(|wanted| self.scopes.contains(wanted) || self.implies(wanted))
    }

    /// Returns an iterator over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn implies(&self, wanted: &str) -> bool {
        self.scopes
            .iter()
            .filter_map(|held| implied_read_scope(held))
            .any(|implied| implied == wanted)
    }
}

fn implied_read_scope(scope: &str) -> Option<String> {
    if let Some(rest) = scope.strip_prefix("unauthenticated_write_") {
        return Some(format!("unauthenticated_read_{rest}"));
    }
    scope.strip_prefix("write_").map(|rest| format!("read_{rest}"))
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }
            scopes.insert(scope.to_string());
        }

        Ok(Self { scopes })
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.scopes {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(scope)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
