//! Strongly-typed identifiers for domain entities
//!
//! The partner store keys every row by a plain integer, so these newtypes wrap
//! `i32` rather than UUIDs. Wrapping keeps a group id from being passed where a
//! partner id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wraps a raw integer identifier
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Returns the underlying integer
            pub const fn value(&self) -> i32 {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                raw.trim()
                    .parse()
                    .map(Self)
                    .map_err(|_| CoreError::InvalidIdentifier(s.to_string()))
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> i32 {
                id.0
            }
        }
    };
}

// Tenant identifiers
define_id!(ClientId, "CLT");
define_id!(OrgId, "ORG");
define_id!(UserId, "USR");

// Partner domain identifiers
define_id!(PartnerId, "BP");
define_id!(GroupId, "BPG");

/// Tenant partition every partner read and write is evaluated in
///
/// Identifier allocation and code uniqueness are scoped by `client` only; the
/// organization is carried for the rows written under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub client: ClientId,
    pub org: OrgId,
}

impl TenantScope {
    pub fn new(client: impl Into<ClientId>, org: impl Into<OrgId>) -> Self {
        Self {
            client: client.into(),
            org: org.into(),
        }
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.client, self.org)
    }
}
