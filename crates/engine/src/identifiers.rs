//! Newtype identifiers for engine objects.
//!
//! The engine names containers and images with opaque strings (full or
//! abbreviated hex ids, or user-chosen names). Wrapping them keeps a
//! [`ContainerId`] from being passed where an [`ImageTag`] is expected. No
//! validation beyond non-emptiness is performed; the engine is the authority
//! on whether an identifier refers to anything.

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and
// String conversions that serde goes through, so deserialising "" fails.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = EngineError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| EngineError::InvalidRequest {
                    message: format!("{} must not be empty", stringify!($name)),
                })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id! {
    /// Identifies a container, either by id (full or short hex) or by name.
    ///
    /// Used to build path suffixes such as `containers/{id}/wait`.
    ContainerId
}

string_id! {
    /// Identifies a built or pulled image by its hex id.
    ///
    /// Produced by the build log scanner from the `Successfully built <id>`
    /// marker line.
    ImageId
}

string_id! {
    /// A repository tag applied to a build result (e.g. `"app:latest"`).
    ImageTag
}
