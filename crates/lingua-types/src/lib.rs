//! Shared types for the Lingua platform.
//!
//! This crate provides the message role vocabulary used wherever the server
//! authors messages itself. It sits at the bottom of the workspace graph and
//! depends only on serde.

use serde::{Deserialize, Serialize};

/// Author of a message within a conversation.
///
/// Serialized lowercase on the wire and in storage (`"user"`, `"assistant"`,
/// `"system"`). This service produces `User` and `Assistant` messages;
/// `System` exists for the tutor instruction prepended to generation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message authored by the end user.
    User,
    /// A message authored by the language model.
    Assistant,
    /// An instruction message establishing model behavior.
    System,
}

impl Role {
    /// Returns the storage/wire label for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}
