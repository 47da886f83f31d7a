//! Shared protocol crate for the arena server.
//!
//! This crate contains:
//! - Client command definitions (client → server)
//! - Server event definitions (server → client)
//! - Shared types (Color)
//!
//! The wire format is UTF-8 JSON, one event per WebSocket text message,
//! dispatched on a `"type"` tag.

mod commands;
mod error;
mod events;

pub use commands::ClientCommand;
pub use error::ProtocolError;
pub use events::{ServerEvent, TopPlayer};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGB color, carried on the wire as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` string.
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).ok_or_else(|| D::Error::custom(format!("invalid color: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_roundtrip() {
        let color = Color::new(0x1a, 0xff, 0x03);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#1aff03\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
    }

    #[test]
    fn color_rejects_garbage() {
        assert!(Color::parse("1aff03").is_none());
        assert!(Color::parse("#1aff0").is_none());
        assert!(Color::parse("#zzzzzz").is_none());
    }
}
