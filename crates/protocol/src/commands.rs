//! Client → server commands.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// A command sent by a client.
///
/// The tag set is closed: unknown `"type"` values fail to parse and the
/// server drops the frame silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ClientCommand {
    /// Display-name registration. Activates the session.
    Pseudo { pseudo: String },
    /// Chat message, relayed verbatim.
    Chat { message: String },
    /// Absolute position + aim angle update.
    Move {
        x: f32,
        y: f32,
        #[serde(rename = "aimAngle", default)]
        aim_angle: f32,
    },
    /// Fire request: shot origin and direction.
    Shoot { x: f32, y: f32, angle: f32 },
}

impl ClientCommand {
    /// Decode a command from a JSON text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pseudo() {
        let cmd = ClientCommand::parse(r#"{"type":"pseudo","pseudo":"ada"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Pseudo { pseudo: "ada".into() });
    }

    #[test]
    fn parses_move_with_aim_angle() {
        let cmd = ClientCommand::parse(r#"{"type":"move","x":10.5,"y":-3.0,"aimAngle":1.2}"#).unwrap();
        match cmd {
            ClientCommand::Move { x, y, aim_angle } => {
                assert_eq!(x, 10.5);
                assert_eq!(y, -3.0);
                assert_eq!(aim_angle, 1.2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn move_aim_angle_defaults_to_zero() {
        let cmd = ClientCommand::parse(r#"{"type":"move","x":1,"y":2}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Move { x: 1.0, y: 2.0, aim_angle: 0.0 });
    }

    #[test]
    fn parses_shoot() {
        let cmd = ClientCommand::parse(r#"{"type":"shoot","x":100,"y":100,"angle":0.5}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Shoot { x: 100.0, y: 100.0, angle: 0.5 });
    }

    #[test]
    fn rejects_unknown_tag() {
        assert!(ClientCommand::parse(r#"{"type":"teleport","x":0,"y":0}"#).is_err());
    }

    #[test]
    fn rejects_non_json() {
        assert!(ClientCommand::parse("not json").is_err());
    }
}
