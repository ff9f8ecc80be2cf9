//! Bluefruit Connect packet codec.
//!
//! The controller app sends short framed packets over the UART service:
//!
//! ```text
//! color:  '!' 'C' r  g  b      checksum   (6 bytes)
//! button: '!' 'B' id state     checksum   (5 bytes)
//! ```
//!
//! `checksum` is the bitwise complement of the wrapping byte sum of every
//! byte before it. Button ids `'1'..='4'` are the auxiliary buttons, `'5'..='8'`
//! are up, down, left and right. `state` is `'1'` for pressed, `'0'` for
//! released.
//!
//! # Example
//! ```rust
//! use rover_core::utils::connection::packet;
//! use rover_core::utils::{Button, Command};
//!
//! let cmd = packet::decode(b"!B516");
//! assert_eq!(cmd, Some(Command::ButtonEvent { button: Button::Up, pressed: true }));
//! ```

use smart_leds_trait::RGB8;

use crate::utils::controllers::{Button, Command};

/// Largest message the link delivers in one frame.
pub const MAX_PACKET_LEN: usize = 20;

const START: u8 = b'!';
const COLOR_TAG: u8 = b'C';
const BUTTON_TAG: u8 = b'B';
const COLOR_LEN: usize = 6;
const BUTTON_LEN: usize = 5;

/// Reasons a frame was not turned into a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    Empty,
    MissingStart(u8),
    /// Valid framing but a packet type this robot does not act on.
    UnknownType(u8),
    Length { expected: usize, actual: usize },
    Checksum { expected: u8, actual: u8 },
    UnknownButton(u8),
    UnknownState(u8),
}

enum Kind {
    Color,
    Button,
}

/// An encoded packet, ready to hand to the link.
#[derive(Debug, Clone, Copy)]
pub struct Packet {
    bytes: [u8; MAX_PACKET_LEN],
    len: usize,
}

impl Packet {
    /// Frame `body` (start byte and tag included) and append its checksum.
    fn seal(body: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_PACKET_LEN];
        bytes[..body.len()].copy_from_slice(body);
        bytes[body.len()] = checksum(body);
        Self {
            bytes,
            len: body.len() + 1,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Complement of the wrapping sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Decode one framed message, discarding anything that is not a valid color
/// or button packet.
pub fn decode(bytes: &[u8]) -> Option<Command> {
    match parse(bytes) {
        Ok(command) => Some(command),
        Err(error) => {
            tracing::debug!(?error, len = bytes.len(), "discarding packet");
            None
        }
    }
}

/// Like [`decode`], but reports why a frame was rejected.
pub fn parse(bytes: &[u8]) -> Result<Command, PacketError> {
    let (&start, rest) = bytes.split_first().ok_or(PacketError::Empty)?;
    if start != START {
        return Err(PacketError::MissingStart(start));
    }

    let tag = *rest.first().ok_or(PacketError::Length {
        expected: 2,
        actual: bytes.len(),
    })?;
    let (kind, expected) = match tag {
        COLOR_TAG => (Kind::Color, COLOR_LEN),
        BUTTON_TAG => (Kind::Button, BUTTON_LEN),
        other => return Err(PacketError::UnknownType(other)),
    };
    if bytes.len() != expected {
        return Err(PacketError::Length {
            expected,
            actual: bytes.len(),
        });
    }

    let (body, tail) = bytes.split_at(expected - 1);
    let want = checksum(body);
    if tail[0] != want {
        return Err(PacketError::Checksum {
            expected: want,
            actual: tail[0],
        });
    }

    match kind {
        Kind::Color => Ok(Command::SetColor {
            color: RGB8 {
                r: body[2],
                g: body[3],
                b: body[4],
            },
        }),
        Kind::Button => {
            let button = button_from_id(body[2]).ok_or(PacketError::UnknownButton(body[2]))?;
            let pressed = match body[3] {
                b'1' => true,
                b'0' => false,
                other => return Err(PacketError::UnknownState(other)),
            };
            Ok(Command::ButtonEvent { button, pressed })
        }
    }
}

/// Encode a command the way the controller app would send it.
pub fn encode(command: &Command) -> Packet {
    match *command {
        Command::SetColor { color } => {
            Packet::seal(&[START, COLOR_TAG, color.r, color.g, color.b])
        }
        Command::ButtonEvent { button, pressed } => Packet::seal(&[
            START,
            BUTTON_TAG,
            button_id(button),
            if pressed { b'1' } else { b'0' },
        ]),
    }
}

fn button_id(button: Button) -> u8 {
    match button {
        Button::Aux1 => b'1',
        Button::Aux2 => b'2',
        Button::Aux3 => b'3',
        Button::Aux4 => b'4',
        Button::Up => b'5',
        Button::Down => b'6',
        Button::Left => b'7',
        Button::Right => b'8',
    }
}

fn button_from_id(id: u8) -> Option<Button> {
    Some(match id {
        b'1' => Button::Aux1,
        b'2' => Button::Aux2,
        b'3' => Button::Aux3,
        b'4' => Button::Aux4,
        b'5' => Button::Up,
        b'6' => Button::Down,
        b'7' => Button::Left,
        b'8' => Button::Right,
        _ => return None,
    })
}
