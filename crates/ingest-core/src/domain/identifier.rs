//! Line validation for client frames
//!
//! A frame is one newline-terminated unit of client input. After exactly one
//! terminator (`\n` or `\r\n`) is stripped, the remainder must be either the
//! shutdown command `terminate` or an identifier of exactly nine ASCII digits.
//!
//! Identifiers are kept in their raw form: `000000001` is a valid identifier
//! and is distinct from every other 9-digit string.

use std::fmt;

use thiserror::Error;

/// Number of digits in an identifier.
pub const IDENTIFIER_LEN: usize = 9;

/// Literal command that shuts the listener down.
pub const TERMINATE_COMMAND: &[u8] = b"terminate";

/// A validated 9-digit identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier([u8; IDENTIFIER_LEN]);

impl Identifier {
    /// Validate an already-stripped frame body.
    pub fn parse(body: &[u8]) -> Result<Self, Rejection> {
        if body.len() != IDENTIFIER_LEN {
            return Err(Rejection::WrongLength { len: body.len() });
        }

        if let Some(position) = body.iter().position(|b| !b.is_ascii_digit()) {
            return Err(Rejection::InvalidCharacter {
                position,
                byte: body[position],
            });
        }

        let mut digits = [0u8; IDENTIFIER_LEN];
        digits.copy_from_slice(body);
        Ok(Self(digits))
    }

    /// Raw ASCII digits.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &digit in &self.0 {
            fmt::Write::write_char(f, char::from(digit))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self)
    }
}

impl std::str::FromStr for Identifier {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

/// Why a frame failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("wrong length: {len} (expected {})", IDENTIFIER_LEN)]
    WrongLength { len: usize },

    #[error("invalid character 0x{byte:02x} at position {position}")]
    InvalidCharacter { position: usize, byte: u8 },
}

impl Rejection {
    /// Short machine-friendly reason used in log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::WrongLength { .. } => "wrong-length",
            Rejection::InvalidCharacter { .. } => "invalid-character",
        }
    }
}

/// A frame that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    /// A 9-digit identifier.
    Identifier(Identifier),
    /// The `terminate` command.
    Terminate,
}

/// Remove exactly one trailing terminator (`\r\n` or `\n`) if present.
pub fn strip_terminator(raw: &[u8]) -> &[u8] {
    if let Some(body) = raw.strip_suffix(b"\r\n") {
        body
    } else if let Some(body) = raw.strip_suffix(b"\n") {
        body
    } else {
        raw
    }
}

/// Classify a raw frame.
///
/// The command check runs first: `terminate` has the same length as an
/// identifier and would otherwise be rejected as an invalid character.
pub fn parse_frame(raw: &[u8]) -> Result<Frame, Rejection> {
    let body = strip_terminator(raw);

    if body == TERMINATE_COMMAND {
        return Ok(Frame::Terminate);
    }

    Identifier::parse(body).map(Frame::Identifier)
}
