//! Best-effort JSON decoding for responses with stray bytes.
//!
//! The live query service occasionally embeds raw control characters or
//! other junk inside otherwise valid JSON. [`ResilientDecoder`] parses
//! strictly, and on failure blanks the character at the reported error
//! position with a single space and tries again, up to a fixed number of
//! repairs. One damaged field is traded for a parseable document.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

/// Default repair budget.
pub const DEFAULT_MAX_REPAIR_ATTEMPTS: u32 = 100;

/// Errors returned when a payload cannot be repaired.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The repair budget ran out before the payload parsed.
    #[error("payload still malformed after {attempts} repair attempts: {source}")]
    Exhausted {
        /// Repairs performed before giving up.
        attempts: u32,
        /// The last parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The parser stopped at end of input, so masking cannot make progress.
    #[error("payload is truncated at byte {offset}: {source}")]
    Unrepairable {
        /// Byte offset where parsing stopped.
        offset: usize,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// A decoded document and the number of repairs it needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// The parsed JSON value.
    pub value: Value,
    /// Characters blanked before the parse succeeded.
    pub repairs: u32,
}

/// Repairs malformed JSON by masking offending characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResilientDecoder {
    max_attempts: u32,
}

impl Default for ResilientDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REPAIR_ATTEMPTS)
    }
}

impl ResilientDecoder {
    /// Creates a decoder that performs at most `max_attempts` repairs.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Returns the repair budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decodes raw response bytes.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD before parsing.
    ///
    /// # Errors
    ///
    /// See [`ResilientDecoder::decode_str`].
    pub fn decode(&self, payload: &[u8]) -> Result<Decoded, DecodeError> {
        self.decode_str(String::from_utf8_lossy(payload).into_owned())
    }

    /// Decodes a text payload, repairing it in place as needed.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Exhausted`] when the budget is consumed, or
    /// [`DecodeError::Unrepairable`] when the parser hits end of input.
    pub fn decode_str(&self, mut payload: String) -> Result<Decoded, DecodeError> {
        let mut repairs = 0u32;
        loop {
            let error = match serde_json::from_str::<Value>(&payload) {
                Ok(value) => {
                    if repairs > 0 {
                        debug!(repairs, "payload decoded after repair");
                    }
                    return Ok(Decoded { value, repairs });
                }
                Err(error) => error,
            };

            let offset = error_offset(&payload, &error);
            if error.is_eof() || offset >= payload.len() {
                return Err(DecodeError::Unrepairable {
                    offset,
                    source: error,
                });
            }
            if repairs >= self.max_attempts {
                return Err(DecodeError::Exhausted {
                    attempts: repairs,
                    source: error,
                });
            }

            trace!(offset, %error, "masking offending character");
            mask_char_at(&mut payload, offset);
            repairs += 1;
        }
    }
}

/// Converts the parser's 1-based line/column into a byte offset of the
/// offending character.
///
/// Column 0 means the parser stopped on a line feed, which is the last byte
/// of the previous line.
fn error_offset(payload: &str, error: &serde_json::Error) -> usize {
    let line_start = if error.line() <= 1 {
        0
    } else {
        payload
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .nth(error.line() - 2)
            .map_or(payload.len(), |(i, _)| i + 1)
    };
    match error.column() {
        0 => line_start.saturating_sub(1),
        column => line_start + column - 1,
    }
}

/// Replaces the character containing byte `offset` with one space.
fn mask_char_at(payload: &mut String, offset: usize) {
    let mut start = offset;
    while !payload.is_char_boundary(start) {
        start -= 1;
    }
    let width = payload[start..].chars().next().map_or(1, char::len_utf8);
    payload.replace_range(start..start + width, " ");
}
