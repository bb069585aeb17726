//! Signing key normalization.
//!
//! The merchant secret is provisioned as hex text. Two historical formats are
//! in circulation and both must keep working:
//!
//! - **Long keys** (64 hex digits or more) are decoded and used as-is.
//! - **Legacy keys** (around 40 hex digits) go through an XOR derivation that
//!   yields a 20-byte usable key.
//!
//! Anything else is decoded verbatim as a fallback. The lenient path never
//! fails: a bad secret shows up later as a MAC mismatch. Use
//! [`SigningKey::from_secret_strict`] to reject bad secrets up front.

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::KeyError;

/// Minimum number of hex digits for the long key format.
pub const LONG_KEY_MIN_HEX_LEN: usize = 64;

/// Hex lengths accepted as the legacy key format.
pub const LEGACY_KEY_HEX_LEN: RangeInclusive<usize> = 38..=42;

/// Number of hex digits forming the XORed head of a legacy key (19 bytes).
const LEGACY_HEAD_HEX_LEN: usize = 38;

/// Textual wrappers that appear around secrets copied from the merchant back office.
const ALGORITHM_LABEL: &str = "HMAC-SHA1";
const VERSION_LABEL: &str = "VERSION";

/// The format a secret was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// 64+ hex digits, decoded directly.
    Long,
    /// 38-42 hex digits, XOR-derived into 20 bytes.
    Legacy,
    /// Unexpected length, decoded directly.
    Raw,
}

impl KeyFormat {
    /// Classify a cleaned secret by its length in hex digits.
    #[must_use]
    pub fn classify(hex_len: usize) -> Self {
        if hex_len >= LONG_KEY_MIN_HEX_LEN {
            Self::Long
        } else if LEGACY_KEY_HEX_LEN.contains(&hex_len) {
            Self::Legacy
        } else {
            Self::Raw
        }
    }
}

/// The usable key fed to HMAC, tagged with the format it was derived from.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    format: KeyFormat,
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Derive the usable key from a configured secret.
    ///
    /// Never fails. Unexpected lengths and malformed hex are logged as
    /// configuration warnings.
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        let cleaned = clean_secret(secret);
        let format = KeyFormat::classify(cleaned.len());

        let bytes = match format {
            KeyFormat::Long => decode_hex_lenient(cleaned.as_bytes()),
            KeyFormat::Legacy => derive_legacy(cleaned.as_bytes()),
            KeyFormat::Raw => {
                tracing::warn!(
                    hex_len = cleaned.len(),
                    "Signing secret has an unexpected length, using raw decoded bytes"
                );
                decode_hex_lenient(cleaned.as_bytes())
            }
        };

        Self { format, bytes }
    }

    /// Derive the usable key, rejecting secrets the lenient path would only
    /// tolerate.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if the secret is empty, contains non-hex
    /// characters, has an odd number of digits (long format) or matches
    /// neither supported format.
    pub fn from_secret_strict(secret: &str) -> Result<Self, KeyError> {
        let cleaned = clean_secret(secret);
        if cleaned.is_empty() {
            return Err(KeyError::Empty);
        }

        if let Some(position) = cleaned.chars().position(|c| !c.is_ascii_hexdigit()) {
            return Err(KeyError::InvalidHex { position });
        }

        let len = cleaned.len();
        match KeyFormat::classify(len) {
            KeyFormat::Raw => Err(KeyError::UnsupportedLength { len }),
            KeyFormat::Long if len % 2 != 0 => Err(KeyError::OddLength { len }),
            KeyFormat::Long => Ok(Self {
                format: KeyFormat::Long,
                bytes: decode_hex_lenient(cleaned.as_bytes()),
            }),
            KeyFormat::Legacy => Ok(Self {
                format: KeyFormat::Legacy,
                bytes: derive_legacy(cleaned.as_bytes()),
            }),
        }
    }

    /// The format the secret was recognized as.
    #[must_use]
    pub const fn format(&self) -> KeyFormat {
        self.format
    }

    /// The usable key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Derive the usable key bytes from a configured secret.
///
/// Shorthand for `SigningKey::from_secret(secret).as_bytes().to_vec()`.
#[must_use]
pub fn normalize(secret: &str) -> Vec<u8> {
    SigningKey::from_secret(secret).bytes
}

/// Remove whitespace, a `VERSION<n>` label and the algorithm name.
fn clean_secret(secret: &str) -> String {
    let compact: String = secret.chars().filter(|c| !c.is_whitespace()).collect();
    strip_version_label(&compact).replacen(ALGORITHM_LABEL, "", 1)
}

/// Remove the first `VERSION` immediately followed by at least one digit.
fn strip_version_label(s: &str) -> String {
    let mut search_from = 0;
    while let Some(offset) = s[search_from..].find(VERSION_LABEL) {
        let start = search_from + offset;
        let digits_start = start + VERSION_LABEL.len();
        let digits = s[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits > 0 {
            return format!("{}{}", &s[..start], &s[digits_start + digits..]);
        }
        search_from = digits_start;
    }
    s.to_string()
}

/// Decode hex two digits at a time. Malformed pairs decode to zero and a
/// trailing odd digit is dropped.
fn decode_hex_lenient(hex: &[u8]) -> Vec<u8> {
    if hex.len() % 2 != 0 {
        tracing::warn!(hex_len = hex.len(), "Signing secret has an odd number of hex digits");
    }

    hex.chunks_exact(2).map(parse_hex_pair).collect()
}

fn parse_hex_pair(pair: &[u8]) -> u8 {
    // from_str_radix tolerates a sign, so check the digits first.
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return 0;
    }
    std::str::from_utf8(pair)
        .ok()
        .and_then(|p| u8::from_str_radix(p, 16).ok())
        .unwrap_or(0)
}

/// Legacy derivation: the 19-byte head is XORed with the final byte, which
/// is then appended, giving 20 bytes.
fn derive_legacy(hex: &[u8]) -> Vec<u8> {
    let (head, rest) = hex.split_at(LEGACY_HEAD_HEX_LEN.min(hex.len()));

    // Final byte digits are right-padded with '0' (38 digits -> 0x00).
    let mut final_pair = [b'0'; 2];
    for (slot, digit) in final_pair.iter_mut().zip(rest.iter()) {
        *slot = *digit;
    }
    let final_byte = parse_hex_pair(&final_pair);

    decode_hex_lenient(head)
        .into_iter()
        .map(|b| b ^ final_byte)
        .chain(std::iter::once(final_byte))
        .collect()
}
