//! Canonical string construction and MAC computation.
//!
//! The gateway authenticates both directions with a lowercase hex
//! HMAC-SHA1 over the field values joined with `*`, in a fixed order.

use std::fmt;

use hmac::{Hmac, Mac as _};
use sha1::Sha1;

use crate::fields::CanonicalFields;
use crate::key::SigningKey;

type HmacSha1 = Hmac<Sha1>;

/// Separator between values in the string to sign.
pub const FIELD_SEPARATOR: &str = "*";

/// A lowercase hex HMAC-SHA1 digest (40 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mac(String);

impl Mac {
    /// Compute the MAC of `message` with the raw key bytes.
    ///
    /// # Panics
    ///
    /// This function will never panic in practice. HMAC accepts keys of any
    /// size per RFC 2104.
    #[must_use]
    pub fn compute(key: &[u8], message: &str) -> Self {
        let mut mac = HmacSha1::new_from_slice(key).expect("HMAC-SHA1 accepts any key size");
        mac.update(message.as_bytes());
        Self(hex::encode(mac.finalize().into_bytes()))
    }

    /// Compare with a MAC asserted by the gateway, ignoring case.
    #[must_use]
    pub fn matches(&self, received: &str) -> bool {
        constant_time_eq(&self.0, &received.trim().to_ascii_lowercase())
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the hex digest.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Join values with `*`. Absent values become empty strings.
///
/// Some protocol messages end with a separator; pass `trailing_separator`
/// for those.
pub fn canonical_string<'a, I>(values: I, trailing_separator: bool) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut out = values
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR);
    if trailing_separator {
        out.push_str(FIELD_SEPARATOR);
    }
    out
}

/// Sign a field set with the usable key.
#[must_use]
pub fn sign<F: CanonicalFields + ?Sized>(fields: &F, key: &SigningKey) -> Mac {
    Mac::compute(key.as_bytes(), &fields.string_to_sign())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
