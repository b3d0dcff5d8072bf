use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IdError;

/// Unguessable identifier naming exactly one stored trace.
///
/// A `TraceId` is 120 bits of operating-system randomness rendered as
/// URL-safe base64. 15 bytes is a multiple of 3, so the encoding is always
/// exactly 20 characters with no `=` padding.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(String);

impl TraceId {
    /// Number of random bytes behind every identifier.
    pub const BYTES: usize = 15;

    /// Length of the encoded identifier in characters.
    pub const LEN: usize = Self::BYTES / 3 * 4;

    /// Draw a fresh identifier from the OS CSPRNG.
    ///
    /// # Panics
    ///
    /// Panics if the operating system cannot supply randomness. There is no
    /// sensible fallback: a predictable identifier is worse than none.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Validate untrusted input against the exact length and alphabet.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.len() != Self::LEN {
            return Err(IdError::InvalidLength {
                expected: Self::LEN,
                actual: s.len(),
            });
        }
        if let Some((index, ch)) = s.char_indices().find(|(_, ch)| !is_alphabet_char(*ch)) {
            return Err(IdError::InvalidCharacter { ch, index });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Presentation filename offered to downloaders.
    pub fn download_name(&self) -> String {
        format!("{}.trace", self.0)
    }
}

fn is_alphabet_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TraceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for TraceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TraceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn generated_id_has_fixed_length() {
        assert_eq!(TraceId::LEN, 20);
        for _ in 0..100 {
            assert_eq!(TraceId::generate().as_str().len(), TraceId::LEN);
        }
    }

    #[test]
    fn generated_id_uses_url_safe_alphabet() {
        for _ in 0..1000 {
            let id = TraceId::generate();
            assert!(id.as_str().chars().all(is_alphabet_char), "bad id {id}");
            assert!(!id.as_str().contains('='));
        }
    }

    #[test]
    fn generated_ids_are_distinct() {
        let ids: HashSet<_> = (0..5000).map(|_| TraceId::generate()).collect();
        assert_eq!(ids.len(), 5000);
    }

    #[test]
    fn generated_id_parses_back() {
        let id = TraceId::generate();
        assert_eq!(TraceId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            TraceId::parse("short"),
            Err(IdError::InvalidLength { expected: 20, actual: 5 })
        );
        assert!(TraceId::parse("").is_err());
        assert!(TraceId::parse("aaaaaaaaaaaaaaaaaaaaa").is_err());
    }

    #[test]
    fn rejects_traversal_sequences() {
        assert!(TraceId::parse("../../etc/passwd").is_err());
        // Right length, wrong alphabet.
        assert_eq!(
            TraceId::parse("../../../etc/passwdx"),
            Err(IdError::InvalidCharacter { ch: '.', index: 0 })
        );
        assert!(TraceId::parse("aaaaaaaaaaaaaaaaaa/a").is_err());
        assert!(TraceId::parse("aaaaaaaaaaaaaaaaaaa=").is_err());
    }

    #[test]
    fn multibyte_input_is_rejected() {
        // 20 bytes but only 10 chars.
        assert!(TraceId::parse("éééééééééé").is_err());
    }

    #[test]
    fn download_name_has_trace_suffix() {
        let id = TraceId::parse("AbCdEfGhIjKlMnOpQr-_").unwrap();
        assert_eq!(id.download_name(), "AbCdEfGhIjKlMnOpQr-_.trace");
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let id = TraceId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: TraceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<TraceId>("\"../etc/passwd\"").is_err());
    }

    proptest! {
        #[test]
        fn any_valid_shape_parses(s in "[A-Za-z0-9_-]{20}") {
            let id = TraceId::parse(&s).unwrap();
            prop_assert_eq!(id.as_str(), s.as_str());
        }

        #[test]
        fn parsed_ids_never_contain_path_characters(s in "\\PC{0,40}") {
            if let Ok(id) = TraceId::parse(&s) {
                prop_assert!(!id.as_str().contains('/'));
                prop_assert!(!id.as_str().contains('\\'));
                prop_assert!(!id.as_str().contains('.'));
            }
        }
    }
}
