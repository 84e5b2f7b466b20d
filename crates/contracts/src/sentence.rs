//! Sentence - Cheap-to-clone framed sentence text
//!
//! Uses Arc<str> internally; the bucket index is replayed in an endless loop,
//! so every pass clones each sentence into an outbound message.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// One framed sentence as it appeared in the source log, e.g.
/// `$GPGGA,123519.00,4807.038,N,...*47`.
///
/// The text is opaque apart from the frame marker and checksum that the
/// extractor already verified. Cloning only bumps a reference count.
///
/// # Examples
/// ```
/// use contracts::Sentence;
///
/// let s: Sentence = "$GPZDA,120000.00,21,09,2023,,*6A".into();
/// let s2 = s.clone();
/// assert_eq!(s, s2);
/// assert!(s.starts_with("$GP"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Sentence(Arc<str>);

impl Sentence {
    /// Create a sentence from a string slice.
    #[inline]
    pub fn new(text: &str) -> Self {
        Self(Arc::from(text))
    }

    /// Get the underlying text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the underlying bytes (publish payload).
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Deref for Sentence {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Sentence {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Sentence {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Sentence {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sentence({:?})", self.0)
    }
}

impl PartialEq<str> for Sentence {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for Sentence {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for Sentence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_storage() {
        let a: Sentence = "$GPRMC,000001.00,A*11".into();
        let b = a.clone();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
    }

    #[test]
    fn test_compare_with_str() {
        let s = Sentence::from(String::from("$PSSN,HRP*00"));
        assert_eq!(s, "$PSSN,HRP*00");
        assert_eq!(s.as_bytes(), b"$PSSN,HRP*00");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let s: Sentence = "$GNGSA,A*2E".into();
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"$GNGSA,A*2E\"");
    }
}
