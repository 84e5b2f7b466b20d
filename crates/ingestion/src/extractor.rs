//! Sentence extraction
//!
//! Grammar, byte-exact:
//!
//! ```text
//! '$' TALKER payload '*' HEX HEX
//! TALKER  := GP | GN | GL | GA | GB | GQ | PSSN | PS | PM | PC
//! payload := any characters except '$' (line breaks included)
//! ```
//!
//! The payload is greedy: within the stretch of text that runs up to the next
//! frame marker, the match ends at the *last* `*XX` checksum. Matches never
//! overlap and the scan is independent of line structure.

const FRAME_MARKER: u8 = b'$';
const CHECKSUM_DELIMITER: u8 = b'*';
/// Delimiter plus two hex digits
const CHECKSUM_LEN: usize = 3;

/// Talker / sentence-id prefixes accepted right after the frame marker.
pub const TALKER_PREFIXES: [&str; 10] = [
    "GP", "GN", "GL", "GA", "GB", "GQ", "PSSN", "PS", "PM", "PC",
];

/// Lazy scanner yielding candidate sentences in text order.
///
/// Every yielded slice starts with `$` and ends with `*` followed by two hex
/// digits. Sentences truncated before their checksum are never yielded.
#[derive(Debug, Clone)]
pub struct SentenceExtractor<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> SentenceExtractor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }
}

/// Shorthand for [`SentenceExtractor::new`].
pub fn extract_sentences(text: &str) -> SentenceExtractor<'_> {
    SentenceExtractor::new(text)
}

impl<'a> Iterator for SentenceExtractor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();

        while let Some(start) = find_marker(bytes, self.cursor) {
            // The payload may not cross another frame marker
            let region_end = find_marker(bytes, start + 1).unwrap_or(bytes.len());
            self.cursor = region_end;

            let Some(prefix_len) = talker_prefix_len(&bytes[start + 1..region_end]) else {
                continue;
            };

            if let Some(end) = last_checksum_end(bytes, start + 1 + prefix_len, region_end) {
                self.cursor = end;
                // '$', '*' and hex digits are ASCII, so both ends are char boundaries
                return Some(&self.text[start..end]);
            }
        }

        self.cursor = bytes.len();
        None
    }
}

fn find_marker(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == FRAME_MARKER)
        .map(|pos| from + pos)
}

fn talker_prefix_len(after_marker: &[u8]) -> Option<usize> {
    TALKER_PREFIXES
        .iter()
        .find(|prefix| after_marker.starts_with(prefix.as_bytes()))
        .map(|prefix| prefix.len())
}

/// End offset of the last `*XX` whose delimiter sits in `[payload_start, region_end)`.
fn last_checksum_end(bytes: &[u8], payload_start: usize, region_end: usize) -> Option<usize> {
    if region_end < payload_start + CHECKSUM_LEN {
        return None;
    }

    (payload_start..=region_end - CHECKSUM_LEN)
        .rev()
        .find(|&pos| {
            bytes[pos] == CHECKSUM_DELIMITER
                && bytes[pos + 1].is_ascii_hexdigit()
                && bytes[pos + 2].is_ascii_hexdigit()
        })
        .map(|pos| pos + CHECKSUM_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<&str> {
        extract_sentences(text).collect()
    }

    #[test]
    fn test_extracts_line_per_sentence() {
        let text = "$GPGGA,123519.00,4807.038,N,01131.000,E*47\r\n\
                    $GNRMC,123520.00,A,4807.038,N*6b\r\n";
        assert_eq!(
            collect(text),
            vec![
                "$GPGGA,123519.00,4807.038,N,01131.000,E*47",
                "$GNRMC,123520.00,A,4807.038,N*6b",
            ]
        );
    }

    #[test]
    fn test_missing_checksum_is_skipped() {
        let text = "$GPGGA,123519.00,4807.038,N\n$GPGLL,123520.00,4807.038*1F\n";
        assert_eq!(collect(text), vec!["$GPGLL,123520.00,4807.038*1F"]);
    }

    #[test]
    fn test_truncated_tail_is_never_matched() {
        assert!(collect("noise $GPGGA,123519.00,4807.0*4").is_empty());
        assert!(collect("$GPGGA,123519.00*").is_empty());
    }

    #[test]
    fn test_unknown_talker_is_skipped() {
        let text = "$XXGGA,123519.00*47 $HEHDT,1.0,T*2A $PSSN,HRP,123519.00*0C";
        assert_eq!(collect(text), vec!["$PSSN,HRP,123519.00*0C"]);
    }

    #[test]
    fn test_payload_is_greedy_up_to_next_marker() {
        // Second checksum before the next '$' wins; text in between rides along
        let text = "$GPGSV,1,1*70 trailing *AB\n$GPGSA,A,3*11";
        assert_eq!(
            collect(text),
            vec!["$GPGSV,1,1*70 trailing *AB", "$GPGSA,A,3*11"]
        );
    }

    #[test]
    fn test_interleaved_with_binary_noise() {
        let text = "\u{1}\u{2}garbage$GPZDA,000000.00,21,09,2023*6Aµµ$$PM,x*FFtail";
        assert_eq!(collect(text), vec!["$GPZDA,000000.00,21,09,2023*6A", "$PM,x*FF"]);
    }

    #[test]
    fn test_non_hex_checksum_rejected() {
        assert!(collect("$GPGGA,1*G1").is_empty());
        assert_eq!(collect("$GPGGA,1*G1*a0"), vec!["$GPGGA,1*G1*a0"]);
    }

    #[test]
    fn test_checksum_right_after_prefix() {
        assert_eq!(collect("$GP*00"), vec!["$GP*00"]);
        assert!(collect("$G*00").is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(collect("").is_empty());
        assert!(collect("$").is_empty());
    }
}
