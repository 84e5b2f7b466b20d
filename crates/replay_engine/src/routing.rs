//! Destination channel derivation

/// First non-empty `[id]` tag in `message`, or `default` when there is none.
///
/// A tag ends at the first `]`; an opening bracket that is followed by another
/// `[` before its closing bracket does not start a tag.
pub fn channel_suffix<'a>(message: &'a str, default: &'a str) -> &'a str {
    let mut rest = message;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            break;
        };
        let candidate = &after[..close];
        match candidate.rfind('[') {
            // Nested opener: retry from the innermost one
            Some(inner) => rest = &after[inner..],
            None if candidate.is_empty() => rest = &after[close + 1..],
            None => return candidate,
        }
    }
    default
}

/// `<prefix>/<suffix>`
pub fn destination_channel(prefix: &str, suffix: &str) -> String {
    format!("{prefix}/{suffix}")
}
