//! Input decoding and tokenization.
//!
//! The decoding policy is chosen from the leading bytes of a file: `FF FE`
//! selects UTF-16 little-endian, `FE FF` UTF-16 big-endian, and anything
//! else is parsed byte-wise as single-byte / ASCII-compatible text.
//!
//! Under every policy a token is a maximal run of alphanumeric characters,
//! lowercased; every other character is a separator.

/// Tokenize single-byte / ASCII-compatible text.
///
/// Bytes outside the ASCII alphanumeric range are separators, so UTF-8
/// multi-byte sequences split words rather than corrupting them.
pub fn tokenize_bytes(bytes: &[u8]) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for &b in bytes {
        if b.is_ascii_alphanumeric() {
            current.push(b.to_ascii_lowercase() as char);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Tokenize a stream of UTF-16 code units.
///
/// Unpaired surrogates act as separators.
fn tokenize_utf16<I: Iterator<Item = u16>>(units: I) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(ch) if ch.is_alphanumeric() => current.extend(ch.to_lowercase()),
            _ => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Tokenize raw file contents, dispatching on the byte-order mark.
///
/// UTF-16 input is consumed in whole code units; a trailing odd byte is
/// dropped.
pub fn tokenize_detected(bytes: &[u8]) -> Vec<String> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => {
            tokenize_utf16(rest.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])))
        }
        [0xFE, 0xFF, rest @ ..] => {
            tokenize_utf16(rest.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])))
        }
        _ => tokenize_bytes(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_non_alphanumerics() {
        let tokens = tokenize_bytes(b"Hello, World! 42 times");
        assert_eq!(tokens, vec!["hello", "world", "42", "times"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize_bytes(b"").is_empty());
        assert!(tokenize_bytes(b" \t\n--").is_empty());
    }

    #[test]
    fn run_at_end_of_input_is_kept() {
        assert_eq!(tokenize_bytes(b"trailing"), vec!["trailing"]);
    }

    #[test]
    fn utf8_multibyte_acts_as_separator() {
        // "caf\u{e9}s" encodes e-acute as two non-ASCII bytes
        let tokens = tokenize_bytes("cafés".as_bytes());
        assert_eq!(tokens, vec!["caf", "s"]);
    }

    #[test]
    fn utf16_le_bom_is_detected() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Foo Bar".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(tokenize_detected(&bytes), vec!["foo", "bar"]);
    }

    #[test]
    fn utf16_be_bom_is_detected() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Foo Bar".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(tokenize_detected(&bytes), vec!["foo", "bar"]);
    }

    #[test]
    fn utf16_trailing_odd_byte_is_dropped() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "ab".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.push(0x41);
        assert_eq!(tokenize_detected(&bytes), vec!["ab"]);
    }

    #[test]
    fn no_bom_falls_back_to_byte_policy() {
        assert_eq!(tokenize_detected(b"plain text"), vec!["plain", "text"]);
    }
}
