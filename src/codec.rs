//! Percent-encoding restricted to the character classes of [`crate::grammar`].

use percent_encoding::{percent_decode_str, percent_encode_byte, utf8_percent_encode, AsciiSet};

use crate::error::FormatError;
use crate::grammar::{CharClass, VENDOR_NAME};

/// Decodes `value`, accepting only characters in `class` and, if the class
/// permits it, `%XX` triplets. The result is raw bytes.
pub fn decode(value: &str, class: &CharClass) -> Result<Vec<u8>, FormatError> {
    validate(value, class)?;
    Ok(percent_decode_str(value).collect())
}

/// Checks every character of `value` against `class` without decoding.
pub(crate) fn validate(value: &str, class: &CharClass) -> Result<(), FormatError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'%' && class.allows_percent() {
            let hex = bytes.get(i + 1..i + 3);
            match hex {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                    i += 3;
                    continue;
                }
                _ => return Err(FormatError::InvalidPercentEncoding { position: i }),
            }
        }
        if !class.allows(byte) {
            let char = value[i..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(FormatError::DisallowedChar { char, position: i });
        }
        i += 1;
    }
    Ok(())
}

/// Encodes `text` for a position accepting `class`.
///
/// Allowed ASCII is emitted literally and every other character as one
/// `%XX` triplet per UTF-8 byte. Path values escape `&` even though they
/// accept it. Classes without percent-encoding, such as
/// [`VENDOR_NAME`], cannot represent other characters and reject them.
pub fn encode(text: &str, class: &CharClass) -> Result<String, FormatError> {
    match class.encode_set() {
        Some(set) => Ok(escape(text, set)),
        None => {
            validate(text, class)?;
            Ok(text.to_string())
        }
    }
}

pub(crate) fn escape(text: &str, set: &'static AsciiSet) -> String {
    utf8_percent_encode(text, set).to_string()
}

/// Encodes arbitrary bytes with every byte as a `%XX` triplet.
pub fn encode_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| percent_encode_byte(byte)).collect()
}

/// Validates a vendor attribute name, which is never percent-encoded.
pub fn encode_name(name: &str) -> Result<String, FormatError> {
    encode(name, &VENDOR_NAME)
}
