//! Locating a PKCS#11 URI inside surrounding text.

use crate::error::FormatError;
use crate::grammar::SCHEME_PREFIX;

/// Extracts a candidate URI from `text`.
///
/// All whitespace is removed first, since the grammar has none. A URI that
/// does not start the text must be enclosed in double quotes or angle
/// brackets; the enclosing delimiters and everything outside them are
/// dropped. Text without the scheme is returned as is, for the parser to
/// reject.
///
/// ```
/// let uri = pkcs11_uri::extract("key is <pkcs11:token=my-ca> on the HSM").unwrap();
/// assert_eq!(uri, "pkcs11:token=my-ca");
/// ```
pub fn extract(text: &str) -> Result<String, FormatError> {
    let stripped: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let start = match stripped.find(SCHEME_PREFIX) {
        None | Some(0) => return Ok(stripped),
        Some(start) => start,
    };

    let close = match stripped[..start].chars().next_back() {
        Some('"') => '"',
        Some('<') => '>',
        _ => return Err(FormatError::UnenclosedUri),
    };
    log::debug!(
        "found enclosed URI at byte {} of {}, expecting '{}'",
        start,
        stripped.len(),
        close
    );

    let enclosed = &stripped[start..];
    match enclosed.find(close) {
        Some(end) => Ok(enclosed[..end].to_string()),
        None => Err(FormatError::UnterminatedDelimiter { expected: close }),
    }
}
