//! Error types for PKCS#11 URI parsing, building and matching.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by the extractor, parser, builder and matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input was empty where a URI is mandatory
    EmptyInput,
    /// The text violates the URI grammar
    Format(FormatError),
    /// A known attribute appeared more than once in the same scope
    DuplicateAttribute {
        /// Name of the repeated attribute
        name: String,
    },
    /// A length-checked attribute is longer than its cap
    LengthExceeded {
        /// Name of the attribute
        name: &'static str,
        /// Maximum allowed length in bytes
        max: usize,
        /// Actual decoded length in bytes
        actual: usize,
    },
    /// The URI constrains an attribute the supplied object attributes lack
    Inconsistent {
        /// Name of the missing attribute
        attribute: &'static str,
    },
}

/// Grammar violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Text does not start with `pkcs11:`
    MissingScheme,
    /// Scheme found after text that is not an opening delimiter
    UnenclosedUri,
    /// Opening delimiter without its closing counterpart
    UnterminatedDelimiter {
        /// The closing delimiter that was expected
        expected: char,
    },
    /// `?` present but nothing follows it
    EmptyQuery,
    /// Attribute without `=` between name and value
    MissingValueSeparator {
        /// The offending attribute text
        attribute: String,
    },
    /// Character outside the allowed class
    DisallowedChar {
        /// The character
        char: char,
        /// Byte position within the value
        position: usize,
    },
    /// `%` not followed by two hexadecimal digits
    InvalidPercentEncoding {
        /// Byte position of the `%`
        position: usize,
    },
    /// Vendor attribute name is malformed
    InvalidVendorName {
        /// The name
        name: String,
        /// Reason for invalidity
        reason: &'static str,
    },
    /// Name is neither a known attribute nor vendor-prefixed
    UnknownAttribute {
        /// The name
        name: String,
    },
    /// Attribute that must not be empty has an empty value
    EmptyValue {
        /// Name of the attribute
        name: &'static str,
    },
    /// Malformed `library-version`
    InvalidVersion {
        /// The decoded value
        value: String,
        /// Reason for invalidity
        reason: &'static str,
    },
    /// `slot-id` is not a decimal 64-bit number
    InvalidSlotId {
        /// The decoded value
        value: String,
    },
    /// `type` is not one of the known object classes
    InvalidObjectType {
        /// The decoded value
        value: String,
    },
    /// Decoded bytes of a text attribute are not UTF-8
    InvalidUtf8 {
        /// Name of the attribute
        name: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "PKCS#11 URI cannot be empty"),
            Self::Format(e) => write!(f, "invalid PKCS#11 URI: {e}"),
            Self::DuplicateAttribute { name } => {
                write!(f, "duplicate attribute '{name}'")
            }
            Self::LengthExceeded { name, max, actual } => {
                write!(f, "attribute '{name}' is {actual} bytes, maximum is {max}")
            }
            Self::Inconsistent { attribute } => write!(
                f,
                "object attributes lack '{attribute}' which the URI constrains"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScheme => write!(f, "URI must start with 'pkcs11:'"),
            Self::UnenclosedUri => write!(
                f,
                "unenclosed URI with surrounding text; enclose it in double quotes or angle brackets"
            ),
            Self::UnterminatedDelimiter { expected } => {
                write!(f, "missing closing delimiter '{expected}'")
            }
            Self::EmptyQuery => write!(f, "query separator '?' present but query is empty"),
            Self::MissingValueSeparator { attribute } => {
                write!(f, "name and value of '{attribute}' are not separated by '='")
            }
            Self::DisallowedChar { char, position } => {
                write!(f, "disallowed character '{char}' at position {position}")
            }
            Self::InvalidPercentEncoding { position } => {
                write!(f, "invalid percent encoding at position {position}")
            }
            Self::InvalidVendorName { name, reason } => {
                write!(f, "invalid vendor attribute name '{name}': {reason}")
            }
            Self::UnknownAttribute { name } => write!(
                f,
                "unknown attribute '{name}'; vendor attributes must start with 'x-'"
            ),
            Self::EmptyValue { name } => write!(f, "attribute '{name}' cannot be empty"),
            Self::InvalidVersion { value, reason } => {
                write!(f, "invalid library version '{value}': {reason}")
            }
            Self::InvalidSlotId { value } => write!(f, "invalid slot id '{value}'"),
            Self::InvalidObjectType { value } => write!(
                f,
                "invalid object type '{value}'; expected public, private, cert, secret-key or data"
            ),
            Self::InvalidUtf8 { name } => {
                write!(f, "value of attribute '{name}' is not valid UTF-8")
            }
        }
    }
}

impl std::error::Error for FormatError {}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_attribute() {
        let err = Error::DuplicateAttribute {
            name: "token".into(),
        };
        assert_eq!(err.to_string(), "duplicate attribute 'token'");

        let err = Error::LengthExceeded {
            name: "model",
            max: 16,
            actual: 17,
        };
        assert!(err.to_string().contains("17 bytes"));
    }

    #[test]
    fn format_error_is_source() {
        use std::error::Error as _;
        let err = Error::from(FormatError::EmptyQuery);
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("invalid PKCS#11 URI"));
    }
}
