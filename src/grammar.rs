//! Character classes, separators and attribute vocabulary of RFC 7512.

use core::convert::TryFrom;
use core::str::FromStr;
use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS};

use crate::error::FormatError;

/// The `pkcs11` scheme and its separator, the required start of every URI.
pub const SCHEME_PREFIX: &str = "pkcs11:";

/// Prefix reserved for vendor-specific attribute names.
pub const VENDOR_PREFIX: &str = "x-";

pub(crate) const QUERY_SEPARATOR: &str = "?";
pub(crate) const PATH_ATTRIBUTE_SEPARATOR: &str = ";";
pub(crate) const QUERY_ATTRIBUTE_SEPARATOR: &str = "&";
pub(crate) const VALUE_SEPARATOR: &str = "=";

/// Set of ASCII bytes allowed unencoded in some part of the URI.
#[derive(Clone, Copy)]
pub struct CharClass {
    arr: [bool; 128],
    encode_set: Option<&'static AsciiSet>,
}

impl CharClass {
    const fn gen(mut bytes: &[u8]) -> Self {
        let mut arr = [false; 128];
        while let [cur, rem @ ..] = bytes {
            arr[*cur as usize] = true;
            bytes = rem;
        }
        Self {
            arr,
            encode_set: None,
        }
    }

    const fn or(mut self, other: &CharClass) -> Self {
        let mut i = 0;
        while i < 128 {
            self.arr[i] |= other.arr[i];
            i += 1;
        }
        self
    }

    /// Permits `%XX` triplets, encoding everything outside the class with `set`.
    const fn percent(mut self, set: &'static AsciiSet) -> Self {
        self.encode_set = Some(set);
        self
    }

    /// Returns `true` if `byte` may appear unencoded.
    #[inline]
    pub const fn allows(&self, byte: u8) -> bool {
        byte < 128 && self.arr[byte as usize]
    }

    /// Returns `true` if `%XX` triplets are permitted.
    #[inline]
    pub const fn allows_percent(&self) -> bool {
        self.encode_set.is_some()
    }

    pub(crate) const fn encode_set(&self) -> Option<&'static AsciiSet> {
        self.encode_set
    }

    /// Complement of this class, for use with `percent_encoding`.
    const fn complement(&self) -> AsciiSet {
        let mut set = CONTROLS.add(b' ');
        let mut byte = 0x21;
        while byte < 0x7f {
            if !self.allows(byte) {
                set = set.add(byte);
            }
            byte += 1;
        }
        set
    }
}

impl fmt::Debug for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let allowed: String = (0..128u8)
            .filter(|&byte| self.allows(byte))
            .map(char::from)
            .collect();
        f.debug_struct("CharClass")
            .field("allowed", &allowed)
            .field("allows_percent", &self.allows_percent())
            .finish()
    }
}

const ALPHA_DIGIT: CharClass =
    CharClass::gen(b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789");

/// unreserved = ALPHA / DIGIT / "-" / "." / "_" / "~"
const UNRESERVED: CharClass = ALPHA_DIGIT.or(&CharClass::gen(b"-._~"));

/// pk11-res-avail = ":" / "[" / "]" / "@" / "!" / "$" / "'" / "(" / ")" / "*" / "+" / "," / "="
const RES_AVAIL: CharClass = CharClass::gen(b":[]@!$'()*+,=");

/// Shared by path and query values.
const COMMON_CHARS: CharClass = UNRESERVED.or(&RES_AVAIL);

/// pk11-path-res-avail = pk11-res-avail / "&"
const PATH_CHARS: CharClass = COMMON_CHARS.or(&CharClass::gen(b"&"));

/// pk11-query-res-avail = pk11-res-avail / "/" / "?" / "|"
const QUERY_CHARS: CharClass = COMMON_CHARS.or(&CharClass::gen(b"/?|"));

// `&` is accepted in path values but still escaped on output.
pub(crate) const PATH_VALUE_ENCODE: &AsciiSet = &COMMON_CHARS.complement();
pub(crate) const QUERY_VALUE_ENCODE: &AsciiSet = &QUERY_CHARS.complement();

/// Characters allowed in path attribute values.
pub const PATH_VALUE: CharClass = PATH_CHARS.percent(PATH_VALUE_ENCODE);

/// Characters allowed in query attribute values. Unlike [`PATH_VALUE`] it
/// excludes `&`, the query attribute separator.
pub const QUERY_VALUE: CharClass = QUERY_CHARS.percent(QUERY_VALUE_ENCODE);

/// Characters allowed in vendor attribute names; never percent-encoded.
pub const VENDOR_NAME: CharClass = ALPHA_DIGIT.or(&CharClass::gen(b"-_"));

/// Path attributes carrying free UTF-8 text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextAttribute {
    /// `library-manufacturer`
    LibraryManufacturer,
    /// `library-description`
    LibraryDescription,
    /// `slot-manufacturer`
    SlotManufacturer,
    /// `slot-description`
    SlotDescription,
    /// `manufacturer` (token manufacturer)
    Manufacturer,
    /// `model` (token model)
    Model,
    /// `serial` (token serial number)
    Serial,
    /// `token` (token label)
    Token,
    /// `object` (object label)
    Object,
}

impl TextAttribute {
    /// Attribute name as it appears in the URI.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LibraryManufacturer => "library-manufacturer",
            Self::LibraryDescription => "library-description",
            Self::SlotManufacturer => "slot-manufacturer",
            Self::SlotDescription => "slot-description",
            Self::Manufacturer => "manufacturer",
            Self::Model => "model",
            Self::Serial => "serial",
            Self::Token => "token",
            Self::Object => "object",
        }
    }

    /// Maximum length in bytes when length checking is enabled.
    ///
    /// These are the sizes of the blank-padded fields in `CK_INFO`,
    /// `CK_SLOT_INFO` and `CK_TOKEN_INFO`. Object labels are unbounded.
    pub const fn max_len(self) -> Option<usize> {
        match self {
            Self::LibraryManufacturer
            | Self::LibraryDescription
            | Self::SlotManufacturer
            | Self::Manufacturer
            | Self::Token => Some(32),
            Self::SlotDescription => Some(64),
            Self::Model | Self::Serial => Some(16),
            Self::Object => None,
        }
    }
}

/// Known path attributes, listed in canonical serialization order by [`PathAttribute::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathAttribute {
    /// One of the free-text attributes
    Text(TextAttribute),
    /// `library-version`
    LibraryVersion,
    /// `slot-id`
    SlotId,
    /// `type`
    Type,
    /// `id`
    Id,
}

impl PathAttribute {
    /// Every known path attribute in serialization order.
    pub const ALL: [PathAttribute; 13] = [
        Self::Text(TextAttribute::LibraryManufacturer),
        Self::Text(TextAttribute::LibraryDescription),
        Self::LibraryVersion,
        Self::Text(TextAttribute::SlotManufacturer),
        Self::Text(TextAttribute::SlotDescription),
        Self::SlotId,
        Self::Text(TextAttribute::Manufacturer),
        Self::Text(TextAttribute::Model),
        Self::Text(TextAttribute::Serial),
        Self::Text(TextAttribute::Token),
        Self::Type,
        Self::Text(TextAttribute::Object),
        Self::Id,
    ];

    /// Attribute name as it appears in the URI.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text(attr) => attr.name(),
            Self::LibraryVersion => "library-version",
            Self::SlotId => "slot-id",
            Self::Type => "type",
            Self::Id => "id",
        }
    }

    /// Looks up a known path attribute by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|attr| attr.name() == name)
    }
}

/// Known query attributes, in serialization order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryAttribute {
    /// `module-path`
    ModulePath,
    /// `module-name`
    ModuleName,
    /// `pin-value`
    PinValue,
    /// `pin-source`
    PinSource,
}

impl QueryAttribute {
    /// Every known query attribute in serialization order.
    pub const ALL: [QueryAttribute; 4] = [
        Self::ModulePath,
        Self::ModuleName,
        Self::PinValue,
        Self::PinSource,
    ];

    /// Attribute name as it appears in the URI.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModulePath => "module-path",
            Self::ModuleName => "module-name",
            Self::PinValue => "pin-value",
            Self::PinSource => "pin-source",
        }
    }

    /// Whether an empty value is accepted.
    pub const fn allows_empty(self) -> bool {
        !matches!(self, Self::ModulePath)
    }

    /// Looks up a known query attribute by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|attr| attr.name() == name)
    }
}

/// Object class named by the `type` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    /// `public` (`CKO_PUBLIC_KEY`)
    PublicKey,
    /// `private` (`CKO_PRIVATE_KEY`)
    PrivateKey,
    /// `cert` (`CKO_CERTIFICATE`)
    Certificate,
    /// `secret-key` (`CKO_SECRET_KEY`)
    SecretKey,
    /// `data` (`CKO_DATA`)
    Data,
}

impl ObjectClass {
    /// Value of the `type` attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PublicKey => "public",
            Self::PrivateKey => "private",
            Self::Certificate => "cert",
            Self::SecretKey => "secret-key",
            Self::Data => "data",
        }
    }

    /// The `CK_OBJECT_CLASS` constant for this class.
    pub const fn as_raw(self) -> u64 {
        match self {
            Self::Data => 0,
            Self::Certificate => 1,
            Self::PublicKey => 2,
            Self::PrivateKey => 3,
            Self::SecretKey => 4,
        }
    }

    /// Maps a `CK_OBJECT_CLASS` constant, of any binding width, to a class.
    pub fn from_raw(raw: impl Into<u64>) -> Option<Self> {
        match raw.into() {
            0 => Some(Self::Data),
            1 => Some(Self::Certificate),
            2 => Some(Self::PublicKey),
            3 => Some(Self::PrivateKey),
            4 => Some(Self::SecretKey),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::PublicKey),
            "private" => Ok(Self::PrivateKey),
            "cert" => Ok(Self::Certificate),
            "secret-key" => Ok(Self::SecretKey),
            "data" => Ok(Self::Data),
            other => Err(FormatError::InvalidObjectType {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<&str> for ObjectClass {
    type Error = FormatError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_class_extends_path_class_except_ampersand() {
        for byte in 0..128u8 {
            if PATH_VALUE.allows(byte) && byte != b'&' {
                assert!(QUERY_VALUE.allows(byte), "{}", byte as char);
            }
        }
        assert!(QUERY_VALUE.allows(b'/'));
        assert!(!PATH_VALUE.allows(b'/'));
        assert!(PATH_VALUE.allows(b'&'));
        assert!(!QUERY_VALUE.allows(b'&'));
        assert!(!PATH_VALUE.allows(b';'));
        assert!(!QUERY_VALUE.allows(b';'));
    }

    #[test]
    fn separators_and_specials_are_not_allowed() {
        for byte in [b'%', b' ', b'#', b'"', b'<', b'>', b'\\', b'^', b'`', b'{', b'}'] {
            assert!(!PATH_VALUE.allows(byte));
            assert!(!QUERY_VALUE.allows(byte));
        }
        assert!(!PATH_VALUE.allows(b'?'));
        assert!(!PATH_VALUE.allows(0xc3));
    }

    #[test]
    fn vendor_names_forbid_percent() {
        assert!(VENDOR_NAME.allows(b'_'));
        assert!(!VENDOR_NAME.allows(b'.'));
        assert!(!VENDOR_NAME.allows_percent());
        assert!(PATH_VALUE.allows_percent());
        assert!(QUERY_VALUE.allows_percent());
    }

    #[test]
    fn attribute_names_resolve() {
        for attr in PathAttribute::ALL.iter() {
            assert_eq!(PathAttribute::from_name(attr.name()), Some(*attr));
        }
        for attr in QueryAttribute::ALL.iter() {
            assert_eq!(QueryAttribute::from_name(attr.name()), Some(*attr));
        }
        assert_eq!(PathAttribute::from_name("pin-value"), None);
        assert_eq!(QueryAttribute::from_name("token"), None);
    }

    #[test]
    fn object_class_vocabulary() {
        for class in [
            ObjectClass::PublicKey,
            ObjectClass::PrivateKey,
            ObjectClass::Certificate,
            ObjectClass::SecretKey,
            ObjectClass::Data,
        ] {
            assert_eq!(class.as_str().parse::<ObjectClass>(), Ok(class));
            assert_eq!(ObjectClass::from_raw(class.as_raw()), Some(class));
        }
        assert!("secret".parse::<ObjectClass>().is_err());
        assert_eq!(ObjectClass::from_raw(3u32), Some(ObjectClass::PrivateKey));
        assert_eq!(ObjectClass::from_raw(0x8000_0000u32), None);
    }
}
