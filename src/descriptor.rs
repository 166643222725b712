//! Library, slot, token and object metadata to match URIs against.
//!
//! PKCS#11 reports text in fixed-width, blank-padded `CK_UTF8CHAR` arrays
//! and identifiers in `CK_ULONG`s whose width depends on the platform. The
//! `from_padded` constructors turn either into plain values so one matcher
//! serves every binding.

use crate::grammar::ObjectClass;

/// Converts a blank- or NUL-padded fixed-width field to text.
pub fn trim_padded(field: &[u8]) -> String {
    let end = field
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Metadata of a PKCS#11 library (`CK_INFO`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryInfo {
    /// `manufacturerID`
    pub manufacturer: String,
    /// `libraryDescription`
    pub description: String,
    /// `libraryVersion` as `major.minor`
    pub version: String,
}

impl LibraryInfo {
    /// Builds the descriptor from raw `CK_INFO` fields.
    pub fn from_padded(manufacturer: &[u8], description: &[u8], version: (u8, u8)) -> Self {
        Self {
            manufacturer: trim_padded(manufacturer),
            description: trim_padded(description),
            version: format!("{}.{}", version.0, version.1),
        }
    }
}

/// Metadata of a slot (`CK_SLOT_INFO` plus its identifier).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotInfo {
    /// `CK_SLOT_ID`
    pub id: u64,
    /// `manufacturerID`
    pub manufacturer: String,
    /// `slotDescription`
    pub description: String,
}

impl SlotInfo {
    /// Builds the descriptor from raw `CK_SLOT_INFO` fields and a slot
    /// identifier of any unsigned width.
    pub fn from_padded(id: impl Into<u64>, manufacturer: &[u8], description: &[u8]) -> Self {
        Self {
            id: id.into(),
            manufacturer: trim_padded(manufacturer),
            description: trim_padded(description),
        }
    }
}

/// Metadata of a token (`CK_TOKEN_INFO`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenInfo {
    /// `label`
    pub label: String,
    /// `manufacturerID`
    pub manufacturer: String,
    /// `serialNumber`
    pub serial: String,
    /// `model`
    pub model: String,
}

impl TokenInfo {
    /// Builds the descriptor from raw `CK_TOKEN_INFO` fields.
    pub fn from_padded(label: &[u8], manufacturer: &[u8], serial: &[u8], model: &[u8]) -> Self {
        Self {
            label: trim_padded(label),
            manufacturer: trim_padded(manufacturer),
            serial: trim_padded(serial),
            model: trim_padded(model),
        }
    }
}

/// An object attribute relevant to URI matching and object search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectAttribute {
    /// `CKA_CLASS`
    Class(ObjectClass),
    /// `CKA_LABEL`
    Label(String),
    /// `CKA_ID`
    Id(Vec<u8>),
}

impl ObjectAttribute {
    /// The `CK_ATTRIBUTE_TYPE` constant for this attribute.
    pub fn attribute_type(&self) -> u64 {
        match self {
            Self::Class(_) => 0x0000_0000,
            Self::Label(_) => 0x0000_0003,
            Self::Id(_) => 0x0000_0102,
        }
    }

    /// Builds a `CKA_LABEL` attribute from raw bytes, which unlike token
    /// fields are not padded.
    pub fn label_from_bytes(bytes: &[u8]) -> Self {
        Self::Label(String::from_utf8_lossy(bytes).into_owned())
    }
}
