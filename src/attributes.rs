//! The attribute record shared by [`Pkcs11Uri`](crate::Pkcs11Uri) and
//! [`Pkcs11UriBuilder`](crate::Pkcs11UriBuilder), and the validation rules
//! both of them apply to every value.

use std::collections::BTreeMap;
use std::fmt;

use crate::codec;
use crate::error::{Error, FormatError, Result};
use crate::grammar::{
    ObjectClass, PathAttribute, QueryAttribute, TextAttribute, PATH_ATTRIBUTE_SEPARATOR,
    PATH_VALUE_ENCODE, QUERY_ATTRIBUTE_SEPARATOR, QUERY_SEPARATOR, QUERY_VALUE_ENCODE,
    SCHEME_PREFIX, VALUE_SEPARATOR, VENDOR_NAME, VENDOR_PREFIX,
};

/// Largest version component representable in a `CK_VERSION`.
const MAX_VERSION_COMPONENT: u64 = 255;

/// Every attribute a PKCS#11 URI can carry. `None` means absent, which is
/// distinct from an empty value.
#[derive(Clone, Default, PartialEq, Eq)]
pub(crate) struct Attributes {
    pub(crate) library_manufacturer: Option<String>,
    pub(crate) library_description: Option<String>,
    pub(crate) library_version: Option<String>,
    pub(crate) slot_manufacturer: Option<String>,
    pub(crate) slot_description: Option<String>,
    pub(crate) slot_id: Option<u64>,
    pub(crate) manufacturer: Option<String>,
    pub(crate) model: Option<String>,
    pub(crate) serial: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) object_type: Option<ObjectClass>,
    pub(crate) object: Option<String>,
    pub(crate) id: Option<Vec<u8>>,
    pub(crate) module_path: Option<String>,
    pub(crate) module_name: Option<String>,
    pub(crate) pin_value: Option<String>,
    pub(crate) pin_source: Option<String>,
    pub(crate) vendor_path: BTreeMap<String, String>,
    pub(crate) vendor_query: BTreeMap<String, Vec<String>>,
}

impl Attributes {
    pub(crate) fn text(&self, attr: TextAttribute) -> Option<&str> {
        let value = match attr {
            TextAttribute::LibraryManufacturer => &self.library_manufacturer,
            TextAttribute::LibraryDescription => &self.library_description,
            TextAttribute::SlotManufacturer => &self.slot_manufacturer,
            TextAttribute::SlotDescription => &self.slot_description,
            TextAttribute::Manufacturer => &self.manufacturer,
            TextAttribute::Model => &self.model,
            TextAttribute::Serial => &self.serial,
            TextAttribute::Token => &self.token,
            TextAttribute::Object => &self.object,
        };
        value.as_deref()
    }

    pub(crate) fn text_mut(&mut self, attr: TextAttribute) -> &mut Option<String> {
        match attr {
            TextAttribute::LibraryManufacturer => &mut self.library_manufacturer,
            TextAttribute::LibraryDescription => &mut self.library_description,
            TextAttribute::SlotManufacturer => &mut self.slot_manufacturer,
            TextAttribute::SlotDescription => &mut self.slot_description,
            TextAttribute::Manufacturer => &mut self.manufacturer,
            TextAttribute::Model => &mut self.model,
            TextAttribute::Serial => &mut self.serial,
            TextAttribute::Token => &mut self.token,
            TextAttribute::Object => &mut self.object,
        }
    }

    pub(crate) fn query(&self, attr: QueryAttribute) -> Option<&str> {
        let value = match attr {
            QueryAttribute::ModulePath => &self.module_path,
            QueryAttribute::ModuleName => &self.module_name,
            QueryAttribute::PinValue => &self.pin_value,
            QueryAttribute::PinSource => &self.pin_source,
        };
        value.as_deref()
    }

    pub(crate) fn query_mut(&mut self, attr: QueryAttribute) -> &mut Option<String> {
        match attr {
            QueryAttribute::ModulePath => &mut self.module_path,
            QueryAttribute::ModuleName => &mut self.module_name,
            QueryAttribute::PinValue => &mut self.pin_value,
            QueryAttribute::PinSource => &mut self.pin_source,
        }
    }

    pub(crate) fn has_path(&self, attr: PathAttribute) -> bool {
        match attr {
            PathAttribute::Text(text) => self.text(text).is_some(),
            PathAttribute::LibraryVersion => self.library_version.is_some(),
            PathAttribute::SlotId => self.slot_id.is_some(),
            PathAttribute::Type => self.object_type.is_some(),
            PathAttribute::Id => self.id.is_some(),
        }
    }

    /// Percent-encoded value of a known path attribute, if set.
    fn encoded_path(&self, attr: PathAttribute) -> Option<String> {
        match attr {
            PathAttribute::Text(text) => self
                .text(text)
                .map(|value| codec::escape(value, PATH_VALUE_ENCODE)),
            PathAttribute::LibraryVersion => self.library_version.clone(),
            PathAttribute::SlotId => self.slot_id.map(|id| id.to_string()),
            PathAttribute::Type => self.object_type.map(|class| class.as_str().to_string()),
            PathAttribute::Id => self.id.as_deref().map(codec::encode_bytes),
        }
    }

    /// Whether any of `token`, `manufacturer`, `serial` or `model` is set.
    pub(crate) fn defines_token(&self) -> bool {
        self.token.is_some()
            || self.manufacturer.is_some()
            || self.serial.is_some()
            || self.model.is_some()
    }

    /// Writes the canonical URI text.
    pub(crate) fn write_uri(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path: Vec<String> = PathAttribute::ALL
            .iter()
            .filter_map(|&attr| {
                self.encoded_path(attr)
                    .map(|value| format!("{}{}{}", attr.name(), VALUE_SEPARATOR, value))
            })
            .collect();
        path.extend(self.vendor_path.iter().map(|(name, value)| {
            format!(
                "{}{}{}",
                name,
                VALUE_SEPARATOR,
                codec::escape(value, PATH_VALUE_ENCODE)
            )
        }));

        let mut query: Vec<String> = QueryAttribute::ALL
            .iter()
            .filter_map(|&attr| {
                self.query(attr).map(|value| {
                    format!(
                        "{}{}{}",
                        attr.name(),
                        VALUE_SEPARATOR,
                        codec::escape(value, QUERY_VALUE_ENCODE)
                    )
                })
            })
            .collect();
        for (name, values) in &self.vendor_query {
            query.extend(values.iter().map(|value| {
                format!(
                    "{}{}{}",
                    name,
                    VALUE_SEPARATOR,
                    codec::escape(value, QUERY_VALUE_ENCODE)
                )
            }));
        }

        f.write_str(SCHEME_PREFIX)?;
        f.write_str(&path.join(PATH_ATTRIBUTE_SEPARATOR))?;
        if !query.is_empty() {
            f.write_str(QUERY_SEPARATOR)?;
            f.write_str(&query.join(QUERY_ATTRIBUTE_SEPARATOR))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("library_manufacturer", &self.library_manufacturer)
            .field("library_description", &self.library_description)
            .field("library_version", &self.library_version)
            .field("slot_manufacturer", &self.slot_manufacturer)
            .field("slot_description", &self.slot_description)
            .field("slot_id", &self.slot_id)
            .field("manufacturer", &self.manufacturer)
            .field("model", &self.model)
            .field("serial", &self.serial)
            .field("token", &self.token)
            .field("object_type", &self.object_type)
            .field("object", &self.object)
            .field("id", &self.id)
            .field("module_path", &self.module_path)
            .field("module_name", &self.module_name)
            .field("pin_value", &self.pin_value.as_ref().map(|_| "<redacted>"))
            .field("pin_source", &self.pin_source)
            .field("vendor_path", &self.vendor_path)
            .field("vendor_query", &self.vendor_query)
            .finish()
    }
}

// Validation rules. The parser calls these on decoded values, the builder on
// the values handed to its setters.

/// Checks the byte length of a text attribute against its cap.
pub(crate) fn check_text(attr: TextAttribute, len: usize, check_lengths: bool) -> Result<()> {
    match attr.max_len() {
        Some(max) if check_lengths && len > max => Err(Error::LengthExceeded {
            name: attr.name(),
            max,
            actual: len,
        }),
        _ => Ok(()),
    }
}

/// Parses `major[.minor]` and normalizes it to `major.minor`.
pub(crate) fn normalize_version(value: &str, check_lengths: bool) -> Result<String> {
    if value.is_empty() {
        return Err(FormatError::EmptyValue {
            name: PathAttribute::LibraryVersion.name(),
        }
        .into());
    }
    let invalid = |reason| FormatError::InvalidVersion {
        value: value.to_string(),
        reason,
    };

    let mut parts = value.split('.');
    let major = parts.next().unwrap_or_default();
    let minor = parts.next();
    if parts.next().is_some() {
        return Err(invalid("more than one '.'").into());
    }
    if major.is_empty() {
        return Err(invalid("major version is empty").into());
    }
    if minor == Some("") {
        return Err(invalid("minor version is empty").into());
    }

    let component = |part: &str| -> Result<u64> {
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("version components must be decimal digits").into());
        }
        let number: u64 = part
            .parse()
            .map_err(|_| invalid("version component is too large"))?;
        if check_lengths && number > MAX_VERSION_COMPONENT {
            return Err(invalid("version component exceeds 255").into());
        }
        Ok(number)
    };
    let major = component(major)?;
    let minor = match minor {
        Some(minor) => component(minor)?,
        None => 0,
    };
    Ok(format!("{}.{}", major, minor))
}

/// Parses a non-empty decimal `slot-id`.
pub(crate) fn parse_slot_id(value: &str) -> Result<u64> {
    if value.is_empty() {
        return Err(FormatError::EmptyValue {
            name: PathAttribute::SlotId.name(),
        }
        .into());
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::InvalidSlotId {
            value: value.to_string(),
        }
        .into());
    }
    value.parse::<u64>().map_err(|_| {
        Error::from(FormatError::InvalidSlotId {
            value: value.to_string(),
        })
    })
}

/// Parses a non-empty `type` value.
pub(crate) fn parse_object_type(value: &str) -> Result<ObjectClass> {
    if value.is_empty() {
        return Err(FormatError::EmptyValue {
            name: PathAttribute::Type.name(),
        }
        .into());
    }
    Ok(value.parse::<ObjectClass>()?)
}

/// Checks that a known query attribute may take `value`.
pub(crate) fn check_query(attr: QueryAttribute, value: &str) -> Result<()> {
    if value.is_empty() && !attr.allows_empty() {
        return Err(FormatError::EmptyValue { name: attr.name() }.into());
    }
    Ok(())
}

/// Checks that `name` is `x-` followed by one or more name characters.
pub(crate) fn check_vendor_name(name: &str) -> Result<()> {
    let invalid = |reason| FormatError::InvalidVendorName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("name cannot be empty").into());
    }
    let suffix = match name.strip_prefix(VENDOR_PREFIX) {
        Some(suffix) => suffix,
        None => return Err(invalid("name must start with 'x-'").into()),
    };
    if suffix.is_empty() {
        return Err(invalid("name cannot be empty after 'x-'").into());
    }
    if !suffix.bytes().all(|b| VENDOR_NAME.allows(b)) {
        return Err(invalid("only letters, digits, '-' and '_' are allowed").into());
    }
    Ok(())
}

/// Whether `name` should be treated as a vendor attribute name.
pub(crate) fn is_vendor_name(name: &str) -> bool {
    name.starts_with(VENDOR_PREFIX)
}

/// Converts decoded bytes of a text attribute to a `String`.
pub(crate) fn into_text(name: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| {
        Error::from(FormatError::InvalidUtf8 {
            name: name.to_string(),
        })
    })
}
