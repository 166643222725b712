//! Parsed PKCS#11 URIs.

use core::convert::TryFrom;
use core::str::FromStr;
use std::collections::BTreeMap;
use std::fmt;

use crate::attributes::{self, Attributes};
use crate::builder::Pkcs11UriBuilder;
use crate::codec;
use crate::error::{Error, FormatError, Result};
use crate::extract::extract;
use crate::grammar::{
    ObjectClass, PathAttribute, QueryAttribute, TextAttribute, PATH_ATTRIBUTE_SEPARATOR,
    PATH_VALUE, QUERY_ATTRIBUTE_SEPARATOR, QUERY_SEPARATOR, QUERY_VALUE, SCHEME_PREFIX,
    VALUE_SEPARATOR, VENDOR_NAME,
};

/// A parsed PKCS#11 URI.
///
/// Immutable once parsed; use [`Pkcs11Uri::to_builder`] to derive a
/// modified copy. `Display` renders the canonical form, which may differ
/// from the parsed text in attribute order and percent-encoding.
///
/// ```
/// use pkcs11_uri::{ObjectClass, Pkcs11Uri};
///
/// let uri = Pkcs11Uri::parse("pkcs11:token=my-ca;object=my-key;type=private?pin-value=1234")?;
/// assert_eq!(uri.token(), Some("my-ca"));
/// assert_eq!(uri.object_type(), Some(ObjectClass::PrivateKey));
/// assert_eq!(
///     uri.to_string(),
///     "pkcs11:token=my-ca;type=private;object=my-key?pin-value=1234"
/// );
/// # Ok::<(), pkcs11_uri::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkcs11Uri {
    pub(crate) attributes: Attributes,
    pub(crate) check_lengths: bool,
}

impl Pkcs11Uri {
    /// Extracts and parses a URI with length checking enabled.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for empty text, [`Error::Format`] for grammar
    /// violations, [`Error::DuplicateAttribute`] and
    /// [`Error::LengthExceeded`] as described on [`Error`].
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, true)
    }

    /// Extracts and parses a URI, enforcing the maximum lengths of library,
    /// slot and token attributes only if `check_lengths` is set.
    ///
    /// # Errors
    ///
    /// See [`Pkcs11Uri::parse`].
    pub fn parse_with(text: &str, check_lengths: bool) -> Result<Self> {
        let uri = extract(text)?;
        Parser::new(check_lengths).parse(&uri)
    }

    /// Whether maximum attribute lengths were enforced.
    pub fn checks_lengths(&self) -> bool {
        self.check_lengths
    }

    /// Library manufacturer (`library-manufacturer`).
    pub fn library_manufacturer(&self) -> Option<&str> {
        self.attributes.library_manufacturer.as_deref()
    }

    /// Library description (`library-description`).
    pub fn library_description(&self) -> Option<&str> {
        self.attributes.library_description.as_deref()
    }

    /// Library version, normalized to `major.minor` (`library-version`).
    pub fn library_version(&self) -> Option<&str> {
        self.attributes.library_version.as_deref()
    }

    /// Slot manufacturer (`slot-manufacturer`).
    pub fn slot_manufacturer(&self) -> Option<&str> {
        self.attributes.slot_manufacturer.as_deref()
    }

    /// Slot description (`slot-description`).
    pub fn slot_description(&self) -> Option<&str> {
        self.attributes.slot_description.as_deref()
    }

    /// Slot identifier (`slot-id`).
    pub fn slot_id(&self) -> Option<u64> {
        self.attributes.slot_id
    }

    /// Token manufacturer (`manufacturer`).
    pub fn manufacturer(&self) -> Option<&str> {
        self.attributes.manufacturer.as_deref()
    }

    /// Token model (`model`).
    pub fn model(&self) -> Option<&str> {
        self.attributes.model.as_deref()
    }

    /// Token serial number (`serial`).
    pub fn serial(&self) -> Option<&str> {
        self.attributes.serial.as_deref()
    }

    /// Token label (`token`).
    pub fn token(&self) -> Option<&str> {
        self.attributes.token.as_deref()
    }

    /// Object class (`type`).
    pub fn object_type(&self) -> Option<ObjectClass> {
        self.attributes.object_type
    }

    /// Object label (`object`).
    pub fn object(&self) -> Option<&str> {
        self.attributes.object.as_deref()
    }

    /// Object identifier as raw bytes (`id`).
    pub fn id(&self) -> Option<&[u8]> {
        self.attributes.id.as_deref()
    }

    /// Location of the PIN, e.g. `file:/etc/token` (`pin-source`).
    pub fn pin_source(&self) -> Option<&str> {
        self.attributes.pin_source.as_deref()
    }

    /// The PIN itself (`pin-value`).
    pub fn pin_value(&self) -> Option<&str> {
        self.attributes.pin_value.as_deref()
    }

    /// Name of the PKCS#11 module (`module-name`).
    pub fn module_name(&self) -> Option<&str> {
        self.attributes.module_name.as_deref()
    }

    /// Path to the PKCS#11 module (`module-path`).
    pub fn module_path(&self) -> Option<&str> {
        self.attributes.module_path.as_deref()
    }

    /// Vendor attributes of the path component, keyed by full name.
    pub fn vendor_path_attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes.vendor_path
    }

    /// Vendor attributes of the query component, with repeated values in
    /// order of appearance.
    pub fn vendor_query_attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.attributes.vendor_query
    }

    /// Whether any token-identifying attribute is present.
    pub fn defines_token(&self) -> bool {
        self.attributes.defines_token()
    }

    /// Whether any object-identifying attribute (`object`, `type`, `id`) is present.
    pub fn defines_object(&self) -> bool {
        self.attributes.object.is_some()
            || self.attributes.object_type.is_some()
            || self.attributes.id.is_some()
    }

    /// A builder seeded with this URI's attributes.
    pub fn to_builder(&self) -> Pkcs11UriBuilder {
        Pkcs11UriBuilder::from(self)
    }
}

impl fmt::Display for Pkcs11Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.attributes.write_uri(f)
    }
}

impl FromStr for Pkcs11Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Pkcs11Uri {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parses extracted URI text into [`Attributes`].
struct Parser {
    attributes: Attributes,
    check_lengths: bool,
}

impl Parser {
    fn new(check_lengths: bool) -> Self {
        Self {
            attributes: Attributes::default(),
            check_lengths,
        }
    }

    fn parse(mut self, uri: &str) -> Result<Pkcs11Uri> {
        if uri.is_empty() {
            return Err(Error::EmptyInput);
        }
        let rest = uri
            .strip_prefix(SCHEME_PREFIX)
            .ok_or(FormatError::MissingScheme)?;

        let (path, query) = match rest.find(QUERY_SEPARATOR) {
            Some(pos) => (&rest[..pos], Some(&rest[pos + QUERY_SEPARATOR.len()..])),
            None => (rest, None),
        };

        if !path.is_empty() {
            for attribute in path.split(PATH_ATTRIBUTE_SEPARATOR) {
                let (name, value) = split_attribute(attribute)?;
                self.path_attribute(name, value)?;
            }
        }

        if let Some(query) = query {
            if query.is_empty() {
                return Err(FormatError::EmptyQuery.into());
            }
            for attribute in query.split(QUERY_ATTRIBUTE_SEPARATOR) {
                let (name, value) = split_attribute(attribute)?;
                self.query_attribute(name, value)?;
            }
        }

        Ok(Pkcs11Uri {
            attributes: self.attributes,
            check_lengths: self.check_lengths,
        })
    }

    fn path_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        log::trace!("path attribute '{}'", name);
        let attr = match PathAttribute::from_name(name) {
            Some(attr) => attr,
            None => return self.vendor_path_attribute(name, value),
        };
        if self.attributes.has_path(attr) {
            return Err(Error::DuplicateAttribute {
                name: name.to_string(),
            });
        }

        let bytes = codec::decode(value, &PATH_VALUE)?;
        match attr {
            PathAttribute::Text(text) => self.text_attribute(text, bytes)?,
            PathAttribute::LibraryVersion => {
                let version = attributes::into_text(name, bytes)?;
                self.attributes.library_version =
                    Some(attributes::normalize_version(&version, self.check_lengths)?);
            }
            PathAttribute::SlotId => {
                let slot_id = attributes::into_text(name, bytes)?;
                self.attributes.slot_id = Some(attributes::parse_slot_id(&slot_id)?);
            }
            PathAttribute::Type => {
                let object_type = attributes::into_text(name, bytes)?;
                self.attributes.object_type = Some(attributes::parse_object_type(&object_type)?);
            }
            PathAttribute::Id => self.attributes.id = Some(bytes),
        }
        Ok(())
    }

    fn text_attribute(&mut self, attr: TextAttribute, bytes: Vec<u8>) -> Result<()> {
        attributes::check_text(attr, bytes.len(), self.check_lengths)?;
        *self.attributes.text_mut(attr) = Some(attributes::into_text(attr.name(), bytes)?);
        Ok(())
    }

    fn vendor_path_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        let name = vendor_name(name)?;
        if self.attributes.vendor_path.contains_key(&name) {
            return Err(Error::DuplicateAttribute { name });
        }
        let value = attributes::into_text(&name, codec::decode(value, &PATH_VALUE)?)?;
        self.attributes.vendor_path.insert(name, value);
        Ok(())
    }

    fn query_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        log::trace!("query attribute '{}'", name);
        let attr = match QueryAttribute::from_name(name) {
            Some(attr) => attr,
            None => {
                let name = vendor_name(name)?;
                let value = attributes::into_text(&name, codec::decode(value, &QUERY_VALUE)?)?;
                self.attributes
                    .vendor_query
                    .entry(name)
                    .or_default()
                    .push(value);
                return Ok(());
            }
        };
        if self.attributes.query(attr).is_some() {
            return Err(Error::DuplicateAttribute {
                name: name.to_string(),
            });
        }

        let value = attributes::into_text(name, codec::decode(value, &QUERY_VALUE)?)?;
        attributes::check_query(attr, &value)?;
        *self.attributes.query_mut(attr) = Some(value);
        Ok(())
    }
}

/// Splits `name=value` at the first `=`.
fn split_attribute(attribute: &str) -> Result<(&str, &str)> {
    let mut parts = attribute.splitn(2, VALUE_SEPARATOR);
    match (parts.next(), parts.next()) {
        (Some(name), Some(value)) => Ok((name, value)),
        _ => Err(FormatError::MissingValueSeparator {
            attribute: attribute.to_string(),
        }
        .into()),
    }
}

/// Validates an attribute name outside the known vocabulary as a vendor name.
fn vendor_name(name: &str) -> Result<String> {
    if !attributes::is_vendor_name(name) {
        return Err(FormatError::UnknownAttribute {
            name: name.to_string(),
        }
        .into());
    }
    attributes::check_vendor_name(name)?;
    let decoded = codec::decode(name, &VENDOR_NAME)?;
    attributes::into_text(name, decoded)
}
