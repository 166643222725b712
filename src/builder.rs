//! Builder for constructing [`Pkcs11Uri`] values attribute by attribute.
//!
//! Every setter applies the same rules the parser applies to decoded
//! values, so anything the builder accepts serializes to text the parser
//! accepts and maps back to the same attributes.

use std::fmt;

use crate::attributes::{self, Attributes};
use crate::error::Result;
use crate::grammar::{ObjectClass, QueryAttribute, TextAttribute};
use crate::uri::Pkcs11Uri;

/// A mutable set of PKCS#11 URI attributes.
///
/// Setters take `Option`s: `None` removes the attribute, `Some("")` sets it
/// to an empty value. They return `&mut Self` so calls can be chained with `?`.
///
/// ```
/// use pkcs11_uri::{ObjectClass, Pkcs11UriBuilder};
///
/// let mut builder = Pkcs11UriBuilder::new();
/// builder
///     .set_token(Some("The Software PKCS#11 Softtoken"))?
///     .set_object_type(Some(ObjectClass::PrivateKey))
///     .set_id(Some(&[0x01, 0xff][..]))
///     .set_pin_source(Some("file:/etc/token"))?;
///
/// assert_eq!(
///     builder.to_string(),
///     "pkcs11:token=The%20Software%20PKCS%2311%20Softtoken;type=private;id=%01%FF?pin-source=file:/etc/token"
/// );
/// let uri = builder.build()?;
/// assert_eq!(uri.id(), Some(&[0x01, 0xff][..]));
/// # Ok::<(), pkcs11_uri::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkcs11UriBuilder {
    attributes: Attributes,
    check_lengths: bool,
}

impl Pkcs11UriBuilder {
    /// Creates an empty builder with length checking enabled.
    pub fn new() -> Self {
        Self::with_length_checking(true)
    }

    /// Creates an empty builder, enforcing maximum attribute lengths only if
    /// `check_lengths` is set.
    pub fn with_length_checking(check_lengths: bool) -> Self {
        Self {
            attributes: Attributes::default(),
            check_lengths,
        }
    }

    /// Whether maximum attribute lengths are enforced.
    pub fn checks_lengths(&self) -> bool {
        self.check_lengths
    }

    fn set_text(&mut self, attr: TextAttribute, value: Option<&str>) -> Result<&mut Self> {
        if let Some(value) = value {
            attributes::check_text(attr, value.len(), self.check_lengths)?;
        }
        *self.attributes.text_mut(attr) = value.map(str::to_string);
        Ok(self)
    }

    fn set_query(&mut self, attr: QueryAttribute, value: Option<&str>) -> Result<&mut Self> {
        if let Some(value) = value {
            attributes::check_query(attr, value)?;
        }
        *self.attributes.query_mut(attr) = value.map(str::to_string);
        Ok(self)
    }

    /// Sets `library-manufacturer`.
    ///
    /// # Errors
    ///
    /// [`Error::LengthExceeded`](crate::Error::LengthExceeded) when longer
    /// than 32 bytes and length checking is enabled. The other capped text
    /// setters behave the same with their own limits.
    pub fn set_library_manufacturer(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::LibraryManufacturer, value)
    }

    /// Sets `library-description` (max 32 bytes).
    pub fn set_library_description(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::LibraryDescription, value)
    }

    /// Sets `library-version` from `major[.minor]`, stored as `major.minor`.
    ///
    /// # Errors
    ///
    /// [`FormatError::InvalidVersion`](crate::FormatError::InvalidVersion)
    /// or [`FormatError::EmptyValue`](crate::FormatError::EmptyValue) for a
    /// malformed version.
    pub fn set_library_version(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.attributes.library_version = match value {
            Some(value) => Some(attributes::normalize_version(value, self.check_lengths)?),
            None => None,
        };
        Ok(self)
    }

    /// Sets `slot-manufacturer` (max 32 bytes).
    pub fn set_slot_manufacturer(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::SlotManufacturer, value)
    }

    /// Sets `slot-description` (max 64 bytes).
    pub fn set_slot_description(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::SlotDescription, value)
    }

    /// Sets `slot-id`.
    pub fn set_slot_id(&mut self, value: Option<u64>) -> &mut Self {
        self.attributes.slot_id = value;
        self
    }

    /// Sets `manufacturer` (max 32 bytes).
    pub fn set_manufacturer(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::Manufacturer, value)
    }

    /// Sets `model` (max 16 bytes).
    pub fn set_model(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::Model, value)
    }

    /// Sets `serial` (max 16 bytes).
    pub fn set_serial(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::Serial, value)
    }

    /// Sets `token` (max 32 bytes).
    pub fn set_token(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::Token, value)
    }

    /// Sets `type`.
    pub fn set_object_type(&mut self, value: Option<ObjectClass>) -> &mut Self {
        self.attributes.object_type = value;
        self
    }

    /// Sets `object`. Object labels have no length limit.
    pub fn set_object(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_text(TextAttribute::Object, value)
    }

    /// Sets `id` to raw bytes, which are always fully percent-encoded.
    pub fn set_id(&mut self, value: Option<&[u8]>) -> &mut Self {
        self.attributes.id = value.map(<[u8]>::to_vec);
        self
    }

    /// Sets `module-path`.
    ///
    /// # Errors
    ///
    /// [`FormatError::EmptyValue`](crate::FormatError::EmptyValue) for an
    /// empty path.
    pub fn set_module_path(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_query(QueryAttribute::ModulePath, value)
    }

    /// Sets `module-name`.
    pub fn set_module_name(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_query(QueryAttribute::ModuleName, value)
    }

    /// Sets `pin-value`.
    pub fn set_pin_value(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_query(QueryAttribute::PinValue, value)
    }

    /// Sets `pin-source`.
    pub fn set_pin_source(&mut self, value: Option<&str>) -> Result<&mut Self> {
        self.set_query(QueryAttribute::PinSource, value)
    }

    /// Sets or removes a vendor attribute of the path component.
    ///
    /// # Errors
    ///
    /// [`FormatError::InvalidVendorName`](crate::FormatError::InvalidVendorName)
    /// unless `name` is `x-` followed by letters, digits, `-` or `_`.
    pub fn set_vendor_path_attribute(
        &mut self,
        name: &str,
        value: Option<&str>,
    ) -> Result<&mut Self> {
        attributes::check_vendor_name(name)?;
        match value {
            Some(value) => {
                self.attributes
                    .vendor_path
                    .insert(name.to_string(), value.to_string());
            }
            None => {
                self.attributes.vendor_path.remove(name);
            }
        }
        Ok(self)
    }

    /// Appends a value to a vendor attribute of the query component.
    ///
    /// # Errors
    ///
    /// See [`Pkcs11UriBuilder::set_vendor_path_attribute`].
    pub fn add_vendor_query_attribute(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        attributes::check_vendor_name(name)?;
        self.attributes
            .vendor_query
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        Ok(self)
    }

    /// Replaces all values of a vendor query attribute. `None` or an empty
    /// list removes the attribute.
    ///
    /// # Errors
    ///
    /// See [`Pkcs11UriBuilder::set_vendor_path_attribute`].
    pub fn set_vendor_query_attribute(
        &mut self,
        name: &str,
        values: Option<Vec<String>>,
    ) -> Result<&mut Self> {
        attributes::check_vendor_name(name)?;
        match values {
            Some(values) if !values.is_empty() => {
                self.attributes.vendor_query.insert(name.to_string(), values);
            }
            _ => {
                self.attributes.vendor_query.remove(name);
            }
        }
        Ok(self)
    }

    /// Parses the serialized form back into a [`Pkcs11Uri`].
    ///
    /// # Errors
    ///
    /// None in practice: setters only admit values the parser accepts.
    pub fn build(&self) -> Result<Pkcs11Uri> {
        Pkcs11Uri::parse_with(&self.to_string(), self.check_lengths)
    }
}

impl Default for Pkcs11UriBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Pkcs11Uri> for Pkcs11UriBuilder {
    fn from(uri: &Pkcs11Uri) -> Self {
        Self {
            attributes: uri.attributes.clone(),
            check_lengths: uri.check_lengths,
        }
    }
}

impl fmt::Display for Pkcs11UriBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.attributes.write_uri(f)
    }
}
