//! Deciding whether a URI applies to a library, slot, token or object.
//!
//! Vendor path attributes cannot be expressed by any descriptor, so a URI
//! carrying one matches nothing. Every other attribute constrains the match
//! only when present, and is compared exactly.

use crate::descriptor::{LibraryInfo, ObjectAttribute, SlotInfo, TokenInfo};
use crate::error::{Error, Result};
use crate::grammar::{PathAttribute, TextAttribute};
use crate::uri::Pkcs11Uri;

/// An absent constraint matches anything.
fn matches<T: PartialEq + ?Sized>(constraint: Option<&T>, actual: &T) -> bool {
    constraint.map_or(true, |expected| expected == actual)
}

impl Pkcs11Uri {
    fn has_vendor_path_attributes(&self) -> bool {
        !self.attributes.vendor_path.is_empty()
    }

    /// Checks `library-manufacturer`, `library-description` and `library-version`.
    pub fn matches_library(&self, library: &LibraryInfo) -> bool {
        !self.has_vendor_path_attributes()
            && matches(self.library_manufacturer(), library.manufacturer.as_str())
            && matches(self.library_description(), library.description.as_str())
            && matches(self.library_version(), library.version.as_str())
    }

    /// Checks `slot-manufacturer`, `slot-description` and `slot-id`.
    pub fn matches_slot(&self, slot: &SlotInfo) -> bool {
        !self.has_vendor_path_attributes()
            && matches(self.slot_manufacturer(), slot.manufacturer.as_str())
            && matches(self.slot_description(), slot.description.as_str())
            && matches(self.slot_id().as_ref(), &slot.id)
    }

    /// Checks `token`, `manufacturer`, `serial` and `model`.
    pub fn matches_token(&self, token: &TokenInfo) -> bool {
        !self.has_vendor_path_attributes()
            && matches(self.token(), token.label.as_str())
            && matches(self.manufacturer(), token.manufacturer.as_str())
            && matches(self.serial(), token.serial.as_str())
            && matches(self.model(), token.model.as_str())
    }

    /// Checks `type`, `object` and `id` against attributes read from an object.
    ///
    /// # Errors
    ///
    /// [`Error::Inconsistent`] if the URI constrains an attribute missing
    /// from `attributes`; no verdict is possible then.
    pub fn matches_object(&self, attributes: &[ObjectAttribute]) -> Result<bool> {
        if self.has_vendor_path_attributes() {
            return Ok(false);
        }

        if let Some(expected) = self.object_type() {
            let class = attributes
                .iter()
                .find_map(|attribute| match attribute {
                    ObjectAttribute::Class(class) => Some(*class),
                    _ => None,
                })
                .ok_or(Error::Inconsistent {
                    attribute: PathAttribute::Type.name(),
                })?;
            if class != expected {
                return Ok(false);
            }
        }

        if let Some(expected) = self.object() {
            let label = attributes
                .iter()
                .find_map(|attribute| match attribute {
                    ObjectAttribute::Label(label) => Some(label.as_str()),
                    _ => None,
                })
                .ok_or(Error::Inconsistent {
                    attribute: TextAttribute::Object.name(),
                })?;
            if label != expected {
                return Ok(false);
            }
        }

        if let Some(expected) = self.id() {
            let id = attributes
                .iter()
                .find_map(|attribute| match attribute {
                    ObjectAttribute::Id(id) => Some(id.as_slice()),
                    _ => None,
                })
                .ok_or(Error::Inconsistent {
                    attribute: PathAttribute::Id.name(),
                })?;
            if id != expected {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Search template implied by the URI: class, label and id, in that
    /// order, for those that are set.
    pub fn object_attributes(&self) -> Vec<ObjectAttribute> {
        let mut attributes = Vec::new();
        if let Some(class) = self.object_type() {
            attributes.push(ObjectAttribute::Class(class));
        }
        if let Some(label) = self.object() {
            attributes.push(ObjectAttribute::Label(label.to_string()));
        }
        if let Some(id) = self.id() {
            attributes.push(ObjectAttribute::Id(id.to_vec()));
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ObjectClass;

    fn uri(text: &str) -> Pkcs11Uri {
        Pkcs11Uri::parse(text).unwrap()
    }

    fn library() -> LibraryInfo {
        LibraryInfo {
            manufacturer: "SoftHSM".into(),
            description: "Implementation of PKCS11".into(),
            version: "2.6".into(),
        }
    }

    fn slot() -> SlotInfo {
        SlotInfo {
            id: 327,
            manufacturer: "SoftHSM project".into(),
            description: "SoftHSM slot ID 0x147".into(),
        }
    }

    fn token() -> TokenInfo {
        TokenInfo {
            label: "my-ca".into(),
            manufacturer: "SoftHSM project".into(),
            serial: "DECC0401648".into(),
            model: "SoftHSM v2".into(),
        }
    }

    fn object() -> Vec<ObjectAttribute> {
        vec![
            ObjectAttribute::Class(ObjectClass::PrivateKey),
            ObjectAttribute::Label("my-signing-key".into()),
            ObjectAttribute::Id(vec![0x01, 0x02]),
        ]
    }

    #[test]
    fn empty_uri_matches_everything() {
        let uri = uri("pkcs11:");
        assert!(uri.matches_library(&library()));
        assert!(uri.matches_slot(&slot()));
        assert!(uri.matches_token(&token()));
        assert_eq!(uri.matches_object(&object()), Ok(true));
        assert_eq!(uri.matches_object(&[]), Ok(true));
    }

    #[test]
    fn library_matching() {
        assert!(uri("pkcs11:library-manufacturer=SoftHSM;library-version=2.6")
            .matches_library(&library()));
        assert!(uri("pkcs11:library-version=2").matches_library(&LibraryInfo {
            version: "2.0".into(),
            ..library()
        }));
        assert!(!uri("pkcs11:library-manufacturer=softhsm").matches_library(&library()));
        assert!(!uri("pkcs11:library-description=").matches_library(&library()));
        assert!(!uri("pkcs11:library-version=2.7").matches_library(&library()));
    }

    #[test]
    fn slot_matching() {
        assert!(uri("pkcs11:slot-id=327").matches_slot(&slot()));
        assert!(!uri("pkcs11:slot-id=328").matches_slot(&slot()));
        assert!(uri("pkcs11:slot-manufacturer=SoftHSM%20project").matches_slot(&slot()));
        assert!(!uri("pkcs11:slot-description=other").matches_slot(&slot()));
    }

    #[test]
    fn token_matching() {
        assert!(uri("pkcs11:token=my-ca;serial=DECC0401648").matches_token(&token()));
        assert!(uri("pkcs11:model=SoftHSM%20v2;manufacturer=SoftHSM%20project")
            .matches_token(&token()));
        assert!(!uri("pkcs11:token=my-ca;serial=0").matches_token(&token()));
        // path attributes of other levels do not constrain tokens
        assert!(uri("pkcs11:token=my-ca;object=anything").matches_token(&token()));
    }

    #[test]
    fn vendor_path_attributes_never_match() {
        let uri = uri("pkcs11:token=my-ca;x-vendor=1");
        assert!(!uri.matches_library(&library()));
        assert!(!uri.matches_slot(&slot()));
        assert!(!uri.matches_token(&token()));
        assert_eq!(uri.matches_object(&object()), Ok(false));
    }

    #[test]
    fn vendor_query_attributes_do_not_affect_matching() {
        let uri = uri("pkcs11:token=my-ca?x-vendor=1");
        assert!(uri.matches_token(&token()));
    }

    #[test]
    fn object_matching() {
        assert_eq!(
            uri("pkcs11:type=private;object=my-signing-key;id=%01%02").matches_object(&object()),
            Ok(true)
        );
        assert_eq!(uri("pkcs11:type=public").matches_object(&object()), Ok(false));
        assert_eq!(uri("pkcs11:id=%01").matches_object(&object()), Ok(false));
        assert_eq!(uri("pkcs11:object=my").matches_object(&object()), Ok(false));
    }

    #[test]
    fn missing_object_attribute_is_inconsistent() {
        let without_id = vec![
            ObjectAttribute::Class(ObjectClass::PrivateKey),
            ObjectAttribute::Label("my-signing-key".into()),
        ];
        assert_eq!(
            uri("pkcs11:id=%01%02").matches_object(&without_id),
            Err(Error::Inconsistent { attribute: "id" })
        );
        assert_eq!(
            uri("pkcs11:type=cert").matches_object(&[]),
            Err(Error::Inconsistent { attribute: "type" })
        );
        assert_eq!(
            uri("pkcs11:object=x").matches_object(&[ObjectAttribute::Id(vec![])]),
            Err(Error::Inconsistent { attribute: "object" })
        );
        // unconstrained attributes may be missing
        assert_eq!(uri("pkcs11:type=private").matches_object(&without_id), Ok(true));
    }

    #[test]
    fn projection() {
        assert!(uri("pkcs11:token=a").object_attributes().is_empty());
        assert_eq!(
            uri("pkcs11:id=%01;object=k;type=data").object_attributes(),
            vec![
                ObjectAttribute::Class(ObjectClass::Data),
                ObjectAttribute::Label("k".into()),
                ObjectAttribute::Id(vec![1]),
            ]
        );
        assert_eq!(
            uri("pkcs11:id=").object_attributes(),
            vec![ObjectAttribute::Id(Vec::new())]
        );
    }
}
