use crate::{
    Error, FormatError, LibraryInfo, ObjectAttribute, ObjectClass, Pkcs11Uri, Pkcs11UriBuilder,
    SlotInfo, TokenInfo,
};

const ALL_ATTRIBUTES: &str = "pkcs11:library-manufacturer=foo;library-description=bar;library-version=1.0;slot-manufacturer=foo;slot-description=bar;slot-id=1;manufacturer=foo;model=bar;serial=foo;token=bar;type=private;object=foo;id=%62%61%72?module-path=foo&module-name=bar&pin-value=foo&pin-source=bar";

#[test]
fn every_known_attribute() {
    let uri = Pkcs11Uri::parse(ALL_ATTRIBUTES).unwrap();
    assert_eq!(uri.library_manufacturer(), Some("foo"));
    assert_eq!(uri.library_description(), Some("bar"));
    assert_eq!(uri.library_version(), Some("1.0"));
    assert_eq!(uri.slot_manufacturer(), Some("foo"));
    assert_eq!(uri.slot_description(), Some("bar"));
    assert_eq!(uri.slot_id(), Some(1));
    assert_eq!(uri.manufacturer(), Some("foo"));
    assert_eq!(uri.model(), Some("bar"));
    assert_eq!(uri.serial(), Some("foo"));
    assert_eq!(uri.token(), Some("bar"));
    assert_eq!(uri.object_type(), Some(ObjectClass::PrivateKey));
    assert_eq!(uri.object(), Some("foo"));
    assert_eq!(uri.id(), Some(&b"bar"[..]));
    assert_eq!(uri.module_path(), Some("foo"));
    assert_eq!(uri.module_name(), Some("bar"));
    assert_eq!(uri.pin_value(), Some("foo"));
    assert_eq!(uri.pin_source(), Some("bar"));
    assert!(uri.vendor_path_attributes().is_empty());
    assert!(uri.vendor_query_attributes().is_empty());

    assert_eq!(uri.to_string(), ALL_ATTRIBUTES);
}

#[test]
fn attribute_order_is_canonicalized() {
    let uri = Pkcs11Uri::parse(
        "pkcs11:id=%62%61%72;library-version=1;x-b=2;token=bar;x-a=1?x-q=2&pin-source=bar&x-q=1",
    )
    .unwrap();
    assert_eq!(
        uri.to_string(),
        "pkcs11:library-version=1.0;token=bar;id=%62%61%72;x-a=1;x-b=2?pin-source=bar&x-q=2&x-q=1"
    );
}

#[test]
fn quoted_uri_in_configuration_text() {
    let text = r#"
        [signing]
        key = "pkcs11:token=my-ca;
               object=my-signing-key;
               type=private
               ?pin-source=file:/etc/token"
    "#;
    let uri = Pkcs11Uri::parse(text).unwrap();
    assert_eq!(uri.token(), Some("my-ca"));
    assert_eq!(uri.object(), Some("my-signing-key"));
    assert_eq!(uri.pin_source(), Some("file:/etc/token"));

    let uri = Pkcs11Uri::parse("see <pkcs11:token=my-ca> for details").unwrap();
    assert_eq!(uri.token(), Some("my-ca"));
}

#[test]
fn bad_delimiters() {
    assert_eq!(
        Pkcs11Uri::parse("key=pkcs11:token=a"),
        Err(Error::Format(FormatError::UnenclosedUri))
    );
    assert_eq!(
        Pkcs11Uri::parse("\"pkcs11:token=a"),
        Err(Error::Format(FormatError::UnterminatedDelimiter { expected: '"' }))
    );
    assert_eq!(
        Pkcs11Uri::parse("<pkcs11:token=a\""),
        Err(Error::Format(FormatError::UnterminatedDelimiter { expected: '>' }))
    );
}

#[test]
fn length_checking_can_be_disabled() {
    let long_token = format!("pkcs11:token={}", "a".repeat(33));
    assert_eq!(
        Pkcs11Uri::parse(&long_token),
        Err(Error::LengthExceeded {
            name: "token",
            max: 32,
            actual: 33
        })
    );
    let uri = Pkcs11Uri::parse_with(&long_token, false).unwrap();
    assert_eq!(uri.token().map(str::len), Some(33));
    assert!(!uri.checks_lengths());

    assert!(Pkcs11Uri::parse("pkcs11:library-version=256").is_err());
    let uri = Pkcs11Uri::parse_with("pkcs11:library-version=256.1000", false).unwrap();
    assert_eq!(uri.library_version(), Some("256.1000"));

    // caps count bytes, not characters
    let umlauts = format!("pkcs11:model={}", "%C3%BC".repeat(9));
    assert_eq!(
        Pkcs11Uri::parse(&umlauts),
        Err(Error::LengthExceeded {
            name: "model",
            max: 16,
            actual: 18
        })
    );
}

#[test]
fn slot_values_are_capped() {
    let manufacturer = format!("pkcs11:slot-manufacturer={}", "m".repeat(33));
    assert_eq!(
        Pkcs11Uri::parse(&manufacturer),
        Err(Error::LengthExceeded {
            name: "slot-manufacturer",
            max: 32,
            actual: 33
        })
    );
    assert!(Pkcs11Uri::parse_with(&manufacturer, false).is_ok());

    let description = format!("pkcs11:slot-description={}", "d".repeat(64));
    assert!(Pkcs11Uri::parse(&description).is_ok());
    let description = format!("pkcs11:slot-description={}", "d".repeat(65));
    assert_eq!(
        Pkcs11Uri::parse(&description),
        Err(Error::LengthExceeded {
            name: "slot-description",
            max: 64,
            actual: 65
        })
    );
    let uri = Pkcs11Uri::parse_with(&description, false).unwrap();
    assert_eq!(uri.slot_description().map(str::len), Some(65));
}

#[test]
fn length_checking_carries_into_builders() {
    let long = "a".repeat(40);
    let uri = Pkcs11Uri::parse_with(&format!("pkcs11:serial={}", long), false).unwrap();
    let mut builder = uri.to_builder();
    assert!(!builder.checks_lengths());
    builder.set_manufacturer(Some(long.as_str())).unwrap();
    assert_eq!(builder.build().unwrap().manufacturer(), Some(long.as_str()));

    let mut strict = Pkcs11UriBuilder::new();
    assert!(strict.set_manufacturer(Some(long.as_str())).is_err());
    assert_eq!(strict.to_string(), "pkcs11:");
}

#[test]
fn empty_is_not_absent() {
    let uri = Pkcs11Uri::parse("pkcs11:token=;object=?pin-value=").unwrap();
    assert_eq!(uri.token(), Some(""));
    assert_eq!(uri.object(), Some(""));
    assert_eq!(uri.pin_value(), Some(""));
    assert_eq!(uri.serial(), None);
    assert!(uri.defines_token());
    assert!(uri.defines_object());
    assert_eq!(uri.to_string(), "pkcs11:token=;object=?pin-value=");

    assert!(!uri.matches_token(&TokenInfo {
        label: "my-ca".into(),
        ..TokenInfo::default()
    }));
    assert!(uri.matches_token(&TokenInfo::default()));
}

#[test]
fn resolving_a_module() {
    let uri = Pkcs11Uri::parse(
        "pkcs11:library-manufacturer=SoftHSM;library-version=2.6;token=my-ca;object=my-signing-key;type=private",
    )
    .unwrap();

    let library = LibraryInfo::from_padded(
        b"SoftHSM                         ",
        b"Implementation of PKCS11        ",
        (2, 6),
    );
    let slot = SlotInfo::from_padded(0u32, b"SoftHSM project                 ", b"");
    let token = TokenInfo::from_padded(b"my-ca                           ", b"", b"", b"");
    assert!(uri.matches_library(&library));
    assert!(uri.matches_slot(&slot));
    assert!(uri.matches_token(&token));

    let template = uri.object_attributes();
    assert_eq!(
        template,
        vec![
            ObjectAttribute::Class(ObjectClass::PrivateKey),
            ObjectAttribute::label_from_bytes(b"my-signing-key"),
        ]
    );
    assert_eq!(uri.matches_object(&template), Ok(true));
    assert_eq!(
        uri.matches_object(&[ObjectAttribute::Class(ObjectClass::PrivateKey)]),
        Err(Error::Inconsistent { attribute: "object" })
    );
}

#[test]
fn vendor_path_attributes_block_matching() {
    let uri = Pkcs11Uri::parse("pkcs11:x-slot-group=2").unwrap();
    assert!(!uri.matches_library(&LibraryInfo::default()));
    assert!(!uri.matches_slot(&SlotInfo::default()));
    assert!(!uri.matches_token(&TokenInfo::default()));
    assert_eq!(uri.matches_object(&[]), Ok(false));

    let mut builder = uri.to_builder();
    builder.set_vendor_path_attribute("x-slot-group", None).unwrap();
    let uri = builder.build().unwrap();
    assert!(uri.matches_token(&TokenInfo::default()));
}

#[test]
fn pin_value_is_not_debug_printed() {
    let uri = Pkcs11Uri::parse("pkcs11:token=a?pin-value=hunter2").unwrap();
    let debug = format!("{:?}", uri);
    assert!(!debug.contains("hunter2"));
    assert!(!format!("{:?}", uri.to_builder()).contains("hunter2"));
    // it is still part of the URI itself
    assert!(uri.to_string().contains("pin-value=hunter2"));
}

#[test]
fn id_round_trips_raw_bytes() {
    let id = [0x69, 0x95, 0x3e, 0x5c, 0xf4, 0xbd, 0xec, 0x91];
    let mut builder = Pkcs11UriBuilder::new();
    builder.set_id(Some(&id[..]));
    let uri = builder.build().unwrap();
    assert_eq!(uri.to_string(), "pkcs11:id=%69%95%3E%5C%F4%BD%EC%91");
    assert_eq!(uri.id(), Some(&id[..]));

    // a literal id is stored as its bytes but emitted fully encoded
    let uri = Pkcs11Uri::parse("pkcs11:id=ab%63").unwrap();
    assert_eq!(uri.id(), Some(&b"abc"[..]));
    assert_eq!(uri.to_string(), "pkcs11:id=%61%62%63");
}
