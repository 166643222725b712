use pkcs11_uri::{ObjectClass, Pkcs11Uri, Pkcs11UriBuilder};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
fn try_main() -> anyhow::Result<()> {
    let uri_str = "pkcs11:library-version=3;token=The%20Software%20PKCS%2311%20Softtoken;id=%69%95%3E%5C%F4%BD%EC%91;object=my-signing-key;type=private;slot-id=327;serial=DECC0401648?pin-source=file:/etc/token";
    let uri = Pkcs11Uri::parse(uri_str)?;
    dbg!(&uri);
    println!("{}", uri);

    let mut builder = uri.to_builder();
    builder
        .set_object_type(Some(ObjectClass::PublicKey))
        .set_pin_source(None)?
        .add_vendor_query_attribute("x-purpose", "verify")?;
    println!("{}", builder.build()?);

    let mut builder = Pkcs11UriBuilder::new();
    builder
        .set_token(Some("my-ca"))?
        .set_object(Some("my signing key"))?
        .set_pin_value(Some("1234"))?;
    // Debug output never shows the PIN
    dbg!(builder.build()?);
    Ok(())
}
