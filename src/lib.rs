//! PKCS#11 URI
//!
//! Implementation of the [RFC 7512][rfc-7512] URI scheme for locating PKCS#11
//! libraries, slots, tokens and objects, such as keys on an HSM.
//!
//! ```text
//! pkcs11:token=my-ca;object=my-signing-key;type=private?pin-source=file:/etc/token
//! ```
//!
//! The crate
//! - extracts a URI from surrounding text ([`extract`]),
//! - parses it strictly against the grammar ([`Pkcs11Uri::parse`]),
//! - builds canonical URIs the parser reads back unchanged ([`Pkcs11UriBuilder`]),
//! - matches URIs against library, slot, token and object metadata
//!   ([`Pkcs11Uri::matches_token`] and friends, [`matching_slots`]).
//!
//! It does not load modules or open sessions; callers hand in the metadata.
//!
//! ```
//! use pkcs11_uri::{Pkcs11Uri, TokenInfo};
//!
//! let uri = Pkcs11Uri::parse(r#"key = "pkcs11:token=my-ca;object=my-signing-key""#)?;
//! let token = TokenInfo::from_padded(b"my-ca                           ", b"", b"", b"");
//! assert!(uri.matches_token(&token));
//! # Ok::<(), pkcs11_uri::Error>(())
//! ```
//!
//! [rfc-7512]: https://tools.ietf.org/html/rfc7512

mod attributes;
mod builder;
mod codec;
mod descriptor;
mod error;
mod extract;
mod grammar;
mod matcher;
mod resolve;
mod uri;

#[cfg(test)]
mod tests;

pub use builder::Pkcs11UriBuilder;
pub use codec::{decode, encode, encode_bytes, encode_name};
pub use descriptor::{trim_padded, LibraryInfo, ObjectAttribute, SlotInfo, TokenInfo};
pub use error::{Error, FormatError, Result};
pub use extract::extract;
pub use grammar::{
    CharClass, ObjectClass, PathAttribute, QueryAttribute, TextAttribute, PATH_VALUE,
    QUERY_VALUE, SCHEME_PREFIX, VENDOR_NAME, VENDOR_PREFIX,
};
pub use resolve::{matching_slots, SlotSource};
pub use uri::Pkcs11Uri;
