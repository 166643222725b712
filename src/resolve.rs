//! Selecting the slots of a PKCS#11 module that a URI refers to.

use crate::descriptor::{LibraryInfo, SlotInfo, TokenInfo};
use crate::uri::Pkcs11Uri;

/// Read-only view of a loaded PKCS#11 module.
///
/// Implemented by whatever wraps the actual module (`C_GetInfo`,
/// `C_GetSlotList`, `C_GetSlotInfo`, `C_GetTokenInfo`).
pub trait SlotSource {
    /// Metadata of the module itself.
    fn library_info(&self) -> anyhow::Result<LibraryInfo>;

    /// All slots, with or without a token.
    fn slots(&self) -> anyhow::Result<Vec<SlotInfo>>;

    /// The token in slot `slot_id`, or `None` if the slot is empty.
    fn token_info(&self, slot_id: u64) -> anyhow::Result<Option<TokenInfo>>;
}

/// Returns the identifiers of slots matching `uri`.
///
/// Nothing matches if the library does not. Slots holding a token must
/// match on both slot and token attributes. Empty slots are included only
/// with `include_empty_slots` and when the URI names no token attribute.
pub fn matching_slots<S>(
    uri: &Pkcs11Uri,
    source: &S,
    include_empty_slots: bool,
) -> anyhow::Result<Vec<u64>>
where
    S: SlotSource + ?Sized,
{
    let library = source.library_info()?;
    if !uri.matches_library(&library) {
        log::debug!(
            "library '{}' version {} does not match",
            library.description,
            library.version
        );
        return Ok(Vec::new());
    }

    let mut matching = Vec::new();
    for slot in source.slots()? {
        if !uri.matches_slot(&slot) {
            log::trace!("slot {} does not match", slot.id);
            continue;
        }
        let included = match source.token_info(slot.id)? {
            Some(token) => uri.matches_token(&token),
            None => include_empty_slots && !uri.defines_token(),
        };
        if included {
            matching.push(slot.id);
        } else {
            log::trace!("slot {} excluded by token attributes", slot.id);
        }
    }
    log::debug!("{} matching slot(s)", matching.len());
    Ok(matching)
}
