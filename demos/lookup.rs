use std::path::PathBuf;

use anyhow::anyhow;
use pkcs11::types::{
    CKF_SERIAL_SESSION, CKF_TOKEN_PRESENT, CKU_USER, CK_ATTRIBUTE, CK_ATTRIBUTE_TYPE,
    CK_OBJECT_CLASS, CK_OBJECT_HANDLE, CK_SLOT_ID,
};
use pkcs11::Ctx;
use pkcs11_uri::{
    matching_slots, LibraryInfo, ObjectAttribute, Pkcs11Uri, SlotInfo, SlotSource, TokenInfo,
};

/// A loaded PKCS#11 module.
struct Module(Ctx);

impl SlotSource for Module {
    fn library_info(&self) -> anyhow::Result<LibraryInfo> {
        let info = self
            .0
            .get_info()
            .map_err(|err| anyhow!("C_GetInfo failed: {}", err))?;
        Ok(LibraryInfo::from_padded(
            &info.manufacturerID.0,
            &info.libraryDescription.0,
            (info.libraryVersion.major, info.libraryVersion.minor),
        ))
    }

    fn slots(&self) -> anyhow::Result<Vec<SlotInfo>> {
        let ids = self
            .0
            .get_slot_list(false)
            .map_err(|err| anyhow!("C_GetSlotList failed: {}", err))?;
        let mut slots = Vec::with_capacity(ids.len());
        for id in ids {
            let info = self
                .0
                .get_slot_info(id)
                .map_err(|err| anyhow!("C_GetSlotInfo({}) failed: {}", id, err))?;
            slots.push(SlotInfo::from_padded(
                id,
                &info.manufacturerID.0,
                &info.slotDescription.0,
            ));
        }
        Ok(slots)
    }

    fn token_info(&self, slot_id: u64) -> anyhow::Result<Option<TokenInfo>> {
        let id = slot_id as CK_SLOT_ID;
        let slot = self
            .0
            .get_slot_info(id)
            .map_err(|err| anyhow!("C_GetSlotInfo({}) failed: {}", slot_id, err))?;
        if slot.flags & CKF_TOKEN_PRESENT == 0 {
            return Ok(None);
        }
        let info = self
            .0
            .get_token_info(id)
            .map_err(|err| anyhow!("C_GetTokenInfo({}) failed: {}", slot_id, err))?;
        Ok(Some(TokenInfo::from_padded(
            &info.label.0,
            &info.manufacturerID.0,
            &info.serialNumber.0,
            &info.model.0,
        )))
    }
}

impl Module {
    /// Searches the token in `slot_id` for objects matching the URI's
    /// `type`, `object` and `id`, logging in with `pin-value` if given.
    fn find_objects(
        &self,
        uri: &Pkcs11Uri,
        slot_id: u64,
    ) -> anyhow::Result<Vec<CK_OBJECT_HANDLE>> {
        let attributes = uri.object_attributes();
        // CK_ATTRIBUTE points into these, so they outlive the search
        let classes: Vec<CK_OBJECT_CLASS> = attributes
            .iter()
            .map(|attribute| match attribute {
                ObjectAttribute::Class(class) => class.as_raw() as CK_OBJECT_CLASS,
                _ => 0,
            })
            .collect();
        let template: Vec<CK_ATTRIBUTE> = attributes
            .iter()
            .zip(&classes)
            .map(|(attribute, class)| {
                let raw = CK_ATTRIBUTE::new(attribute.attribute_type() as CK_ATTRIBUTE_TYPE);
                match attribute {
                    ObjectAttribute::Class(_) => raw.with_ck_ulong(class),
                    ObjectAttribute::Label(label) => raw.with_string(label),
                    ObjectAttribute::Id(id) => raw.with_bytes(id),
                }
            })
            .collect();

        let session = self
            .0
            .open_session(slot_id as CK_SLOT_ID, CKF_SERIAL_SESSION, None, None)
            .map_err(|err| anyhow!("C_OpenSession failed: {}", err))?;
        if let Some(pin) = uri.pin_value() {
            self.0
                .login(session, CKU_USER, Some(pin))
                .map_err(|err| anyhow!("C_Login failed: {}", err))?;
        }
        self.0
            .find_objects_init(session, &template)
            .map_err(|err| anyhow!("C_FindObjectsInit failed: {}", err))?;
        let objects = self
            .0
            .find_objects(session, 16)
            .map_err(|err| anyhow!("C_FindObjects failed: {}", err))?;
        self.0
            .find_objects_final(session)
            .map_err(|err| anyhow!("C_FindObjectsFinal failed: {}", err))?;
        self.0
            .close_session(session)
            .map_err(|err| anyhow!("C_CloseSession failed: {}", err))?;
        Ok(objects)
    }
}

fn main() {
    // let level = log::LevelFilter::Trace;
    let level = log::LevelFilter::Debug;
    let _ = simplelog::SimpleLogger::init(level, simplelog::Config::default());
    if let Err(err) = try_main() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
fn try_main() -> anyhow::Result<()> {
    let uri_str = r"pkcs11:
        type=private;
        token=my-ca;
        object=my-signing-key
            ?pin-value=1234
            &module-path=/usr/lib/libsofthsm2.so";
    let uri = Pkcs11Uri::parse(uri_str)?;

    let module_path = match uri.module_path() {
        Some(path) => PathBuf::from(path),
        None => std::env::var_os("PKCS11_MODULE")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("no module-path, set PKCS11_MODULE"))?,
    };
    let context = Ctx::new_and_initialize(&module_path)
        .map_err(|err| anyhow!("loading {}: {}", module_path.display(), err))?;
    let module = Module(context);

    let slots = matching_slots(&uri, &module, false)?;
    println!("slots: {:x?}", slots);

    for slot_id in slots {
        let objects = module.find_objects(&uri, slot_id)?;
        println!("slot {:x}: objects {:?}", slot_id, objects);
    }

    let any_slot = Pkcs11Uri::parse("pkcs11:slot-manufacturer=SoftHSM%20project")?;
    let slots = matching_slots(&any_slot, &module, true)?;
    println!("slots incl. empty: {:x?}", slots);
    Ok(())
}
