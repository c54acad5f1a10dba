//! Persistence glue: the image and settings in the key-value store.
//!
//! The image occupies a run of sequential keys laid out by
//! [`wristsketch_protocol::persist`]; settings are one postcard blob under
//! their own key. Both are touched only at lifecycle boundaries (load at
//! startup, save at shutdown or settings-menu close), never per stroke.

use wristsketch_protocol::persist::{entry_count, entry_range};

use crate::raster::{Bitmap, BITMAP_BYTES};
use crate::settings::Settings;
use crate::traits::{KeyValueStore, StoreError};

/// Key holding the settings blob
pub const SETTINGS_KEY: u32 = 0;

/// First key of the image entry run
pub const IMAGE_BASE_KEY: u32 = 20;

/// Entries in a full image run
pub const IMAGE_ENTRY_COUNT: usize = entry_count(BITMAP_BYTES);

/// Upper bound on the encoded settings blob
const SETTINGS_BLOB_BYTES: usize = 16;

/// Persist the image, or its absence.
///
/// Every image key is deleted first in either case, so a failed or partial
/// earlier save can never leave stale entries behind a fresh header.
pub fn save_image<S: KeyValueStore>(
    store: &mut S,
    image: Option<&Bitmap>,
) -> Result<(), StoreError> {
    for index in 0..IMAGE_ENTRY_COUNT {
        let key = IMAGE_BASE_KEY + index as u32;
        if store.exists(key) {
            store.delete(key)?;
        }
    }

    if let Some(image) = image {
        let bytes = image.bytes();
        for index in 0..IMAGE_ENTRY_COUNT {
            let range = entry_range(index, BITMAP_BYTES);
            store.write(IMAGE_BASE_KEY + index as u32, &bytes[range])?;
        }
    }

    Ok(())
}

/// Load the persisted image, if one was saved.
///
/// Individually missing entries are tolerated: their span of the image
/// stays at the freshly allocated background, so a partially corrupted
/// store still yields most of the drawing.
pub fn load_image<S: KeyValueStore>(store: &S) -> Option<Bitmap> {
    if !store.exists(IMAGE_BASE_KEY) {
        return None;
    }

    let mut image = Bitmap::new();
    for index in 0..IMAGE_ENTRY_COUNT {
        let key = IMAGE_BASE_KEY + index as u32;
        if !store.exists(key) {
            continue;
        }
        let range = entry_range(index, BITMAP_BYTES);
        // A short or failed read likewise leaves background
        let _ = store.read(key, &mut image.bytes_mut()[range]);
    }
    Some(image)
}

/// Persist the settings as one postcard blob
pub fn save_settings<S: KeyValueStore>(
    store: &mut S,
    settings: &Settings,
) -> Result<(), StoreError> {
    let mut buffer = [0u8; SETTINGS_BLOB_BYTES];
    let encoded =
        postcard::to_slice(settings, &mut buffer).map_err(|_| StoreError::EntryTooLarge)?;
    store.write(SETTINGS_KEY, encoded)
}

/// Load persisted settings; `None` when absent or undecodable (the caller
/// falls back to defaults)
pub fn load_settings<S: KeyValueStore>(store: &S) -> Option<Settings> {
    if !store.exists(SETTINGS_KEY) {
        return None;
    }
    let mut buffer = [0u8; SETTINGS_BLOB_BYTES];
    let len = store.read(SETTINGS_KEY, &mut buffer).ok()?;
    postcard::from_bytes(&buffer[..len]).ok()
}
