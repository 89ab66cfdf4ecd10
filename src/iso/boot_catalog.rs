// bootiso/src/iso/boot_catalog.rs

use crate::error::{ImageError, Result};
use crate::iso::SECTOR_SIZE;

pub const VALIDATION_ENTRY_HEADER_ID: u8 = 0x01;
pub const BOOT_INDICATOR_BOOTABLE: u8 = 0x88;
pub const MEDIA_TYPE_NO_EMULATION: u8 = 0x00;

/// Conventional real-mode load segment 0x07C0 (physical 0x7C00).
pub const DEFAULT_LOAD_SEGMENT: u16 = 0x07C0;

/// Default advertised load size, in 512-byte units.
pub const DEFAULT_BOOT_SECTOR_COUNT: u16 = 4;

/// One reserved 2048-byte boot sector holds four 512-byte load units.
pub const MAX_BOOT_SECTOR_COUNT: u16 = 4;

const SIGNATURE: [u8; 4] = [0x55, 0xAA, 0x55, 0xAA];
const SIGNATURE_OFFSET: usize = 28;
const INITIAL_ENTRY_OFFSET: usize = 32;

/// The initial/default boot entry advertised by the catalog.
#[derive(Clone, Copy, Debug)]
pub struct BootEntry {
    /// Real-mode segment the BIOS loads the image at.
    pub load_segment: u16,
    /// Number of 512-byte units the BIOS reads.
    pub sector_count: u16,
    /// Sector the boot image starts at.
    pub load_rba: u32,
}

/// Builds the El Torito boot catalog sector: a 32-byte validation entry
/// followed by the 32-byte initial/default entry.
///
/// The advertised sector count may not run past the single reserved boot
/// sector.
pub fn boot_catalog(entry: &BootEntry) -> Result<[u8; SECTOR_SIZE]> {
    if entry.sector_count > MAX_BOOT_SECTOR_COUNT {
        return Err(ImageError::BootSpanTooLarge {
            sectors: entry.sector_count,
        });
    }

    let mut catalog = [0u8; SECTOR_SIZE];

    // Validation entry: header id, platform 0 (80x86), fixed signature.
    catalog[0] = VALIDATION_ENTRY_HEADER_ID;
    catalog[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 4].copy_from_slice(&SIGNATURE);

    let initial = &mut catalog[INITIAL_ENTRY_OFFSET..INITIAL_ENTRY_OFFSET + 32];
    initial[0] = BOOT_INDICATOR_BOOTABLE;
    initial[1] = MEDIA_TYPE_NO_EMULATION;
    initial[2..4].copy_from_slice(&entry.load_segment.to_le_bytes());
    initial[6..8].copy_from_slice(&entry.sector_count.to_le_bytes());
    initial[8..12].copy_from_slice(&entry.load_rba.to_le_bytes());

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_entry() -> BootEntry {
        BootEntry {
            load_segment: DEFAULT_LOAD_SEGMENT,
            sector_count: DEFAULT_BOOT_SECTOR_COUNT,
            load_rba: 20,
        }
    }

    #[test]
    fn validation_entry_header_and_signature() {
        let catalog = boot_catalog(&default_entry()).unwrap();
        assert_eq!(catalog[0], 0x01);
        assert_eq!(&catalog[28..32], &[0x55, 0xAA, 0x55, 0xAA]);
    }

    #[test]
    fn initial_entry_fields() {
        let catalog = boot_catalog(&default_entry()).unwrap();
        assert_eq!(catalog[32], 0x88);
        assert_eq!(catalog[33], 0x00);
        assert_eq!(&catalog[34..36], &[0xC0, 0x07]);
        assert_eq!(&catalog[38..40], &[4, 0]);
        assert_eq!(&catalog[40..44], &[20, 0, 0, 0]);
        assert!(catalog[64..].iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_boot_span_is_rejected() {
        let entry = BootEntry {
            sector_count: 5,
            ..default_entry()
        };
        assert!(matches!(
            boot_catalog(&entry),
            Err(ImageError::BootSpanTooLarge { sectors: 5 })
        ));
    }
}
