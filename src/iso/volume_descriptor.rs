// bootiso/src/iso/volume_descriptor.rs

use crate::endian::ByteOrder;
use crate::iso::SECTOR_SIZE;
use crate::iso::dir_record::ROOT_RECORD_LEN;
use crate::iso::image::{ImageOptions, PATH_TABLE_L_SECTOR, PATH_TABLE_M_SECTOR};

pub const DESCRIPTOR_TYPE_PRIMARY: u8 = 0x01;
pub const DESCRIPTOR_TYPE_BOOT_RECORD: u8 = 0x00;
pub const DESCRIPTOR_TYPE_TERMINATOR: u8 = 0xFF;
pub const STANDARD_IDENTIFIER: &[u8] = b"CD001";
pub const DESCRIPTOR_VERSION: u8 = 0x01;
pub const EL_TORITO_IDENTIFIER: &[u8] = b"EL TORITO SPECIFICATION";

pub const PVD_SYSTEM_ID_OFFSET: usize = 8;
pub const PVD_VOLUME_ID_OFFSET: usize = 40;
pub const PVD_TOTAL_SECTORS_OFFSET: usize = 80;
pub const PVD_VOL_SET_SIZE_OFFSET: usize = 120;
pub const PVD_VOL_SEQ_NUM_OFFSET: usize = 124;
pub const PVD_LOGICAL_BLOCK_SIZE_OFFSET: usize = 128;
pub const PVD_PATH_TABLE_SIZE_OFFSET: usize = 132;
pub const PVD_PATH_TABLE_L_OFFSET: usize = 140;
pub const PVD_PATH_TABLE_M_OFFSET: usize = 148;
pub const PVD_ROOT_DIR_RECORD_OFFSET: usize = 156;
pub const PVD_VOLUME_SET_ID_OFFSET: usize = 190;
pub const PVD_PUBLISHER_ID_OFFSET: usize = 318;
pub const PVD_PREPARER_ID_OFFSET: usize = 446;
pub const PVD_APPLICATION_ID_OFFSET: usize = 574;
pub const PVD_FILE_STRUCTURE_VERSION_OFFSET: usize = 881;

const BRVD_BOOT_IDENTIFIER_OFFSET: usize = 7;
const BRVD_CATALOG_SECTOR_OFFSET: usize = 71;

/// Writes `text` space-padded into the fixed-width field at `offset`.
/// Text longer than the field is truncated to the field width.
fn put_str(sector: &mut [u8], offset: usize, width: usize, text: &str) {
    let field = &mut sector[offset..offset + width];
    field.fill(b' ');
    let bytes = text.as_bytes();
    let len = bytes.len().min(width);
    field[..len].copy_from_slice(&bytes[..len]);
}

fn put_field(sector: &mut [u8], offset: usize, bytes: &[u8]) {
    sector[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// Builds the primary volume descriptor sector.
pub fn primary_volume_descriptor(
    opts: &ImageOptions,
    path_table_size: u32,
    root_record: &[u8; ROOT_RECORD_LEN],
) -> [u8; SECTOR_SIZE] {
    let mut pvd = [0u8; SECTOR_SIZE];
    pvd[0] = DESCRIPTOR_TYPE_PRIMARY;
    pvd[1..6].copy_from_slice(STANDARD_IDENTIFIER);
    pvd[6] = DESCRIPTOR_VERSION;

    put_str(&mut pvd, PVD_SYSTEM_ID_OFFSET, 32, &opts.system_id);
    put_str(&mut pvd, PVD_VOLUME_ID_OFFSET, 32, &opts.volume_id);

    put_field(
        &mut pvd,
        PVD_TOTAL_SECTORS_OFFSET,
        &ByteOrder::Mixed.encode_u32(opts.total_sectors),
    );
    put_field(
        &mut pvd,
        PVD_VOL_SET_SIZE_OFFSET,
        &ByteOrder::Mixed.encode_u16(1),
    );
    put_field(
        &mut pvd,
        PVD_VOL_SEQ_NUM_OFFSET,
        &ByteOrder::Mixed.encode_u16(1),
    );
    put_field(
        &mut pvd,
        PVD_LOGICAL_BLOCK_SIZE_OFFSET,
        &ByteOrder::Mixed.encode_u16(SECTOR_SIZE as u16),
    );
    put_field(
        &mut pvd,
        PVD_PATH_TABLE_SIZE_OFFSET,
        &ByteOrder::Mixed.encode_u32(path_table_size),
    );
    put_field(
        &mut pvd,
        PVD_PATH_TABLE_L_OFFSET,
        &ByteOrder::Least.encode_u32(PATH_TABLE_L_SECTOR),
    );
    put_field(
        &mut pvd,
        PVD_PATH_TABLE_M_OFFSET,
        &ByteOrder::Most.encode_u32(PATH_TABLE_M_SECTOR),
    );

    put_field(&mut pvd, PVD_ROOT_DIR_RECORD_OFFSET, root_record);

    put_str(&mut pvd, PVD_VOLUME_SET_ID_OFFSET, 128, "");
    put_str(&mut pvd, PVD_PUBLISHER_ID_OFFSET, 128, &opts.publisher_id);
    put_str(&mut pvd, PVD_PREPARER_ID_OFFSET, 128, &opts.preparer_id);
    // 239 bytes, the application-use field included
    put_str(&mut pvd, PVD_APPLICATION_ID_OFFSET, 239, "");

    pvd[PVD_FILE_STRUCTURE_VERSION_OFFSET] = 1;
    pvd
}

/// Builds the El Torito boot record volume descriptor sector.
pub fn boot_record_descriptor(boot_catalog_sector: u32) -> [u8; SECTOR_SIZE] {
    let mut brvd = [0u8; SECTOR_SIZE];
    brvd[0] = DESCRIPTOR_TYPE_BOOT_RECORD;
    brvd[1..6].copy_from_slice(STANDARD_IDENTIFIER);
    brvd[6] = DESCRIPTOR_VERSION;
    put_field(&mut brvd, BRVD_BOOT_IDENTIFIER_OFFSET, EL_TORITO_IDENTIFIER);
    put_field(
        &mut brvd,
        BRVD_CATALOG_SECTOR_OFFSET,
        &ByteOrder::Least.encode_u32(boot_catalog_sector),
    );
    brvd
}

/// Builds the volume descriptor set terminator sector.
pub fn terminator_descriptor() -> [u8; SECTOR_SIZE] {
    let mut term = [0u8; SECTOR_SIZE];
    term[0] = DESCRIPTOR_TYPE_TERMINATOR;
    term[1..6].copy_from_slice(STANDARD_IDENTIFIER);
    term[6] = DESCRIPTOR_VERSION;
    term
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iso::dir_record::root_record;
    use crate::iso::fs_node::DirTree;
    use crate::iso::record::RecordTimestamp;

    fn sample_pvd() -> [u8; SECTOR_SIZE] {
        let tree = DirTree::new(25);
        let root = root_record(&tree, RecordTimestamp::default());
        let opts = ImageOptions {
            total_sectors: 300,
            ..ImageOptions::default()
        };
        primary_volume_descriptor(&opts, 20, &root)
    }

    #[test]
    fn pvd_header_and_version() {
        let pvd = sample_pvd();
        assert_eq!(pvd[0], 0x01);
        assert_eq!(&pvd[1..6], b"CD001");
        assert_eq!(pvd[6], 0x01);
        assert_eq!(pvd[PVD_FILE_STRUCTURE_VERSION_OFFSET], 1);
    }

    #[test]
    fn pvd_numeric_fields_are_mixed_order() {
        let pvd = sample_pvd();
        assert_eq!(&pvd[80..88], &[44, 1, 0, 0, 0, 0, 1, 44]); // 300 sectors
        assert_eq!(&pvd[128..132], &[0, 8, 8, 0]); // block size 2048
        assert_eq!(&pvd[132..140], &[20, 0, 0, 0, 0, 0, 0, 20]); // table size
        assert_eq!(&pvd[140..144], &[21, 0, 0, 0]); // L table, least
        assert_eq!(&pvd[148..152], &[0, 0, 0, 22]); // M table, most
    }

    #[test]
    fn pvd_embeds_the_root_record() {
        let pvd = sample_pvd();
        assert_eq!(pvd[PVD_ROOT_DIR_RECORD_OFFSET] as usize, ROOT_RECORD_LEN);
        assert_eq!(pvd[PVD_ROOT_DIR_RECORD_OFFSET + 25], 0x02);
    }

    #[test]
    fn identifier_fields_are_space_padded() {
        let pvd = sample_pvd();
        let volume_id = &pvd[PVD_VOLUME_ID_OFFSET..PVD_VOLUME_ID_OFFSET + 32];
        assert!(volume_id.ends_with(b"  "));
        assert!(volume_id.iter().all(|&b| b == b' ' || b.is_ascii_graphic()));
    }

    #[test]
    fn boot_record_descriptor_layout() {
        let brvd = boot_record_descriptor(19);
        assert_eq!(brvd[0], 0x00);
        assert_eq!(&brvd[1..6], b"CD001");
        assert_eq!(brvd[6], 0x01);
        assert_eq!(&brvd[7..30], b"EL TORITO SPECIFICATION");
        assert_eq!(&brvd[71..75], &[19, 0, 0, 0]);
    }

    #[test]
    fn terminator_descriptor_layout() {
        let term = terminator_descriptor();
        assert_eq!(term[0], 0xFF);
        assert_eq!(&term[1..6], b"CD001");
        assert_eq!(term[6], 0x01);
        assert!(term[7..].iter().all(|&b| b == 0));
    }
}
