// bootiso/src/iso/dir_record.rs

use crate::endian::ByteOrder;
use crate::error::{ImageError, Result};
use crate::iso::SECTOR_SIZE;
use crate::iso::fs_node::{DirId, DirTree, FileNode};
use crate::iso::record::{RecordBuf, RecordTimestamp};

/// File-flags bit marking a directory record.
pub const FLAG_DIRECTORY: u8 = 0x02;

/// Length of the root record embedded in the primary volume descriptor.
pub const ROOT_RECORD_LEN: usize = 34;

const SELF_IDENTIFIER: u8 = 0x00;
const PARENT_IDENTIFIER: u8 = 0x01;

enum Identifier<'a> {
    /// Single-byte identifier of the self/parent back-reference records.
    Special(u8),
    Name(&'a str),
}

/// Builds one directory record.
///
/// Layout: length byte (backpatched last), extended-attribute length,
/// starting block and data length both in mixed order, 7-byte recording
/// timestamp, flags, two unused bytes, volume sequence number in mixed
/// order, identifier length and bytes, and a trailing zero pad so every
/// record ends on an even offset.
fn record(
    block: u32,
    data_len: u32,
    flags: u8,
    identifier: Identifier,
    timestamp: RecordTimestamp,
) -> Vec<u8> {
    let mut buf = RecordBuf::new();
    buf.put_u8(0); // record length, backpatched below
    buf.put_u8(0); // extended attribute length
    buf.put_u32(block, ByteOrder::Mixed);
    buf.put_u32(data_len, ByteOrder::Mixed);
    buf.put_bytes(&timestamp.to_bytes());
    buf.put_u8(flags);
    buf.skip(2);
    buf.put_u16(1, ByteOrder::Mixed); // volume sequence number
    match identifier {
        Identifier::Special(byte) => {
            buf.put_u8(1);
            buf.put_u8(byte);
        }
        Identifier::Name(name) => {
            buf.put_u8(name.len() as u8);
            buf.put_bytes(name.as_bytes());
        }
    }
    buf.pad_to_even();
    let len = buf.len();
    buf.set(0, len as u8);
    buf.into_vec()
}

fn file_record(file: &FileNode, timestamp: RecordTimestamp) -> Result<Vec<u8>> {
    let size = u32::try_from(file.size()).map_err(|_| ImageError::FileTooLarge {
        path: file.abs_path().to_string(),
    })?;
    Ok(record(
        file.block(),
        size,
        0x00,
        Identifier::Name(file.identifier()),
        timestamp,
    ))
}

/// Renders the minimal root-only record embedded in the primary volume
/// descriptor: the root's self record, which is always exactly 34 bytes.
pub fn root_record(tree: &DirTree, timestamp: RecordTimestamp) -> [u8; ROOT_RECORD_LEN] {
    let root = tree.dir(tree.root());
    let bytes = record(
        root.block(),
        SECTOR_SIZE as u32,
        FLAG_DIRECTORY,
        Identifier::Special(SELF_IDENTIFIER),
        timestamp,
    );
    let mut out = [0u8; ROOT_RECORD_LEN];
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

/// Renders one directory's full record sector: self record, parent
/// back-reference (the root references itself), one record per child
/// directory in tree order, one record per child file in tree order.
///
/// The concatenated records must fit in a single sector; overflowing
/// content is rejected rather than truncated.
pub fn directory_sector(
    tree: &DirTree,
    id: DirId,
    timestamp: RecordTimestamp,
) -> Result<[u8; SECTOR_SIZE]> {
    let dir = tree.dir(id);
    let parent = tree.dir(dir.parent().unwrap_or(id));

    let mut records = Vec::new();
    records.push(record(
        dir.block(),
        SECTOR_SIZE as u32,
        FLAG_DIRECTORY,
        Identifier::Special(SELF_IDENTIFIER),
        timestamp,
    ));
    records.push(record(
        parent.block(),
        SECTOR_SIZE as u32,
        FLAG_DIRECTORY,
        Identifier::Special(PARENT_IDENTIFIER),
        timestamp,
    ));
    for &child in dir.subdirs() {
        let child = tree.dir(child);
        records.push(record(
            child.block(),
            SECTOR_SIZE as u32,
            FLAG_DIRECTORY,
            Identifier::Name(child.identifier()),
            timestamp,
        ));
    }
    for file in dir.files() {
        records.push(file_record(file, timestamp)?);
    }

    let total: usize = records.iter().map(Vec::len).sum();
    if total > SECTOR_SIZE {
        return Err(ImageError::SectorOverflow {
            path: dir.abs_path().to_string(),
            len: total,
        });
    }

    let mut sector = [0u8; SECTOR_SIZE];
    let mut offset = 0;
    for rec in records {
        sector[offset..offset + rec.len()].copy_from_slice(&rec);
        offset += rec.len();
    }
    Ok(sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (DirTree, DirId) {
        let mut tree = DirTree::new(25);
        let a = tree.add_directory(tree.root(), "A", 26).unwrap();
        tree.add_file(a, "f", 27, 5000, "f.bin").unwrap();
        (tree, a)
    }

    #[test]
    fn record_length_is_self_describing_and_even() {
        let ts = RecordTimestamp::default();
        for name in ["A", "AB", "KERNEL.SYS"] {
            let rec = record(30, 1234, 0x00, Identifier::Name(name), ts);
            assert_eq!(rec[0] as usize, rec.len());
            assert_eq!(rec.len() % 2, 0);
        }
        let rec = record(30, 2048, FLAG_DIRECTORY, Identifier::Special(0), ts);
        assert_eq!(rec[0] as usize, rec.len());
        assert_eq!(rec.len(), ROOT_RECORD_LEN);
    }

    #[test]
    fn field_offsets_match_the_on_disc_layout() {
        let ts = RecordTimestamp::new(105, 6, 14, 12, 30, 45, 0);
        let rec = record(20, 5000, 0x00, Identifier::Name("f"), ts);
        assert_eq!(rec[1], 0);
        // starting block, mixed order
        assert_eq!(&rec[2..10], &[20, 0, 0, 0, 0, 0, 0, 20]);
        // data length, mixed order (5000 = 0x1388)
        assert_eq!(&rec[10..18], &[0x88, 0x13, 0, 0, 0, 0, 0x13, 0x88]);
        assert_eq!(&rec[18..25], &[105, 6, 14, 12, 30, 45, 0]);
        assert_eq!(rec[25], 0x00);
        assert_eq!(&rec[26..28], &[0, 0]);
        // volume sequence number 1, mixed order
        assert_eq!(&rec[28..32], &[1, 0, 0, 1]);
        assert_eq!(rec[32], 1);
        assert_eq!(rec[33], b'f');
    }

    #[test]
    fn sector_orders_self_parent_dirs_then_files() {
        let (tree, a) = sample_tree();
        let sector = directory_sector(&tree, a, RecordTimestamp::default()).unwrap();

        // self record: identifier byte 0x00, directory flag
        let self_len = sector[0] as usize;
        assert_eq!(sector[25], FLAG_DIRECTORY);
        assert_eq!(sector[32], 1);
        assert_eq!(sector[33], 0x00);

        // parent record references the root's block with identifier 0x01
        let parent = &sector[self_len..];
        assert_eq!(parent[2], 25);
        assert_eq!(parent[32], 1);
        assert_eq!(parent[33], 0x01);

        // file record follows
        let parent_len = parent[0] as usize;
        let file = &sector[self_len + parent_len..];
        assert_eq!(file[2], 27);
        assert_eq!(file[25], 0x00);
        assert_eq!(file[33], b'f');
    }

    #[test]
    fn root_parent_record_references_itself() {
        let (tree, _) = sample_tree();
        let sector = directory_sector(&tree, tree.root(), RecordTimestamp::default()).unwrap();
        let self_len = sector[0] as usize;
        let parent = &sector[self_len..];
        assert_eq!(parent[2], 25);
        assert_eq!(parent[33], 0x01);
    }

    #[test]
    fn embedded_root_record_is_34_bytes() {
        let (tree, _) = sample_tree();
        let rec = root_record(&tree, RecordTimestamp::default());
        assert_eq!(rec[0] as usize, ROOT_RECORD_LEN);
        assert_eq!(rec[25], FLAG_DIRECTORY);
        assert_eq!(rec[32], 1);
        assert_eq!(rec[33], 0x00);
    }

    #[test]
    fn overflowing_directory_is_rejected() {
        let mut tree = DirTree::new(25);
        let root = tree.root();
        // Each record is 32 + name + pad bytes; enough children overflow
        // the 2048-byte sector.
        for i in 0..50 {
            let name = format!("SUBDIRECTORY.{i:03}");
            tree.add_directory(root, &name, 30 + i).unwrap();
        }
        match directory_sector(&tree, root, RecordTimestamp::default()) {
            Err(ImageError::SectorOverflow { path, len }) => {
                assert_eq!(path, "\\");
                assert!(len > SECTOR_SIZE);
            }
            other => panic!("expected overflow, got {:?}", other.map(|_| ())),
        }
    }
}
