// bootiso/src/iso/path_table.rs

use crate::endian::ByteOrder;
use crate::error::{ImageError, Result};
use crate::iso::SECTOR_SIZE;
use crate::iso::fs_node::{DirId, DirTree};

/// The two on-disc path table variants. They hold identical entries;
/// only the multi-byte numeric fields differ in orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableType {
    /// Least-significant-byte-first numeric fields.
    L,
    /// Most-significant-byte-first numeric fields.
    M,
}

impl TableType {
    fn byte_order(self) -> ByteOrder {
        match self {
            TableType::L => ByteOrder::Least,
            TableType::M => ByteOrder::Most,
        }
    }
}

/// Ordered list of every directory in the tree, renderable as either
/// path table variant.
///
/// Directories are listed depth-first pre-order: a directory's whole
/// subtree precedes its next sibling. Strict ISO9660 orders the table by
/// depth level instead; this builder reproduces the depth-first layout
/// of the writer it models. Construction stamps each directory's 1-based
/// table index, which child entries reference as their parent number.
pub struct PathTable {
    order: Vec<DirId>,
    size: usize,
}

impl PathTable {
    pub fn new(tree: &mut DirTree) -> Result<Self> {
        let mut order = Vec::with_capacity(tree.dir_count());
        collect(tree, tree.root(), &mut order);
        for (i, &id) in order.iter().enumerate() {
            tree.dir_mut(id).set_path_index((i + 1) as u16);
        }

        let size = order.iter().map(|&id| entry_len(tree, id)).sum();
        if size > SECTOR_SIZE {
            return Err(ImageError::SectorOverflow {
                path: "path table".to_string(),
                len: size,
            });
        }
        Ok(Self { order, size })
    }

    /// Total byte size of the rendered table. Identical for both variants.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of table entries.
    pub fn entry_count(&self) -> usize {
        self.order.len()
    }

    /// Renders the table in the given variant.
    pub fn to_bytes(&self, tree: &DirTree, table_type: TableType) -> Vec<u8> {
        let order = table_type.byte_order();
        let mut bytes = Vec::with_capacity(self.size);

        for &id in &self.order {
            let dir = tree.dir(id);
            let id_len = dir.identifier().len();

            bytes.push(id_len as u8);
            bytes.push(0); // extended attribute length
            bytes.extend_from_slice(&order.encode_u32(dir.block()));

            let parent_index = match dir.parent() {
                // Parent indices were stamped in pre-order, so a parent is
                // always visited before its children.
                Some(parent) => tree.dir(parent).path_index().unwrap_or(1),
                None => 1,
            };
            bytes.extend_from_slice(&order.encode_u16(parent_index));

            if dir.is_root() {
                bytes.push(0);
            } else {
                bytes.extend_from_slice(dir.identifier().as_bytes());
            }
            if id_len % 2 != 0 {
                bytes.push(0);
            }
        }
        bytes
    }
}

fn collect(tree: &DirTree, id: DirId, order: &mut Vec<DirId>) {
    order.push(id);
    for &child in tree.dir(id).subdirs() {
        collect(tree, child, order);
    }
}

fn entry_len(tree: &DirTree, id: DirId) -> usize {
    let id_len = tree.dir(id).identifier().len();
    let mut len = 1 + 1 + 4 + 2 + id_len;
    if id_len % 2 != 0 {
        len += 1;
    }
    len
}
