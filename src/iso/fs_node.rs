// bootiso/src/iso/fs_node.rs

use std::path::{Path, PathBuf};

use crate::error::{ImageError, Phase, Result};
use crate::iso::SECTOR_SIZE;
use crate::iso::image::PATH_TABLE_M_SECTOR;

/// Identifier of the root directory.
pub const ROOT_IDENTIFIER: &str = "\\";

/// Separator used in absolute paths inside the image tree.
const SEPARATOR: char = '\\';

/// ISO9660 directory identifiers are limited to 31 bytes.
const MAX_IDENTIFIER_LEN: usize = 31;

/// Handle to a directory inside a [`DirTree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirId(usize);

/// A file entry: identifier, placement, and the host file its bytes are
/// streamed from when the image is written.
#[derive(Clone, Debug)]
pub struct FileNode {
    identifier: String,
    abs_path: String,
    block: u32,
    size: u64,
    source: PathBuf,
}

impl FileNode {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn abs_path(&self) -> &str {
        &self.abs_path
    }

    /// Starting sector of the file data.
    pub fn block(&self) -> u32 {
        self.block
    }

    /// Byte length of the file data.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of 2048-byte sectors the file data occupies.
    pub fn sectors(&self) -> u32 {
        self.size.div_ceil(SECTOR_SIZE as u64) as u32
    }
}

/// A directory entry. Children are owned in insertion order; the parent
/// link is a non-owning arena index.
#[derive(Debug)]
pub struct Directory {
    identifier: String,
    abs_path: String,
    block: u32,
    parent: Option<DirId>,
    path_index: Option<u16>,
    subdirs: Vec<DirId>,
    files: Vec<FileNode>,
}

impl Directory {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn abs_path(&self) -> &str {
        &self.abs_path
    }

    /// Sector where this directory's record sector lives.
    pub fn block(&self) -> u32 {
        self.block
    }

    pub fn parent(&self) -> Option<DirId> {
        self.parent
    }

    /// 1-based path table index, stamped during path table construction.
    pub fn path_index(&self) -> Option<u16> {
        self.path_index
    }

    pub fn subdirs(&self) -> &[DirId] {
        &self.subdirs
    }

    pub fn files(&self) -> &[FileNode] {
        &self.files
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_path_index(&mut self, index: u16) {
        debug_assert!(self.path_index.is_none(), "path index stamped twice");
        self.path_index = Some(index);
    }
}

/// The directory/file tree an image is built from.
///
/// The tree is arena-backed: directories live in one `Vec`, children refer
/// to each other by [`DirId`], so parent back-references need no shared
/// ownership. Construction always starts from the single root.
pub struct DirTree {
    dirs: Vec<Directory>,
}

impl DirTree {
    /// Creates a tree containing only the root directory at `root_block`.
    pub fn new(root_block: u32) -> Self {
        Self {
            dirs: vec![Directory {
                identifier: ROOT_IDENTIFIER.to_string(),
                abs_path: ROOT_IDENTIFIER.to_string(),
                block: root_block,
                parent: None,
                path_index: None,
                subdirs: Vec::new(),
                files: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> DirId {
        DirId(0)
    }

    pub fn dir(&self, id: DirId) -> &Directory {
        &self.dirs[id.0]
    }

    pub(crate) fn dir_mut(&mut self, id: DirId) -> &mut Directory {
        &mut self.dirs[id.0]
    }

    /// Number of directories in the tree.
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    /// Adds a child directory whose record sector lives at `block`.
    pub fn add_directory(&mut self, parent: DirId, name: &str, block: u32) -> Result<DirId> {
        validate_identifier(name)?;
        let mut abs_path = self.dirs[parent.0].abs_path.clone();
        abs_path.push_str(name);
        abs_path.push(SEPARATOR);

        let id = DirId(self.dirs.len());
        self.dirs.push(Directory {
            identifier: name.to_string(),
            abs_path,
            block,
            parent: Some(parent),
            path_index: None,
            subdirs: Vec::new(),
            files: Vec::new(),
        });
        self.dirs[parent.0].subdirs.push(id);
        Ok(id)
    }

    /// Adds a file of `size` bytes starting at `block`, read from `source`
    /// when the image is written.
    pub fn add_file(
        &mut self,
        parent: DirId,
        name: &str,
        block: u32,
        size: u64,
        source: impl Into<PathBuf>,
    ) -> Result<()> {
        validate_identifier(name)?;
        let mut abs_path = self.dirs[parent.0].abs_path.clone();
        abs_path.push_str(name);

        self.dirs[parent.0].files.push(FileNode {
            identifier: name.to_string(),
            abs_path,
            block,
            size,
            source: source.into(),
        });
        Ok(())
    }

    /// Adds a file sized from the host file's metadata. The block is
    /// expected to be assigned afterwards through [`DirTree::assign_blocks`].
    pub fn add_file_from(
        &mut self,
        parent: DirId,
        name: &str,
        source: impl Into<PathBuf>,
    ) -> Result<()> {
        let source = source.into();
        let size = std::fs::metadata(&source)
            .map_err(|e| ImageError::io_at(Phase::FileData, source.clone(), e))?
            .len();
        self.add_file(parent, name, 0, size, source)
    }

    /// Assigns ascending blocks to every node in pre-order: a directory
    /// takes one sector for its record sector, then its files take
    /// `ceil(len / 2048)` sectors each, then each child subtree follows.
    ///
    /// `data_start` must leave the fixed structure sectors untouched.
    /// Returns the first unused block.
    pub fn assign_blocks(&mut self, data_start: u32) -> Result<u32> {
        if data_start <= PATH_TABLE_M_SECTOR {
            return Err(ImageError::DataStartTooLow { block: data_start });
        }
        let mut next = data_start;
        self.assign_blocks_inner(self.root(), &mut next);
        Ok(next)
    }

    fn assign_blocks_inner(&mut self, id: DirId, next: &mut u32) {
        self.dirs[id.0].block = *next;
        *next += 1;
        for file in &mut self.dirs[id.0].files {
            file.block = *next;
            *next += file.sectors();
        }
        let subdirs = self.dirs[id.0].subdirs.clone();
        for child in subdirs {
            self.assign_blocks_inner(child, next);
        }
    }
}

fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ImageError::InvalidIdentifier {
            name: name.to_string(),
            reason: "identifier is empty",
        });
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(ImageError::InvalidIdentifier {
            name: name.to_string(),
            reason: "identifier exceeds 31 bytes",
        });
    }
    if name.contains(SEPARATOR) {
        return Err(ImageError::InvalidIdentifier {
            name: name.to_string(),
            reason: "identifier contains the path separator",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_concatenate_ancestors() {
        let mut tree = DirTree::new(25);
        let a = tree.add_directory(tree.root(), "A", 26).unwrap();
        tree.add_file(a, "f", 27, 5000, "f.bin").unwrap();

        assert_eq!(tree.dir(tree.root()).abs_path(), "\\");
        assert_eq!(tree.dir(a).abs_path(), "\\A\\");
        assert_eq!(tree.dir(a).files()[0].abs_path(), "\\A\\f");
        assert_eq!(tree.dir(a).parent(), Some(tree.root()));
    }

    #[test]
    fn identifier_validation() {
        let mut tree = DirTree::new(25);
        let root = tree.root();
        assert!(matches!(
            tree.add_directory(root, "", 26),
            Err(ImageError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            tree.add_directory(root, "A\\B", 26),
            Err(ImageError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            tree.add_file(root, &"x".repeat(32), 26, 0, "x"),
            Err(ImageError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn assign_blocks_is_preorder_and_ascending() {
        let mut tree = DirTree::new(0);
        let root = tree.root();
        let a = tree.add_directory(root, "A", 0).unwrap();
        tree.add_file(a, "f", 0, 5000, "f.bin").unwrap();
        let b = tree.add_directory(root, "B", 0).unwrap();

        let next = tree.assign_blocks(25).unwrap();
        assert_eq!(tree.dir(root).block(), 25);
        assert_eq!(tree.dir(a).block(), 26);
        // 5000 bytes -> 3 sectors
        assert_eq!(tree.dir(a).files()[0].block(), 27);
        assert_eq!(tree.dir(a).files()[0].sectors(), 3);
        assert_eq!(tree.dir(b).block(), 30);
        assert_eq!(next, 31);
    }

    #[test]
    fn data_start_below_fixed_sectors_is_rejected() {
        let mut tree = DirTree::new(0);
        assert!(matches!(
            tree.assign_blocks(22),
            Err(ImageError::DataStartTooLow { block: 22 })
        ));
    }
}
