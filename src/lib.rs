//! Build bootable ISO9660 disc images with an El Torito boot catalog.
//!
//! The caller assembles a [`DirTree`], assigns sector numbers to every
//! node, and hands the tree to [`build_image`]:
//!
//! ```no_run
//! use bootiso::{DEFAULT_DATA_START_SECTOR, DirTree, ImageOptions, build_image};
//! use std::path::Path;
//!
//! # fn main() -> bootiso::Result<()> {
//! let mut tree = DirTree::new(0);
//! let boot = tree.root();
//! tree.add_file_from(boot, "KERNEL.SYS", "cd_root/KERNEL.SYS")?;
//! let total = tree.assign_blocks(DEFAULT_DATA_START_SECTOR)?;
//!
//! let opts = ImageOptions {
//!     total_sectors: total,
//!     boot_image: "boot.bin".into(),
//!     ..ImageOptions::default()
//! };
//! build_image(&mut tree, &opts, Path::new("boot.iso"))?;
//! # Ok(())
//! # }
//! ```

pub mod endian;
pub mod error;
pub mod iso;

pub use crate::endian::ByteOrder;
pub use crate::error::{ImageError, Phase, Result};
pub use crate::iso::SECTOR_SIZE;
pub use crate::iso::fs_node::{DirId, DirTree, Directory, FileNode};
pub use crate::iso::image::{DEFAULT_DATA_START_SECTOR, ImageOptions, ImageWriter, build_image};
pub use crate::iso::path_table::{PathTable, TableType};
pub use crate::iso::record::RecordTimestamp;
