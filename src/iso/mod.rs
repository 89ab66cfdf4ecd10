// bootiso/src/iso/mod.rs
pub mod boot_catalog;
pub mod dir_record;
pub mod fs_node;
pub mod image;
pub mod path_table;
pub mod record;
pub mod volume_descriptor;

/// Size of one disc sector/logical block in bytes.
pub const SECTOR_SIZE: usize = 2048;
