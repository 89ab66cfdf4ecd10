// bootiso/src/iso/image.rs

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{ImageError, Phase, Result};
use crate::iso::SECTOR_SIZE;
use crate::iso::boot_catalog::{
    BootEntry, DEFAULT_BOOT_SECTOR_COUNT, DEFAULT_LOAD_SEGMENT, boot_catalog,
};
use crate::iso::dir_record::{directory_sector, root_record};
use crate::iso::fs_node::{DirId, DirTree, FileNode};
use crate::iso::path_table::{PathTable, TableType};
use crate::iso::record::RecordTimestamp;
use crate::iso::volume_descriptor::{
    boot_record_descriptor, primary_volume_descriptor, terminator_descriptor,
};

/// Fixed sector plan for every structure preceding the data area.
pub const PRIMARY_VOLUME_SECTOR: u32 = 16;
pub const BOOT_RECORD_SECTOR: u32 = 17;
pub const TERMINATOR_SECTOR: u32 = 18;
pub const BOOT_CATALOG_SECTOR: u32 = 19;
pub const BOOT_IMAGE_SECTOR: u32 = 20;
pub const PATH_TABLE_L_SECTOR: u32 = 21;
pub const PATH_TABLE_M_SECTOR: u32 = 22;

/// Default first block of the directory/file data area.
pub const DEFAULT_DATA_START_SECTOR: u32 = 25;

/// Number of boot-loader bytes copied verbatim into the boot sector.
pub const BOOT_LOADER_LEN: usize = 512;

/// Configuration for one image build.
#[derive(Clone, Debug)]
pub struct ImageOptions {
    /// 32-byte system identifier field of the primary volume descriptor.
    pub system_id: String,
    /// 32-byte volume identifier field.
    pub volume_id: String,
    pub publisher_id: String,
    pub preparer_id: String,
    /// Total image sector count written to the volume-space-size field.
    pub total_sectors: u32,
    /// Boot-loader binary; its first 512 bytes become the boot sector.
    pub boot_image: PathBuf,
    pub boot_load_segment: u16,
    /// Advertised load size in 512-byte units, at most 4.
    pub boot_sector_count: u16,
    /// Recording date stamped into every directory record.
    pub timestamp: RecordTimestamp,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            system_id: "BOOT DISK".to_string(),
            volume_id: "BOOTISO".to_string(),
            publisher_id: String::new(),
            preparer_id: String::new(),
            total_sectors: 0,
            boot_image: PathBuf::from("boot.bin"),
            boot_load_segment: DEFAULT_LOAD_SEGMENT,
            boot_sector_count: DEFAULT_BOOT_SECTOR_COUNT,
            timestamp: RecordTimestamp::default(),
        }
    }
}

/// Writes sector `sector_num` of `out`, zero-filling any gap between the
/// current end of the stream and the sector's offset first, so sectors can
/// be written out of numeric order without leaving holes.
pub fn write_sector<W: Write + Seek>(
    out: &mut W,
    sector_num: u32,
    data: &[u8; SECTOR_SIZE],
) -> io::Result<()> {
    let target = sector_num as u64 * SECTOR_SIZE as u64;
    let end = out.seek(SeekFrom::End(0))?;
    if end < target {
        io::copy(&mut io::repeat(0).take(target - end), out)?;
    }
    out.seek(SeekFrom::Start(target))?;
    out.write_all(data)
}

/// Assembles a bootable image from a directory tree into any seekable sink.
pub struct ImageWriter<'a> {
    opts: &'a ImageOptions,
}

impl<'a> ImageWriter<'a> {
    pub fn new(opts: &'a ImageOptions) -> Self {
        Self { opts }
    }

    /// Runs the full build sequence: path tables, volume descriptors, boot
    /// catalog, boot sector, then every directory record sector and file
    /// payload. Returns the final byte size of the image.
    pub fn write_to<W: Write + Seek>(&self, tree: &mut DirTree, out: &mut W) -> Result<u64> {
        check_assigned_blocks(tree, tree.root())?;

        let table = PathTable::new(tree)?;
        self.write_path_tables(tree, &table, out)?;
        self.write_descriptors(tree, &table, out)?;
        self.write_boot_catalog(out)?;
        self.write_boot_sector(out)?;
        self.write_tree(tree, tree.root(), out)?;

        out.seek(SeekFrom::End(0))
            .map_err(|e| ImageError::io(Phase::Output, e))
    }

    fn write_path_tables<W: Write + Seek>(
        &self,
        tree: &DirTree,
        table: &PathTable,
        out: &mut W,
    ) -> Result<()> {
        for (table_type, sector_num) in [
            (TableType::L, PATH_TABLE_L_SECTOR),
            (TableType::M, PATH_TABLE_M_SECTOR),
        ] {
            let bytes = table.to_bytes(tree, table_type);
            let mut sector = [0u8; SECTOR_SIZE];
            sector[..bytes.len()].copy_from_slice(&bytes);
            write_sector(out, sector_num, &sector)
                .map_err(|e| ImageError::io(Phase::PathTable, e))?;
        }
        Ok(())
    }

    fn write_descriptors<W: Write + Seek>(
        &self,
        tree: &DirTree,
        table: &PathTable,
        out: &mut W,
    ) -> Result<()> {
        let root = root_record(tree, self.opts.timestamp);
        let pvd = primary_volume_descriptor(self.opts, table.size() as u32, &root);
        write_sector(out, PRIMARY_VOLUME_SECTOR, &pvd)
            .map_err(|e| ImageError::io(Phase::VolumeDescriptors, e))?;

        let brvd = boot_record_descriptor(BOOT_CATALOG_SECTOR);
        write_sector(out, BOOT_RECORD_SECTOR, &brvd)
            .map_err(|e| ImageError::io(Phase::VolumeDescriptors, e))?;

        let term = terminator_descriptor();
        write_sector(out, TERMINATOR_SECTOR, &term)
            .map_err(|e| ImageError::io(Phase::VolumeDescriptors, e))
    }

    fn write_boot_catalog<W: Write + Seek>(&self, out: &mut W) -> Result<()> {
        let catalog = boot_catalog(&BootEntry {
            load_segment: self.opts.boot_load_segment,
            sector_count: self.opts.boot_sector_count,
            load_rba: BOOT_IMAGE_SECTOR,
        })?;
        write_sector(out, BOOT_CATALOG_SECTOR, &catalog)
            .map_err(|e| ImageError::io(Phase::BootCatalog, e))
    }

    /// Copies the boot loader's first 512 bytes verbatim into the boot
    /// sector; the rest of the sector stays zero.
    fn write_boot_sector<W: Write + Seek>(&self, out: &mut W) -> Result<()> {
        let boot_path = &self.opts.boot_image;
        let loader = File::open(boot_path)
            .map_err(|e| ImageError::io_at(Phase::BootSector, boot_path.clone(), e))?;

        let mut sector = [0u8; SECTOR_SIZE];
        let mut taken = loader.take(BOOT_LOADER_LEN as u64);
        let mut loaded = 0;
        loop {
            let n = taken
                .read(&mut sector[loaded..BOOT_LOADER_LEN])
                .map_err(|e| ImageError::io_at(Phase::BootSector, boot_path.clone(), e))?;
            if n == 0 {
                break;
            }
            loaded += n;
        }

        write_sector(out, BOOT_IMAGE_SECTOR, &sector)
            .map_err(|e| ImageError::io(Phase::BootSector, e))
    }

    /// Depth-first walk: a directory's record sector, its child subtrees,
    /// then its files' data sectors.
    fn write_tree<W: Write + Seek>(&self, tree: &DirTree, id: DirId, out: &mut W) -> Result<()> {
        let sector = directory_sector(tree, id, self.opts.timestamp)?;
        write_sector(out, tree.dir(id).block(), &sector)
            .map_err(|e| ImageError::io(Phase::DirectoryRecords, e))?;

        for &child in tree.dir(id).subdirs() {
            self.write_tree(tree, child, out)?;
        }

        for file in tree.dir(id).files() {
            let source = File::open(file.source())
                .map_err(|e| ImageError::io_at(Phase::FileData, file.source(), e))?;
            self.write_file_data(file, source, out)?;
        }
        Ok(())
    }

    /// Streams file bytes sector by sector. The node's recorded byte
    /// length is authoritative: at most that many bytes are read from the
    /// source, and everything past them up to the sector boundary stays
    /// zero, even if the host file has grown since the tree was built.
    fn write_file_data<W: Write + Seek>(
        &self,
        file: &FileNode,
        mut source: File,
        out: &mut W,
    ) -> Result<()> {
        let mut remaining = file.size();
        for i in 0..file.sectors() {
            let mut sector = [0u8; SECTOR_SIZE];
            let want = remaining.min(SECTOR_SIZE as u64) as usize;
            let mut filled = 0;
            while filled < want {
                let n = source
                    .read(&mut sector[filled..want])
                    .map_err(|e| ImageError::io_at(Phase::FileData, file.source(), e))?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            remaining -= filled as u64;
            write_sector(out, file.block() + i, &sector)
                .map_err(|e| ImageError::io(Phase::FileData, e))?;
        }
        Ok(())
    }
}

/// Rejects any tree node whose block still lies at or below the fixed
/// structure sectors, before a single sector is written. Directories left
/// at their construction-time block 0 would otherwise land on top of the
/// volume descriptors.
fn check_assigned_blocks(tree: &DirTree, id: DirId) -> Result<()> {
    let dir = tree.dir(id);
    if dir.block() <= PATH_TABLE_M_SECTOR {
        return Err(ImageError::UnassignedBlock {
            path: dir.abs_path().to_string(),
            block: dir.block(),
        });
    }
    for file in dir.files() {
        if file.block() <= PATH_TABLE_M_SECTOR {
            return Err(ImageError::UnassignedBlock {
                path: file.abs_path().to_string(),
                block: file.block(),
            });
        }
    }
    for &child in dir.subdirs() {
        check_assigned_blocks(tree, child)?;
    }
    Ok(())
}

/// Builds a bootable image file at `image_path` from the tree.
///
/// Every node must already carry its assigned block (see
/// [`DirTree::assign_blocks`]). Returns the final image size in bytes,
/// always a multiple of 2048.
pub fn build_image(tree: &mut DirTree, opts: &ImageOptions, image_path: &Path) -> Result<u64> {
    let mut out = File::create(image_path)
        .map_err(|e| ImageError::io_at(Phase::Output, image_path, e))?;

    let size = ImageWriter::new(opts).write_to(tree, &mut out)?;
    println!(
        "build_image: wrote {} ({} bytes, {} sectors)",
        image_path.display(),
        size,
        size / SECTOR_SIZE as u64
    );
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn out_of_order_sector_writes_fill_gaps_with_zeros() {
        let mut out = Cursor::new(Vec::new());
        let five = [5u8; SECTOR_SIZE];
        let two = [2u8; SECTOR_SIZE];

        write_sector(&mut out, 5, &five).unwrap();
        write_sector(&mut out, 2, &two).unwrap();

        let image = out.into_inner();
        assert_eq!(image.len(), 6 * SECTOR_SIZE);
        assert!(image[..2 * SECTOR_SIZE].iter().all(|&b| b == 0));
        assert!(image[2 * SECTOR_SIZE..3 * SECTOR_SIZE].iter().all(|&b| b == 2));
        assert!(image[3 * SECTOR_SIZE..5 * SECTOR_SIZE].iter().all(|&b| b == 0));
        assert!(image[5 * SECTOR_SIZE..].iter().all(|&b| b == 5));
    }

    #[test]
    fn unassigned_tree_is_rejected_before_anything_is_written() {
        let mut tree = DirTree::new(0);
        let opts = ImageOptions::default();
        let mut out = Cursor::new(Vec::new());

        let err = ImageWriter::new(&opts)
            .write_to(&mut tree, &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            ImageError::UnassignedBlock { block: 0, .. }
        ));
        assert!(out.into_inner().is_empty());
    }

    #[test]
    fn rewriting_a_sector_does_not_extend_the_stream() {
        let mut out = Cursor::new(Vec::new());
        let data = [7u8; SECTOR_SIZE];
        write_sector(&mut out, 3, &data).unwrap();
        write_sector(&mut out, 0, &data).unwrap();
        assert_eq!(out.into_inner().len(), 4 * SECTOR_SIZE);
    }
}
