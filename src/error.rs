// bootiso/src/error.rs
//! Error types for image building.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for image-building operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// The build phase an I/O failure occurred in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Writing a path table sector.
    PathTable,
    /// Writing a volume descriptor sector.
    VolumeDescriptors,
    /// Writing the El Torito boot catalog.
    BootCatalog,
    /// Reading or writing the boot-loader sector.
    BootSector,
    /// Writing a directory record sector.
    DirectoryRecords,
    /// Reading or writing file payload sectors.
    FileData,
    /// Creating or finalizing the output image.
    Output,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::PathTable => "path table",
            Phase::VolumeDescriptors => "volume descriptors",
            Phase::BootCatalog => "boot catalog",
            Phase::BootSector => "boot sector",
            Phase::DirectoryRecords => "directory records",
            Phase::FileData => "file data",
            Phase::Output => "output image",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while building an image.
#[derive(Debug)]
pub enum ImageError {
    /// Serialized content for one structure exceeds a single 2048-byte sector.
    SectorOverflow {
        /// Absolute path of the directory (or `"\"`-rooted structure) at fault.
        path: String,
        /// Serialized length in bytes.
        len: usize,
    },

    /// An identifier is empty, too long, or contains the path separator.
    InvalidIdentifier {
        /// The offending identifier.
        name: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// The data start block would overlap the fixed structure sectors.
    DataStartTooLow {
        /// The rejected block number.
        block: u32,
    },

    /// The boot catalog advertises more 512-byte sectors than the single
    /// reserved boot sector can hold.
    BootSpanTooLarge {
        /// Advertised sector count.
        sectors: u16,
    },

    /// A file's byte length does not fit the 32-bit data-length field.
    FileTooLarge {
        /// Absolute path of the file inside the image.
        path: String,
    },

    /// A tree node's block was never assigned past the fixed structure
    /// sectors, so writing it would overwrite them.
    UnassignedBlock {
        /// Absolute path of the offending node.
        path: String,
        /// The block the node carries.
        block: u32,
    },

    /// An I/O operation failed.
    Io {
        /// Which build phase failed.
        phase: Phase,
        /// The file involved, when there is one beyond the output sink.
        path: Option<PathBuf>,
        /// The underlying error.
        source: io::Error,
    },
}

impl ImageError {
    pub(crate) fn io(phase: Phase, source: io::Error) -> Self {
        ImageError::Io {
            phase,
            path: None,
            source,
        }
    }

    pub(crate) fn io_at(phase: Phase, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ImageError::Io {
            phase,
            path: Some(path.into()),
            source,
        }
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::SectorOverflow { path, len } => write!(
                f,
                "serialized content for {path} is {len} bytes, which exceeds one 2048-byte sector"
            ),
            ImageError::InvalidIdentifier { name, reason } => {
                write!(f, "invalid identifier {name:?}: {reason}")
            }
            ImageError::DataStartTooLow { block } => write!(
                f,
                "data start block {block} overlaps the fixed structure sectors (must be >= 23)"
            ),
            ImageError::BootSpanTooLarge { sectors } => write!(
                f,
                "boot catalog sector count {sectors} exceeds the reserved boot sector (max 4)"
            ),
            ImageError::FileTooLarge { path } => write!(
                f,
                "file {path} is too large for the 32-bit data-length field"
            ),
            ImageError::UnassignedBlock { path, block } => write!(
                f,
                "node {path} has block {block}, which lies inside the fixed structure sectors; \
                 assign blocks past sector 22 first"
            ),
            ImageError::Io {
                phase,
                path: Some(path),
                source,
            } => write!(f, "{phase}: {}: {source}", path.display()),
            ImageError::Io {
                phase,
                path: None,
                source,
            } => write!(f, "{phase}: {source}"),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
