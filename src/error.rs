use crate::position::RegionChunkPosition;
use nbt::decode::TagDecodeError;
use std::{error::Error, fmt::Display, io};

/// Possible errors while accessing a byte buffer.
#[derive(Debug)]
pub enum CursorError {
    /// Tried to read more bytes than the buffer holds.
    UnexpectedEof {
        /// Buffer offset at which the read started.
        offset: usize,
        /// Amount of bytes the read required.
        need: usize,
        /// Amount of bytes left in the buffer.
        have: usize,
    },
    /// Tried to seek or write outside the buffer.
    OutOfBounds {
        /// Requested position.
        position: usize,
        /// Buffer length.
        length: usize,
    },
}

impl Error for CursorError {}

impl Display for CursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CursorError::*;
        match self {
            UnexpectedEof { offset, need, have } => write!(
                f,
                "Unexpected end of data at offset {}: need {} bytes, have {}",
                offset, need, have
            ),
            OutOfBounds { position, length } => {
                write!(f, "Position {} out of bounds (length {})", position, length)
            }
        }
    }
}

/// Possible errors while decoding a run-length layer.
#[derive(Debug)]
pub enum RleError {
    /// A run record was cut off by the end of input.
    ///
    /// This should not occur under normal conditions.
    ///
    /// The stored chunk payload is corrupted.
    TruncatedRun {
        /// Offset at which the missing run byte was expected.
        offset: usize,
    },
}

impl Error for RleError {}

impl Display for RleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RleError::TruncatedRun { offset } => {
                write!(f, "Truncated run record at offset {}", offset)
            }
        }
    }
}

/// Possible errors while running a platform codec over a chunk payload.
#[derive(Debug)]
pub enum CodecError {
    /// The platform decompressor rejected the stored payload.
    ///
    /// The stored chunk payload is corrupted or belongs to a different
    /// platform.
    Inflate { io_error: io::Error },
    /// The platform compressor failed.
    ///
    /// This should not occur under normal conditions.
    Deflate { io_error: io::Error },
    /// The run-length layer could not be decoded.
    Rle { rle_error: RleError },
    /// The LZX decoder rejected the stored payload.
    Lzx { detail: String },
}

impl From<RleError> for CodecError {
    fn from(rle_error: RleError) -> Self {
        CodecError::Rle { rle_error }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use CodecError::*;
        match self {
            Inflate { io_error } => Some(io_error),
            Deflate { io_error } => Some(io_error),
            Rle { rle_error } => Some(rle_error),
            Lzx { .. } => None,
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CodecError::*;
        match self {
            Inflate { .. } => write!(f, "Failed to decompress chunk payload"),
            Deflate { .. } => write!(f, "Failed to compress chunk payload"),
            Rle { .. } => write!(f, "Failed to decode run-length layer"),
            Lzx { detail } => write!(f, "Failed to decompress LZX payload: {}", detail),
        }
    }
}

/// Possible errors while reading a region container.
#[derive(Debug)]
pub enum RegionReadError {
    /// Container is shorter than the two header sectors.
    ///
    /// The container is truncated or not a region file at all.
    TruncatedHeader {
        /// Container length.
        length: usize,
    },
    /// A chunk record points past the end of the container.
    ///
    /// This should not occur under normal conditions.
    ///
    /// The container is corrupted.
    SectorRangeOutOfBounds {
        position: RegionChunkPosition,
        sector_offset: u32,
        sector_count: u8,
        /// Container length in bytes.
        container_length: usize,
    },
    /// A chunk record claims a sector already claimed by the header or
    /// another chunk.
    ///
    /// This should not occur under normal conditions.
    ///
    /// The container is corrupted.
    SectorOverlap {
        position: RegionChunkPosition,
        sector_index: usize,
    },
    /// A chunk record claims more payload bytes than its sectors hold.
    ///
    /// This should not occur under normal conditions.
    ///
    /// The container is corrupted.
    LengthExceedsMaximum {
        position: RegionChunkPosition,
        /// Stored payload length.
        length: u32,
        /// Maximum length the claimed sectors can hold.
        maximum_length: u32,
    },
    /// A chunk record was cut off by the end of the container.
    Cursor { cursor_error: CursorError },
}

impl From<CursorError> for RegionReadError {
    fn from(cursor_error: CursorError) -> Self {
        RegionReadError::Cursor { cursor_error }
    }
}

impl Error for RegionReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegionReadError::Cursor { cursor_error } => Some(cursor_error),
            _ => None,
        }
    }
}

impl Display for RegionReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RegionReadError::*;
        match self {
            TruncatedHeader { length } => {
                write!(f, "Container of {} bytes is shorter than the header", length)
            }
            SectorRangeOutOfBounds {
                position,
                sector_offset,
                sector_count,
                container_length,
            } => write!(
                f,
                "Chunk {}, {} sectors [{}, +{}] end outside the {} byte container",
                position.x, position.z, sector_offset, sector_count, container_length
            ),
            SectorOverlap {
                position,
                sector_index,
            } => write!(
                f,
                "Chunk {}, {} claims already used sector {}",
                position.x, position.z, sector_index
            ),
            LengthExceedsMaximum {
                position,
                length,
                maximum_length,
            } => write!(
                f,
                "Chunk {}, {} length of {} exceeds maximum ({})",
                position.x, position.z, length, maximum_length
            ),
            Cursor { .. } => write!(f, "Container data ended inside a chunk record"),
        }
    }
}

/// Possible errors while writing a region container.
#[derive(Debug)]
pub enum RegionWriteError {
    /// A stored chunk would not fit the 8-bit sector count field.
    ///
    /// This should not occur under normal conditions.
    LengthExceedsMaximum {
        position: RegionChunkPosition,
        /// Stored payload length.
        length: u32,
    },
    /// The platform codec failed while bringing a chunk to stored form.
    Codec {
        position: RegionChunkPosition,
        codec_error: CodecError,
    },
    /// The serialized container did not fit its computed sector layout.
    ///
    /// This should not occur under normal conditions.
    Cursor { cursor_error: CursorError },
}

impl From<CursorError> for RegionWriteError {
    fn from(cursor_error: CursorError) -> Self {
        RegionWriteError::Cursor { cursor_error }
    }
}

impl Error for RegionWriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use RegionWriteError::*;
        match self {
            Codec { codec_error, .. } => Some(codec_error),
            Cursor { cursor_error } => Some(cursor_error),
            _ => None,
        }
    }
}

impl Display for RegionWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RegionWriteError::*;
        match self {
            LengthExceedsMaximum { position, length } => write!(
                f,
                "Chunk {}, {} length of {} exceeds the sector count field",
                position.x, position.z, length
            ),
            Codec { position, .. } => {
                write!(f, "Failed to compress chunk {}, {}", position.x, position.z)
            }
            Cursor { .. } => write!(f, "Container layout overflow"),
        }
    }
}

/// Possible errors while decoding a chunk payload into chunk data.
#[derive(Debug)]
pub enum ChunkDecodeError {
    /// Payload is too short to hold a version tag.
    Truncated {
        /// Payload length.
        length: usize,
    },
    /// The version tag does not name any known chunk version.
    ///
    /// The payload is corrupted, still compressed, or the byte order
    /// does not match the platform.
    UnknownVersion {
        /// Version tag as read.
        tag: u16,
    },
    /// The version is recognized but has no decoder.
    UnsupportedVersion {
        /// Version code.
        version: u16,
    },
    /// Error while decoding binary data to an NBT tag.
    ///
    /// This should not occur under normal conditions.
    ///
    /// The payload is corrupted or a developer error in the NBT library.
    TagDecode { tag_decode_error: TagDecodeError },
}

impl From<TagDecodeError> for ChunkDecodeError {
    fn from(tag_decode_error: TagDecodeError) -> Self {
        ChunkDecodeError::TagDecode { tag_decode_error }
    }
}

// `TagDecodeError` is `Debug` only, so it cannot be a `source()`; the
// detail goes through `Display` instead.
impl Error for ChunkDecodeError {}

impl Display for ChunkDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ChunkDecodeError::*;
        match self {
            Truncated { length } => {
                write!(f, "Chunk payload of {} bytes has no version tag", length)
            }
            UnknownVersion { tag } => write!(f, "Unknown chunk version tag: {:#06x}", tag),
            UnsupportedVersion { version } => {
                write!(f, "Chunk version {} has no decoder", version)
            }
            TagDecode { tag_decode_error } => {
                write!(f, "Failed to decode nbt: {:?}", tag_decode_error)
            }
        }
    }
}

/// Possible errors while encoding chunk data into a chunk payload.
#[derive(Debug)]
pub enum ChunkEncodeError {
    /// The chunk version must not be written.
    ///
    /// Callers have to treat this as fatal for the conversion.
    ForbiddenVersion {
        /// Version code.
        version: u16,
    },
    /// I/O error while encoding the NBT tag.
    IOError { io_error: io::Error },
}

impl From<io::Error> for ChunkEncodeError {
    fn from(io_error: io::Error) -> Self {
        ChunkEncodeError::IOError { io_error }
    }
}

impl Error for ChunkEncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChunkEncodeError::IOError { io_error } => Some(io_error),
            _ => None,
        }
    }
}

impl Display for ChunkEncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ChunkEncodeError::*;
        match self {
            ForbiddenVersion { version } => {
                write!(f, "Chunk version {} must not be encoded", version)
            }
            IOError { .. } => write!(f, "IO Error"),
        }
    }
}

/// Possible errors while loading or saving region containers from a
/// save folder.
#[derive(Debug)]
pub enum ProviderError {
    /// I/O error while accessing a region container file.
    IOError { io_error: io::Error },
    /// The region container file could not be parsed.
    Read { read_error: RegionReadError },
    /// The region container could not be serialized.
    Write { write_error: RegionWriteError },
}

impl From<io::Error> for ProviderError {
    fn from(io_error: io::Error) -> Self {
        ProviderError::IOError { io_error }
    }
}

impl From<RegionReadError> for ProviderError {
    fn from(read_error: RegionReadError) -> Self {
        ProviderError::Read { read_error }
    }
}

impl From<RegionWriteError> for ProviderError {
    fn from(write_error: RegionWriteError) -> Self {
        ProviderError::Write { write_error }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use ProviderError::*;
        match self {
            IOError { io_error } => Some(io_error),
            Read { read_error } => Some(read_error),
            Write { write_error } => Some(write_error),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ProviderError::*;
        match self {
            IOError { .. } => write!(f, "IO Error"),
            Read { .. } => write!(f, "Failed to read region container"),
            Write { .. } => write!(f, "Failed to write region container"),
        }
    }
}
