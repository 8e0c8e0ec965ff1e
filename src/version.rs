use crate::console::Console;
use crate::cursor::Endian;
use crate::error::{ChunkDecodeError, ChunkEncodeError};
use nbt::decode::read_compound_tag;
use nbt::encode::write_compound_tag;
use nbt::CompoundTag;
use std::io::Cursor;

/// Leading byte pair of a serialized compound tag root.
///
/// Payloads that open with it predate numeric version tags and are
/// treated as version 11. The pair never collides with a version code
/// in either byte order since code 10 was never shipped.
const COMPOUND_TAG_MARKER: [u8; 2] = [0x0A, 0x00];

/// Chunk format versions the dispatcher recognizes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChunkVersion {
    /// Legacy format, shares the structural codec with version 11.
    V8,
    /// Legacy format, shares the structural codec with version 11.
    V9,
    /// Canonical legacy format, also reached through the marker form.
    V11,
    /// Newer format carrying the submerged block array.
    V12,
    /// Recognized but unsupported: reading reports the version,
    /// encoding refuses outright.
    V13,
}

impl ChunkVersion {
    /// Numeric code stored in front of the chunk payload.
    pub fn code(self) -> u16 {
        match self {
            ChunkVersion::V8 => 8,
            ChunkVersion::V9 => 9,
            ChunkVersion::V11 => 11,
            ChunkVersion::V12 => 12,
            ChunkVersion::V13 => 13,
        }
    }

    pub fn from_code(code: u16) -> Option<ChunkVersion> {
        match code {
            8 => Some(ChunkVersion::V8),
            9 => Some(ChunkVersion::V9),
            11 => Some(ChunkVersion::V11),
            12 => Some(ChunkVersion::V12),
            13 => Some(ChunkVersion::V13),
            _ => None,
        }
    }
}

/// Decoded chunk record shared by every version codec.
///
/// The typed fields are convenience views decoded out of `structure`,
/// which stays the authoritative tag tree. Encoding writes the scalar
/// fields back into the tree before serializing, so coordinate and
/// timestamp edits round trip; edits to the array data go through
/// `structure` directly.
#[derive(Debug)]
pub struct ChunkData {
    pub version: ChunkVersion,
    pub x: i32,
    pub z: i32,
    pub last_update: i64,
    pub inhabited_time: i64,
    pub terrain_populated: i16,
    pub blocks: Vec<u16>,
    /// Present only for version 12 chunks of water heavy world
    /// variants.
    pub submerged: Option<Vec<u16>>,
    pub block_light: Vec<u8>,
    pub sky_light: Vec<u8>,
    pub height_map: Vec<u8>,
    pub biomes: Vec<u8>,
    /// Full structural tag tree of the chunk.
    pub structure: CompoundTag,
}

impl ChunkData {
    /// Creates an empty record for the given version and coordinates.
    pub fn new(version: ChunkVersion, x: i32, z: i32) -> ChunkData {
        ChunkData {
            version,
            x,
            z,
            last_update: 0,
            inhabited_time: 0,
            terrain_populated: 0,
            blocks: Vec::new(),
            submerged: None,
            block_light: Vec::new(),
            sky_light: Vec::new(),
            height_map: Vec::new(),
            biomes: Vec::new(),
            structure: CompoundTag::new(),
        }
    }
}

/// Structural codec family backing a chunk version.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ChunkCodec {
    /// Versions 8, 9 and 11.
    Legacy,
    /// Version 12.
    V12,
    /// Version 13 has no structural codec.
    V13Stub,
}

impl ChunkCodec {
    fn for_version(version: ChunkVersion) -> ChunkCodec {
        match version {
            ChunkVersion::V8 | ChunkVersion::V9 | ChunkVersion::V11 => ChunkCodec::Legacy,
            ChunkVersion::V12 => ChunkCodec::V12,
            ChunkVersion::V13 => ChunkCodec::V13Stub,
        }
    }

    fn decode(self, version: ChunkVersion, body: &[u8]) -> Result<ChunkData, ChunkDecodeError> {
        if let ChunkCodec::V13Stub = self {
            return Err(ChunkDecodeError::UnsupportedVersion {
                version: version.code(),
            });
        }

        let structure = read_compound_tag(&mut Cursor::new(body))?;

        let x = structure.get_i32("xPos").unwrap_or(0);
        let z = structure.get_i32("zPos").unwrap_or(0);
        let last_update = structure.get_i64("LastUpdate").unwrap_or(0);
        let inhabited_time = structure.get_i64("InhabitedTime").unwrap_or(0);
        let terrain_populated = structure.get_i16("TerrainPopulated").unwrap_or(0);

        let blocks = structure
            .get_i8_vec("Blocks")
            .map(|values| widen_u16(values))
            .unwrap_or_default();
        let block_light = structure
            .get_i8_vec("BlockLight")
            .map(|values| widen_u8(values))
            .unwrap_or_default();
        let sky_light = structure
            .get_i8_vec("SkyLight")
            .map(|values| widen_u8(values))
            .unwrap_or_default();
        let height_map = structure
            .get_i8_vec("HeightMap")
            .map(|values| widen_u8(values))
            .unwrap_or_default();
        let biomes = structure
            .get_i8_vec("Biomes")
            .map(|values| widen_u8(values))
            .unwrap_or_default();

        let submerged = if let ChunkCodec::V12 = self {
            structure
                .get_i8_vec("Submerged")
                .ok()
                .map(|values| widen_u16(values))
        } else {
            None
        };

        Ok(ChunkData {
            version,
            x,
            z,
            last_update,
            inhabited_time,
            terrain_populated,
            blocks,
            submerged,
            block_light,
            sky_light,
            height_map,
            biomes,
            structure,
        })
    }

    fn encode(self, chunk: ChunkData, endian: Endian) -> Result<Vec<u8>, ChunkEncodeError> {
        if let ChunkCodec::V13Stub = self {
            return Err(ChunkEncodeError::ForbiddenVersion {
                version: chunk.version.code(),
            });
        }

        let version_code = chunk.version.code();

        let mut structure = chunk.structure;
        structure.insert_i32("xPos", chunk.x);
        structure.insert_i32("zPos", chunk.z);
        structure.insert_i64("LastUpdate", chunk.last_update);
        structure.insert_i64("InhabitedTime", chunk.inhabited_time);
        structure.insert_i16("TerrainPopulated", chunk.terrain_populated);

        let mut encoded = vec![0u8; 2];
        endian.write_u16(&mut encoded, version_code);
        write_compound_tag(&mut encoded, structure)?;

        Ok(encoded)
    }
}

fn widen_u16(values: &[i8]) -> Vec<u16> {
    values.iter().map(|&value| value as u8 as u16).collect()
}

fn widen_u8(values: &[i8]) -> Vec<u8> {
    values.iter().map(|&value| value as u8).collect()
}

/// Decodes decompressed chunk bytes for the given platform.
///
/// The leading 16-bit version tag follows the platform byte order and
/// selects the structural codec; payloads opening with a bare compound
/// root dispatch as version 11 with the tree starting at offset zero.
pub fn decode_chunk(console: Console, bytes: &[u8]) -> Result<ChunkData, ChunkDecodeError> {
    if bytes.starts_with(&COMPOUND_TAG_MARKER) {
        return ChunkCodec::Legacy.decode(ChunkVersion::V11, bytes);
    }

    if 2 > bytes.len() {
        return Err(ChunkDecodeError::Truncated {
            length: bytes.len(),
        });
    }

    let tag = console.endian().read_u16(&bytes[..2]);
    let version = ChunkVersion::from_code(tag).ok_or(ChunkDecodeError::UnknownVersion { tag })?;

    ChunkCodec::for_version(version).decode(version, &bytes[2..])
}

/// Encodes a chunk record back to decompressed payload bytes.
///
/// The output always carries the numeric version tag, also for records
/// read from the marker form. Version 13 is refused before a single
/// byte is produced.
pub fn encode_chunk(console: Console, chunk: ChunkData) -> Result<Vec<u8>, ChunkEncodeError> {
    ChunkCodec::for_version(chunk.version).encode(chunk, console.endian())
}
