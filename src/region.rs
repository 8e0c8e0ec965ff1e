use crate::chunk::ChunkSlot;
use crate::console::Console;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{RegionReadError, RegionWriteError};
use crate::position::RegionChunkPosition;
use bitvec::prelude::*;
use log::debug;

/// Amount of chunk slots in a region container.
const REGION_CHUNKS: usize = 1024;
/// Amount of 32-bit words in the two header tables.
const REGION_HEADER_WORDS_LENGTH: usize = 2 * REGION_CHUNKS;
/// Region sector length in bytes.
const REGION_SECTOR_BYTES_LENGTH: usize = 4096;
/// Region header length in bytes: the offset table and timestamp table.
const REGION_HEADER_BYTES_LENGTH: usize = 2 * REGION_SECTOR_BYTES_LENGTH;
/// Maximum sectors a single chunk record can claim in its 8-bit field.
const CHUNK_MAXIMUM_SECTORS: usize = 255;

/// Region container: a 32x32 group of chunk slots on a sector grid.
///
/// The first two sectors hold an offset table and a timestamp table of
/// 1024 entries each; chunk records start at sector 2. All integer
/// fields follow the byte order of the configured [`Console`].
pub struct RegionContainer {
    /// Platform whose conventions the stored chunks follow.
    console: Console,
    /// Chunk slots in slot index order.
    slots: Vec<ChunkSlot>,
}

impl RegionContainer {
    /// Creates an empty container with the given platform conventions.
    pub fn new(console: Console) -> RegionContainer {
        let slots = vec![ChunkSlot::default(); REGION_CHUNKS];

        RegionContainer { console, slots }
    }

    pub fn console(&self) -> Console {
        self.console
    }

    pub fn chunk(&self, position: RegionChunkPosition) -> &ChunkSlot {
        &self.slots[position.slot_index()]
    }

    pub fn chunk_mut(&mut self, position: RegionChunkPosition) -> &mut ChunkSlot {
        &mut self.slots[position.slot_index()]
    }

    /// Iterates present chunk slots in slot index order.
    pub fn present_chunks(&self) -> impl Iterator<Item = (RegionChunkPosition, &ChunkSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_present())
            .map(|(index, slot)| (RegionChunkPosition::from_slot_index(index), slot))
    }

    /// Parses a container, keeping every chunk in its stored form.
    ///
    /// Fails on the first record whose sectors fall outside the
    /// container, overlap the header or another record, or claim more
    /// payload than their sectors hold. Nothing is recovered from a
    /// container that fails here.
    pub fn read(console: Console, bytes: &[u8]) -> Result<RegionContainer, RegionReadError> {
        if REGION_HEADER_BYTES_LENGTH > bytes.len() {
            return Err(RegionReadError::TruncatedHeader {
                length: bytes.len(),
            });
        }

        let mut reader = ByteReader::new(bytes, console.endian());

        let mut header = [0u32; REGION_HEADER_WORDS_LENGTH];
        for value in header.iter_mut() {
            *value = reader.read_u32()?;
        }

        // Sectors 0 and 1 hold the two header tables.
        let total_sectors =
            (bytes.len() + REGION_SECTOR_BYTES_LENGTH - 1) / REGION_SECTOR_BYTES_LENGTH;
        let mut used_sectors = bitvec![0; total_sectors];
        used_sectors.set(0, true);
        used_sectors.set(1, true);

        let mut slots = vec![ChunkSlot::default(); REGION_CHUNKS];
        let mut present = 0;

        for (index, slot) in slots.iter_mut().enumerate() {
            let offset_word = header[index];
            let sector_offset = offset_word >> 8;
            let sector_count = (offset_word & 0xFF) as u8;

            if sector_count == 0 {
                continue;
            }

            let position = RegionChunkPosition::from_slot_index(index);
            let start_byte = sector_offset as u64 * REGION_SECTOR_BYTES_LENGTH as u64;
            let end_byte =
                start_byte + sector_count as u64 * REGION_SECTOR_BYTES_LENGTH as u64;

            if end_byte > bytes.len() as u64 {
                return Err(RegionReadError::SectorRangeOutOfBounds {
                    position,
                    sector_offset,
                    sector_count,
                    container_length: bytes.len(),
                });
            }

            let start_sector = sector_offset as usize;
            for sector_index in start_sector..start_sector + sector_count as usize {
                if used_sectors[sector_index] {
                    return Err(RegionReadError::SectorOverlap {
                        position,
                        sector_index,
                    });
                }

                used_sectors.set(sector_index, true);
            }

            reader.seek(start_byte as usize)?;

            let length_word = reader.read_u32()?;
            let rle = length_word >> 31 != 0;
            let length = length_word & 0x3FFF_FFFF;

            let maximum_length = sector_count as u32 * REGION_SECTOR_BYTES_LENGTH as u32
                - console.chunk_header_length() as u32;

            if length > maximum_length {
                return Err(RegionReadError::LengthExceedsMaximum {
                    position,
                    length,
                    maximum_length,
                });
            }

            let decompressed_length = reader.read_u32()?;
            // The PS3 family repeats the decompressed length word.
            for _ in 1..console.decompressed_length_words() {
                reader.read_u32()?;
            }

            let payload = reader.read_exact(length as usize)?.to_vec();

            *slot = ChunkSlot::new_stored(
                payload,
                decompressed_length,
                header[REGION_CHUNKS + index],
                rle,
                sector_count,
                sector_offset,
            );
            present += 1;
        }

        debug!(
            target: "lce-region",
            "Read container with {} present chunks out of {} sectors",
            present,
            total_sectors
        );

        Ok(RegionContainer { console, slots })
    }

    /// Serializes the container for the target platform.
    ///
    /// Every present chunk is first brought to the target platform's
    /// stored form; chunks still stored for a different source platform
    /// are re-encoded through their decompressed form. On success the
    /// container's configured platform becomes `target`.
    pub fn write(&mut self, target: Console) -> Result<Vec<u8>, RegionWriteError> {
        let source = self.console;
        let header_length = target.chunk_header_length();

        // Sectors 0 and 1 hold the two header tables.
        let mut next_sector = 2usize;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_present() {
                continue;
            }

            let position = RegionChunkPosition::from_slot_index(index);

            if source != target {
                slot.ensure_decompressed(source).map_err(|codec_error| {
                    RegionWriteError::Codec {
                        position,
                        codec_error,
                    }
                })?;
            }

            slot.ensure_compressed(target).map_err(|codec_error| {
                RegionWriteError::Codec {
                    position,
                    codec_error,
                }
            })?;

            let length = slot.payload().len();
            let sectors = (length + header_length + REGION_SECTOR_BYTES_LENGTH - 1)
                / REGION_SECTOR_BYTES_LENGTH
                + 1;

            if sectors > CHUNK_MAXIMUM_SECTORS {
                return Err(RegionWriteError::LengthExceedsMaximum {
                    position,
                    length: length as u32,
                });
            }

            debug!(
                target: "lce-region",
                "Chunk x: {}, z: {} stored length {} placed at sectors {}..{}",
                position.x,
                position.z,
                length,
                next_sector,
                next_sector + sectors
            );

            slot.set_sector_place(next_sector as u32, sectors as u8);
            next_sector += sectors;
        }

        let mut writer =
            ByteWriter::with_length(next_sector * REGION_SECTOR_BYTES_LENGTH, target.endian());

        for slot in self.slots.iter() {
            let offset_word = if slot.is_present() {
                (slot.sector_offset() << 8) | slot.sector_count() as u32
            } else {
                0
            };

            writer.write_u32(offset_word)?;
        }

        for slot in self.slots.iter() {
            writer.write_u32(slot.timestamp())?;
        }

        for slot in self.slots.iter().filter(|slot| slot.is_present()) {
            writer.seek(slot.sector_offset() as usize * REGION_SECTOR_BYTES_LENGTH)?;

            let length = slot.payload().len() as u32;
            let length_word = if slot.has_rle_layer() {
                (length & 0x00FF_FFFF) | (0xC0 << 24)
            } else {
                length
            };

            writer.write_u32(length_word)?;
            for _ in 0..target.decompressed_length_words() {
                writer.write_u32(slot.decompressed_length())?;
            }
            writer.write_all(slot.payload())?;
        }

        self.console = target;

        Ok(writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use crate::console::Console;
    use crate::error::{RegionReadError, RegionWriteError};
    use crate::position::RegionChunkPosition;
    use crate::region::{
        RegionContainer, REGION_HEADER_BYTES_LENGTH, REGION_SECTOR_BYTES_LENGTH,
    };
    use byteorder::{BigEndian, ByteOrder};

    fn sample(length: usize) -> Vec<u8> {
        (0..length)
            .map(|i| if i % 13 == 0 { 255 } else { (i % 17) as u8 })
            .collect()
    }

    fn raw_container(total_sectors: usize) -> Vec<u8> {
        vec![0u8; total_sectors * REGION_SECTOR_BYTES_LENGTH]
    }

    fn set_place(bytes: &mut [u8], slot_index: usize, sector_offset: u32, sector_count: u8) {
        let offset_word = (sector_offset << 8) | sector_count as u32;
        BigEndian::write_u32(&mut bytes[slot_index * 4..], offset_word);
    }

    fn set_record(bytes: &mut [u8], sector_offset: usize, payload: &[u8]) {
        let start = sector_offset * REGION_SECTOR_BYTES_LENGTH;
        BigEndian::write_u32(&mut bytes[start..], payload.len() as u32);
        BigEndian::write_u32(&mut bytes[start + 4..], payload.len() as u32);
        bytes[start + 8..start + 8 + payload.len()].copy_from_slice(payload);
    }

    #[test]
    fn test_empty_region_write() {
        let mut region = RegionContainer::new(Console::Switch);
        let bytes = region.write(Console::Switch).unwrap();

        assert_eq!(bytes.len(), REGION_HEADER_BYTES_LENGTH);
        assert!(bytes.iter().all(|&byte| byte == 0));

        let read_back = RegionContainer::read(Console::Switch, &bytes).unwrap();
        assert_eq!(read_back.present_chunks().count(), 0);
    }

    #[test]
    fn test_write_read_round_trip() {
        let mut region = RegionContainer::new(Console::WiiU);

        let chunks = [
            (RegionChunkPosition::new(0, 0), 10usize, false),
            (RegionChunkPosition::new(13, 15), 5000, true),
            (RegionChunkPosition::new(31, 31), 100_000, true),
        ];

        for (index, (position, length, rle)) in chunks.iter().enumerate() {
            let chunk = region.chunk_mut(*position);
            chunk.set_payload(sample(*length), *rle);
            chunk.set_timestamp(1_700_000_000 + index as u32);
        }

        let bytes = region.write(Console::WiiU).unwrap();
        assert_eq!(bytes.len() % REGION_SECTOR_BYTES_LENGTH, 0);

        let mut read_back = RegionContainer::read(Console::WiiU, &bytes).unwrap();
        assert_eq!(read_back.present_chunks().count(), 3);

        // No record claims the header sectors or a sector of another
        // record.
        let mut used = vec![false; bytes.len() / REGION_SECTOR_BYTES_LENGTH];
        for (_, chunk) in read_back.present_chunks() {
            let start = chunk.sector_offset() as usize;
            for sector in start..start + chunk.sector_count() as usize {
                assert!(sector >= 2);
                assert!(!used[sector]);
                used[sector] = true;
            }
        }

        for (index, (position, length, rle)) in chunks.iter().enumerate() {
            let chunk = read_back.chunk_mut(*position);

            assert_eq!(chunk.timestamp(), 1_700_000_000 + index as u32);
            assert_eq!(chunk.has_rle_layer(), *rle);
            assert!(chunk.is_compressed());

            chunk.ensure_decompressed(Console::WiiU).unwrap();
            assert_eq!(chunk.payload(), &sample(*length)[..]);
        }
    }

    #[test]
    fn test_sector_layout_formula() {
        let position = RegionChunkPosition::new(13, 15);
        let mut region = RegionContainer::new(Console::WiiU);
        region.chunk_mut(position).set_payload(sample(5000), true);

        let bytes = region.write(Console::WiiU).unwrap();
        let read_back = RegionContainer::read(Console::WiiU, &bytes).unwrap();
        let chunk = read_back.chunk(position);

        let stored_length = chunk.payload().len();
        let expected_sectors =
            (stored_length + 8 + REGION_SECTOR_BYTES_LENGTH - 1) / REGION_SECTOR_BYTES_LENGTH + 1;

        assert_eq!(chunk.sector_offset(), 2);
        assert_eq!(chunk.sector_count() as usize, expected_sectors);
        assert_eq!(chunk.decompressed_length(), 5000);
        assert!(chunk.has_rle_layer());
        assert_eq!(
            bytes.len(),
            (2 + expected_sectors) * REGION_SECTOR_BYTES_LENGTH
        );
    }

    #[test]
    fn test_cross_platform_rewrite() {
        let source = sample(4000);
        let position = RegionChunkPosition::new(5, 9);

        let mut region = RegionContainer::new(Console::WiiU);
        region.chunk_mut(position).set_payload(source.clone(), true);

        let wiiu_bytes = region.write(Console::WiiU).unwrap();
        let mut converted = RegionContainer::read(Console::WiiU, &wiiu_bytes).unwrap();

        // Chunks are still stored zlib for the Wii U and get re-encoded
        // as raw deflate on the way out.
        let rpcs3_bytes = converted.write(Console::Rpcs3).unwrap();
        assert_eq!(converted.console(), Console::Rpcs3);

        let mut read_back = RegionContainer::read(Console::Rpcs3, &rpcs3_bytes).unwrap();
        let chunk = read_back.chunk_mut(position);
        chunk.ensure_decompressed(Console::Rpcs3).unwrap();

        assert_eq!(chunk.payload(), &source[..]);
    }

    #[test]
    fn test_ps3_family_repeats_length_word() {
        let position = RegionChunkPosition::new(0, 0);
        let mut region = RegionContainer::new(Console::Rpcs3);
        region.chunk_mut(position).set_payload(sample(100), false);

        let bytes = region.write(Console::Rpcs3).unwrap();

        let record = 2 * REGION_SECTOR_BYTES_LENGTH;
        let first = BigEndian::read_u32(&bytes[record + 4..]);
        let second = BigEndian::read_u32(&bytes[record + 8..]);

        assert_eq!(first, 100);
        assert_eq!(second, 100);

        let read_back = RegionContainer::read(Console::Rpcs3, &bytes).unwrap();
        assert_eq!(read_back.chunk(position).decompressed_length(), 100);
    }

    #[test]
    fn test_vita_little_endian_layout() {
        let position = RegionChunkPosition::new(0, 0);
        let mut region = RegionContainer::new(Console::PsVita);
        region.chunk_mut(position).set_payload(vec![1, 2, 3], false);

        let bytes = region.write(Console::PsVita).unwrap();

        // Offset word for slot 0, little endian: sector count 2 in the
        // low byte, offset 2 above it.
        assert_eq!(&bytes[0..4], &[0x02, 0x02, 0x00, 0x00][..]);

        let mut read_back = RegionContainer::read(Console::PsVita, &bytes).unwrap();
        assert_eq!(read_back.present_chunks().count(), 1);

        // Big endian parsing of the same word sees a zero sector count.
        let as_big = RegionContainer::read(Console::WiiU, &bytes).unwrap();
        assert_eq!(as_big.present_chunks().count(), 0);

        let chunk = read_back.chunk_mut(position);
        chunk.ensure_decompressed(Console::PsVita).unwrap();
        assert_eq!(chunk.payload(), &[1, 2, 3][..]);
    }

    #[test]
    fn test_read_truncated_header() {
        let error = RegionContainer::read(Console::WiiU, &[0u8; 100])
            .err()
            .unwrap();

        match error {
            RegionReadError::TruncatedHeader { length } => assert_eq!(length, 100),
            _ => panic!("Expected `TruncatedHeader` but got `{:?}`", error),
        }
    }

    #[test]
    fn test_read_sector_range_out_of_bounds() {
        let mut bytes = raw_container(3);
        set_place(&mut bytes, 0, 2, 2);

        let error = RegionContainer::read(Console::WiiU, &bytes).err().unwrap();

        match error {
            RegionReadError::SectorRangeOutOfBounds {
                position,
                sector_offset,
                sector_count,
                container_length,
            } => {
                assert_eq!(position, RegionChunkPosition::new(0, 0));
                assert_eq!(sector_offset, 2);
                assert_eq!(sector_count, 2);
                assert_eq!(container_length, 3 * REGION_SECTOR_BYTES_LENGTH);
            }
            _ => panic!("Expected `SectorRangeOutOfBounds` but got `{:?}`", error),
        }
    }

    #[test]
    fn test_read_sector_overlap() {
        let mut bytes = raw_container(3);
        set_place(&mut bytes, 0, 2, 1);
        set_place(&mut bytes, 1, 2, 1);
        set_record(&mut bytes, 2, &[7; 16]);

        let error = RegionContainer::read(Console::WiiU, &bytes).err().unwrap();

        match error {
            RegionReadError::SectorOverlap {
                position,
                sector_index,
            } => {
                assert_eq!(position, RegionChunkPosition::new(1, 0));
                assert_eq!(sector_index, 2);
            }
            _ => panic!("Expected `SectorOverlap` but got `{:?}`", error),
        }
    }

    #[test]
    fn test_read_header_sectors_are_reserved() {
        let mut bytes = raw_container(3);
        set_place(&mut bytes, 0, 1, 1);

        let error = RegionContainer::read(Console::WiiU, &bytes).err().unwrap();

        match error {
            RegionReadError::SectorOverlap { sector_index, .. } => assert_eq!(sector_index, 1),
            _ => panic!("Expected `SectorOverlap` but got `{:?}`", error),
        }
    }

    #[test]
    fn test_read_length_exceeds_sectors() {
        let mut bytes = raw_container(3);
        set_place(&mut bytes, 0, 2, 1);
        BigEndian::write_u32(&mut bytes[2 * REGION_SECTOR_BYTES_LENGTH..], 5000);

        let error = RegionContainer::read(Console::WiiU, &bytes).err().unwrap();

        match error {
            RegionReadError::LengthExceedsMaximum {
                length,
                maximum_length,
                ..
            } => {
                assert_eq!(length, 5000);
                assert_eq!(maximum_length, 4096 - 8);
            }
            _ => panic!("Expected `LengthExceedsMaximum` but got `{:?}`", error),
        }
    }

    #[test]
    fn test_write_oversized_chunk_rejected() {
        // Noise does not deflate, so the stored form stays past the
        // 254 sector payload maximum.
        let mut state: u32 = 0x1234_5678;
        let noise: Vec<u8> = (0..1_100_000)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();

        let position = RegionChunkPosition::new(3, 3);
        let mut region = RegionContainer::new(Console::WiiU);
        region.chunk_mut(position).set_payload(noise, false);

        let error = region.write(Console::WiiU).err().unwrap();

        match error {
            RegionWriteError::LengthExceedsMaximum { position: at, .. } => {
                assert_eq!(at, position);
            }
            _ => panic!("Expected `LengthExceedsMaximum` but got `{:?}`", error),
        }
    }
}
