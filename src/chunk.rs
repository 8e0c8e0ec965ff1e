use crate::codec;
use crate::console::Console;
use crate::error::CodecError;
use crate::rle;

/// Ceiling applied to the stored decompressed length word when it
/// pre-sizes buffers. The word is container data; a corrupt value far
/// beyond any real chunk must not drive the reservation.
const SIZE_HINT_MAXIMUM_BYTES: usize = 16 * 1024 * 1024;

/// One chunk slot of a region container.
///
/// The payload either holds the stored form taken from the container
/// (platform compressed, possibly with a run-length layer underneath) or
/// the fully decompressed chunk bytes, per
/// [`is_compressed`](ChunkSlot::is_compressed). The two `ensure_`
/// transitions move between the forms and are no-ops when the slot is
/// already in the requested one.
#[derive(Debug, Clone, Default)]
pub struct ChunkSlot {
    payload: Vec<u8>,
    /// Payload length after full decompression.
    decompressed_length: u32,
    /// Last modification time in epoch seconds.
    timestamp: u32,
    /// Stored form carries a run-length layer under the platform codec.
    rle: bool,
    /// Payload currently holds the stored form.
    compressed: bool,
    /// Amount of sectors the record occupies, zero for absent slots.
    sector_count: u8,
    /// Sector at which the record starts.
    sector_offset: u32,
}

impl ChunkSlot {
    pub(crate) fn new_stored(
        payload: Vec<u8>,
        decompressed_length: u32,
        timestamp: u32,
        rle: bool,
        sector_count: u8,
        sector_offset: u32,
    ) -> ChunkSlot {
        ChunkSlot {
            payload,
            decompressed_length,
            timestamp,
            rle,
            compressed: true,
            sector_count,
            sector_offset,
        }
    }

    /// Slots claiming at least one sector are present in the container.
    pub fn is_present(&self) -> bool {
        self.sector_count > 0
    }

    /// Current payload bytes, in whichever form the slot holds.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn decompressed_length(&self) -> u32 {
        self.decompressed_length
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u32) {
        self.timestamp = timestamp;
    }

    /// Whether the stored form carries the run-length layer.
    pub fn has_rle_layer(&self) -> bool {
        self.rle
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn sector_count(&self) -> u8 {
        self.sector_count
    }

    pub fn sector_offset(&self) -> u32 {
        self.sector_offset
    }

    pub(crate) fn set_sector_place(&mut self, sector_offset: u32, sector_count: u8) {
        self.sector_offset = sector_offset;
        self.sector_count = sector_count;
    }

    /// Installs decompressed chunk bytes, marking the slot present.
    ///
    /// `rle` selects whether the stored form gets the run-length layer.
    /// The previous payload is released.
    pub fn set_payload(&mut self, payload: Vec<u8>, rle: bool) {
        self.decompressed_length = payload.len() as u32;
        self.payload = payload;
        self.rle = rle;
        self.compressed = false;

        // Sector place is provisional until the next container write.
        if self.sector_count == 0 {
            self.sector_count = 1;
        }
    }

    /// Clears the slot back to absent, releasing the payload.
    pub fn clear(&mut self) {
        *self = ChunkSlot::default();
    }

    /// Brings the payload to decompressed form.
    ///
    /// Already decompressed and empty slots are left untouched. Platforms
    /// without a registered decompressor keep the stored form and flags
    /// unchanged.
    pub fn ensure_decompressed(&mut self, console: Console) -> Result<(), CodecError> {
        if !self.compressed || self.payload.is_empty() {
            return Ok(());
        }

        let size_hint = (self.decompressed_length as usize).min(SIZE_HINT_MAXIMUM_BYTES);
        let decompressed = match codec::decompress(console, &self.payload, size_hint)? {
            Some(decompressed) => decompressed,
            None => return Ok(()),
        };

        let payload = if self.rle {
            rle::decode(&decompressed, size_hint)?
        } else {
            decompressed
        };

        self.decompressed_length = payload.len() as u32;
        self.payload = payload;
        self.compressed = false;

        Ok(())
    }

    /// Brings the payload to the stored form of the given platform.
    ///
    /// Applies the run-length layer first when the slot carries one, then
    /// the platform codec. Already stored and empty slots are left
    /// untouched. Platforms without a registered compressor keep the
    /// decompressed form and flags unchanged.
    pub fn ensure_compressed(&mut self, console: Console) -> Result<(), CodecError> {
        if self.compressed || self.payload.is_empty() {
            return Ok(());
        }

        let rle_encoded;
        let source = if self.rle {
            rle_encoded = rle::encode(&self.payload);
            &rle_encoded[..]
        } else {
            &self.payload[..]
        };

        let compressed = match codec::compress(console, source)? {
            Some(compressed) => compressed,
            None => return Ok(()),
        };

        self.decompressed_length = self.payload.len() as u32;
        self.payload = compressed;
        self.compressed = true;

        Ok(())
    }
}
