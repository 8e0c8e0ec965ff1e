//! Region container codec for console edition worlds.
//!
//! Consoles store chunks in 1024 slot region containers on a 4096 byte
//! sector grid, with per platform compression (zlib, raw deflate or
//! LZX) and an optional run length layer in front of it. This crate
//! reads and writes those containers, moves chunks between their
//! stored and decompressed forms, and dispatches decompressed payloads
//! to the matching chunk version codec.
//!
//! Xbox 360 chunks are LZX compressed; decompression for them is
//! behind the optional `lzxd` feature.
//!
//! # Example
//!
//! ```
//! use lce_region::position::RegionChunkPosition;
//! use lce_region::{Console, RegionContainer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let position = RegionChunkPosition::new(13, 15);
//!
//! let mut region = RegionContainer::new(Console::WiiU);
//! region.chunk_mut(position).set_payload(vec![42; 5000], true);
//!
//! let bytes = region.write(Console::WiiU)?;
//!
//! let mut read_back = RegionContainer::read(Console::WiiU, &bytes)?;
//! let chunk = read_back.chunk_mut(position);
//! chunk.ensure_decompressed(Console::WiiU)?;
//!
//! assert_eq!(chunk.payload().len(), 5000);
//! # Ok(())
//! # }
//! ```

pub mod chunk;
mod codec;
pub mod console;
mod cursor;
pub mod error;
pub mod position;
pub mod provider;
pub mod region;
pub mod rle;
pub mod version;

pub use crate::chunk::ChunkSlot;
pub use crate::console::Console;
pub use crate::position::{RegionChunkPosition, RegionPosition};
pub use crate::region::RegionContainer;
pub use crate::version::{decode_chunk, encode_chunk, ChunkData, ChunkVersion};
