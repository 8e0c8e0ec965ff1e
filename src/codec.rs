//! Per-platform compression primitives.
//!
//! Deflate based platforms go through `flate2`; the Xbox 360 LZX
//! decompressor is only available with the `lzxd` cargo feature.
//! Platforms without a registered primitive for a direction return
//! `Ok(None)` and the caller keeps the current form.

use crate::console::Console;
use crate::error::CodecError;
use flate2::read::{DeflateDecoder, DeflateEncoder, ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use std::io::Read;

/// Decompresses `source` with the platform codec.
///
/// `size_hint` pre-sizes the output buffer from the decompressed length
/// recorded in the chunk header.
pub(crate) fn decompress(
    console: Console,
    source: &[u8],
    size_hint: usize,
) -> Result<Option<Vec<u8>>, CodecError> {
    match console {
        // PS3 dumps carry raw deflate streams without the zlib header.
        Console::Ps3 | Console::Rpcs3 => inflate_raw(source, size_hint).map(Some),
        Console::PsVita | Console::Ps4 | Console::WiiU | Console::Switch => {
            inflate_zlib(source, size_hint).map(Some)
        }
        #[cfg(feature = "lzxd")]
        Console::Xbox360 => lzx::decompress(source, size_hint).map(Some),
        #[cfg(not(feature = "lzxd"))]
        Console::Xbox360 => Ok(None),
        Console::XboxOne => Ok(None),
    }
}

/// Compresses `source` with the platform codec.
///
/// Xbox platforms and the PS3 itself are read sources only and have no
/// registered compressor.
pub(crate) fn compress(console: Console, source: &[u8]) -> Result<Option<Vec<u8>>, CodecError> {
    match console {
        Console::Rpcs3 => deflate_raw(source).map(Some),
        Console::PsVita | Console::Ps4 | Console::WiiU | Console::Switch => {
            deflate_zlib(source).map(Some)
        }
        Console::Xbox360 | Console::XboxOne | Console::Ps3 => Ok(None),
    }
}

fn inflate_zlib(source: &[u8], size_hint: usize) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(source);
    let mut decompressed = Vec::with_capacity(size_hint);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|io_error| CodecError::Inflate { io_error })?;

    Ok(decompressed)
}

fn inflate_raw(source: &[u8], size_hint: usize) -> Result<Vec<u8>, CodecError> {
    let mut decoder = DeflateDecoder::new(source);
    let mut decompressed = Vec::with_capacity(size_hint);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|io_error| CodecError::Inflate { io_error })?;

    Ok(decompressed)
}

fn deflate_zlib(source: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(source, Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|io_error| CodecError::Deflate { io_error })?;

    Ok(compressed)
}

fn deflate_raw(source: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = DeflateEncoder::new(source, Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|io_error| CodecError::Deflate { io_error })?;

    Ok(compressed)
}

/// Xbox 360 saves wrap LZX in the XMem frame format: each frame is a
/// 2-byte big endian compressed length, with a leading `0xFF` escaping
/// an explicit output length for the final short frame.
#[cfg(feature = "lzxd")]
mod lzx {
    use crate::error::CodecError;
    use lzxd::{Lzxd, WindowSize};

    /// Output length of a regular frame.
    const FRAME_LENGTH: usize = 0x8000;

    pub(crate) fn decompress(source: &[u8], size_hint: usize) -> Result<Vec<u8>, CodecError> {
        let mut lzxd = Lzxd::new(WindowSize::KB64);
        let mut decompressed = Vec::with_capacity(size_hint);
        let mut position = 0;

        while position < source.len() && decompressed.len() < size_hint {
            let (compressed_length, frame_length) = read_frame_header(source, &mut position)?;

            let remaining = size_hint - decompressed.len();
            let frame_length = frame_length.min(remaining);

            if position + compressed_length > source.len() {
                return Err(CodecError::Lzx {
                    detail: format!("frame of {} bytes past end of input", compressed_length),
                });
            }

            let frame = &source[position..position + compressed_length];
            position += compressed_length;

            let decoded = lzxd
                .decompress_next(frame, frame_length)
                .map_err(|error| CodecError::Lzx {
                    detail: format!("{:?}", error),
                })?;

            decompressed.extend_from_slice(decoded);
        }

        decompressed.truncate(size_hint);

        Ok(decompressed)
    }

    fn read_frame_header(
        source: &[u8],
        position: &mut usize,
    ) -> Result<(usize, usize), CodecError> {
        let truncated = || CodecError::Lzx {
            detail: String::from("truncated frame header"),
        };

        if source[*position] == 0xFF {
            if *position + 5 > source.len() {
                return Err(truncated());
            }

            let frame_length =
                u16::from_be_bytes([source[*position + 1], source[*position + 2]]) as usize;
            let compressed_length =
                u16::from_be_bytes([source[*position + 3], source[*position + 4]]) as usize;
            *position += 5;

            Ok((compressed_length, frame_length))
        } else {
            if *position + 2 > source.len() {
                return Err(truncated());
            }

            let compressed_length =
                u16::from_be_bytes([source[*position], source[*position + 1]]) as usize;
            *position += 2;

            Ok((compressed_length, FRAME_LENGTH))
        }
    }
}
