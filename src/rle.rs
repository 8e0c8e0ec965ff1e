//! Run-length layer applied under the platform codec on some chunks.
//!
//! Byte 255 is the sentinel that opens a run record. A record holds the
//! run length minus one and, for runs of four bytes or more, an explicit
//! value byte; shorter runs of the sentinel leave the value implicit.

use crate::error::RleError;

/// Sentinel byte that opens a run record.
const RUN_SENTINEL: u8 = 255;
/// Longest run a single record can encode.
const RUN_MAXIMUM_LENGTH: usize = 256;

/// Encodes `source` into the run-length form.
pub fn encode(source: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(source.len());
    let mut position = 0;

    while position < source.len() {
        let value = source[position];
        let mut run_length = 1;

        while run_length < RUN_MAXIMUM_LENGTH
            && position + run_length < source.len()
            && source[position + run_length] == value
        {
            run_length += 1;
        }

        position += run_length;

        if value == RUN_SENTINEL {
            encoded.push(RUN_SENTINEL);
            encoded.push((run_length - 1) as u8);

            // Runs of four or more carry the value byte even though the
            // decoder would default to the sentinel anyway.
            if run_length >= 4 {
                encoded.push(value);
            }
        } else if run_length >= 4 {
            encoded.push(RUN_SENTINEL);
            encoded.push((run_length - 1) as u8);
            encoded.push(value);
        } else {
            for _ in 0..run_length {
                encoded.push(value);
            }
        }
    }

    encoded
}

/// Decodes the run-length form back into plain bytes.
///
/// `size_hint` pre-sizes the output buffer, usually from the decompressed
/// length recorded in the chunk header.
pub fn decode(source: &[u8], size_hint: usize) -> Result<Vec<u8>, RleError> {
    let mut decoded = Vec::with_capacity(size_hint);
    let mut position = 0;

    while position < source.len() {
        let value = source[position];
        position += 1;

        if value != RUN_SENTINEL {
            decoded.push(value);
            continue;
        }

        let run_length = match source.get(position) {
            Some(&byte) => byte as usize + 1,
            None => return Err(RleError::TruncatedRun { offset: position }),
        };
        position += 1;

        let run_value = if run_length >= 4 {
            match source.get(position) {
                Some(&byte) => {
                    position += 1;
                    byte
                }
                None => return Err(RleError::TruncatedRun { offset: position }),
            }
        } else {
            RUN_SENTINEL
        };

        decoded.extend(std::iter::repeat(run_value).take(run_length));
    }

    Ok(decoded)
}
