//! Encoder contracts and built-in pass-through encoders.
//!
//! Heavier codecs (Motion JPEG, MPEG-4, MP3) live outside this crate and
//! plug in through these traits.

use crate::error::{AviError, Result};
use crate::fourcc::{codecs, FourCC};
use crate::stream::BitsPerPixel;

/// Result of encoding one video frame.
#[derive(Debug, Clone, Copy)]
pub struct EncodedFrame {
    /// Bytes written into the destination buffer.
    pub len: usize,
    /// Whether the encoded frame is independently decodable.
    pub is_key_frame: bool,
}

/// Contract for pluggable video encoders.
///
/// Source frames are 32-bit BGR with top-down rows, `width * height * 4`
/// bytes. Implementations must never write more than
/// [`max_encoded_size`](VideoFrameEncoder::max_encoded_size) bytes.
pub trait VideoFrameEncoder: Send {
    /// Codec FourCC recorded in the stream header and format.
    fn codec(&self) -> FourCC;

    /// Bit depth declared in the stream format.
    fn bits_per_pixel(&self) -> BitsPerPixel;

    /// Upper bound on the encoded size of any single frame.
    fn max_encoded_size(&self) -> usize;

    /// Encode one frame from `src` into `dst`.
    fn encode(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EncodedFrame>;
}

/// Contract for pluggable audio encoders.
pub trait AudioBlockEncoder: Send {
    fn channels(&self) -> u16;
    fn samples_per_second(&self) -> u32;
    fn bits_per_sample(&self) -> u16;
    fn format_tag(&self) -> u16;
    fn bytes_per_second(&self) -> u32;
    /// Block alignment of the encoded stream.
    fn granularity(&self) -> u16;

    /// Format-specific bytes appended to the WAVEFORMATEX structure.
    fn format_specific_data(&self) -> Option<&[u8]> {
        None
    }

    /// Upper bound on the encoded size of a block of `src_len` source bytes.
    /// `flush` output is bounded by `max_encoded_len(0)`.
    fn max_encoded_len(&self, src_len: usize) -> usize;

    /// Encode one block, returning the number of bytes written to `dst`.
    fn encode_block(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize>;

    /// Emit any bytes still buffered by the encoder.
    fn flush(&mut self, dst: &mut [u8]) -> Result<usize>;
}

/// Pass-through video encoder: converts 32-bit top-down BGR input to the
/// bottom-up 24-bit BGR layout uncompressed AVI streams store.
#[derive(Debug, Clone)]
pub struct UncompressedVideoEncoder {
    width: u32,
    height: u32,
}

impl UncompressedVideoEncoder {
    pub fn new(width: u32, height: u32) -> Self {
        UncompressedVideoEncoder { width, height }
    }
}

impl VideoFrameEncoder for UncompressedVideoEncoder {
    fn codec(&self) -> FourCC {
        codecs::UNCOMPRESSED
    }

    fn bits_per_pixel(&self) -> BitsPerPixel {
        BitsPerPixel::Bpp24
    }

    fn max_encoded_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    fn encode(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EncodedFrame> {
        let width = self.width as usize;
        let height = self.height as usize;
        let needed_src = width * height * 4;
        let needed_dst = width * height * 3;
        if src.len() < needed_src {
            return Err(AviError::encoder(format!(
                "source frame too small: need {} bytes, got {}",
                needed_src,
                src.len()
            )));
        }
        if dst.len() < needed_dst {
            return Err(AviError::encoder(format!(
                "destination buffer too small: need {} bytes, got {}",
                needed_dst,
                dst.len()
            )));
        }

        for y in 0..height {
            let src_row = &src[(height - 1 - y) * width * 4..];
            let dst_row = &mut dst[y * width * 3..];
            for x in 0..width {
                dst_row[x * 3] = src_row[x * 4];
                dst_row[x * 3 + 1] = src_row[x * 4 + 1];
                dst_row[x * 3 + 2] = src_row[x * 4 + 2];
            }
        }

        Ok(EncodedFrame {
            len: needed_dst,
            is_key_frame: true,
        })
    }
}

/// Pass-through audio encoder for linear PCM blocks.
#[derive(Debug, Clone)]
pub struct PcmAudioEncoder {
    channels: u16,
    samples_per_second: u32,
    bits_per_sample: u16,
    granularity: u16,
}

impl PcmAudioEncoder {
    pub fn new(channels: u16, samples_per_second: u32, bits_per_sample: u16) -> Self {
        let granularity = (bits_per_sample as u32 * channels as u32).div_ceil(8) as u16;
        PcmAudioEncoder {
            channels,
            samples_per_second,
            bits_per_sample,
            granularity,
        }
    }
}

impl AudioBlockEncoder for PcmAudioEncoder {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn samples_per_second(&self) -> u32 {
        self.samples_per_second
    }

    fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    fn format_tag(&self) -> u16 {
        crate::stream::format_tags::PCM
    }

    fn bytes_per_second(&self) -> u32 {
        self.granularity as u32 * self.samples_per_second
    }

    fn granularity(&self) -> u16 {
        self.granularity
    }

    fn max_encoded_len(&self, src_len: usize) -> usize {
        src_len
    }

    fn encode_block(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        if dst.len() < src.len() {
            return Err(AviError::encoder(format!(
                "destination buffer too small: need {} bytes, got {}",
                src.len(),
                dst.len()
            )));
        }
        dst[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }

    fn flush(&mut self, _dst: &mut [u8]) -> Result<usize> {
        Ok(0)
    }
}
