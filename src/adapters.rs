//! Shared muxer handle and encoding stream wrappers.
//!
//! [`SharedAviMuxer`] is the single write mutex: any number of producer
//! threads may hold clones, and every write serializes through it. The
//! encoding wrappers sit between a producer and the muxer, applying a
//! [`VideoFrameEncoder`]/[`AudioBlockEncoder`] into a reused scratch buffer
//! before delegating the encoded bytes.

use crate::encoders::{AudioBlockEncoder, EncodedFrame, VideoFrameEncoder};
use crate::error::Result;
use crate::muxer::AviMuxer;
use crate::stream::{AudioParams, StreamId, VideoParams};
use parking_lot::Mutex;
use std::io::{Seek, Write};
use std::sync::Arc;

/// Clonable handle serializing all muxer access behind one mutex.
pub struct SharedAviMuxer<W: Write + Seek> {
    inner: Arc<Mutex<AviMuxer<W>>>,
}

impl<W: Write + Seek> Clone for SharedAviMuxer<W> {
    fn clone(&self) -> Self {
        SharedAviMuxer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write + Seek> SharedAviMuxer<W> {
    /// Wrap a muxer for shared use.
    pub fn new(muxer: AviMuxer<W>) -> Self {
        SharedAviMuxer {
            inner: Arc::new(Mutex::new(muxer)),
        }
    }

    /// Register a video stream.
    pub fn add_video_stream(&self, params: VideoParams) -> Result<StreamId> {
        self.inner.lock().add_video_stream(params)
    }

    /// Register an audio stream.
    pub fn add_audio_stream(&self, params: AudioParams) -> Result<StreamId> {
        self.inner.lock().add_audio_stream(params)
    }

    /// Write one video frame.
    pub fn write_video_frame(&self, id: StreamId, is_key_frame: bool, data: &[u8]) -> Result<()> {
        self.inner.lock().write_video_frame(id, is_key_frame, data)
    }

    /// Write one audio block.
    pub fn write_audio_block(&self, id: StreamId, data: &[u8]) -> Result<()> {
        self.inner.lock().write_audio_block(id, data)
    }

    /// Frames (or blocks) written so far for a stream.
    pub fn frame_count(&self, id: StreamId) -> u32 {
        self.inner.lock().frame_count(id)
    }

    /// Finalize the file. Call after finishing all encoding wrappers.
    pub fn finish(&self) -> Result<()> {
        self.inner.lock().finish()
    }

    /// Run a closure with exclusive access to the muxer.
    pub fn with<R>(&self, f: impl FnOnce(&mut AviMuxer<W>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Finalize the file and return the underlying sink. Fails if other
    /// handles (clones, wrappers, async writers) are still alive.
    pub fn close(self) -> Result<W> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().close(),
            Err(inner) => {
                inner.lock().finish()?;
                Err(crate::error::AviError::config(
                    "cannot take the sink: other muxer handles still exist",
                ))
            }
        }
    }
}

/// Grow a scratch buffer to at least `needed` bytes, in powers of two.
fn ensure_capacity(buffer: &mut Vec<u8>, needed: usize) {
    if buffer.len() >= needed {
        return;
    }
    let mut new_len = buffer.len().max(1024);
    while new_len < needed {
        new_len *= 2;
    }
    buffer.resize(new_len, 0);
}

/// Video stream wrapper that encodes frames before writing them.
///
/// The stream's codec and bit depth come from the encoder at registration
/// time, so they cannot drift from what the encoder produces.
pub struct EncodingVideoStream<W: Write + Seek, E: VideoFrameEncoder> {
    muxer: SharedAviMuxer<W>,
    id: StreamId,
    encoder: E,
    buffer: Vec<u8>,
}

impl<W: Write + Seek, E: VideoFrameEncoder> EncodingVideoStream<W, E> {
    /// Register a stream whose metadata is derived from `encoder`.
    pub fn new(muxer: &SharedAviMuxer<W>, encoder: E, width: u32, height: u32) -> Result<Self> {
        let params = VideoParams {
            width,
            height,
            bits_per_pixel: encoder.bits_per_pixel(),
            codec: encoder.codec(),
        };
        let id = muxer.add_video_stream(params)?;
        Ok(EncodingVideoStream {
            muxer: muxer.clone(),
            id,
            encoder,
            buffer: Vec::new(),
        })
    }

    pub fn stream_id(&self) -> StreamId {
        self.id
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Encode one BGR32 top-down frame and write it to the file.
    pub fn write_frame(&mut self, src: &[u8]) -> Result<()> {
        let max = self.encoder.max_encoded_size();
        ensure_capacity(&mut self.buffer, max);
        let EncodedFrame { len, is_key_frame } = self.encoder.encode(src, &mut self.buffer)?;
        self.muxer
            .write_video_frame(self.id, is_key_frame, &self.buffer[..len])
    }
}

/// Audio stream wrapper that encodes blocks before writing them.
pub struct EncodingAudioStream<W: Write + Seek, E: AudioBlockEncoder> {
    muxer: SharedAviMuxer<W>,
    id: StreamId,
    encoder: E,
    buffer: Vec<u8>,
    finished: bool,
}

impl<W: Write + Seek, E: AudioBlockEncoder> EncodingAudioStream<W, E> {
    /// Register a stream whose format is derived from `encoder`.
    pub fn new(muxer: &SharedAviMuxer<W>, encoder: E) -> Result<Self> {
        let params = AudioParams {
            format_tag: encoder.format_tag(),
            channels: encoder.channels(),
            samples_per_second: encoder.samples_per_second(),
            bits_per_sample: encoder.bits_per_sample(),
            bytes_per_second: encoder.bytes_per_second(),
            granularity: encoder.granularity(),
            format_specific_data: encoder.format_specific_data().map(|d| d.to_vec()),
        };
        let id = muxer.add_audio_stream(params)?;
        Ok(EncodingAudioStream {
            muxer: muxer.clone(),
            id,
            encoder,
            buffer: Vec::new(),
            finished: false,
        })
    }

    pub fn stream_id(&self) -> StreamId {
        self.id
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Encode one block of source audio and write the result.
    pub fn write_block(&mut self, src: &[u8]) -> Result<()> {
        let max = self.encoder.max_encoded_len(src.len());
        ensure_capacity(&mut self.buffer, max);
        let len = self.encoder.encode_block(src, &mut self.buffer)?;
        if len > 0 {
            self.muxer.write_audio_block(self.id, &self.buffer[..len])?;
        }
        Ok(())
    }

    /// Flush the encoder and write any residual bytes as a final block.
    /// Must be called before the muxer is finished.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let max = self.encoder.max_encoded_len(0).max(1);
        ensure_capacity(&mut self.buffer, max);
        let len = self.encoder.flush(&mut self.buffer)?;
        if len > 0 {
            self.muxer.write_audio_block(self.id, &self.buffer[..len])?;
        }
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::{PcmAudioEncoder, UncompressedVideoEncoder};
    use crate::muxer::MuxerConfig;
    use std::io::Cursor;

    #[test]
    fn test_ensure_capacity_grows_in_powers_of_two() {
        let mut buffer = Vec::new();
        ensure_capacity(&mut buffer, 100);
        assert_eq!(buffer.len(), 1024);

        ensure_capacity(&mut buffer, 5000);
        assert_eq!(buffer.len(), 8192);

        // Never shrinks.
        ensure_capacity(&mut buffer, 10);
        assert_eq!(buffer.len(), 8192);
    }

    #[test]
    fn test_encoding_video_stream_writes_encoded_bytes() {
        let muxer = SharedAviMuxer::new(AviMuxer::new(
            Cursor::new(Vec::new()),
            MuxerConfig::default(),
        ));
        let mut stream =
            EncodingVideoStream::new(&muxer, UncompressedVideoEncoder::new(2, 2), 2, 2).unwrap();

        stream.write_frame(&[0u8; 16]).unwrap();
        stream.write_frame(&[0u8; 16]).unwrap();
        assert_eq!(muxer.frame_count(stream.stream_id()), 2);
    }

    #[test]
    fn test_encoding_audio_stream_finish_is_idempotent() {
        let muxer = SharedAviMuxer::new(AviMuxer::new(
            Cursor::new(Vec::new()),
            MuxerConfig::default(),
        ));
        let mut stream =
            EncodingAudioStream::new(&muxer, PcmAudioEncoder::new(1, 8000, 8)).unwrap();

        stream.write_block(&[1, 2, 3, 4]).unwrap();
        stream.finish().unwrap();
        stream.finish().unwrap();
        assert_eq!(muxer.frame_count(stream.stream_id()), 1);

        muxer.finish().unwrap();
    }

    #[test]
    fn test_shared_muxer_clones_share_state() {
        let muxer = SharedAviMuxer::new(AviMuxer::new(
            Cursor::new(Vec::new()),
            MuxerConfig::default(),
        ));
        let id = muxer
            .add_video_stream(VideoParams::uncompressed(
                2,
                2,
                crate::stream::BitsPerPixel::Bpp24,
            ))
            .unwrap();

        let clone = muxer.clone();
        clone.write_video_frame(id, true, &[0; 12]).unwrap();
        assert_eq!(muxer.frame_count(id), 1);
    }
}
