//! AVI container multiplexer.
//!
//! This crate writes AVI files conforming to the legacy AVI 1.0 layout and
//! the OpenDML (AVI 2.0) extension:
//!
//! - Two-phase RIFF writing with back-patched chunk sizes
//! - Per-stream standard (`ix##`) indices with bounded flushing
//! - Super-index (`indx`) slots reserved in the header
//! - Optional legacy `idx1` index for AVI 1.0 compatibility
//! - Multi-RIFF (`AVIX`) segmentation past the 2 GiB limit
//! - Pluggable video/audio encoders and a serial async write pipeline
//!
//! Output is write-once to a seekable byte sink; this crate does not read,
//! seek within, or edit existing files.
//!
//! # Example
//!
//! ```no_run
//! use avimux::{AviMuxer, BitsPerPixel, MuxerConfig, VideoParams};
//!
//! let file = std::fs::File::create("out.avi").unwrap();
//! let config = MuxerConfig {
//!     frames_per_second: 30.0,
//!     ..Default::default()
//! };
//! let mut muxer = AviMuxer::new(file, config);
//!
//! let video = muxer
//!     .add_video_stream(VideoParams::uncompressed(640, 480, BitsPerPixel::Bpp24))
//!     .unwrap();
//!
//! let frame = vec![0u8; 640 * 480 * 3];
//! muxer.write_video_frame(video, true, &frame).unwrap();
//! muxer.close().unwrap();
//! ```

mod adapters;
mod encoders;
mod error;
mod fourcc;
mod index;
mod muxer;
mod rate;
mod riff;
mod sequential;
mod stream;

pub use adapters::{EncodingAudioStream, EncodingVideoStream, SharedAviMuxer};
pub use encoders::{
    AudioBlockEncoder, EncodedFrame, PcmAudioEncoder, UncompressedVideoEncoder, VideoFrameEncoder,
};
pub use error::{AviError, Result};
pub use fourcc::{codecs, tags, FourCC};
pub use index::{
    DELTA_FRAME_BIT, IDX1_KEYFRAME_FLAG, MAX_STANDARD_INDEX_ENTRIES, MAX_STREAMS,
    MAX_SUPER_INDEX_ENTRIES,
};
pub use muxer::{AviMuxer, MuxerConfig};
pub use rate::FrameRate;
pub use riff::{RiffItem, RiffWriter, ITEM_HEADER_SIZE};
pub use sequential::{AsyncStreamWriter, WriteTicket};
pub use stream::{
    format_tags, AudioParams, BitsPerPixel, StreamDesc, StreamId, StreamKind, VideoParams,
};
