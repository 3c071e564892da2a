//! Per-stream index bookkeeping: standard (`ix##`), super (`indx`), and
//! legacy (`idx1`) indices, plus the flush policy.

use crate::fourcc::FourCC;
use crate::stream::index_chunk_fourcc;

/// Bit set in a stored `data_size` for delta (non-key) frames.
pub const DELTA_FRAME_BIT: u32 = 0x8000_0000;

/// Flag in `idx1` marking a key frame.
pub const IDX1_KEYFRAME_FLAG: u32 = 0x10;

/// A standard index never grows beyond this many entries before flushing.
pub const MAX_STANDARD_INDEX_ENTRIES: usize = 15_000;

/// Super-index slots reserved per stream in the header.
pub const MAX_SUPER_INDEX_ENTRIES: usize = 256;

/// Two-digit chunk ids allow at most this many streams.
pub const MAX_STREAMS: usize = 100;

/// Entry of a standard (`ix##`) index: one data chunk in the current RIFF.
#[derive(Debug, Clone, Copy)]
pub struct StdIndexEntry {
    /// Absolute offset of the chunk's data.
    pub data_offset: u64,
    /// Data size, with [`DELTA_FRAME_BIT`] set for non-key frames.
    pub data_size: u32,
}

/// Entry of a super (`indx`) index: one flushed `ix##` chunk.
#[derive(Debug, Clone, Copy)]
pub struct SuperIndexEntry {
    /// Absolute offset of the `ix##` chunk.
    pub chunk_offset: u64,
    /// Total chunk size including its 8-byte header.
    pub chunk_size: u32,
    /// Number of data chunks the index covers.
    pub duration: u32,
}

/// Entry of the legacy `idx1` index; first RIFF only.
#[derive(Debug, Clone, Copy)]
pub struct LegacyIndexEntry {
    pub chunk_id: FourCC,
    pub is_key_frame: bool,
    /// Chunk offset relative to the start of the `movi` list data.
    pub data_offset: u32,
    /// Data size, with [`DELTA_FRAME_BIT`] preserved.
    pub data_size: u32,
}

/// Store a data size with the delta-frame flag applied.
pub(crate) fn stored_data_size(data_size: u32, is_key_frame: bool) -> u32 {
    if is_key_frame {
        data_size
    } else {
        data_size | DELTA_FRAME_BIT
    }
}

/// Index and counter state the muxer keeps per stream.
#[derive(Debug)]
pub(crate) struct StreamIndexState {
    pub frame_count: u32,
    pub max_chunk_data_size: u32,
    pub total_data_size: u64,
    pub standard_index: Vec<StdIndexEntry>,
    pub super_index: Vec<SuperIndexEntry>,
    pub legacy_index: Vec<LegacyIndexEntry>,
    /// `ix##` chunk id for this stream.
    pub index_chunk_id: FourCC,
}

impl StreamIndexState {
    pub fn new(stream_index: usize) -> Self {
        StreamIndexState {
            frame_count: 0,
            max_chunk_data_size: 0,
            total_data_size: 0,
            standard_index: Vec::new(),
            super_index: Vec::new(),
            legacy_index: Vec::new(),
            index_chunk_id: index_chunk_fourcc(stream_index),
        }
    }

    /// A flush is due once the entry cap is reached or relative offsets
    /// would no longer fit in 32 bits.
    pub fn needs_flush(&self, current_pos: u64) -> bool {
        if self.standard_index.len() >= MAX_STANDARD_INDEX_ENTRIES {
            return true;
        }
        match self.standard_index.first() {
            Some(first) => current_pos - first.data_offset > u32::MAX as u64,
            None => false,
        }
    }
}
