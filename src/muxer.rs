//! AVI multiplexer: header layout, movi writes, index flushing, RIFF
//! segmentation, and the close-time header rewrite.

use crate::error::{AviError, Result};
use crate::fourcc::{codecs, tags};
use crate::index::{
    stored_data_size, LegacyIndexEntry, StdIndexEntry, StreamIndexState, SuperIndexEntry,
    IDX1_KEYFRAME_FLAG, MAX_STREAMS, MAX_SUPER_INDEX_ENTRIES,
};
use crate::rate::FrameRate;
use crate::riff::{RiffItem, RiffWriter, ITEM_HEADER_SIZE, MAX_ITEM_DATA_SIZE};
use crate::stream::{AudioParams, BitsPerPixel, StreamDesc, StreamId, StreamKind, VideoParams};
use std::io::{Seek, Write};

/// Soft cap for the first RIFF (the hard OpenDML limit is 1 GiB).
const FIRST_RIFF_SIZE_THRESHOLD: u64 = 512 * 1024 * 1024;

/// Cap for every subsequent RIFF.
const NEXT_RIFF_SIZE_THRESHOLD: u64 = i32::MAX as u64 - 1024 * 1024;

/// Offset of the header list: after `RIFF`, the size field, and `AVI `.
const HEADER_LIST_OFFSET: u64 = 12;

/// Data size of the `avih` chunk.
const MAIN_HEADER_SIZE: u32 = 56;

/// Data size of a `strh` chunk.
const STREAM_HEADER_SIZE: u32 = 56;

/// Reserved u32 slots following the total-frame count in `dmlh`.
const DMLH_RESERVED_DWORDS: u64 = 64;

/// `avih` flag bits.
const AVIF_HAS_INDEX: u32 = 0x10;
const AVIF_IS_INTERLEAVED: u32 = 0x100;
const AVIF_TRUST_CK_TYPE: u32 = 0x800;

/// OpenDML index types.
const INDEX_TYPE_INDEXES: u8 = 0x00;
const INDEX_TYPE_CHUNKS: u8 = 0x01;

/// Bytes of one `idx1` entry.
const INDEX1_ENTRY_SIZE: u64 = 16;

/// Muxer configuration.
#[derive(Debug, Clone)]
pub struct MuxerConfig {
    /// Decimal frame rate; rounded to 3 decimal places at first write.
    pub frames_per_second: f64,
    /// Also emit the legacy `idx1` index in the first RIFF.
    pub emit_index1: bool,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        MuxerConfig {
            frames_per_second: 30.0,
            emit_index1: false,
        }
    }
}

/// AVI multiplexer over a seekable byte sink.
///
/// Streams are registered while the muxer is mutable; the first frame or
/// block freezes all metadata, writes the header list, and opens the movie
/// data list. [`close`](AviMuxer::close) finalizes indices and rewrites the
/// header with the true counts.
pub struct AviMuxer<W: Write + Seek> {
    writer: RiffWriter<W>,
    config: MuxerConfig,
    frame_rate: Option<FrameRate>,
    streams: Vec<StreamDesc>,
    index: Vec<StreamIndexState>,
    current_riff: Option<RiffItem>,
    current_movi: Option<RiffItem>,
    is_first_riff: bool,
    first_riff_threshold: u64,
    next_riff_threshold: u64,
    /// Video frame count captured when the first RIFF closes; this is what
    /// the legacy main header reports.
    riff_avi_frame_count: u32,
    legacy_entry_count: u64,
    header_list_end: u64,
    started: bool,
    closed: bool,
}

impl<W: Write + Seek> AviMuxer<W> {
    /// Create a muxer writing to `sink`.
    pub fn new(sink: W, config: MuxerConfig) -> Self {
        AviMuxer {
            writer: RiffWriter::new(sink),
            config,
            frame_rate: None,
            streams: Vec::new(),
            index: Vec::new(),
            current_riff: None,
            current_movi: None,
            is_first_riff: true,
            first_riff_threshold: FIRST_RIFF_SIZE_THRESHOLD,
            next_riff_threshold: NEXT_RIFF_SIZE_THRESHOLD,
            riff_avi_frame_count: 0,
            legacy_entry_count: 0,
            header_list_end: 0,
            started: false,
            closed: false,
        }
    }

    /// Register a video stream.
    pub fn add_video_stream(&mut self, params: VideoParams) -> Result<StreamId> {
        self.add_stream(StreamKind::Video(params))
    }

    /// Register an audio stream.
    pub fn add_audio_stream(&mut self, params: AudioParams) -> Result<StreamId> {
        self.add_stream(StreamKind::Audio(params))
    }

    fn add_stream(&mut self, kind: StreamKind) -> Result<StreamId> {
        if self.started {
            return Err(AviError::config(
                "cannot add streams after writing has started",
            ));
        }
        if self.streams.len() >= MAX_STREAMS {
            return Err(AviError::TooManyStreams { max: MAX_STREAMS });
        }
        if let StreamKind::Audio(a) = &kind {
            if let Some(extra) = &a.format_specific_data {
                if extra.len() > u16::MAX as usize {
                    return Err(AviError::config(
                        "audio format-specific data exceeds 65535 bytes",
                    ));
                }
            }
        }
        let index = self.streams.len();
        self.streams.push(StreamDesc::new(index, kind));
        self.index.push(StreamIndexState::new(index));
        Ok(StreamId(index))
    }

    /// Shared access to a stream's descriptor.
    pub fn stream(&self, id: StreamId) -> &StreamDesc {
        &self.streams[id.0]
    }

    /// Mutable access to a stream's descriptor; its setters fail once
    /// writing has started.
    pub fn stream_mut(&mut self, id: StreamId) -> &mut StreamDesc {
        &mut self.streams[id.0]
    }

    /// Number of registered streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Whether the first write has happened.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Frames (or audio blocks) written so far for a stream.
    pub fn frame_count(&self, id: StreamId) -> u32 {
        self.index[id.0].frame_count
    }

    /// Total data bytes written so far for a stream.
    pub fn total_data_size(&self, id: StreamId) -> u64 {
        self.index[id.0].total_data_size
    }

    /// Largest single chunk written so far for a stream.
    pub fn max_chunk_data_size(&self, id: StreamId) -> u32 {
        self.index[id.0].max_chunk_data_size
    }

    /// Override the RIFF rollover thresholds. Testing hook.
    #[doc(hidden)]
    pub fn set_riff_size_thresholds(&mut self, first: u64, next: u64) {
        self.first_riff_threshold = first;
        self.next_riff_threshold = next;
    }

    /// Write one video frame for `id`.
    pub fn write_video_frame(&mut self, id: StreamId, is_key_frame: bool, data: &[u8]) -> Result<()> {
        if !self.streams[id.0].kind().is_video() {
            return Err(AviError::config("stream is not a video stream"));
        }
        self.write_stream_chunk(id.0, is_key_frame, data)
    }

    /// Write one audio block for `id`. Audio blocks are always key frames.
    pub fn write_audio_block(&mut self, id: StreamId, data: &[u8]) -> Result<()> {
        if !self.streams[id.0].kind().is_audio() {
            return Err(AviError::config("stream is not an audio stream"));
        }
        self.write_stream_chunk(id.0, true, data)
    }

    fn write_stream_chunk(&mut self, stream: usize, is_key_frame: bool, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(AviError::config("writer is closed"));
        }
        if data.len() as u64 > MAX_ITEM_DATA_SIZE {
            return Err(AviError::ChunkTooLarge {
                size: data.len() as u64,
            });
        }
        if !self.started {
            self.prepare_for_writing()?;
        }

        if self.index[stream].super_index.len() >= MAX_SUPER_INDEX_ENTRIES {
            return Err(AviError::SuperIndexFull { index: stream });
        }

        let pos = self.writer.position()?;
        if self.index[stream].needs_flush(pos) {
            self.flush_stream_index(stream)?;
        }

        let mut write_legacy = self.config.emit_index1 && self.is_first_riff;
        let approx = data.len() as u64 + if write_legacy { INDEX1_ENTRY_SIZE } else { 0 };
        self.create_new_riff_if_needed(approx)?;
        // A rollover ends the first RIFF, and with it the legacy index.
        write_legacy = write_legacy && self.is_first_riff;

        let chunk_id = match self.streams[stream].chunk_id() {
            Some(id) => id,
            None => return Err(AviError::config("stream is not frozen")),
        };

        let data_size = data.len() as u32;
        let chunk = self.writer.open_chunk_sized(chunk_id, data_size)?;
        self.writer.write_all(data)?;
        self.writer.close_item(chunk)?;

        let stored = stored_data_size(data_size, is_key_frame);
        let state = &mut self.index[stream];
        state.frame_count += 1;
        state.max_chunk_data_size = state.max_chunk_data_size.max(data_size);
        state.total_data_size += data_size as u64;
        state.standard_index.push(StdIndexEntry {
            data_offset: chunk.data_start(),
            data_size: stored,
        });

        if write_legacy {
            let movi = match self.current_movi {
                Some(m) => m,
                None => return Err(AviError::config("movie list is not open")),
            };
            state.legacy_index.push(LegacyIndexEntry {
                chunk_id,
                is_key_frame,
                data_offset: (chunk.item_start() - movi.data_start()) as u32,
                data_size: stored,
            });
            self.legacy_entry_count += 1;
        }

        Ok(())
    }

    /// First-write transition: freezes the frame rate and every stream,
    /// then lays out the outer RIFF with its header list and movie list.
    fn prepare_for_writing(&mut self) -> Result<()> {
        let rate = FrameRate::from_fps(self.config.frames_per_second)?;
        self.frame_rate = Some(rate);
        for stream in &mut self.streams {
            stream.freeze();
        }
        self.started = true;

        let riff = self.writer.open_riff(tags::AVI)?;
        self.current_riff = Some(riff);
        self.write_header()?;
        self.header_list_end = self.writer.position()?;
        let movi = self.writer.open_list(tags::MOVI)?;
        self.current_movi = Some(movi);

        log::debug!(
            "header written, {} streams, movi starts at {}",
            self.streams.len(),
            movi.item_start()
        );
        Ok(())
    }

    /// Write the `hdrl` list. Used at the first write and again, in place,
    /// when closing; both passes produce the same byte length.
    fn write_header(&mut self) -> Result<()> {
        let hdrl = self.writer.open_list(tags::HDRL)?;
        self.write_main_header()?;
        for stream in 0..self.streams.len() {
            self.write_stream_list(stream)?;
        }
        self.write_odml_header()?;
        self.write_super_index_padding()?;
        self.writer.close_item(hdrl)?;
        Ok(())
    }

    fn write_main_header(&mut self) -> Result<()> {
        let rate = self.frame_rate()?;
        let (width, height) = self
            .streams
            .iter()
            .find_map(|s| s.video())
            .map(|v| (v.width, v.height))
            .unwrap_or((0, 0));

        let mut flags = AVIF_IS_INTERLEAVED | AVIF_TRUST_CK_TYPE;
        if self.config.emit_index1 {
            flags |= AVIF_HAS_INDEX;
        }

        // Suggested byte rate: frame rate times the per-stream peak chunk
        // sizes. Zero until the peaks are known at close.
        let peak_sum: u64 = self
            .index
            .iter()
            .map(|s| s.max_chunk_data_size as u64)
            .sum();
        let max_bytes_per_sec = (rate.to_f64() * peak_sum as f64).round() as u32;

        let chunk = self.writer.open_chunk_sized(tags::AVIH, MAIN_HEADER_SIZE)?;
        self.writer.write_u32(rate.micros_per_frame())?;
        self.writer.write_u32(max_bytes_per_sec)?;
        self.writer.write_u32(0)?; // padding granularity
        self.writer.write_u32(flags)?;
        self.writer.write_u32(self.riff_avi_frame_count)?;
        self.writer.write_u32(0)?; // initial frames
        self.writer.write_u32(self.streams.len() as u32)?;
        self.writer.write_u32(0)?; // suggested buffer size
        self.writer.write_u32(width)?;
        self.writer.write_u32(height)?;
        self.writer.skip_bytes(4 * 4)?; // reserved
        self.writer.close_item(chunk)?;
        Ok(())
    }

    fn write_stream_list(&mut self, stream: usize) -> Result<()> {
        let strl = self.writer.open_list(tags::STRL)?;
        self.write_stream_header(stream)?;
        self.write_stream_format(stream)?;
        self.write_stream_name(stream)?;
        self.write_stream_super_index(stream)?;
        self.writer.close_item(strl)?;
        Ok(())
    }

    fn write_stream_header(&mut self, stream: usize) -> Result<()> {
        let rate = self.frame_rate()?;
        let kind = self.streams[stream].kind().clone();
        let frame_count = self.index[stream].frame_count;
        let max_chunk = self.index[stream].max_chunk_data_size;
        let total_bytes = self.index[stream].total_data_size;

        let chunk = self.writer.open_chunk_sized(tags::STRH, STREAM_HEADER_SIZE)?;
        match kind {
            StreamKind::Video(v) => {
                self.writer.write_fourcc(tags::VIDS)?;
                self.writer.write_fourcc(v.codec)?; // handler
                self.writer.write_u32(0)?; // flags
                self.writer.write_u16(0)?; // priority
                self.writer.write_u16(0)?; // language
                self.writer.write_u32(0)?; // initial frames
                self.writer.write_u32(rate.den())?; // scale
                self.writer.write_u32(rate.num())?; // rate
                self.writer.write_u32(0)?; // start
                self.writer.write_u32(frame_count)?; // length
                self.writer.write_u32(max_chunk)?; // suggested buffer size
                self.writer.write_u32(0)?; // quality
                self.writer.write_u32(0)?; // sample size
                self.writer.write_i16(0)?;
                self.writer.write_i16(0)?;
                self.writer.write_i16(v.width as i16)?;
                self.writer.write_i16(v.height as i16)?;
            }
            StreamKind::Audio(a) => {
                self.writer.write_fourcc(tags::AUDS)?;
                self.writer.write_u32(0)?; // handler
                self.writer.write_u32(0)?; // flags
                self.writer.write_u16(0)?; // priority
                self.writer.write_u16(0)?; // language
                self.writer.write_u32(0)?; // initial frames
                self.writer.write_u32(a.granularity as u32)?; // scale
                self.writer.write_u32(a.bytes_per_second)?; // rate
                self.writer.write_u32(0)?; // start
                self.writer.write_u32(total_bytes as u32)?; // length in bytes
                self.writer.write_u32(a.bytes_per_second / 2)?; // suggested buffer size
                self.writer.write_i32(-1)?; // quality
                self.writer.write_u32(a.granularity as u32)?; // sample size
                self.writer.write_i16(0)?;
                self.writer.write_i16(0)?;
                self.writer.write_i16(0)?;
                self.writer.write_i16(0)?;
            }
        }
        self.writer.close_item(chunk)?;
        Ok(())
    }

    fn write_stream_format(&mut self, stream: usize) -> Result<()> {
        let kind = self.streams[stream].kind().clone();
        let chunk = self.writer.open_chunk(tags::STRF)?;
        match kind {
            StreamKind::Video(v) => {
                // BITMAPINFOHEADER
                let bits = v.bits_per_pixel.bits();
                let image_size = (v.width as u64 * v.height as u64 * bits as u64 / 8) as u32;
                self.writer.write_u32(40)?; // header size
                self.writer.write_i32(v.width as i32)?;
                self.writer.write_i32(v.height as i32)?;
                self.writer.write_u16(1)?; // planes
                self.writer.write_u16(bits)?;
                self.writer.write_fourcc(v.codec)?; // compression
                self.writer.write_u32(image_size)?;
                self.writer.write_u32(0)?; // x pixels per meter
                self.writer.write_u32(0)?; // y pixels per meter
                if v.bits_per_pixel == BitsPerPixel::Bpp8 && v.codec == codecs::UNCOMPRESSED {
                    self.writer.write_u32(256)?; // colors used
                    self.writer.write_u32(0)?; // colors important
                    for i in 0..=255u8 {
                        self.writer.write_all(&[i, i, i, 0])?;
                    }
                } else {
                    self.writer.write_u32(0)?;
                    self.writer.write_u32(0)?;
                }
            }
            StreamKind::Audio(a) => {
                // WAVEFORMATEX
                self.writer.write_u16(a.format_tag)?;
                self.writer.write_u16(a.channels)?;
                self.writer.write_u32(a.samples_per_second)?;
                self.writer.write_u32(a.bytes_per_second)?;
                self.writer.write_u16(a.granularity)?; // block align
                self.writer.write_u16(a.bits_per_sample)?;
                match &a.format_specific_data {
                    Some(extra) => {
                        self.writer.write_u16(extra.len() as u16)?;
                        self.writer.write_all(extra)?;
                    }
                    None => self.writer.write_u16(0)?,
                }
            }
        }
        self.writer.close_item(chunk)?;
        Ok(())
    }

    fn write_stream_name(&mut self, stream: usize) -> Result<()> {
        let name = match self.streams[stream].name() {
            Some(name) => name.to_owned(),
            None => return Ok(()),
        };
        let chunk = self.writer.open_chunk(tags::STRN)?;
        self.writer.write_all(name.as_bytes())?;
        self.writer.write_u8(0)?; // terminator
        self.writer.close_item(chunk)?;
        Ok(())
    }

    fn write_stream_super_index(&mut self, stream: usize) -> Result<()> {
        let chunk_id = match self.streams[stream].chunk_id() {
            Some(id) => id,
            None => return Err(AviError::config("stream is not frozen")),
        };
        let entries = self.index[stream].super_index.clone();

        let chunk = self.writer.open_chunk(tags::INDX)?;
        self.writer.write_u16(4)?; // longs per entry
        self.writer.write_u8(0)?; // index sub-type
        self.writer.write_u8(INDEX_TYPE_INDEXES)?;
        self.writer.write_u32(entries.len() as u32)?;
        self.writer.write_fourcc(chunk_id)?;
        self.writer.skip_bytes(3 * 4)?; // reserved
        for entry in &entries {
            self.writer.write_u64(entry.chunk_offset)?;
            self.writer.write_u32(entry.chunk_size)?;
            self.writer.write_u32(entry.duration)?;
        }
        self.writer.close_item(chunk)?;
        Ok(())
    }

    fn write_odml_header(&mut self) -> Result<()> {
        let total_frames = self
            .streams
            .iter()
            .zip(&self.index)
            .filter(|(s, _)| s.kind().is_video())
            .map(|(_, i)| i.frame_count)
            .max()
            .unwrap_or(0);

        let list = self.writer.open_list(tags::ODML)?;
        let chunk = self.writer.open_chunk(tags::DMLH)?;
        self.writer.write_u32(total_frames)?;
        self.writer.skip_bytes(DMLH_RESERVED_DWORDS * 4)?;
        self.writer.close_item(chunk)?;
        self.writer.close_item(list)?;
        Ok(())
    }

    /// Pad the header with a `JUNK` chunk covering the super-index slots not
    /// yet in use, so the header's byte length never changes.
    fn write_super_index_padding(&mut self) -> Result<()> {
        let missing: u64 = self
            .index
            .iter()
            .map(|s| (MAX_SUPER_INDEX_ENTRIES - s.super_index.len()) as u64)
            .sum();
        if missing == 0 {
            return Ok(());
        }
        let junk_size = missing * 16 - ITEM_HEADER_SIZE;
        let chunk = self.writer.open_chunk(tags::JUNK)?;
        self.writer.skip_bytes(junk_size)?;
        self.writer.close_item(chunk)?;
        Ok(())
    }

    /// Roll over to a fresh `AVIX` RIFF when the current one would exceed
    /// its size threshold after roughly `approx_next` more bytes.
    fn create_new_riff_if_needed(&mut self, approx_next: u64) -> Result<()> {
        let riff = match self.current_riff {
            Some(r) => r,
            None => return Err(AviError::config("no RIFF is open")),
        };
        let threshold = if self.is_first_riff {
            self.first_riff_threshold
        } else {
            self.next_riff_threshold
        };
        let mut estimated = self.writer.position()? + approx_next - riff.item_start();
        if self.is_first_riff && self.config.emit_index1 {
            // Account for the idx1 chunk the first RIFF will carry.
            estimated += ITEM_HEADER_SIZE + self.legacy_entry_count * INDEX1_ENTRY_SIZE;
        }
        if estimated <= threshold {
            return Ok(());
        }

        if let Some(movi) = self.current_movi.take() {
            self.writer.close_item(movi)?;
        }
        self.close_current_riff()?;

        let riff = self.writer.open_riff(tags::AVIX)?;
        self.current_riff = Some(riff);
        let movi = self.writer.open_list(tags::MOVI)?;
        self.current_movi = Some(movi);
        log::debug!("opened AVIX riff at {}", riff.item_start());
        Ok(())
    }

    /// Close the current RIFF. Closing the first RIFF captures the legacy
    /// frame count and emits `idx1` when enabled.
    fn close_current_riff(&mut self) -> Result<()> {
        if self.is_first_riff {
            self.riff_avi_frame_count = self
                .streams
                .iter()
                .zip(&self.index)
                .filter(|(s, _)| s.kind().is_video())
                .map(|(_, i)| i.frame_count)
                .max()
                .unwrap_or(0);
            if self.config.emit_index1 {
                self.write_index1()?;
            }
            self.is_first_riff = false;
        }
        if let Some(riff) = self.current_riff.take() {
            self.writer.close_item(riff)?;
        }
        Ok(())
    }

    /// Emit the legacy `idx1` chunk: a k-way merge of the per-stream legacy
    /// indices ordered by ascending offset.
    fn write_index1(&mut self) -> Result<()> {
        let chunk = self.writer.open_chunk(tags::IDX1)?;
        let mut cursors = vec![0usize; self.index.len()];
        loop {
            let mut best: Option<(usize, u32)> = None;
            for (stream, state) in self.index.iter().enumerate() {
                if let Some(entry) = state.legacy_index.get(cursors[stream]) {
                    if best.map_or(true, |(_, offset)| entry.data_offset < offset) {
                        best = Some((stream, entry.data_offset));
                    }
                }
            }
            let stream = match best {
                Some((stream, _)) => stream,
                None => break,
            };
            let entry = self.index[stream].legacy_index[cursors[stream]];
            cursors[stream] += 1;

            self.writer.write_fourcc(entry.chunk_id)?;
            self.writer
                .write_u32(if entry.is_key_frame { IDX1_KEYFRAME_FLAG } else { 0 })?;
            self.writer.write_u32(entry.data_offset)?;
            self.writer.write_u32(entry.data_size)?;
        }
        self.writer.close_item(chunk)?;
        Ok(())
    }

    /// Flush a stream's standard index into an `ix##` chunk and record it in
    /// the super index.
    fn flush_stream_index(&mut self, stream: usize) -> Result<()> {
        let entry_count = self.index[stream].standard_index.len();
        if entry_count == 0 {
            return Ok(());
        }
        if self.index[stream].super_index.len() >= MAX_SUPER_INDEX_ENTRIES {
            return Err(AviError::SuperIndexFull { index: stream });
        }
        let index_size = 24 + entry_count as u64 * 8;
        self.create_new_riff_if_needed(index_size)?;

        let chunk_id = match self.streams[stream].chunk_id() {
            Some(id) => id,
            None => return Err(AviError::config("stream is not frozen")),
        };
        let index_chunk_id = self.index[stream].index_chunk_id;
        let entries = std::mem::take(&mut self.index[stream].standard_index);
        let base_offset = entries[0].data_offset;

        let chunk = self
            .writer
            .open_chunk_sized(index_chunk_id, index_size as u32)?;
        self.writer.write_u16(2)?; // longs per entry
        self.writer.write_u8(0)?; // index sub-type
        self.writer.write_u8(INDEX_TYPE_CHUNKS)?;
        self.writer.write_u32(entries.len() as u32)?;
        self.writer.write_fourcc(chunk_id)?;
        self.writer.write_u64(base_offset)?;
        self.writer.write_u32(0)?; // reserved
        for entry in &entries {
            self.writer
                .write_u32((entry.data_offset - base_offset) as u32)?;
            self.writer.write_u32(entry.data_size)?;
        }
        self.writer.close_item(chunk)?;

        self.index[stream].super_index.push(SuperIndexEntry {
            chunk_offset: chunk.item_start(),
            chunk_size: (index_size + ITEM_HEADER_SIZE) as u32,
            duration: entries.len() as u32,
        });
        log::debug!(
            "flushed {} index entries for stream {}",
            entries.len(),
            stream
        );
        Ok(())
    }

    fn frame_rate(&self) -> Result<FrameRate> {
        match self.frame_rate {
            Some(rate) => Ok(rate),
            None => Err(AviError::config("frame rate is not frozen yet")),
        }
    }

    /// Finalize the file in place. Pending indices are flushed, the current
    /// RIFF is closed, and the header is rewritten with the true counts.
    pub fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.started {
            for stream in 0..self.streams.len() {
                self.flush_stream_index(stream)?;
            }
            if let Some(movi) = self.current_movi.take() {
                self.writer.close_item(movi)?;
            }
            self.close_current_riff()?;
            self.rewrite_header()?;
            self.writer.flush()?;
        }
        self.closed = true;
        log::debug!("avi muxer closed");
        Ok(())
    }

    /// Finalize and return the underlying sink.
    pub fn close(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.writer.into_inner())
    }

    /// Rewrite the header list in place with final counts. The trailing
    /// `JUNK` shrinks by exactly the super-index entries now in use, so the
    /// header's byte length must come out unchanged.
    fn rewrite_header(&mut self) -> Result<()> {
        let end = self.writer.position()?;
        self.writer.seek_to(HEADER_LIST_OFFSET)?;
        self.write_header()?;
        let rewritten_end = self.writer.position()?;
        if rewritten_end != self.header_list_end {
            return Err(AviError::HeaderLengthChanged {
                expected: self.header_list_end,
                actual: rewritten_end,
            });
        }
        self.writer.seek_to(end)?;
        Ok(())
    }
}
