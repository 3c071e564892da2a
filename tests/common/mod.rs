//! Read-side helpers for inspecting muxer output.
//!
//! The crate itself is write-only, so these tests walk the produced bytes
//! directly: chunk traversal plus small parsers for the header structures.

#![allow(dead_code)]

pub fn u16le(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([data[off], data[off + 1]])
}

pub fn u32le(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

pub fn u64le(data: &[u8], off: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[off..off + 8]);
    u64::from_le_bytes(bytes)
}

pub fn tag(data: &[u8], off: usize) -> [u8; 4] {
    [data[off], data[off + 1], data[off + 2], data[off + 3]]
}

/// A chunk located within the file buffer.
#[derive(Debug, Clone, Copy)]
pub struct Chunk {
    pub id: [u8; 4],
    /// Offset of the chunk's tag within the file.
    pub offset: usize,
    /// Declared data size.
    pub size: u32,
    /// Offset of the chunk's data within the file.
    pub data_offset: usize,
}

impl Chunk {
    pub fn data<'a>(&self, file: &'a [u8]) -> &'a [u8] {
        &file[self.data_offset..self.data_offset + self.size as usize]
    }

    /// Form tag of a `RIFF`/`LIST` chunk (first four data bytes).
    pub fn form(&self, file: &[u8]) -> [u8; 4] {
        tag(file, self.data_offset)
    }

    /// Child chunks of a `RIFF`/`LIST` chunk (after the form tag).
    pub fn children(&self, file: &[u8]) -> Vec<Chunk> {
        walk(
            file,
            self.data_offset + 4,
            self.data_offset + self.size as usize,
        )
    }
}

/// Walk sibling chunks in `file[start..end)`, honoring word padding.
pub fn walk(file: &[u8], start: usize, end: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut off = start;
    while off + 8 <= end {
        let id = tag(file, off);
        let size = u32le(file, off + 4);
        let data_offset = off + 8;
        chunks.push(Chunk {
            id,
            offset: off,
            size,
            data_offset,
        });
        let mut next = data_offset + size as usize;
        if next % 2 == 1 {
            next += 1;
        }
        off = next;
    }
    chunks
}

/// Top-level RIFF segments of the file.
pub fn riff_segments(file: &[u8]) -> Vec<Chunk> {
    let segments = walk(file, 0, file.len());
    assert!(segments.iter().all(|c| &c.id == b"RIFF"));
    segments
}

pub fn find(chunks: &[Chunk], id: &[u8; 4]) -> Option<Chunk> {
    chunks.iter().find(|c| &c.id == id).copied()
}

pub fn find_all(chunks: &[Chunk], id: &[u8; 4]) -> Vec<Chunk> {
    chunks.iter().filter(|c| &c.id == id).copied().collect()
}

/// Find a `LIST` chunk with the given form tag.
pub fn find_list(chunks: &[Chunk], file: &[u8], form: &[u8; 4]) -> Option<Chunk> {
    chunks
        .iter()
        .find(|c| &c.id == b"LIST" && &c.form(file) == form)
        .copied()
}

/// Parsed `avih` main header.
#[derive(Debug)]
pub struct MainHeader {
    pub micros_per_frame: u32,
    pub max_bytes_per_sec: u32,
    pub flags: u32,
    pub total_frames: u32,
    pub streams: u32,
    pub width: u32,
    pub height: u32,
}

pub fn parse_avih(data: &[u8]) -> MainHeader {
    assert_eq!(data.len(), 56);
    MainHeader {
        micros_per_frame: u32le(data, 0),
        max_bytes_per_sec: u32le(data, 4),
        flags: u32le(data, 12),
        total_frames: u32le(data, 16),
        streams: u32le(data, 24),
        width: u32le(data, 32),
        height: u32le(data, 36),
    }
}

/// Parsed `strh` stream header.
#[derive(Debug)]
pub struct StreamHeader {
    pub fcc_type: [u8; 4],
    pub handler: u32,
    pub scale: u32,
    pub rate: u32,
    pub length: u32,
    pub suggested_buffer_size: u32,
    pub quality: u32,
    pub sample_size: u32,
}

pub fn parse_strh(data: &[u8]) -> StreamHeader {
    assert_eq!(data.len(), 56);
    StreamHeader {
        fcc_type: tag(data, 0),
        handler: u32le(data, 4),
        scale: u32le(data, 20),
        rate: u32le(data, 24),
        length: u32le(data, 32),
        suggested_buffer_size: u32le(data, 36),
        quality: u32le(data, 40),
        sample_size: u32le(data, 44),
    }
}

/// Parsed `indx` super index.
#[derive(Debug)]
pub struct SuperIndex {
    pub longs_per_entry: u16,
    pub index_type: u8,
    pub entries_in_use: u32,
    pub chunk_id: [u8; 4],
    /// `(chunk_offset, chunk_size, duration)` for entries in use.
    pub entries: Vec<(u64, u32, u32)>,
}

pub fn parse_indx(data: &[u8]) -> SuperIndex {
    let entries_in_use = u32le(data, 4);
    let mut entries = Vec::new();
    for i in 0..entries_in_use as usize {
        let off = 24 + i * 16;
        entries.push((u64le(data, off), u32le(data, off + 8), u32le(data, off + 12)));
    }
    SuperIndex {
        longs_per_entry: u16le(data, 0),
        index_type: data[3],
        entries_in_use,
        chunk_id: tag(data, 8),
        entries,
    }
}

/// Parsed `ix##` standard index.
#[derive(Debug)]
pub struct StandardIndex {
    pub longs_per_entry: u16,
    pub index_type: u8,
    pub entry_count: u32,
    pub chunk_id: [u8; 4],
    pub base_offset: u64,
    /// `(relative_offset, data_size)`; bit 31 of the size marks non-key.
    pub entries: Vec<(u32, u32)>,
}

pub fn parse_ix(data: &[u8]) -> StandardIndex {
    let entry_count = u32le(data, 4);
    assert_eq!(data.len(), 24 + entry_count as usize * 8);
    let mut entries = Vec::new();
    for i in 0..entry_count as usize {
        let off = 24 + i * 8;
        entries.push((u32le(data, off), u32le(data, off + 4)));
    }
    StandardIndex {
        longs_per_entry: u16le(data, 0),
        index_type: data[3],
        entry_count,
        chunk_id: tag(data, 8),
        base_offset: u64le(data, 12),
        entries,
    }
}

/// Parsed `idx1` entries: `(chunk_id, flags, offset, size)`.
pub fn parse_idx1(data: &[u8]) -> Vec<([u8; 4], u32, u32, u32)> {
    assert_eq!(data.len() % 16, 0);
    (0..data.len() / 16)
        .map(|i| {
            let off = i * 16;
            (
                tag(data, off),
                u32le(data, off + 4),
                u32le(data, off + 8),
                u32le(data, off + 12),
            )
        })
        .collect()
}
