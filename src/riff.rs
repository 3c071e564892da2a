//! Two-phase RIFF chunk writing.
//!
//! Chunks and lists are opened with their 8-byte header reserved up front;
//! closing an item either verifies the declared size or seeks back and
//! patches the size field with the bytes actually written. All multi-byte
//! fields are unsigned little-endian.

use crate::error::{AviError, Result};
use crate::fourcc::{tags, FourCC};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Seek, SeekFrom, Write};

/// Size of a chunk header (tag + size field).
pub const ITEM_HEADER_SIZE: u64 = 8;

/// Largest data size representable in a RIFF size field.
pub(crate) const MAX_ITEM_DATA_SIZE: u64 = u32::MAX as u64 - ITEM_HEADER_SIZE;

/// Reusable zero-fill buffer for `skip_bytes`.
const ZERO_BUF: [u8; 1024] = [0; 1024];

/// Handle to an open chunk or list.
#[derive(Debug, Clone, Copy)]
pub struct RiffItem {
    item_start: u64,
    declared_size: Option<u32>,
}

impl RiffItem {
    /// Byte offset of the item's tag.
    pub fn item_start(&self) -> u64 {
        self.item_start
    }

    /// Byte offset where the item's data begins.
    pub fn data_start(&self) -> u64 {
        self.item_start + ITEM_HEADER_SIZE
    }

    /// Declared data size, if the item was opened with one.
    pub fn declared_size(&self) -> Option<u32> {
        self.declared_size
    }
}

/// Writer for a RIFF tree over a seekable byte sink.
pub struct RiffWriter<W: Write + Seek> {
    sink: W,
}

impl<W: Write + Seek> RiffWriter<W> {
    /// Create a writer over a seekable sink.
    pub fn new(sink: W) -> Self {
        RiffWriter { sink }
    }

    /// Current absolute position in the sink.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.sink.stream_position()?)
    }

    /// Seek to an absolute position.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.sink.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Open a chunk whose size will be patched on close.
    pub fn open_chunk(&mut self, tag: FourCC) -> Result<RiffItem> {
        self.open_item(tag, None)
    }

    /// Open a chunk with a declared data size; close verifies it.
    pub fn open_chunk_sized(&mut self, tag: FourCC, size: u32) -> Result<RiffItem> {
        self.open_item(tag, Some(size))
    }

    /// Open a `LIST` item with the given form tag as its first data bytes.
    pub fn open_list(&mut self, form: FourCC) -> Result<RiffItem> {
        self.open_container(tags::LIST, form)
    }

    /// Open an outer `RIFF` item with the given form tag.
    pub fn open_riff(&mut self, form: FourCC) -> Result<RiffItem> {
        self.open_container(tags::RIFF, form)
    }

    fn open_container(&mut self, container: FourCC, form: FourCC) -> Result<RiffItem> {
        let item = self.open_item(container, None)?;
        self.sink.write_u32::<LittleEndian>(form.to_u32())?;
        Ok(item)
    }

    fn open_item(&mut self, tag: FourCC, size: Option<u32>) -> Result<RiffItem> {
        if let Some(size) = size {
            if size as u64 > MAX_ITEM_DATA_SIZE {
                return Err(AviError::ChunkTooLarge { size: size as u64 });
            }
        }
        let item_start = self.sink.stream_position()?;
        self.sink.write_u32::<LittleEndian>(tag.to_u32())?;
        self.sink.write_u32::<LittleEndian>(size.unwrap_or(0))?;
        Ok(RiffItem {
            item_start,
            declared_size: size,
        })
    }

    /// Close an item: verify or back-patch its size, then pad to a 16-bit
    /// word boundary with a zero byte.
    pub fn close_item(&mut self, item: RiffItem) -> Result<()> {
        let end = self.sink.stream_position()?;
        let actual = end - item.data_start();
        if actual > MAX_ITEM_DATA_SIZE {
            return Err(AviError::ChunkTooLarge { size: actual });
        }
        match item.declared_size {
            Some(declared) => {
                if declared as u64 != actual {
                    return Err(AviError::SizeMismatch { declared, actual });
                }
            }
            None => {
                self.sink.seek(SeekFrom::Start(item.item_start + 4))?;
                self.sink.write_u32::<LittleEndian>(actual as u32)?;
                self.sink.seek(SeekFrom::Start(end))?;
            }
        }
        if end % 2 != 0 {
            self.sink.write_u8(0)?;
        }
        Ok(())
    }

    /// Write `count` zero bytes.
    pub fn skip_bytes(&mut self, mut count: u64) -> Result<()> {
        while count > 0 {
            let n = count.min(ZERO_BUF.len() as u64) as usize;
            self.sink.write_all(&ZERO_BUF[..n])?;
            count -= n as u64;
        }
        Ok(())
    }

    /// Write raw bytes at the current position.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.sink.write_all(data)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.sink.write_u8(value)?;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.sink.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.sink.write_i16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.sink.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.sink.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.sink.write_u64::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_fourcc(&mut self, tag: FourCC) -> Result<()> {
        self.sink.write_u32::<LittleEndian>(tag.to_u32())?;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Unwrap the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}
