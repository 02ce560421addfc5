//! HotSpot 性能数据文件（hsperfdata）解码
//!
//! JVM 启动后会把性能计数器映射到 `<tmp>/hsperfdata_<user>/<pid>`，
//! 本地 JMX 连接器的地址也作为字符串计数器发布在其中。
//!
//! 文件布局（v2）：
//!
//! ```text
//! prologue (32 字节)
//!   magic        [u8; 4]  固定为 CA FE C0 C0
//!   byte_order   u8       0 = 大端, 1 = 小端
//!   major        u8
//!   minor        u8
//!   accessible   u8
//!   used         i32
//!   overflow     i32
//!   mod_time     i64
//!   entry_offset i32
//!   num_entries  i32
//! entry header (20 字节)
//!   entry_length i32, name_offset i32, vector_length i32,
//!   data_type u8, flags u8, data_units u8, data_variability u8, data_offset i32
//! ```

use std::collections::HashMap;
use thiserror::Error;

const MAGIC: [u8; 4] = [0xca, 0xfe, 0xc0, 0xc0];
const PROLOGUE_LEN: usize = 32;
const ENTRY_HEADER_LEN: usize = 20;
const SUPPORTED_MAJOR: u8 = 2;

const TYPE_BYTE: u8 = b'B';
const TYPE_LONG: u8 = b'J';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PerfDataError {
    #[error("buffer too short: need {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unknown byte order flag {0}")]
    BadByteOrder(u8),

    #[error("unsupported perfdata version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("perfdata buffer is not yet accessible")]
    NotAccessible,

    #[error("corrupt entry #{index}: {reason}")]
    CorruptEntry { index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerfValue {
    Long(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Big,
    Little,
}

struct Reader<'a> {
    buf: &'a [u8],
    order: ByteOrder,
}

impl<'a> Reader<'a> {
    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], PerfDataError> {
        offset
            .checked_add(len)
            .and_then(|end| self.buf.get(offset..end))
            .ok_or(PerfDataError::Truncated {
                offset,
                needed: len,
                len: self.buf.len(),
            })
    }

    fn u8(&self, offset: usize) -> Result<u8, PerfDataError> {
        Ok(self.slice(offset, 1)?[0])
    }

    fn i32(&self, offset: usize) -> Result<i32, PerfDataError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.slice(offset, 4)?);
        Ok(match self.order {
            ByteOrder::Big => i32::from_be_bytes(raw),
            ByteOrder::Little => i32::from_le_bytes(raw),
        })
    }

    fn i64(&self, offset: usize) -> Result<i64, PerfDataError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.slice(offset, 8)?);
        Ok(match self.order {
            ByteOrder::Big => i64::from_be_bytes(raw),
            ByteOrder::Little => i64::from_le_bytes(raw),
        })
    }
}

/// 解码后的计数器集合
#[derive(Debug, Clone, Default)]
pub struct PerfData {
    counters: HashMap<String, PerfValue>,
}

impl PerfData {
    pub fn parse(buf: &[u8]) -> Result<Self, PerfDataError> {
        let header = Reader {
            buf,
            order: ByteOrder::Big,
        };

        let magic = header.slice(0, 4)?;
        if magic != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(PerfDataError::BadMagic(found));
        }

        let order = match header.u8(4)? {
            0 => ByteOrder::Big,
            1 => ByteOrder::Little,
            other => return Err(PerfDataError::BadByteOrder(other)),
        };
        let major = header.u8(5)?;
        let minor = header.u8(6)?;
        if major != SUPPORTED_MAJOR {
            return Err(PerfDataError::UnsupportedVersion { major, minor });
        }
        if header.u8(7)? == 0 {
            return Err(PerfDataError::NotAccessible);
        }

        let r = Reader { buf, order };
        r.slice(0, PROLOGUE_LEN)?;
        let entry_offset = r.i32(24)?;
        let num_entries = r.i32(28)?;
        let mut offset = usize::try_from(entry_offset).map_err(|_| PerfDataError::CorruptEntry {
            index: 0,
            reason: format!("negative entry offset {}", entry_offset),
        })?;
        let num_entries = usize::try_from(num_entries).map_err(|_| PerfDataError::CorruptEntry {
            index: 0,
            reason: format!("negative entry count {}", num_entries),
        })?;
        // 每个条目至少包含一个条目头，条目数不能超过缓冲区容量
        let room = buf.len().saturating_sub(offset) / ENTRY_HEADER_LEN;
        if num_entries > room {
            return Err(PerfDataError::CorruptEntry {
                index: 0,
                reason: format!(
                    "{} entries cannot fit in {} bytes after offset {}",
                    num_entries,
                    buf.len(),
                    offset
                ),
            });
        }

        let mut counters = HashMap::new();
        for index in 0..num_entries {
            let corrupt = |reason: String| PerfDataError::CorruptEntry { index, reason };

            let entry_length = r.i32(offset)?;
            let name_offset = r.i32(offset + 4)?;
            let vector_length = r.i32(offset + 8)?;
            let data_type = r.u8(offset + 12)?;
            let data_offset = r.i32(offset + 16)?;

            let entry_length = usize::try_from(entry_length)
                .ok()
                .filter(|len| *len >= ENTRY_HEADER_LEN)
                .ok_or_else(|| corrupt(format!("bad entry length {}", entry_length)))?;
            let name_offset = usize::try_from(name_offset)
                .map_err(|_| corrupt(format!("bad name offset {}", name_offset)))?;
            let data_offset = usize::try_from(data_offset)
                .map_err(|_| corrupt(format!("bad data offset {}", data_offset)))?;
            let vector_length = usize::try_from(vector_length)
                .map_err(|_| corrupt(format!("bad vector length {}", vector_length)))?;

            let entry = r.slice(offset, entry_length)?;
            let name = entry
                .get(name_offset..)
                .map(until_nul)
                .ok_or_else(|| corrupt("name outside entry".to_string()))?;
            let name = String::from_utf8_lossy(name).into_owned();

            let value = match (data_type, vector_length) {
                (TYPE_LONG, 0) => {
                    let value = Reader { buf: entry, order }
                        .i64(data_offset)
                        .map_err(|_| corrupt(format!("long data of '{}' outside entry", name)))?;
                    Some(PerfValue::Long(value))
                }
                (TYPE_BYTE, len) if len > 0 => {
                    let raw = entry
                        .get(data_offset..)
                        .and_then(|data| data.get(..len))
                        .ok_or_else(|| corrupt(format!("string data of '{}' outside entry", name)))?;
                    Some(PerfValue::Text(String::from_utf8_lossy(until_nul(raw)).into_owned()))
                }
                _ => None,
            };

            if let Some(value) = value {
                counters.insert(name, value);
            }
            offset += entry_length;
        }

        Ok(Self { counters })
    }

    pub fn get(&self, name: &str) -> Option<&PerfValue> {
        self.counters.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.counters.get(name) {
            Some(PerfValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
