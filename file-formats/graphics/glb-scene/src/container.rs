//! Binary container reader
//!
//! A GLB file is a 12-byte header followed by length-prefixed chunks. The
//! first chunk holds the glTF JSON document, the second (optional) chunk
//! holds the binary payload that buffer 0 refers to.
//!
//! ```text
//! +--------+---------+--------+   +--------+------+---------+   +--------+------+---------+
//! | magic  | version | length |   | length | JSON | payload |   | length | BIN  | payload |
//! +--------+---------+--------+   +--------+------+---------+   +--------+------+---------+
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::{GltfError, Result};
use crate::options::LoadOptions;
use crate::schema::Document;

/// Magic signature for GLB files ("glTF")
pub const GLB_MAGIC: u32 = 0x4654_6C67;
/// The only container version this reader accepts
pub const GLB_VERSION: u32 = 2;
/// Chunk type tag of the JSON chunk ("JSON")
pub const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;
/// Chunk type tag of the binary chunk ("BIN\0")
pub const CHUNK_TYPE_BIN: u32 = 0x004E_4942;
/// Size of the file header in bytes
pub const HEADER_SIZE: usize = 12;
/// Size of a chunk header in bytes
pub const CHUNK_HEADER_SIZE: usize = 8;

/// GLB file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbHeader {
    /// Magic signature, always [`GLB_MAGIC`] once validated
    pub magic: u32,
    /// Container version, always [`GLB_VERSION`] once validated
    pub version: u32,
    /// Total length of the container in bytes, header included
    pub length: u32,
}

impl GlbHeader {
    /// Read and validate the header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(GltfError::Truncated(format!(
                "need {} header bytes, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        let mut cursor = Cursor::new(data);
        let magic = cursor.read_u32::<LittleEndian>()?;
        if magic != GLB_MAGIC {
            return Err(GltfError::InvalidMagic {
                expected: "glTF".to_string(),
                actual: String::from_utf8_lossy(&data[0..4]).to_string(),
            });
        }

        let version = cursor.read_u32::<LittleEndian>()?;
        if version != GLB_VERSION {
            return Err(GltfError::UnsupportedVersion(version));
        }

        let length = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            magic,
            version,
            length,
        })
    }
}

/// Header of a single chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Payload length in bytes (header excluded)
    pub length: u32,
    /// Chunk type tag
    pub chunk_type: u32,
}

impl ChunkHeader {
    /// Read a chunk header at `offset`, making sure header and payload fit before `end`
    fn parse(data: &[u8], offset: usize, end: usize) -> Result<Self> {
        if offset + CHUNK_HEADER_SIZE > end {
            return Err(GltfError::Truncated(format!(
                "chunk header at offset {} runs past the end of the container ({} bytes)",
                offset, end
            )));
        }

        let mut cursor = Cursor::new(&data[offset..offset + CHUNK_HEADER_SIZE]);
        let length = cursor.read_u32::<LittleEndian>()?;
        let chunk_type = cursor.read_u32::<LittleEndian>()?;

        let payload_end = offset + CHUNK_HEADER_SIZE + length as usize;
        if payload_end > end {
            return Err(GltfError::Truncated(format!(
                "chunk 0x{:08X} declares {} bytes but only {} remain",
                chunk_type,
                length,
                end - offset - CHUNK_HEADER_SIZE
            )));
        }

        Ok(Self { length, chunk_type })
    }
}

/// A validated GLB container
///
/// Holds the original bytes plus the JSON and binary regions as zero-copy
/// slices of them, and the parsed glTF document.
#[derive(Debug, Clone)]
pub struct GlbContainer {
    header: GlbHeader,
    json: Bytes,
    binary: Option<Bytes>,
    document: Document,
}

impl GlbContainer {
    /// Parse a container with default options
    pub fn parse(data: impl Into<Bytes>) -> Result<Self> {
        Self::parse_with_options(data, &LoadOptions::default())
    }

    /// Parse a container
    ///
    /// Validation order: magic, version, declared length, JSON chunk type,
    /// then the type of the chunk immediately after the JSON chunk.
    pub fn parse_with_options(data: impl Into<Bytes>, options: &LoadOptions) -> Result<Self> {
        let data: Bytes = data.into();
        let header = GlbHeader::parse(&data)?;

        let end = header.length as usize;
        if end > data.len() {
            return Err(GltfError::Truncated(format!(
                "header declares {} bytes but the buffer holds {}",
                end,
                data.len()
            )));
        }
        if options.strict_length && end != data.len() {
            return Err(GltfError::ValidationError(format!(
                "header declares {} bytes but the buffer holds {}",
                end,
                data.len()
            )));
        }

        let json_header = ChunkHeader::parse(&data, HEADER_SIZE, end)?;
        if json_header.chunk_type != CHUNK_TYPE_JSON {
            return Err(GltfError::InvalidChunkType {
                expected: CHUNK_TYPE_JSON,
                actual: json_header.chunk_type,
            });
        }
        let json_start = HEADER_SIZE + CHUNK_HEADER_SIZE;
        let json_end = json_start + json_header.length as usize;
        let json = data.slice(json_start..json_end);
        log::debug!("JSON chunk: {} bytes", json.len());

        let binary = if json_end == end {
            None
        } else {
            let bin_header = ChunkHeader::parse(&data, json_end, end)?;
            if bin_header.chunk_type != CHUNK_TYPE_BIN {
                return Err(GltfError::InvalidChunkType {
                    expected: CHUNK_TYPE_BIN,
                    actual: bin_header.chunk_type,
                });
            }
            let bin_start = json_end + CHUNK_HEADER_SIZE;
            let bin_end = bin_start + bin_header.length as usize;
            log::debug!("BIN chunk: {} bytes", bin_header.length);

            if bin_end < end {
                log::debug!(
                    "Ignoring {} trailing bytes after the BIN chunk",
                    end - bin_end
                );
            }

            Some(data.slice(bin_start..bin_end))
        };

        let document: Document = serde_json::from_slice(trim_padding(&json))?;
        if !document.asset.version.starts_with('2') {
            log::warn!(
                "Document declares asset version '{}', reading it as 2.0",
                document.asset.version
            );
        }

        Ok(Self {
            header,
            json,
            binary,
            document,
        })
    }

    /// Read a container from disk with default options
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_options(path, &LoadOptions::default())
    }

    /// Read a container from disk
    pub fn load_with_options<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        log::debug!(
            "Read {} bytes from {}",
            data.len(),
            path.as_ref().display()
        );
        Self::parse_with_options(data, options)
    }

    /// The validated file header
    pub fn header(&self) -> &GlbHeader {
        &self.header
    }

    /// Raw JSON chunk payload, padding included
    pub fn json_chunk(&self) -> &[u8] {
        &self.json
    }

    /// Binary chunk payload, if the container has one
    pub fn binary_chunk(&self) -> Option<&Bytes> {
        self.binary.as_ref()
    }

    /// The parsed glTF document
    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// JSON chunks are padded with spaces; some writers pad with NULs instead
fn trim_padding(json: &[u8]) -> &[u8] {
    let end = json
        .iter()
        .rposition(|&b| b != 0 && !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &json[..end]
}
