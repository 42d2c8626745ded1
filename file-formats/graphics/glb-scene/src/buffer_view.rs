//! Buffer views: byte windows into the binary chunk
//!
//! A view never copies the payload; it holds a reference-counted slice of the
//! container's binary chunk. Usage flags accumulate as accessors are bound to
//! mesh attributes or index lists, and the view is uploaded to the GPU at most
//! once.

use bitflags::bitflags;
use bytes::Bytes;
use std::borrow::Cow;

use crate::error::{GltfError, Result};

/// glTF `target` hint for vertex attribute data
pub const TARGET_ARRAY_BUFFER: u32 = 34962;
/// glTF `target` hint for index data
pub const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

bitflags! {
    /// How a buffer view will be bound on the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        /// Vertex attribute data
        const VERTEX = 0x0001;
        /// Index list
        const INDEX = 0x0002;
        /// Uniform block
        const UNIFORM = 0x0004;
        /// Read-only storage buffer
        const STORAGE = 0x0008;
        /// Destination of later buffer writes
        const COPY_DST = 0x0010;
    }
}

impl BufferUsage {
    /// Usage implied by a glTF `target` hint
    pub fn from_target(target: Option<u32>) -> Self {
        match target {
            Some(TARGET_ARRAY_BUFFER) => Self::VERTEX,
            Some(TARGET_ELEMENT_ARRAY_BUFFER) => Self::INDEX,
            _ => Self::empty(),
        }
    }
}

/// Device handle provided by the renderer
///
/// The loader only asks the device to create GPU copies of already
/// validated byte ranges; binding and drawing stay with the renderer.
pub trait GpuDevice {
    /// Handle of a created GPU buffer
    type Buffer;

    /// Create a buffer initialised with `contents`.
    /// `contents.len()` is always a multiple of 4.
    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> Self::Buffer;
}

/// A byte range of the binary chunk
#[derive(Debug, Clone)]
pub struct BufferView {
    index: usize,
    data: Bytes,
    byte_offset: usize,
    byte_stride: Option<usize>,
    usage: BufferUsage,
    uploaded: bool,
}

impl BufferView {
    /// Create a view over `binary[byte_offset..byte_offset + byte_length]`
    pub fn new(
        index: usize,
        binary: &Bytes,
        byte_offset: usize,
        byte_length: usize,
        byte_stride: Option<usize>,
    ) -> Result<Self> {
        let end = byte_offset
            .checked_add(byte_length)
            .filter(|&end| end <= binary.len())
            .ok_or_else(|| {
                GltfError::ReferenceError(format!(
                    "buffer view {} range {}+{} exceeds the binary chunk ({} bytes)",
                    index,
                    byte_offset,
                    byte_length,
                    binary.len()
                ))
            })?;

        Ok(Self {
            index,
            data: binary.slice(byte_offset..end),
            byte_offset,
            byte_stride: byte_stride.filter(|&stride| stride > 0),
            usage: BufferUsage::empty(),
            uploaded: false,
        })
    }

    /// Index of this view in the document
    pub fn index(&self) -> usize {
        self.index
    }

    /// The viewed bytes
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Offset of the view inside the binary chunk
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    /// Declared stride, 0 when the data is tightly packed
    pub fn byte_stride(&self) -> usize {
        self.byte_stride.unwrap_or(0)
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// OR additional usage flags into the view
    pub fn add_usage(&mut self, usage: BufferUsage) {
        self.usage |= usage;
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded
    }

    /// Length of the GPU copy, rounded up to a 4-byte boundary
    pub fn padded_length(&self) -> usize {
        self.data.len().next_multiple_of(4)
    }

    /// Create the GPU copy of this view
    ///
    /// Returns `None` when the view was already uploaded.
    pub fn upload<D: GpuDevice>(&mut self, device: &mut D) -> Option<D::Buffer> {
        if self.uploaded {
            return None;
        }

        let contents: Cow<'_, [u8]> = if self.data.len() % 4 == 0 {
            Cow::Borrowed(self.data.as_ref())
        } else {
            let mut padded = self.data.to_vec();
            padded.resize(self.padded_length(), 0);
            Cow::Owned(padded)
        };

        let label = format!("buffer_view_{}", self.index);
        log::trace!(
            "Uploading {} ({} bytes, usage {:?})",
            label,
            contents.len(),
            self.usage
        );
        let buffer = device.create_buffer(&label, self.usage, &contents);
        self.uploaded = true;
        Some(buffer)
    }
}
