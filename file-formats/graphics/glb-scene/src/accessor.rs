//! Accessors: typed interpretation of buffer views
//!
//! Every supported component encoding is a variant of [`ComponentType`] and
//! owns exactly one conversion routine; readers never branch on raw type
//! codes.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use glam::{Mat4, Quat, Vec3};
use std::borrow::Cow;
use std::fmt;

use crate::buffer_view::BufferView;
use crate::error::{GltfError, Result};

/// Numeric encoding of a single accessor component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ComponentType {
    I8 = 5120,
    U8 = 5121,
    I16 = 5122,
    U16 = 5123,
    I32 = 5124,
    U32 = 5125,
    F32 = 5126,
}

impl ComponentType {
    /// Size of one component in bytes
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
        }
    }

    /// Read one component and widen it to `f32` (no normalization)
    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        match self {
            Self::I8 => f32::from(bytes[0] as i8),
            Self::U8 => f32::from(bytes[0]),
            Self::I16 => f32::from(LittleEndian::read_i16(bytes)),
            Self::U16 => f32::from(LittleEndian::read_u16(bytes)),
            Self::I32 => LittleEndian::read_i32(bytes) as f32,
            Self::U32 => LittleEndian::read_u32(bytes) as f32,
            Self::F32 => LittleEndian::read_f32(bytes),
        }
    }

    /// Read one component as an unsigned integer
    ///
    /// Negative values saturate to 0, floats are truncated.
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            Self::I8 => (bytes[0] as i8).max(0) as u32,
            Self::U8 => u32::from(bytes[0]),
            Self::I16 => LittleEndian::read_i16(bytes).max(0) as u32,
            Self::U16 => u32::from(LittleEndian::read_u16(bytes)),
            Self::I32 => LittleEndian::read_i32(bytes).max(0) as u32,
            Self::U32 => LittleEndian::read_u32(bytes),
            Self::F32 => LittleEndian::read_f32(bytes) as u32,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::F32)
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = GltfError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            5120 => Ok(Self::I8),
            5121 => Ok(Self::U8),
            5122 => Ok(Self::I16),
            5123 => Ok(Self::U16),
            5124 => Ok(Self::I32),
            5125 => Ok(Self::U32),
            5126 => Ok(Self::F32),
            _ => Err(GltfError::UnsupportedComponentType(value)),
        }
    }
}

/// Shape of one accessor element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl StructureType {
    /// Parse the glTF `type` string
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "SCALAR" => Ok(Self::Scalar),
            "VEC2" => Ok(Self::Vec2),
            "VEC3" => Ok(Self::Vec3),
            "VEC4" => Ok(Self::Vec4),
            "MAT2" => Ok(Self::Mat2),
            "MAT3" => Ok(Self::Mat3),
            "MAT4" => Ok(Self::Mat4),
            other => Err(GltfError::UnsupportedStructureType(other.to_string())),
        }
    }

    /// Number of components in one element
    pub fn num_components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        };
        f.write_str(name)
    }
}

/// Typed view over a [`BufferView`]
#[derive(Debug, Clone)]
pub struct Accessor {
    index: usize,
    component_type: ComponentType,
    structure_type: StructureType,
    count: usize,
    byte_offset: usize,
    buffer_view: usize,
    normalized: bool,
    /// Bytes of the backing view, starting at the view's origin
    data: Bytes,
    byte_stride: usize,
}

impl Accessor {
    /// Bind an accessor to its buffer view, checking that every element fits
    ///
    /// The last element only needs its own bytes, so the check is
    /// `offset + (count - 1) * stride + element_size <= view length` rather
    /// than `count * stride <= view length`. A strided view whose final
    /// element ends before a full stride is accepted.
    pub fn new(
        index: usize,
        component_type: ComponentType,
        structure_type: StructureType,
        count: usize,
        byte_offset: usize,
        view: &BufferView,
    ) -> Result<Self> {
        let element_size = component_type.size() * structure_type.num_components();
        let byte_stride = element_size.max(view.byte_stride());

        // Last element needs only its own bytes, not a full stride
        let required = match count {
            0 => Some(byte_offset),
            n => (n - 1)
                .checked_mul(byte_stride)
                .and_then(|span| span.checked_add(byte_offset))
                .and_then(|span| span.checked_add(element_size)),
        };
        match required {
            Some(required) if required <= view.byte_length() => {}
            _ => {
                return Err(GltfError::ValidationError(format!(
                    "accessor {} ({} x {} {:?}, offset {}, stride {}) overruns buffer view {} ({} bytes)",
                    index,
                    count,
                    structure_type,
                    component_type,
                    byte_offset,
                    byte_stride,
                    view.index(),
                    view.byte_length()
                )));
            }
        }

        Ok(Self {
            index,
            component_type,
            structure_type,
            count,
            byte_offset,
            buffer_view: view.index(),
            normalized: false,
            data: view.bytes().clone(),
            byte_stride,
        })
    }

    /// Mark the accessor as normalized (informational; reads stay raw)
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn structure_type(&self) -> StructureType {
        self.structure_type
    }

    /// Number of elements
    pub fn count(&self) -> usize {
        self.count
    }

    /// Offset relative to the start of the buffer view
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Index of the backing buffer view
    pub fn buffer_view(&self) -> usize {
        self.buffer_view
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Size of one element in bytes
    pub fn element_byte_size(&self) -> usize {
        self.component_type.size() * self.structure_type.num_components()
    }

    /// Distance between consecutive elements in bytes
    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }

    fn element(&self, index: usize) -> &[u8] {
        let start = self.byte_offset + index * self.byte_stride;
        &self.data[start..start + self.element_byte_size()]
    }

    /// Visit every component in element order
    fn for_each_component(&self, mut f: impl FnMut(&[u8])) {
        let size = self.component_type.size();
        for i in 0..self.count {
            for component in self.element(i).chunks_exact(size) {
                f(component);
            }
        }
    }

    /// Read every component as `f32`
    ///
    /// Tightly packed, aligned `f32` data on a little-endian host is
    /// reinterpreted in place; everything else is converted element by element.
    pub fn read_as_f32(&self) -> Cow<'_, [f32]> {
        let element_size = self.element_byte_size();
        if self.component_type == ComponentType::F32
            && self.byte_stride == element_size
            && cfg!(target_endian = "little")
        {
            let start = self.byte_offset;
            let end = start + self.count * element_size;
            if let Ok(floats) = bytemuck::try_cast_slice::<u8, f32>(&self.data[start..end]) {
                return Cow::Borrowed(floats);
            }
            log::trace!("Accessor {} is unaligned, copying", self.index);
        }

        let mut out = Vec::with_capacity(self.count * self.structure_type.num_components());
        let component_type = self.component_type;
        self.for_each_component(|bytes| out.push(component_type.read_f32(bytes)));
        Cow::Owned(out)
    }

    /// Read every component as `u32` (index lists, joint indices)
    pub fn read_as_u32(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.count * self.structure_type.num_components());
        let component_type = self.component_type;
        self.for_each_component(|bytes| out.push(component_type.read_u32(bytes)));
        out
    }

    fn expect_structure(&self, expected: StructureType) -> Result<()> {
        if self.structure_type == expected {
            Ok(())
        } else {
            Err(GltfError::ValidationError(format!(
                "accessor {} is {}, expected {}",
                self.index, self.structure_type, expected
            )))
        }
    }

    /// Read a `SCALAR` accessor
    pub fn read_scalars(&self) -> Result<Vec<f32>> {
        self.expect_structure(StructureType::Scalar)?;
        Ok(self.read_as_f32().into_owned())
    }

    /// Read a `VEC3` accessor
    pub fn read_vec3(&self) -> Result<Vec<Vec3>> {
        self.expect_structure(StructureType::Vec3)?;
        Ok(self
            .read_as_f32()
            .chunks_exact(3)
            .map(Vec3::from_slice)
            .collect())
    }

    /// Read a `VEC4` accessor as `[x, y, z, w]` quaternions
    pub fn read_quat(&self) -> Result<Vec<Quat>> {
        self.expect_structure(StructureType::Vec4)?;
        Ok(self
            .read_as_f32()
            .chunks_exact(4)
            .map(Quat::from_slice)
            .collect())
    }

    /// Read a `MAT4` accessor of 32-bit floats (column-major)
    pub fn read_mat4(&self) -> Result<Vec<Mat4>> {
        if self.structure_type != StructureType::Mat4 || self.component_type != ComponentType::F32
        {
            return Err(GltfError::UnsupportedFeature(format!(
                "accessor {} is {} of {:?}, expected MAT4 of F32",
                self.index, self.structure_type, self.component_type
            )));
        }
        Ok(self
            .read_as_f32()
            .chunks_exact(16)
            .map(Mat4::from_cols_slice)
            .collect())
    }
}
