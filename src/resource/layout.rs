use crate::context::GraphicsContext;
use crate::error::Error;

use super::vertex_array::VertexArray;

/// Enumerates the component types of a vertex attribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AttributeType {
    Float,
    Int,
    UnsignedInt,
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
}

impl AttributeType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            AttributeType::Float | AttributeType::Int | AttributeType::UnsignedInt => 4,
            AttributeType::Short | AttributeType::UnsignedShort => 2,
            AttributeType::Byte | AttributeType::UnsignedByte => 1,
        }
    }

    pub fn is_integer(&self) -> bool {
        *self != AttributeType::Float
    }
}

/// Describes how a shader input reads its values from the vertex buffer of a [VertexArray].
///
/// `stride` and `offset` are in bytes. A `divisor` of `0` advances the attribute once per vertex;
/// a positive divisor `n` advances it once every `n` instances.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VertexAttribute {
    pub location: u32,
    pub size: i32,
    pub attribute_type: AttributeType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: usize,
    pub divisor: u32,
}

impl VertexAttribute {
    /// Whether the shader receives the values of this attribute as integers.
    ///
    /// Normalized integer attributes are converted to floating point and therefore don't count.
    pub fn is_integer(&self) -> bool {
        self.attribute_type.is_integer() && !self.normalized
    }
}

/// Builds the attributes of an interleaved vertex format.
///
/// Each `add_*` call appends an attribute at the current end of the vertex and grows the stride
/// by the attribute's size. An attribute has between 1 and 4 components; any other count is
/// rejected with [Error::InvalidComponentCount]. The accumulated stride is applied to every
/// attribute:
///
/// ```
/// use glitz_pipeline::resource::VertexLayout;
///
/// let layout = VertexLayout::new()
///     .add_float(0, 3)?
///     .add_float(1, 2)?;
///
/// assert_eq!(layout.stride(), 20);
/// assert_eq!(layout.attributes()[1].offset, 12);
/// assert_eq!(layout.attributes()[0].stride, 20);
/// # Ok::<(), glitz_pipeline::Error>(())
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: i32,
}

impl VertexLayout {
    pub fn new() -> Self {
        VertexLayout {
            attributes: Vec::new(),
            stride: 0,
        }
    }

    pub fn add_float(self, location: u32, count: i32) -> Result<Self, Error> {
        self.push(location, count, AttributeType::Float, false)
    }

    pub fn add_int(self, location: u32, count: i32) -> Result<Self, Error> {
        self.push(location, count, AttributeType::Int, false)
    }

    pub fn add_unsigned_byte(
        self,
        location: u32,
        count: i32,
        normalized: bool,
    ) -> Result<Self, Error> {
        self.push(location, count, AttributeType::UnsignedByte, normalized)
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// The size of one vertex in bytes.
    pub fn stride(&self) -> i32 {
        self.stride
    }

    /// Adds every attribute to `vertex_array`, in declaration order.
    pub fn apply<C>(&self, gl: &mut C, vertex_array: &mut VertexArray) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        for attribute in &self.attributes {
            vertex_array.add_attribute(gl, *attribute)?;
        }

        Ok(())
    }

    fn push(
        mut self,
        location: u32,
        count: i32,
        attribute_type: AttributeType,
        normalized: bool,
    ) -> Result<Self, Error> {
        check_component_count(count)?;

        let offset = self.stride as usize;

        self.stride = (count * attribute_type.size_in_bytes() as i32)
            .checked_add(self.stride)
            .ok_or(Error::InvalidComponentCount(count))?;

        self.attributes.push(VertexAttribute {
            location,
            size: count,
            attribute_type,
            normalized,
            stride: 0,
            offset,
            divisor: 0,
        });

        let stride = self.stride;

        for attribute in self.attributes.iter_mut() {
            attribute.stride = stride;
        }

        Ok(self)
    }
}

pub(crate) fn check_component_count(count: i32) -> Result<(), Error> {
    if (1..=4).contains(&count) {
        Ok(())
    } else {
        Err(Error::InvalidComponentCount(count))
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        VertexLayout::new()
    }
}
