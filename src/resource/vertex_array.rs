use crate::context::{BufferId, GraphicsContext, VertexArrayId};
use crate::error::Error;
use crate::pipeline::Primitive;

use super::buffer::{BufferTarget, IndexBuffer, IndexType, VertexSource};
use super::layout::{check_component_count, AttributeType, VertexAttribute};

#[derive(Clone, Copy, PartialEq, Debug)]
struct AttachedIndices {
    id: BufferId,
    count: usize,
    index_type: IndexType,
}

/// Binds a vertex buffer, an optional index buffer and a set of attributes into a drawable unit.
///
/// A vertex array only records the binding relationship. The attached buffers remain owned by
/// whoever created them and are never deleted through the vertex array. The index count and type
/// are captured when the index buffer is attached; attach it again after updating it.
#[derive(PartialEq, Debug)]
pub struct VertexArray {
    id: Option<VertexArrayId>,
    attributes: Vec<VertexAttribute>,
    vertex_buffer: Option<BufferId>,
    index_buffer: Option<AttachedIndices>,
}

impl VertexArray {
    pub fn new<C>(gl: &mut C) -> Result<Self, Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let id = gl.create_vertex_array().ok_or(Error::Construction {
            resource: "vertex array",
        })?;

        log::debug!("created {}", id);

        Ok(VertexArray {
            id: Some(id),
            attributes: Vec::new(),
            vertex_buffer: None,
            index_buffer: None,
        })
    }

    /// The identity of this vertex array, `None` once it has been deleted.
    pub fn id(&self) -> Option<VertexArrayId> {
        self.id
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn vertex_buffer(&self) -> Option<BufferId> {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.index_buffer.map(|indices| indices.id)
    }

    /// The number of indices drawn by [draw_indexed], `None` without an index buffer.
    ///
    /// [draw_indexed]: VertexArray::draw_indexed
    pub fn index_count(&self) -> Option<usize> {
        self.index_buffer.map(|indices| indices.count)
    }

    pub fn bind<C>(&self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        gl.bind_vertex_array(self.id);
    }

    pub fn unbind<C>(&self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        gl.bind_vertex_array(None);
    }

    /// Uses `source` as the buffer subsequently added attributes read from.
    ///
    /// Any buffer viewed as a [VertexSource] is accepted, regardless of the target it was created
    /// for.
    pub fn set_vertex_buffer<C>(&mut self, gl: &mut C, source: VertexSource) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let id = self.id.ok_or(Error::NilArgument("vertex array"))?;
        let buffer = source.id().ok_or(Error::NilArgument("buffer"))?;

        self.vertex_buffer = Some(buffer);

        gl.bind_vertex_array(Some(id));
        gl.bind_buffer(BufferTarget::Vertex, Some(buffer));
        gl.bind_vertex_array(None);

        Ok(())
    }

    pub fn set_index_buffer<C>(&mut self, gl: &mut C, indices: &IndexBuffer) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let id = self.id.ok_or(Error::NilArgument("vertex array"))?;
        let buffer = indices
            .buffer()
            .id()
            .ok_or(Error::NilArgument("buffer"))?;

        self.index_buffer = Some(AttachedIndices {
            id: buffer,
            count: indices.count(),
            index_type: indices.index_type(),
        });

        gl.bind_vertex_array(Some(id));
        gl.bind_buffer(BufferTarget::Index, Some(buffer));
        gl.bind_vertex_array(None);

        Ok(())
    }

    /// Enables and configures `attribute`, reading from the current vertex buffer.
    ///
    /// Integer attributes that are not normalized are configured so that the shader receives
    /// their values unconverted. An attribute whose `size` is outside 1 to 4 is rejected before
    /// the context is touched.
    pub fn add_attribute<C>(&mut self, gl: &mut C, attribute: VertexAttribute) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let id = self.id.ok_or(Error::NilArgument("vertex array"))?;

        check_component_count(attribute.size)?;

        gl.bind_vertex_array(Some(id));

        if let Some(buffer) = self.vertex_buffer {
            gl.bind_buffer(BufferTarget::Vertex, Some(buffer));
        }

        gl.enable_vertex_attrib_array(attribute.location);

        if attribute.is_integer() {
            gl.vertex_attrib_i_pointer(
                attribute.location,
                attribute.size,
                attribute.attribute_type,
                attribute.stride,
                attribute.offset,
            );
        } else {
            gl.vertex_attrib_pointer(
                attribute.location,
                attribute.size,
                attribute.attribute_type,
                attribute.normalized,
                attribute.stride,
                attribute.offset,
            );
        }

        if attribute.divisor > 0 {
            gl.vertex_attrib_divisor(attribute.location, attribute.divisor);
        }

        gl.bind_vertex_array(None);

        self.attributes.push(attribute);

        Ok(())
    }

    pub fn add_float_attribute<C>(
        &mut self,
        gl: &mut C,
        location: u32,
        size: i32,
        stride: i32,
        offset: usize,
    ) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        self.add_attribute(
            gl,
            VertexAttribute {
                location,
                size,
                attribute_type: AttributeType::Float,
                normalized: false,
                stride,
                offset,
                divisor: 0,
            },
        )
    }

    /// Draws `count` vertices starting at `first`.
    ///
    /// With an index buffer attached, `count` indices are drawn starting at index `first`;
    /// otherwise `count` vertices are drawn starting at vertex `first`. A deleted vertex array
    /// draws nothing.
    pub fn draw<C>(&self, gl: &mut C, mode: Primitive, count: i32, first: i32)
    where
        C: GraphicsContext + ?Sized,
    {
        let id = match self.id {
            Some(id) => id,
            None => {
                log::warn!("draw call on a deleted vertex array ignored");

                return;
            }
        };

        gl.bind_vertex_array(Some(id));

        match self.index_buffer {
            Some(indices) => gl.draw_elements(
                mode,
                count,
                indices.index_type,
                index_offset(first, indices.index_type),
            ),
            None => gl.draw_arrays(mode, first, count),
        }

        gl.bind_vertex_array(None);
    }

    /// Draws every index of the attached index buffer; does nothing without an index buffer.
    pub fn draw_indexed<C>(&self, gl: &mut C, mode: Primitive)
    where
        C: GraphicsContext + ?Sized,
    {
        if let Some(indices) = self.index_buffer {
            self.draw(gl, mode, indices.count as i32, 0);
        }
    }

    /// Like [draw], but draws `instance_count` instances.
    ///
    /// [draw]: VertexArray::draw
    pub fn draw_instanced<C>(
        &self,
        gl: &mut C,
        mode: Primitive,
        count: i32,
        instance_count: i32,
        first: i32,
    ) where
        C: GraphicsContext + ?Sized,
    {
        let id = match self.id {
            Some(id) => id,
            None => {
                log::warn!("draw call on a deleted vertex array ignored");

                return;
            }
        };

        gl.bind_vertex_array(Some(id));

        match self.index_buffer {
            Some(indices) => gl.draw_elements_instanced(
                mode,
                count,
                indices.index_type,
                index_offset(first, indices.index_type),
                instance_count,
            ),
            None => gl.draw_arrays_instanced(mode, first, count, instance_count),
        }

        gl.bind_vertex_array(None);
    }

    /// Disables every attribute slot and releases the vertex array. The attached buffers are
    /// left alone.
    pub fn delete<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        if let Some(id) = self.id.take() {
            log::debug!("deleting {}", id);

            gl.bind_vertex_array(Some(id));

            for attribute in &self.attributes {
                gl.disable_vertex_attrib_array(attribute.location);
            }

            gl.bind_vertex_array(None);
            gl.delete_vertex_array(id);
        }
    }
}

fn index_offset(first: i32, index_type: IndexType) -> usize {
    first.max(0) as usize * index_type.size_in_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::recording::{Call, RecordingContext};
    use crate::resource::{BufferUsage, StorageBuffer, VertexBuffer, VertexLayout};

    #[test]
    fn test_set_buffers() {
        let mut gl = RecordingContext::new();
        let vertices = VertexBuffer::new(&mut gl, &[0.0; 9], BufferUsage::StaticDraw).unwrap();
        let indices = IndexBuffer::new(&mut gl, &[0u32, 1, 2], BufferUsage::StaticDraw).unwrap();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();
        let id = vertex_array.id();

        gl.clear_calls();
        vertex_array
            .set_vertex_buffer(&mut gl, vertices.as_vertex_source())
            .unwrap();
        vertex_array.set_index_buffer(&mut gl, &indices).unwrap();

        assert_eq!(
            gl.take_calls(),
            vec![
                Call::BindVertexArray(id),
                Call::BindBuffer(BufferTarget::Vertex, vertices.buffer().id()),
                Call::BindVertexArray(None),
                Call::BindVertexArray(id),
                Call::BindBuffer(BufferTarget::Index, indices.buffer().id()),
                Call::BindVertexArray(None),
            ]
        );
        assert_eq!(vertex_array.index_count(), Some(3));
    }

    #[test]
    fn test_storage_buffer_drawn_as_vertices() {
        let mut gl = RecordingContext::new();
        let particles = StorageBuffer::new(&mut gl, 64, BufferUsage::DynamicDraw).unwrap();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();

        vertex_array
            .set_vertex_buffer(&mut gl, particles.as_vertex_source())
            .unwrap();

        assert_eq!(vertex_array.vertex_buffer(), particles.buffer().id());
        assert!(gl.calls().contains(&Call::BindBuffer(
            BufferTarget::Vertex,
            particles.buffer().id()
        )));
    }

    #[test]
    fn test_deleted_buffer_is_rejected() {
        let mut gl = RecordingContext::new();
        let mut vertices = VertexBuffer::new(&mut gl, &[0.0; 3], BufferUsage::StaticDraw).unwrap();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();

        vertices.delete(&mut gl);

        assert!(matches!(
            vertex_array.set_vertex_buffer(&mut gl, vertices.as_vertex_source()),
            Err(Error::NilArgument("buffer"))
        ));
        assert_eq!(vertex_array.vertex_buffer(), None);
    }

    #[test]
    fn test_attribute_paths() {
        let mut gl = RecordingContext::new();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();
        let layout = VertexLayout::new()
            .add_float(0, 3)
            .and_then(|layout| layout.add_int(1, 1))
            .and_then(|layout| layout.add_unsigned_byte(2, 4, true))
            .unwrap();

        gl.clear_calls();
        layout.apply(&mut gl, &mut vertex_array).unwrap();

        let calls = gl.take_calls();

        assert!(calls.contains(&Call::VertexAttribPointer {
            location: 0,
            size: 3,
            attribute_type: AttributeType::Float,
            normalized: false,
            stride: 20,
            offset: 0,
        }));
        assert!(calls.contains(&Call::VertexAttribIPointer {
            location: 1,
            size: 1,
            attribute_type: AttributeType::Int,
            stride: 20,
            offset: 12,
        }));
        assert!(calls.contains(&Call::VertexAttribPointer {
            location: 2,
            size: 4,
            attribute_type: AttributeType::UnsignedByte,
            normalized: true,
            stride: 20,
            offset: 16,
        }));
        assert!(!calls
            .iter()
            .any(|call| matches!(call, Call::VertexAttribDivisor(..))));
        assert_eq!(vertex_array.attributes().len(), 3);
    }

    #[test]
    fn test_instanced_attribute_sets_divisor() {
        let mut gl = RecordingContext::new();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();

        vertex_array
            .add_attribute(
                &mut gl,
                VertexAttribute {
                    location: 4,
                    size: 4,
                    attribute_type: AttributeType::Float,
                    normalized: false,
                    stride: 16,
                    offset: 0,
                    divisor: 1,
                },
            )
            .unwrap();

        assert!(gl.calls().contains(&Call::VertexAttribDivisor(4, 1)));
    }

    #[test]
    fn test_draw_without_index_buffer() {
        let mut gl = RecordingContext::new();
        let vertex_array = VertexArray::new(&mut gl).unwrap();
        let id = vertex_array.id();

        gl.clear_calls();
        vertex_array.draw(&mut gl, Primitive::Triangles, 6, 3);
        vertex_array.draw_indexed(&mut gl, Primitive::Triangles);
        vertex_array.draw_instanced(&mut gl, Primitive::Points, 1, 100, 0);

        assert_eq!(
            gl.take_calls(),
            vec![
                Call::BindVertexArray(id),
                Call::DrawArrays {
                    mode: Primitive::Triangles,
                    first: 3,
                    count: 6,
                },
                Call::BindVertexArray(None),
                Call::BindVertexArray(id),
                Call::DrawArraysInstanced {
                    mode: Primitive::Points,
                    first: 0,
                    count: 1,
                    instance_count: 100,
                },
                Call::BindVertexArray(None),
            ]
        );
    }

    #[test]
    fn test_indexed_draw_offset_uses_index_width() {
        let mut gl = RecordingContext::new();
        let indices =
            IndexBuffer::new(&mut gl, &[0u16, 1, 2, 2, 3, 0], BufferUsage::StaticDraw).unwrap();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();

        vertex_array.set_index_buffer(&mut gl, &indices).unwrap();
        gl.clear_calls();
        vertex_array.draw(&mut gl, Primitive::Triangles, 3, 3);
        vertex_array.draw_indexed(&mut gl, Primitive::Triangles);

        let draws: Vec<_> = gl
            .take_calls()
            .into_iter()
            .filter(|call| matches!(call, Call::DrawElements { .. }))
            .collect();

        assert_eq!(
            draws,
            vec![
                Call::DrawElements {
                    mode: Primitive::Triangles,
                    count: 3,
                    index_type: IndexType::UnsignedShort,
                    offset: 6,
                },
                Call::DrawElements {
                    mode: Primitive::Triangles,
                    count: 6,
                    index_type: IndexType::UnsignedShort,
                    offset: 0,
                },
            ]
        );
    }

    #[test]
    fn test_instanced_draw_uses_index_buffer() {
        let mut gl = RecordingContext::new();
        let indices =
            IndexBuffer::new(&mut gl, &[0u16, 1, 2, 2, 3, 0], BufferUsage::StaticDraw).unwrap();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();
        let id = vertex_array.id();

        vertex_array.set_index_buffer(&mut gl, &indices).unwrap();
        gl.clear_calls();
        vertex_array.draw_instanced(&mut gl, Primitive::Triangles, 3, 7, 3);

        assert_eq!(
            gl.take_calls(),
            vec![
                Call::BindVertexArray(id),
                Call::DrawElementsInstanced {
                    mode: Primitive::Triangles,
                    count: 3,
                    index_type: IndexType::UnsignedShort,
                    offset: 6,
                    instance_count: 7,
                },
                Call::BindVertexArray(None),
            ]
        );
    }

    #[test]
    fn test_attribute_size_out_of_range_is_rejected() {
        let mut gl = RecordingContext::new();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();

        gl.clear_calls();

        assert!(matches!(
            vertex_array.add_float_attribute(&mut gl, 0, 5, 20, 0),
            Err(Error::InvalidComponentCount(5))
        ));
        assert!(gl.calls().is_empty());
        assert!(vertex_array.attributes().is_empty());
    }

    #[test]
    fn test_delete_disables_attributes_and_keeps_buffers() {
        let mut gl = RecordingContext::new();
        let vertices = VertexBuffer::new(&mut gl, &[0.0; 6], BufferUsage::StaticDraw).unwrap();
        let mut vertex_array = VertexArray::new(&mut gl).unwrap();
        let id = vertex_array.id().unwrap();

        vertex_array
            .set_vertex_buffer(&mut gl, vertices.as_vertex_source())
            .unwrap();
        vertex_array
            .add_float_attribute(&mut gl, 0, 2, 8, 0)
            .unwrap();
        gl.clear_calls();

        vertex_array.delete(&mut gl);
        vertex_array.delete(&mut gl);

        assert_eq!(
            gl.take_calls(),
            vec![
                Call::BindVertexArray(Some(id)),
                Call::DisableVertexAttribArray(0),
                Call::BindVertexArray(None),
                Call::DeleteVertexArray(id),
            ]
        );
        assert!(!gl.is_vertex_array_alive(id));
        assert_eq!(gl.live_buffer_count(), 1);

        vertex_array.draw(&mut gl, Primitive::Triangles, 3, 0);

        assert!(gl.calls().is_empty());
        assert!(matches!(
            vertex_array.add_float_attribute(&mut gl, 1, 2, 8, 0),
            Err(Error::NilArgument("vertex array"))
        ));
    }
}
