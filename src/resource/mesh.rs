use crate::context::GraphicsContext;
use crate::error::Error;
use crate::pipeline::Primitive;

use super::buffer::{BufferUsage, IndexBuffer, VertexBuffer};
use super::layout::VertexLayout;
use super::vertex_array::VertexArray;

const FLOATS_PER_VERTEX: usize = 3;

/// A vertex buffer, an optional index buffer and the vertex array binding them, managed as one
/// unit.
///
/// ```
/// use glitz_pipeline::context::RecordingContext;
/// use glitz_pipeline::pipeline::Primitive;
/// use glitz_pipeline::resource::{Mesh, VertexLayout};
///
/// let mut gl = RecordingContext::new();
/// let layout = VertexLayout::new().add_float(0, 2)?.add_float(1, 3)?;
///
/// let vertices = [
///     0.0, 0.5,   1.0, 0.0, 0.0,
///     -0.5, -0.5, 0.0, 1.0, 0.0,
///     0.5, -0.5,  0.0, 0.0, 1.0,
/// ];
///
/// let mut mesh = Mesh::new(&mut gl, &vertices, &[], Some(&layout))?;
///
/// assert_eq!(mesh.vertex_count(), 3);
///
/// mesh.draw(&mut gl, Primitive::Triangles);
/// mesh.delete(&mut gl);
/// # Ok::<(), glitz_pipeline::Error>(())
/// ```
#[derive(Debug)]
pub struct Mesh {
    vertex_array: VertexArray,
    vertex_buffer: VertexBuffer,
    index_buffer: Option<IndexBuffer>,
    vertex_count: usize,
}

impl Mesh {
    /// Uploads `vertices` (and `indices`, unless empty) and configures a vertex array with
    /// `layout`.
    ///
    /// The vertex count is the size of `vertices` divided by the layout's stride. Without a layout
    /// (or with an empty one) every vertex is assumed to consist of three floats. If any part fails
    /// to construct, the parts created so far are deleted before the error is returned.
    pub fn new<C>(
        gl: &mut C,
        vertices: &[f32],
        indices: &[u32],
        layout: Option<&VertexLayout>,
    ) -> Result<Self, Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let mut vertex_buffer = VertexBuffer::new(gl, vertices, BufferUsage::StaticDraw)?;

        let mut index_buffer = if indices.is_empty() {
            None
        } else {
            match IndexBuffer::new(gl, indices, BufferUsage::StaticDraw) {
                Ok(index_buffer) => Some(index_buffer),
                Err(err) => {
                    vertex_buffer.delete(gl);

                    return Err(err);
                }
            }
        };

        let vertex_array = match VertexArray::new(gl) {
            Ok(vertex_array) => vertex_array,
            Err(err) => {
                vertex_buffer.delete(gl);

                if let Some(index_buffer) = &mut index_buffer {
                    index_buffer.delete(gl);
                }

                return Err(err);
            }
        };

        let vertex_count = match layout {
            Some(layout) if layout.stride() > 0 => {
                vertex_buffer.buffer().size_in_bytes() / layout.stride() as usize
            }
            _ => vertices.len() / FLOATS_PER_VERTEX,
        };

        let mut mesh = Mesh {
            vertex_array,
            vertex_buffer,
            index_buffer,
            vertex_count,
        };

        if let Err(err) = mesh.configure(gl, layout) {
            mesh.delete(gl);

            return Err(err);
        }

        Ok(mesh)
    }

    fn configure<C>(&mut self, gl: &mut C, layout: Option<&VertexLayout>) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        self.vertex_array
            .set_vertex_buffer(gl, self.vertex_buffer.as_vertex_source())?;

        if let Some(index_buffer) = &self.index_buffer {
            self.vertex_array.set_index_buffer(gl, index_buffer)?;
        }

        if let Some(layout) = layout {
            layout.apply(gl, &mut self.vertex_array)?;
        }

        Ok(())
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.index_buffer.as_ref()
    }

    /// The number of vertices in the vertex buffer, as determined at construction.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Draws the whole mesh, through its indices if it has an index buffer.
    pub fn draw<C>(&self, gl: &mut C, mode: Primitive)
    where
        C: GraphicsContext + ?Sized,
    {
        if self.index_buffer.is_some() {
            self.vertex_array.draw_indexed(gl, mode);
        } else {
            self.vertex_array
                .draw(gl, mode, self.vertex_count as i32, 0);
        }
    }

    pub fn draw_instanced<C>(&self, gl: &mut C, mode: Primitive, instance_count: i32)
    where
        C: GraphicsContext + ?Sized,
    {
        let count = match &self.index_buffer {
            Some(index_buffer) => index_buffer.count(),
            None => self.vertex_count,
        };

        self.vertex_array
            .draw_instanced(gl, mode, count as i32, instance_count, 0);
    }

    /// Deletes the vertex array and both buffers. Deleting a mesh twice is a no-op.
    pub fn delete<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        self.vertex_array.delete(gl);
        self.vertex_buffer.delete(gl);

        if let Some(index_buffer) = &mut self.index_buffer {
            index_buffer.delete(gl);
        }
    }
}
