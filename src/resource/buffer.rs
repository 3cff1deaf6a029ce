use bytemuck::Pod;

use crate::context::{BufferId, BufferSource, GraphicsContext};
use crate::error::Error;

/// Enumerates the binding points a [Buffer] is created for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Vertex,
    /// Element indices for indexed drawing.
    Index,
    /// Uniform block storage.
    Uniform,
    /// Shader storage block storage, written by compute passes.
    Storage,
}

/// Enumerates the available usage hints for a [Buffer].
///
/// A usage hint tells the driver how often the contents are expected to change and allows it to
/// pick an appropriate memory location. It is a hint only; any buffer may be updated regardless.
///
/// - [BufferUsage::StaticDraw]: specified once, used many times as a drawing source.
/// - [BufferUsage::DynamicDraw]: respecified repeatedly, used many times as a drawing source.
/// - [BufferUsage::StreamDraw]: specified once, used at most a few times.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

/// Enumerates the element types an [IndexBuffer] may hold.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IndexType {
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }
}

/// Trait implemented by the integer types that may be used as vertex indices.
///
/// `u16` indices halve the memory footprint at the cost of addressing at most 65536 vertices.
pub trait IndexFormat: Pod {
    /// The [IndexType] associated with this [IndexFormat].
    const TYPE: IndexType;
}

impl IndexFormat for u16 {
    const TYPE: IndexType = IndexType::UnsignedShort;
}

impl IndexFormat for u32 {
    const TYPE: IndexType = IndexType::UnsignedInt;
}

/// A block of GPU memory, exclusively owned by whoever holds this value.
///
/// Deleting a buffer releases its storage and clears its identity; deleting it again is a no-op.
/// A buffer is not deleted when dropped, call [delete] explicitly.
///
/// [delete]: Buffer::delete
#[derive(PartialEq, Debug)]
pub struct Buffer {
    id: Option<BufferId>,
    target: BufferTarget,
    size_in_bytes: usize,
    usage: BufferUsage,
}

impl Buffer {
    /// Allocates a buffer for `target` with storage initialized from `source`.
    ///
    /// Fails with [Error::Construction] if the context hands back the null identity.
    pub fn new<C>(
        gl: &mut C,
        target: BufferTarget,
        source: BufferSource,
        usage: BufferUsage,
    ) -> Result<Self, Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let id = gl
            .create_buffer()
            .ok_or(Error::Construction { resource: "buffer" })?;
        let size_in_bytes = source.size_in_bytes();

        gl.bind_buffer(target, Some(id));
        gl.buffer_data(target, source, usage);
        gl.bind_buffer(target, None);

        log::debug!(
            "created {} ({:?}, {} bytes, {:?})",
            id,
            target,
            size_in_bytes,
            usage
        );

        Ok(Buffer {
            id: Some(id),
            target,
            size_in_bytes,
            usage,
        })
    }

    /// The identity of this buffer, `None` once it has been deleted.
    pub fn id(&self) -> Option<BufferId> {
        self.id
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// The capacity of this buffer in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn is_deleted(&self) -> bool {
        self.id.is_none()
    }

    pub fn bind<C>(&self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        gl.bind_buffer(self.target, self.id);
    }

    pub fn unbind<C>(&self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        gl.bind_buffer(self.target, None);
    }

    /// Overwrites `data.len()` bytes starting at byte `offset`.
    ///
    /// Fails with [Error::OutOfRange] if the write would extend past the capacity of this buffer,
    /// and with [Error::NilArgument] if the buffer was deleted. Nothing is written on failure.
    pub fn update<C>(&mut self, gl: &mut C, offset: usize, data: &[u8]) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let id = self.id.ok_or(Error::NilArgument("buffer"))?;
        let out_of_range = Error::OutOfRange {
            offset,
            len: data.len(),
            capacity: self.size_in_bytes,
        };

        match offset.checked_add(data.len()) {
            Some(end) if end <= self.size_in_bytes => (),
            _ => return Err(out_of_range),
        }

        gl.bind_buffer(self.target, Some(id));
        gl.buffer_sub_data(self.target, offset, data);
        gl.bind_buffer(self.target, None);

        Ok(())
    }

    /// Releases the storage of this buffer.
    pub fn delete<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        if let Some(id) = self.id.take() {
            log::debug!("deleting {}", id);

            gl.delete_buffer(id);
        }
    }

    pub fn as_vertex_source(&self) -> VertexSource {
        VertexSource { buffer: self }
    }
}

/// A borrowed view of a [Buffer] as a source of vertex attribute data.
///
/// The view does not take ownership: the viewed buffer keeps its original [BufferTarget] and is
/// still deleted through its owner. Any buffer may be viewed this way, which allows the output of
/// a compute pass held in a [StorageBuffer] to be drawn directly.
#[derive(Clone, Copy, Debug)]
pub struct VertexSource<'a> {
    buffer: &'a Buffer,
}

impl<'a> VertexSource<'a> {
    pub fn buffer(&self) -> &'a Buffer {
        self.buffer
    }

    pub fn id(&self) -> Option<BufferId> {
        self.buffer.id()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.buffer.size_in_bytes()
    }
}

/// A [Buffer] holding `f32` vertex data.
#[derive(PartialEq, Debug)]
pub struct VertexBuffer {
    buffer: Buffer,
}

impl VertexBuffer {
    pub fn new<C>(gl: &mut C, data: &[f32], usage: BufferUsage) -> Result<Self, Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let bytes = bytemuck::cast_slice(data);
        let buffer = Buffer::new(gl, BufferTarget::Vertex, BufferSource::Bytes(bytes), usage)?;

        Ok(VertexBuffer { buffer })
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Overwrites the floats starting at byte `offset`. An empty `data` slice is a no-op.
    pub fn update<C>(&mut self, gl: &mut C, offset: usize, data: &[f32]) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        if data.is_empty() {
            return Ok(());
        }

        self.buffer.update(gl, offset, bytemuck::cast_slice(data))
    }

    pub fn delete<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        self.buffer.delete(gl);
    }

    pub fn as_vertex_source(&self) -> VertexSource {
        self.buffer.as_vertex_source()
    }
}

/// A [Buffer] holding vertex indices of a single [IndexType].
#[derive(PartialEq, Debug)]
pub struct IndexBuffer {
    buffer: Buffer,
    count: usize,
    index_type: IndexType,
}

impl IndexBuffer {
    /// Creates an index buffer from `data`; the element type follows from `F`.
    ///
    /// ```
    /// use glitz_pipeline::context::RecordingContext;
    /// use glitz_pipeline::resource::{BufferUsage, IndexBuffer, IndexType};
    ///
    /// let mut gl = RecordingContext::new();
    /// let indices = IndexBuffer::new(&mut gl, &[0u16, 1, 2], BufferUsage::StaticDraw).unwrap();
    ///
    /// assert_eq!(indices.count(), 3);
    /// assert_eq!(indices.index_type(), IndexType::UnsignedShort);
    /// assert_eq!(indices.buffer().size_in_bytes(), 6);
    /// ```
    pub fn new<C, F>(gl: &mut C, data: &[F], usage: BufferUsage) -> Result<Self, Error>
    where
        C: GraphicsContext + ?Sized,
        F: IndexFormat,
    {
        let bytes = bytemuck::cast_slice(data);
        let buffer = Buffer::new(gl, BufferTarget::Index, BufferSource::Bytes(bytes), usage)?;

        Ok(IndexBuffer {
            buffer,
            count: data.len(),
            index_type: F::TYPE,
        })
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The number of indices drawn by an indexed draw call.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Writes `data` at byte `offset`.
    ///
    /// On success the index count becomes `data.len()` and the index type becomes that of `F`. An
    /// empty `data` slice is a no-op.
    pub fn update<C, F>(&mut self, gl: &mut C, offset: usize, data: &[F]) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
        F: IndexFormat,
    {
        if data.is_empty() {
            return Ok(());
        }

        self.buffer.update(gl, offset, bytemuck::cast_slice(data))?;
        self.count = data.len();
        self.index_type = F::TYPE;

        Ok(())
    }

    pub fn delete<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        self.buffer.delete(gl);
    }
}

/// A zero-initialized [Buffer] that backs a uniform block.
#[derive(PartialEq, Debug)]
pub struct UniformBuffer {
    buffer: Buffer,
    binding_point: u32,
}

impl UniformBuffer {
    pub fn new<C>(gl: &mut C, size_in_bytes: usize, usage: BufferUsage) -> Result<Self, Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let buffer = Buffer::new(
            gl,
            BufferTarget::Uniform,
            BufferSource::Size(size_in_bytes),
            usage,
        )?;

        Ok(UniformBuffer {
            buffer,
            binding_point: 0,
        })
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The binding point most recently passed to [bind_base], `0` initially.
    ///
    /// [bind_base]: UniformBuffer::bind_base
    pub fn binding_point(&self) -> u32 {
        self.binding_point
    }

    pub fn bind_base<C>(&mut self, gl: &mut C, binding_point: u32)
    where
        C: GraphicsContext + ?Sized,
    {
        self.binding_point = binding_point;

        gl.bind_buffer_base(BufferTarget::Uniform, binding_point, self.buffer.id());
    }

    pub fn update<C>(&mut self, gl: &mut C, offset: usize, data: &[u8]) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        self.buffer.update(gl, offset, data)
    }

    pub fn delete<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        self.buffer.delete(gl);
    }
}

/// A zero-initialized [Buffer] that backs a shader storage block.
#[derive(PartialEq, Debug)]
pub struct StorageBuffer {
    buffer: Buffer,
    binding_point: u32,
}

impl StorageBuffer {
    pub fn new<C>(gl: &mut C, size_in_bytes: usize, usage: BufferUsage) -> Result<Self, Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let buffer = Buffer::new(
            gl,
            BufferTarget::Storage,
            BufferSource::Size(size_in_bytes),
            usage,
        )?;

        Ok(StorageBuffer {
            buffer,
            binding_point: 0,
        })
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn binding_point(&self) -> u32 {
        self.binding_point
    }

    pub fn bind_base<C>(&mut self, gl: &mut C, binding_point: u32)
    where
        C: GraphicsContext + ?Sized,
    {
        self.binding_point = binding_point;

        gl.bind_buffer_base(BufferTarget::Storage, binding_point, self.buffer.id());
    }

    pub fn update<C>(&mut self, gl: &mut C, offset: usize, data: &[u8]) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        self.buffer.update(gl, offset, data)
    }

    pub fn delete<C>(&mut self, gl: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        self.buffer.delete(gl);
    }

    /// Views the contents of this buffer as vertex data, e.g. to draw particles a compute pass
    /// just simulated.
    pub fn as_vertex_source(&self) -> VertexSource {
        self.buffer.as_vertex_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::recording::{Call, RecordingContext};

    #[test]
    fn test_new_uploads_and_unbinds() {
        let mut gl = RecordingContext::new();

        let buffer = VertexBuffer::new(&mut gl, &[1.0, 2.0], BufferUsage::StaticDraw).unwrap();
        let id = buffer.buffer().id().unwrap();

        assert_eq!(buffer.buffer().size_in_bytes(), 8);
        assert_eq!(
            gl.take_calls(),
            vec![
                Call::CreateBuffer(Some(id)),
                Call::BindBuffer(BufferTarget::Vertex, Some(id)),
                Call::BufferData {
                    target: BufferTarget::Vertex,
                    data: Some(bytemuck::cast_slice::<f32, u8>(&[1.0, 2.0]).to_vec()),
                    size: 8,
                    usage: BufferUsage::StaticDraw,
                },
                Call::BindBuffer(BufferTarget::Vertex, None),
            ]
        );
    }

    #[test]
    fn test_construction_failure() {
        let mut gl = RecordingContext::new();

        gl.fail_allocations(true);

        let result = UniformBuffer::new(&mut gl, 64, BufferUsage::DynamicDraw);

        assert!(matches!(
            result,
            Err(Error::Construction { resource: "buffer" })
        ));
    }

    #[test]
    fn test_update_range() {
        let mut gl = RecordingContext::new();
        let mut buffer = Buffer::new(
            &mut gl,
            BufferTarget::Uniform,
            BufferSource::Size(16),
            BufferUsage::DynamicDraw,
        )
        .unwrap();

        gl.clear_calls();

        assert!(buffer.update(&mut gl, 8, &[0; 8]).is_ok());
        assert!(matches!(
            buffer.update(&mut gl, 9, &[0; 8]),
            Err(Error::OutOfRange {
                offset: 9,
                len: 8,
                capacity: 16
            })
        ));
        assert!(matches!(
            buffer.update(&mut gl, usize::max_value(), &[0; 2]),
            Err(Error::OutOfRange { .. })
        ));

        let writes = gl
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::BufferSubData { .. }))
            .count();

        assert_eq!(writes, 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut gl = RecordingContext::new();
        let mut buffer = VertexBuffer::new(&mut gl, &[0.0; 3], BufferUsage::StaticDraw).unwrap();
        let id = buffer.buffer().id().unwrap();

        buffer.delete(&mut gl);
        buffer.delete(&mut gl);

        assert!(buffer.buffer().is_deleted());
        assert_eq!(gl.deleted_buffers(), &[id]);
    }

    #[test]
    fn test_update_deleted_buffer() {
        let mut gl = RecordingContext::new();
        let mut buffer = VertexBuffer::new(&mut gl, &[0.0; 3], BufferUsage::StaticDraw).unwrap();

        buffer.delete(&mut gl);

        assert!(matches!(
            buffer.update(&mut gl, 0, &[1.0]),
            Err(Error::NilArgument("buffer"))
        ));
    }

    #[test]
    fn test_empty_typed_update_is_a_no_op() {
        let mut gl = RecordingContext::new();
        let mut vertices = VertexBuffer::new(&mut gl, &[0.0; 3], BufferUsage::StaticDraw).unwrap();
        let mut indices =
            IndexBuffer::new(&mut gl, &[0u32, 1, 2], BufferUsage::StaticDraw).unwrap();

        gl.clear_calls();

        assert!(vertices.update(&mut gl, 1024, &[]).is_ok());
        assert!(indices.update::<_, u16>(&mut gl, 0, &[]).is_ok());
        assert!(gl.calls().is_empty());
        assert_eq!(indices.count(), 3);
        assert_eq!(indices.index_type(), IndexType::UnsignedInt);
    }

    #[test]
    fn test_index_update_tracks_count_and_type() {
        let mut gl = RecordingContext::new();
        let mut indices =
            IndexBuffer::new(&mut gl, &[0u32, 1, 2, 2, 3, 0], BufferUsage::StaticDraw).unwrap();

        indices.update(&mut gl, 0, &[0u16, 1, 2, 3]).unwrap();

        assert_eq!(indices.count(), 4);
        assert_eq!(indices.index_type(), IndexType::UnsignedShort);

        assert!(indices.update(&mut gl, 20, &[0u32, 1]).is_err());
        assert_eq!(indices.count(), 4);
    }

    #[test]
    fn test_bind_base_records_binding_point() {
        let mut gl = RecordingContext::new();
        let mut storage = StorageBuffer::new(&mut gl, 256, BufferUsage::DynamicDraw).unwrap();
        let id = storage.buffer().id();

        gl.clear_calls();
        storage.bind_base(&mut gl, 3);

        assert_eq!(storage.binding_point(), 3);
        assert_eq!(
            gl.take_calls(),
            vec![Call::BindBufferBase(BufferTarget::Storage, 3, id)]
        );
    }

    #[test]
    fn test_uniform_bind_base_records_binding_point() {
        let mut gl = RecordingContext::new();
        let mut uniforms = UniformBuffer::new(&mut gl, 64, BufferUsage::DynamicDraw).unwrap();
        let id = uniforms.buffer().id();

        gl.clear_calls();
        uniforms.bind_base(&mut gl, 2);

        assert_eq!(uniforms.binding_point(), 2);
        assert_eq!(
            gl.take_calls(),
            vec![Call::BindBufferBase(BufferTarget::Uniform, 2, id)]
        );
    }

    #[test]
    fn test_storage_buffer_as_vertex_source() {
        let mut gl = RecordingContext::new();
        let storage = StorageBuffer::new(&mut gl, 128, BufferUsage::DynamicDraw).unwrap();

        let source = storage.as_vertex_source();

        assert_eq!(source.id(), storage.buffer().id());
        assert_eq!(source.size_in_bytes(), 128);
        assert_eq!(source.buffer().target(), BufferTarget::Storage);
    }
}
