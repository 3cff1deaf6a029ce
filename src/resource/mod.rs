//! GPU memory and vertex input resources.
//!
//! Resources are created and destroyed explicitly against a [GraphicsContext]; none of them
//! release their GPU-side object on drop.
//!
//! [GraphicsContext]: crate::context::GraphicsContext

mod buffer;
pub use self::buffer::{
    Buffer, BufferTarget, BufferUsage, IndexBuffer, IndexFormat, IndexType, StorageBuffer,
    UniformBuffer, VertexBuffer, VertexSource,
};

mod layout;
pub use self::layout::{AttributeType, VertexAttribute, VertexLayout};

mod mesh;
pub use self::mesh::Mesh;

mod pool;
pub use self::pool::{BufferLease, BufferPool};

mod vertex_array;
pub use self::vertex_array::VertexArray;
