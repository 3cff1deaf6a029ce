//! The boundary between the state/resource layer and the graphics device.
//!
//! Every operation in this crate that talks to the device does so through a [GraphicsContext]
//! that is passed in explicitly. The trait mirrors the small subset of the OpenGL ES 3.0 / WebGL
//! 2.0 API that the pipeline and resource layers need. It carries no numeric GL enum values:
//! closed enums such as [BlendFactor] or [BufferTarget] cross the boundary as-is and an
//! implementation maps them onto whatever its driver expects (see [webgl::WebGlContext]).
//!
//! All calls are synchronous and infallible at this level. A driver signals failure through the
//! side channel queried with [GraphicsContext::take_error], mirroring `glGetError`.

use std::fmt;
use std::num::NonZeroU32;

use bitflags::bitflags;

use crate::pipeline::{BlendFactor, CullFace, DepthFunction, Primitive, Viewport};
use crate::resource::{AttributeType, BufferTarget, BufferUsage, IndexType};

mod options;
pub use self::options::{ContextOptions, ContextOptionsBuilder, PowerPreference};

pub mod recording;
pub use self::recording::RecordingContext;

pub mod webgl;
pub use self::webgl::WebGlContext;

/// Identifies a buffer object allocated by a [GraphicsContext].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferId(NonZeroU32);

impl BufferId {
    /// Returns `None` for the null identity `0`.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(BufferId)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl From<NonZeroU32> for BufferId {
    fn from(raw: NonZeroU32) -> Self {
        BufferId(raw)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Identifies a vertex array object allocated by a [GraphicsContext].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VertexArrayId(NonZeroU32);

impl VertexArrayId {
    /// Returns `None` for the null identity `0`.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(VertexArrayId)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl From<NonZeroU32> for VertexArrayId {
    fn from(raw: NonZeroU32) -> Self {
        VertexArrayId(raw)
    }
}

impl fmt::Display for VertexArrayId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "vertex-array#{}", self.0)
    }
}

/// Opaque, comparable reference to a linked shader program.
///
/// Programs are compiled and owned by the shader subsystem; this crate only ever compares handles
/// and asks the context to activate them. Nothing in this crate deletes a program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ProgramHandle(NonZeroU32);

impl ProgramHandle {
    /// Returns `None` for the null identity `0`.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(ProgramHandle)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl From<NonZeroU32> for ProgramHandle {
    fn from(raw: NonZeroU32) -> Self {
        ProgramHandle(raw)
    }
}

impl fmt::Display for ProgramHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// Server-side capabilities that are toggled with [GraphicsContext::enable] and
/// [GraphicsContext::disable].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Capability {
    Blend,
    DepthTest,
    CullFace,
}

/// Rasterization mode for polygons.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PolygonMode {
    Fill,
    Line,
}

bitflags! {
    /// Selects the buffers cleared by [GraphicsContext::clear].
    pub struct ClearMask: u8 {
        const COLOR = 0b001;
        const DEPTH = 0b010;
        const STENCIL = 0b100;
    }
}

impl ClearMask {
    /// Builds a mask from the three individual flags.
    pub fn from_flags(color: bool, depth: bool, stencil: bool) -> Self {
        let mut mask = ClearMask::empty();

        mask.set(ClearMask::COLOR, color);
        mask.set(ClearMask::DEPTH, depth);
        mask.set(ClearMask::STENCIL, stencil);

        mask
    }
}

/// Initial contents for [GraphicsContext::buffer_data].
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BufferSource<'a> {
    /// Allocate storage initialized with these bytes.
    Bytes(&'a [u8]),
    /// Allocate zero-initialized storage of the given size in bytes.
    Size(usize),
}

impl BufferSource<'_> {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            BufferSource::Bytes(bytes) => bytes.len(),
            BufferSource::Size(size) => *size,
        }
    }
}

/// Errors reported through the [GraphicsContext::take_error] side channel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContextError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    ContextLost,
    Unknown(u32),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContextError::InvalidEnum => write!(f, "invalid enum"),
            ContextError::InvalidValue => write!(f, "invalid value"),
            ContextError::InvalidOperation => write!(f, "invalid operation"),
            ContextError::InvalidFramebufferOperation => {
                write!(f, "invalid framebuffer operation")
            }
            ContextError::OutOfMemory => write!(f, "out of memory"),
            ContextError::ContextLost => write!(f, "context lost"),
            ContextError::Unknown(code) => write!(f, "unknown error code {:#x}", code),
        }
    }
}

/// The graphics device as seen by the pipeline and resource layers.
///
/// Implementations are expected to be used from the single thread that owns the underlying
/// context. None of the methods block or fail; see [take_error] for the failure channel.
///
/// [take_error]: GraphicsContext::take_error
pub trait GraphicsContext {
    fn enable(&mut self, capability: Capability);

    fn disable(&mut self, capability: Capability);

    fn blend_func(&mut self, source: BlendFactor, destination: BlendFactor);

    fn depth_func(&mut self, function: DepthFunction);

    fn depth_mask(&mut self, write: bool);

    /// Selects the faces to cull. Never called with [CullFace::None].
    fn cull_face(&mut self, face: CullFace);

    fn viewport(&mut self, viewport: Viewport);

    fn polygon_mode(&mut self, mode: PolygonMode);

    /// Activates `program`, or deactivates the current program if `None`.
    fn use_program(&mut self, program: Option<ProgramHandle>);

    fn clear(&mut self, mask: ClearMask);

    fn clear_color(&mut self, color: [f32; 4]);

    /// Allocates a new buffer object, returns `None` if the context handed back the null
    /// identity (typically because it was not initialized).
    fn create_buffer(&mut self) -> Option<BufferId>;

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);

    /// (Re)allocates the storage of the buffer currently bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, source: BufferSource, usage: BufferUsage);

    /// Overwrites part of the storage of the buffer currently bound to `target`.
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]);

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<BufferId>);

    fn delete_buffer(&mut self, buffer: BufferId);

    /// Allocates a new vertex array object, returns `None` for the null identity.
    fn create_vertex_array(&mut self) -> Option<VertexArrayId>;

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    fn enable_vertex_attrib_array(&mut self, location: u32);

    fn disable_vertex_attrib_array(&mut self, location: u32);

    /// Configures an attribute that the shader reads as floating point values.
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        size: i32,
        attribute_type: AttributeType,
        normalized: bool,
        stride: i32,
        offset: usize,
    );

    /// Configures an attribute that the shader reads as integer values, without conversion.
    fn vertex_attrib_i_pointer(
        &mut self,
        location: u32,
        size: i32,
        attribute_type: AttributeType,
        stride: i32,
        offset: usize,
    );

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32);

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32);

    fn draw_elements(&mut self, mode: Primitive, count: i32, index_type: IndexType, offset: usize);

    fn draw_arrays_instanced(
        &mut self,
        mode: Primitive,
        first: i32,
        count: i32,
        instance_count: i32,
    );

    fn draw_elements_instanced(
        &mut self,
        mode: Primitive,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instance_count: i32,
    );

    /// Returns and clears the oldest pending error, if any.
    fn take_error(&mut self) -> Option<ContextError>;
}

/// A deferred context call, produced by state trackers that may decide a call is redundant.
///
/// `Option<F>` implements this trait: `None` represents an elided call, `Some(f)` a call that
/// still has to reach the context.
pub trait ContextUpdate<C>
where
    C: ?Sized,
{
    fn apply(self, context: &mut C);
}

impl<C, F> ContextUpdate<C> for Option<F>
where
    C: ?Sized,
    F: FnOnce(&mut C),
{
    fn apply(self, context: &mut C) {
        if let Some(f) = self {
            f(context)
        }
    }
}
