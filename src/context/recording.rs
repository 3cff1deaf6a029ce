//! An in-memory [GraphicsContext] that records every call made to it.
//!
//! [RecordingContext] allocates handles and tracks which buffers and vertex arrays are alive, but
//! otherwise performs no work. It is primarily intended for tests that need to assert on the exact
//! stream of calls a pipeline or resource operation produces:
//!
//! ```
//! use glitz_pipeline::context::recording::{Call, RecordingContext};
//! use glitz_pipeline::context::{Capability, GraphicsContext};
//!
//! let mut gl = RecordingContext::new();
//!
//! gl.enable(Capability::Blend);
//!
//! assert_eq!(gl.take_calls(), vec![Call::Enable(Capability::Blend)]);
//! ```

use std::collections::VecDeque;

use fnv::FnvHashSet;

use crate::context::{
    BufferId, BufferSource, Capability, ClearMask, ContextError, GraphicsContext, PolygonMode,
    ProgramHandle, VertexArrayId,
};
use crate::pipeline::{BlendFactor, CullFace, DepthFunction, Primitive, Viewport};
use crate::resource::{AttributeType, BufferTarget, BufferUsage, IndexType};

/// A single call received by a [RecordingContext].
///
/// Buffer uploads are recorded by value, allocations record the handle that was handed out.
#[derive(Clone, PartialEq, Debug)]
pub enum Call {
    Enable(Capability),
    Disable(Capability),
    BlendFunc(BlendFactor, BlendFactor),
    DepthFunc(DepthFunction),
    DepthMask(bool),
    CullFace(CullFace),
    Viewport(Viewport),
    PolygonMode(PolygonMode),
    UseProgram(Option<ProgramHandle>),
    Clear(ClearMask),
    ClearColor([f32; 4]),
    CreateBuffer(Option<BufferId>),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData {
        target: BufferTarget,
        data: Option<Vec<u8>>,
        size: usize,
        usage: BufferUsage,
    },
    BufferSubData {
        target: BufferTarget,
        offset: usize,
        data: Vec<u8>,
    },
    BindBufferBase(BufferTarget, u32, Option<BufferId>),
    DeleteBuffer(BufferId),
    CreateVertexArray(Option<VertexArrayId>),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribPointer {
        location: u32,
        size: i32,
        attribute_type: AttributeType,
        normalized: bool,
        stride: i32,
        offset: usize,
    },
    VertexAttribIPointer {
        location: u32,
        size: i32,
        attribute_type: AttributeType,
        stride: i32,
        offset: usize,
    },
    VertexAttribDivisor(u32, u32),
    DrawArrays {
        mode: Primitive,
        first: i32,
        count: i32,
    },
    DrawElements {
        mode: Primitive,
        count: i32,
        index_type: IndexType,
        offset: usize,
    },
    DrawArraysInstanced {
        mode: Primitive,
        first: i32,
        count: i32,
        instance_count: i32,
    },
    DrawElementsInstanced {
        mode: Primitive,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instance_count: i32,
    },
}

/// A [GraphicsContext] that records calls instead of rendering.
#[derive(Debug)]
pub struct RecordingContext {
    calls: Vec<Call>,
    next_id: u32,
    fail_allocations: bool,
    allocation_budget: Option<usize>,
    live_buffers: FnvHashSet<BufferId>,
    live_vertex_arrays: FnvHashSet<VertexArrayId>,
    deleted_buffers: Vec<BufferId>,
    errors: VecDeque<ContextError>,
}

impl RecordingContext {
    pub fn new() -> Self {
        RecordingContext {
            calls: Vec::new(),
            next_id: 1,
            fail_allocations: false,
            allocation_budget: None,
            live_buffers: FnvHashSet::default(),
            live_vertex_arrays: FnvHashSet::default(),
            deleted_buffers: Vec::new(),
            errors: VecDeque::new(),
        }
    }

    /// The calls recorded since creation or since the last [take_calls]/[clear_calls].
    ///
    /// [take_calls]: RecordingContext::take_calls
    /// [clear_calls]: RecordingContext::clear_calls
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::replace(&mut self.calls, Vec::new())
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// When set, every subsequent allocation hands back the null identity, as an uninitialized
    /// context would.
    pub fn fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Lets the next `successes` allocations succeed and fails every one after that.
    pub fn fail_allocations_after(&mut self, successes: usize) {
        self.allocation_budget = Some(successes);
    }

    /// Queues an error to be reported by [GraphicsContext::take_error].
    pub fn push_error(&mut self, error: ContextError) {
        self.errors.push_back(error);
    }

    pub fn is_buffer_alive(&self, buffer: BufferId) -> bool {
        self.live_buffers.contains(&buffer)
    }

    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn is_vertex_array_alive(&self, vertex_array: VertexArrayId) -> bool {
        self.live_vertex_arrays.contains(&vertex_array)
    }

    pub fn live_vertex_array_count(&self) -> usize {
        self.live_vertex_arrays.len()
    }

    /// Every buffer deletion received, in order, including deletions of unknown buffers.
    pub fn deleted_buffers(&self) -> &[BufferId] {
        &self.deleted_buffers
    }

    fn next_raw_id(&mut self) -> Option<u32> {
        if self.fail_allocations {
            return None;
        }

        if let Some(budget) = &mut self.allocation_budget {
            if *budget == 0 {
                return None;
            }

            *budget -= 1;
        }

        let id = self.next_id;

        self.next_id += 1;

        Some(id)
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        RecordingContext::new()
    }
}

impl GraphicsContext for RecordingContext {
    fn enable(&mut self, capability: Capability) {
        self.calls.push(Call::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.calls.push(Call::Disable(capability));
    }

    fn blend_func(&mut self, source: BlendFactor, destination: BlendFactor) {
        self.calls.push(Call::BlendFunc(source, destination));
    }

    fn depth_func(&mut self, function: DepthFunction) {
        self.calls.push(Call::DepthFunc(function));
    }

    fn depth_mask(&mut self, write: bool) {
        self.calls.push(Call::DepthMask(write));
    }

    fn cull_face(&mut self, face: CullFace) {
        self.calls.push(Call::CullFace(face));
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::Viewport(viewport));
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        self.calls.push(Call::PolygonMode(mode));
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.calls.push(Call::UseProgram(program));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.calls.push(Call::Clear(mask));
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.calls.push(Call::ClearColor(color));
    }

    fn create_buffer(&mut self) -> Option<BufferId> {
        let id = self.next_raw_id().and_then(BufferId::new);

        if let Some(id) = id {
            self.live_buffers.insert(id);
        }

        self.calls.push(Call::CreateBuffer(id));

        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.calls.push(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, source: BufferSource, usage: BufferUsage) {
        let data = match source {
            BufferSource::Bytes(bytes) => Some(bytes.to_vec()),
            BufferSource::Size(_) => None,
        };

        self.calls.push(Call::BufferData {
            target,
            data,
            size: source.size_in_bytes(),
            usage,
        });
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.calls.push(Call::BufferSubData {
            target,
            offset,
            data: data.to_vec(),
        });
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<BufferId>) {
        self.calls.push(Call::BindBufferBase(target, index, buffer));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.live_buffers.remove(&buffer);
        self.deleted_buffers.push(buffer);
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&mut self) -> Option<VertexArrayId> {
        let id = self.next_raw_id().and_then(VertexArrayId::new);

        if let Some(id) = id {
            self.live_vertex_arrays.insert(id);
        }

        self.calls.push(Call::CreateVertexArray(id));

        id
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.calls.push(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.live_vertex_arrays.remove(&vertex_array);
        self.calls.push(Call::DeleteVertexArray(vertex_array));
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.calls.push(Call::EnableVertexAttribArray(location));
    }

    fn disable_vertex_attrib_array(&mut self, location: u32) {
        self.calls.push(Call::DisableVertexAttribArray(location));
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        size: i32,
        attribute_type: AttributeType,
        normalized: bool,
        stride: i32,
        offset: usize,
    ) {
        self.calls.push(Call::VertexAttribPointer {
            location,
            size,
            attribute_type,
            normalized,
            stride,
            offset,
        });
    }

    fn vertex_attrib_i_pointer(
        &mut self,
        location: u32,
        size: i32,
        attribute_type: AttributeType,
        stride: i32,
        offset: usize,
    ) {
        self.calls.push(Call::VertexAttribIPointer {
            location,
            size,
            attribute_type,
            stride,
            offset,
        });
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        self.calls.push(Call::VertexAttribDivisor(location, divisor));
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        self.calls.push(Call::DrawArrays {
            mode,
            first,
            count,
        });
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32, index_type: IndexType, offset: usize) {
        self.calls.push(Call::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
    }

    fn draw_arrays_instanced(
        &mut self,
        mode: Primitive,
        first: i32,
        count: i32,
        instance_count: i32,
    ) {
        self.calls.push(Call::DrawArraysInstanced {
            mode,
            first,
            count,
            instance_count,
        });
    }

    fn draw_elements_instanced(
        &mut self,
        mode: Primitive,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instance_count: i32,
    ) {
        self.calls.push(Call::DrawElementsInstanced {
            mode,
            count,
            index_type,
            offset,
            instance_count,
        });
    }

    fn take_error(&mut self) -> Option<ContextError> {
        self.errors.pop_front()
    }
}
