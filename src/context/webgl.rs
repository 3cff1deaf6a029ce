//! [GraphicsContext] implementation on top of a browser's WebGL 2.0 context.

use std::collections::VecDeque;
use std::num::NonZeroU32;

use fnv::FnvHashMap;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram,
    WebGlVertexArrayObject,
};

use crate::context::{
    BufferId, BufferSource, Capability, ClearMask, ContextError, ContextOptions, GraphicsContext,
    PolygonMode, ProgramHandle, VertexArrayId,
};
use crate::pipeline::{BlendFactor, CullFace, DepthFunction, Primitive, Viewport};
use crate::resource::{AttributeType, BufferTarget, BufferUsage, IndexType};

/// A [GraphicsContext] that forwards to a [web_sys::WebGl2RenderingContext].
///
/// The JS objects backing buffers, vertex arrays and programs are kept in tables keyed by the
/// handles given out to the rest of the crate. Programs are compiled elsewhere and made known to
/// the context with [register_program].
///
/// WebGL 2.0 has neither polygon rasterization modes nor shader storage buffers. Requests for line
/// rasterization are logged and ignored; any call involving [BufferTarget::Storage] is skipped and
/// reported as [ContextError::InvalidEnum] by [take_error](GraphicsContext::take_error).
///
/// [register_program]: WebGlContext::register_program
pub struct WebGlContext {
    gl: Gl,
    next_id: NonZeroU32,
    buffers: FnvHashMap<BufferId, WebGlBuffer>,
    vertex_arrays: FnvHashMap<VertexArrayId, WebGlVertexArrayObject>,
    programs: FnvHashMap<ProgramHandle, WebGlProgram>,
    pending_errors: VecDeque<ContextError>,
}

impl WebGlContext {
    /// Wraps an existing WebGL 2.0 context.
    ///
    /// The context is assumed to be in its initial state.
    pub fn new(gl: Gl) -> Self {
        WebGlContext {
            gl,
            next_id: NonZeroU32::MIN,
            buffers: FnvHashMap::default(),
            vertex_arrays: FnvHashMap::default(),
            programs: FnvHashMap::default(),
            pending_errors: VecDeque::new(),
        }
    }

    /// Obtains a WebGL 2.0 context for `canvas` configured with `options`.
    pub fn from_canvas(
        canvas: &HtmlCanvasElement,
        options: &ContextOptions,
    ) -> Result<Self, String> {
        #[allow(deprecated)]
        let attributes =
            JsValue::from_serde(&options.to_attributes()).map_err(|e| e.to_string())?;

        let gl = canvas
            .get_context_with_context_options("webgl2", &attributes)
            .map_err(|e| {
                e.as_string()
                    .unwrap_or_else(|| "failed to obtain context".to_string())
            })?
            .ok_or_else(|| "WebGL 2.0 is not supported".to_string())?
            .dyn_into::<Gl>()
            .map_err(|_| "not a WebGL 2.0 context".to_string())?;

        Ok(WebGlContext::new(gl))
    }

    /// The wrapped JS context.
    pub fn gl(&self) -> &Gl {
        &self.gl
    }

    /// Makes `program` available to [Pipeline](crate::pipeline::Pipeline) states and returns its
    /// handle.
    pub fn register_program(&mut self, program: WebGlProgram) -> ProgramHandle {
        let handle = ProgramHandle::from(self.next_id());

        self.programs.insert(handle, program);

        handle
    }

    /// Forgets `program` and returns the JS object, e.g. so that the shader subsystem can delete
    /// it.
    pub fn unregister_program(&mut self, program: ProgramHandle) -> Option<WebGlProgram> {
        self.programs.remove(&program)
    }

    fn next_id(&mut self) -> NonZeroU32 {
        let id = self.next_id;

        self.next_id = NonZeroU32::new(id.get().wrapping_add(1)).unwrap_or(NonZeroU32::MIN);

        id
    }

    fn target_id(&mut self, target: BufferTarget) -> Option<u32> {
        match target {
            BufferTarget::Vertex => Some(Gl::ARRAY_BUFFER),
            BufferTarget::Index => Some(Gl::ELEMENT_ARRAY_BUFFER),
            BufferTarget::Uniform => Some(Gl::UNIFORM_BUFFER),
            BufferTarget::Storage => {
                log::warn!("shader storage buffers are not supported by WebGL 2.0");

                self.pending_errors.push_back(ContextError::InvalidEnum);

                None
            }
        }
    }
}

trait GlEnum {
    fn gl_id(&self) -> u32;
}

impl GlEnum for Capability {
    fn gl_id(&self) -> u32 {
        match self {
            Capability::Blend => Gl::BLEND,
            Capability::DepthTest => Gl::DEPTH_TEST,
            Capability::CullFace => Gl::CULL_FACE,
        }
    }
}

impl GlEnum for BlendFactor {
    fn gl_id(&self) -> u32 {
        match self {
            BlendFactor::Zero => Gl::ZERO,
            BlendFactor::One => Gl::ONE,
            BlendFactor::SourceColor => Gl::SRC_COLOR,
            BlendFactor::OneMinusSourceColor => Gl::ONE_MINUS_SRC_COLOR,
            BlendFactor::DestinationColor => Gl::DST_COLOR,
            BlendFactor::OneMinusDestinationColor => Gl::ONE_MINUS_DST_COLOR,
            BlendFactor::SourceAlpha => Gl::SRC_ALPHA,
            BlendFactor::OneMinusSourceAlpha => Gl::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DestinationAlpha => Gl::DST_ALPHA,
            BlendFactor::OneMinusDestinationAlpha => Gl::ONE_MINUS_DST_ALPHA,
        }
    }
}

impl GlEnum for DepthFunction {
    fn gl_id(&self) -> u32 {
        match self {
            DepthFunction::NeverPass => Gl::NEVER,
            DepthFunction::Less => Gl::LESS,
            DepthFunction::Equal => Gl::EQUAL,
            DepthFunction::LessOrEqual => Gl::LEQUAL,
            DepthFunction::Greater => Gl::GREATER,
            DepthFunction::NotEqual => Gl::NOTEQUAL,
            DepthFunction::GreaterOrEqual => Gl::GEQUAL,
            DepthFunction::AlwaysPass => Gl::ALWAYS,
        }
    }
}

impl GlEnum for Primitive {
    fn gl_id(&self) -> u32 {
        match self {
            Primitive::Points => Gl::POINTS,
            Primitive::Lines => Gl::LINES,
            Primitive::LineLoop => Gl::LINE_LOOP,
            Primitive::LineStrip => Gl::LINE_STRIP,
            Primitive::Triangles => Gl::TRIANGLES,
            Primitive::TriangleStrip => Gl::TRIANGLE_STRIP,
            Primitive::TriangleFan => Gl::TRIANGLE_FAN,
        }
    }
}

impl GlEnum for BufferUsage {
    fn gl_id(&self) -> u32 {
        match self {
            BufferUsage::StaticDraw => Gl::STATIC_DRAW,
            BufferUsage::DynamicDraw => Gl::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => Gl::STREAM_DRAW,
        }
    }
}

impl GlEnum for IndexType {
    fn gl_id(&self) -> u32 {
        match self {
            IndexType::UnsignedShort => Gl::UNSIGNED_SHORT,
            IndexType::UnsignedInt => Gl::UNSIGNED_INT,
        }
    }
}

impl GlEnum for AttributeType {
    fn gl_id(&self) -> u32 {
        match self {
            AttributeType::Float => Gl::FLOAT,
            AttributeType::Int => Gl::INT,
            AttributeType::UnsignedInt => Gl::UNSIGNED_INT,
            AttributeType::Byte => Gl::BYTE,
            AttributeType::UnsignedByte => Gl::UNSIGNED_BYTE,
            AttributeType::Short => Gl::SHORT,
            AttributeType::UnsignedShort => Gl::UNSIGNED_SHORT,
        }
    }
}

impl GlEnum for ClearMask {
    fn gl_id(&self) -> u32 {
        let mut bits = 0;

        if self.contains(ClearMask::COLOR) {
            bits |= Gl::COLOR_BUFFER_BIT;
        }

        if self.contains(ClearMask::DEPTH) {
            bits |= Gl::DEPTH_BUFFER_BIT;
        }

        if self.contains(ClearMask::STENCIL) {
            bits |= Gl::STENCIL_BUFFER_BIT;
        }

        bits
    }
}

fn context_error(code: u32) -> Option<ContextError> {
    match code {
        Gl::NO_ERROR => None,
        Gl::INVALID_ENUM => Some(ContextError::InvalidEnum),
        Gl::INVALID_VALUE => Some(ContextError::InvalidValue),
        Gl::INVALID_OPERATION => Some(ContextError::InvalidOperation),
        Gl::INVALID_FRAMEBUFFER_OPERATION => Some(ContextError::InvalidFramebufferOperation),
        Gl::OUT_OF_MEMORY => Some(ContextError::OutOfMemory),
        Gl::CONTEXT_LOST_WEBGL => Some(ContextError::ContextLost),
        code => Some(ContextError::Unknown(code)),
    }
}

impl GraphicsContext for WebGlContext {
    fn enable(&mut self, capability: Capability) {
        self.gl.enable(capability.gl_id());
    }

    fn disable(&mut self, capability: Capability) {
        self.gl.disable(capability.gl_id());
    }

    fn blend_func(&mut self, source: BlendFactor, destination: BlendFactor) {
        self.gl.blend_func(source.gl_id(), destination.gl_id());
    }

    fn depth_func(&mut self, function: DepthFunction) {
        self.gl.depth_func(function.gl_id());
    }

    fn depth_mask(&mut self, write: bool) {
        self.gl.depth_mask(write);
    }

    fn cull_face(&mut self, face: CullFace) {
        let id = match face {
            CullFace::Front => Gl::FRONT,
            CullFace::Back => Gl::BACK,
            CullFace::FrontAndBack => Gl::FRONT_AND_BACK,
            CullFace::None => return,
        };

        self.gl.cull_face(id);
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.gl
            .viewport(viewport.x, viewport.y, viewport.width, viewport.height);
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        if mode == PolygonMode::Line {
            log::warn!("wireframe rasterization is not supported by WebGL 2.0, ignoring");
        }
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        let program = program.and_then(|handle| self.programs.get(&handle));

        self.gl.use_program(program);
    }

    fn clear(&mut self, mask: ClearMask) {
        self.gl.clear(mask.gl_id());
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color;

        self.gl.clear_color(r, g, b, a);
    }

    fn create_buffer(&mut self) -> Option<BufferId> {
        let buffer = self.gl.create_buffer()?;
        let id = BufferId::from(self.next_id());

        self.buffers.insert(id, buffer);

        Some(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        if let Some(target) = self.target_id(target) {
            let buffer = buffer.and_then(|id| self.buffers.get(&id));

            self.gl.bind_buffer(target, buffer);
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, source: BufferSource, usage: BufferUsage) {
        if let Some(target) = self.target_id(target) {
            match source {
                BufferSource::Bytes(bytes) => {
                    self.gl
                        .buffer_data_with_u8_array(target, bytes, usage.gl_id())
                }
                BufferSource::Size(size) => {
                    self.gl
                        .buffer_data_with_i32(target, size as i32, usage.gl_id())
                }
            }
        }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        if let Some(target) = self.target_id(target) {
            self.gl
                .buffer_sub_data_with_i32_and_u8_array(target, offset as i32, data);
        }
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<BufferId>) {
        if let Some(target) = self.target_id(target) {
            let buffer = buffer.and_then(|id| self.buffers.get(&id));

            self.gl.bind_buffer_base(target, index, buffer);
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(buffer) = self.buffers.remove(&buffer) {
            self.gl.delete_buffer(Some(&buffer));
        }
    }

    fn create_vertex_array(&mut self) -> Option<VertexArrayId> {
        let vertex_array = self.gl.create_vertex_array()?;
        let id = VertexArrayId::from(self.next_id());

        self.vertex_arrays.insert(id, vertex_array);

        Some(id)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        let vertex_array = vertex_array.and_then(|id| self.vertex_arrays.get(&id));

        self.gl.bind_vertex_array(vertex_array);
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if let Some(vertex_array) = self.vertex_arrays.remove(&vertex_array) {
            self.gl.delete_vertex_array(Some(&vertex_array));
        }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.gl.enable_vertex_attrib_array(location);
    }

    fn disable_vertex_attrib_array(&mut self, location: u32) {
        self.gl.disable_vertex_attrib_array(location);
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
        self.gl.vertex_attrib_pointer_with_i32(
            location,
            size,
            attribute_type.gl_id(),
            normalized,
            stride,
            offset as i32,
        );
    }

    fn vertex_attrib_i_pointer(
        &mut self,
        location: u32,
        size: i32,
        attribute_type: AttributeType,
        stride: i32,
        offset: usize,
    ) {
        self.gl.vertex_attrib_i_pointer_with_i32(
            location,
            size,
            attribute_type.gl_id(),
            stride,
            offset as i32,
        );
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        self.gl.vertex_attrib_divisor(location, divisor);
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        self.gl.draw_arrays(mode.gl_id(), first, count);
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32, index_type: IndexType, offset: usize) {
        self.gl
            .draw_elements_with_i32(mode.gl_id(), count, index_type.gl_id(), offset as i32);
    }

    fn draw_arrays_instanced(
        &mut self,
        mode: Primitive,
        first: i32,
        count: i32,
        instance_count: i32,
    ) {
        self.gl
            .draw_arrays_instanced(mode.gl_id(), first, count, instance_count);
    }

    fn draw_elements_instanced(
        &mut self,
        mode: Primitive,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instance_count: i32,
    ) {
        self.gl.draw_elements_instanced_with_i32(
            mode.gl_id(),
            count,
            index_type.gl_id(),
            offset as i32,
            instance_count,
        );
    }

    fn take_error(&mut self) -> Option<ContextError> {
        self.pending_errors
            .pop_front()
            .or_else(|| context_error(self.gl.get_error()))
    }
}
