use glitz_pipeline::context::recording::{Call, RecordingContext};
use glitz_pipeline::context::{Capability, ClearMask, GraphicsContext, ProgramHandle};
use glitz_pipeline::pipeline::{
    BlendFactor, CullFace, DepthFunction, Pipeline, Primitive, State, ValidationError,
};
use glitz_pipeline::resource::{
    BufferPool, BufferTarget, BufferUsage, Mesh, StorageBuffer, VertexArray, VertexLayout,
};
use glitz_pipeline::Error;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_default_state_is_valid() {
    init_logger();

    let state = State::begin().finish();

    assert_eq!(state.viewport.width, 800);
    assert_eq!(state.viewport.height, 600);
    assert!(state.depth_enabled);
    assert_eq!(state.depth_function, DepthFunction::Less);
    assert!(state.cull_enabled);
    assert_eq!(state.cull_face, CullFace::Back);
    assert!(!state.blend_enabled);
    assert_eq!(state.validate(), Ok(()));
}

#[test]
fn test_zero_blend_function_is_invalid() {
    init_logger();

    let state = State::begin()
        .blending(true, BlendFactor::Zero, BlendFactor::Zero)
        .finish();

    assert_eq!(state.validate(), Err(ValidationError::InvalidBlendFunction));
}

#[test]
fn test_zero_width_viewport_is_invalid() {
    init_logger();

    let state = State::begin().viewport(0, 0, 0, 600).finish();

    assert!(matches!(
        state.validate(),
        Err(ValidationError::InvalidViewport { width: 0, .. })
    ));
}

#[test]
fn test_pool_reuses_released_buffer() {
    init_logger();

    let mut gl = RecordingContext::new();
    let mut pool = BufferPool::new();

    let a = pool
        .acquire(&mut gl, BufferTarget::Vertex, 1024, BufferUsage::StaticDraw)
        .unwrap();
    let b = pool
        .acquire(&mut gl, BufferTarget::Vertex, 512, BufferUsage::StaticDraw)
        .unwrap();
    let a_id = a.id();

    assert_ne!(a.id(), b.id());

    pool.release(a).unwrap();

    let c = pool
        .acquire(&mut gl, BufferTarget::Vertex, 500, BufferUsage::StaticDraw)
        .unwrap();

    assert_eq!(c.id(), a_id);
    assert_eq!(gl.live_buffer_count(), 2);

    pool.release(b).unwrap();
    pool.release(c).unwrap();
    pool.clear(&mut gl);

    assert_eq!(gl.live_buffer_count(), 0);
    assert_eq!(gl.deleted_buffers().len(), 2);
}

#[test]
fn test_push_mutate_pop_restores_state() {
    init_logger();

    let mut gl = RecordingContext::new();
    let mut pipeline = Pipeline::new();
    let program = ProgramHandle::new(1).unwrap();
    let base = State::begin()
        .program(program)
        .viewport(0, 0, 1280, 720)
        .finish();

    pipeline.set_state_checked(&mut gl, &base).unwrap();

    let before = *pipeline.state();

    pipeline.push_state();
    pipeline.set_blending(
        &mut gl,
        true,
        BlendFactor::SourceAlpha,
        BlendFactor::OneMinusSourceAlpha,
    );
    pipeline.set_depth_test(&mut gl, true, false, DepthFunction::LessOrEqual);
    pipeline.set_culling(&mut gl, false, CullFace::Back);
    pipeline.set_wireframe(&mut gl, true);
    pipeline.set_viewport(&mut gl, 0, 0, 64, 64);
    pipeline.pop_state(&mut gl).unwrap();

    assert_eq!(pipeline.state(), &before);
    assert!(matches!(pipeline.pop_state(&mut gl), Err(Error::EmptyStack)));
    assert_eq!(pipeline.state(), &before);
}

#[test]
fn test_frame_with_shared_context() {
    init_logger();

    let mut gl = RecordingContext::new();
    let mut pipeline = Pipeline::new();
    let program = ProgramHandle::new(7).unwrap();
    let layout = VertexLayout::new().add_float(0, 3).unwrap();
    let mut mesh = Mesh::new(
        &mut gl,
        &[0.0, 0.5, 0.0, -0.5, -0.5, 0.0, 0.5, -0.5, 0.0],
        &[0, 1, 2],
        Some(&layout),
    )
    .unwrap();
    let state = State::begin().program(program).finish();

    gl.clear_calls();

    for _ in 0..2 {
        pipeline.set_clear_color(&mut gl, 0.0, 0.0, 0.0, 1.0);
        pipeline.clear(&mut gl, ClearMask::COLOR | ClearMask::DEPTH);
        pipeline.set_state(&mut gl, &state);
        mesh.draw(&mut gl, Primitive::Triangles);
    }

    let calls = gl.take_calls();
    let binds = calls
        .iter()
        .filter(|call| matches!(call, Call::UseProgram(_)))
        .count();
    let depth_enables = calls
        .iter()
        .filter(|call| **call == Call::Enable(Capability::DepthTest))
        .count();
    let draws = calls
        .iter()
        .filter(|call| matches!(call, Call::DrawElements { count: 3, .. }))
        .count();

    assert_eq!(binds, 1);
    assert_eq!(depth_enables, 1);
    assert_eq!(draws, 2);

    mesh.delete(&mut gl);

    assert_eq!(gl.live_buffer_count(), 0);
    assert_eq!(gl.live_vertex_array_count(), 0);
    assert_eq!(gl.take_error(), None);
}

#[test]
fn test_compute_output_drawn_as_points() {
    init_logger();

    let mut gl = RecordingContext::new();
    let mut particles =
        StorageBuffer::new(&mut gl, 1024 * 16, BufferUsage::DynamicDraw).unwrap();
    let mut vertex_array = VertexArray::new(&mut gl).unwrap();

    particles.bind_base(&mut gl, 0);
    vertex_array
        .set_vertex_buffer(&mut gl, particles.as_vertex_source())
        .unwrap();
    VertexLayout::new()
        .add_float(0, 4)
        .unwrap()
        .apply(&mut gl, &mut vertex_array)
        .unwrap();
    vertex_array.draw(&mut gl, Primitive::Points, 1024, 0);

    assert!(gl.calls().contains(&Call::DrawArrays {
        mode: Primitive::Points,
        first: 0,
        count: 1024,
    }));

    vertex_array.delete(&mut gl);

    assert!(gl.is_buffer_alive(particles.buffer().id().unwrap()));

    particles.delete(&mut gl);

    assert_eq!(gl.live_buffer_count(), 0);
}
