//! Tracks the rendering configuration of a context and applies changes to it with as few
//! driver calls as possible.
//!
//! The desired configuration is described by a [State], typically assembled with a
//! [StateBuilder] and checked with [State::validate]. A [Pipeline] applies states to a
//! [GraphicsContext]:
//!
//! ```
//! use glitz_pipeline::context::RecordingContext;
//! use glitz_pipeline::pipeline::{BlendFactor, Pipeline, State};
//!
//! let mut gl = RecordingContext::new();
//! let mut pipeline = Pipeline::new();
//!
//! let transparent = State::begin()
//!     .blending(true, BlendFactor::SourceAlpha, BlendFactor::OneMinusSourceAlpha)
//!     .finish();
//!
//! pipeline.push_state();
//! pipeline.set_state_checked(&mut gl, &transparent).unwrap();
//! // ... draw transparent geometry ...
//! pipeline.pop_state(&mut gl).unwrap();
//!
//! assert!(!pipeline.state().blend_enabled);
//! ```

mod builder;
pub use self::builder::StateBuilder;

mod cache;
pub use self::cache::AppliedState;

mod state;
pub use self::state::{BlendFactor, CullFace, DepthFunction, Primitive, State, Viewport};

mod validate;
pub use self::validate::{validate, ValidationError};

use crate::context::{ClearMask, ContextUpdate, GraphicsContext, PolygonMode, ProgramHandle};
use crate::error::Error;

/// Owns the current [State], a stack of saved states and the memo of what was last sent to the
/// context.
///
/// Enabling or disabling blending, depth testing and face culling is only requested from the
/// context when the toggle actually changes. While a toggle stays enabled, its parameters (blend
/// factors, depth function and mask, culled face) are re-sent on every application. The viewport
/// and polygon mode are sent unconditionally. A program is only rebound when its identity differs
/// from the one last bound through this pipeline.
///
/// The pipeline assumes it is the only writer of the tracked context state. If other code changes
/// toggles or the active program directly, call [invalidate_cache] before the next application.
///
/// [invalidate_cache]: Pipeline::invalidate_cache
#[derive(Clone, Debug)]
pub struct Pipeline {
    current_state: State,
    state_stack: Vec<State>,
    applied: AppliedState,
}

impl Pipeline {
    /// Creates a pipeline for a freshly created context.
    ///
    /// The current state starts out as [State::default]; it is not applied until the first call
    /// to [set_state].
    ///
    /// [set_state]: Pipeline::set_state
    pub fn new() -> Self {
        Pipeline {
            current_state: State::default(),
            state_stack: Vec::new(),
            applied: AppliedState::initial(),
        }
    }

    /// The most recently applied (or default) configuration.
    pub fn state(&self) -> &State {
        &self.current_state
    }

    /// What this pipeline believes the context currently has enabled and bound.
    pub fn applied(&self) -> &AppliedState {
        &self.applied
    }

    /// The number of states saved with [push_state].
    ///
    /// [push_state]: Pipeline::push_state
    pub fn stack_depth(&self) -> usize {
        self.state_stack.len()
    }

    /// Applies `state` in full, eliding calls that would not change the context.
    ///
    /// A `state` without a program leaves the currently bound program in place.
    pub fn set_state<C>(&mut self, gl: &mut C, state: &State)
    where
        C: GraphicsContext + ?Sized,
    {
        if let Some(program) = state.program {
            self.applied.use_program(program).apply(gl);
        }

        self.apply_blending(gl, state);
        self.apply_depth_test(gl, state);
        self.apply_culling(gl, state);

        gl.viewport(state.viewport);
        gl.polygon_mode(polygon_mode(state.wireframe));

        self.current_state = *state;
    }

    /// Validates `state` and applies it only if it is valid.
    ///
    /// On failure neither the context nor the pipeline is touched.
    pub fn set_state_checked<C>(&mut self, gl: &mut C, state: &State) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        state.validate()?;
        self.set_state(gl, state);

        Ok(())
    }

    /// Saves a copy of the current state.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.current_state);
    }

    /// Restores the most recently saved state and applies it.
    ///
    /// Returns [Error::EmptyStack] and leaves the pipeline unchanged if nothing was saved.
    pub fn pop_state<C>(&mut self, gl: &mut C) -> Result<(), Error>
    where
        C: GraphicsContext + ?Sized,
    {
        let state = self.state_stack.pop().ok_or(Error::EmptyStack)?;

        self.set_state(gl, &state);

        Ok(())
    }

    /// Binds `program`, or forgets the bound program identity if `None`.
    ///
    /// Passing `None` does not unbind anything on the context; it only ensures the next concrete
    /// program is bound even if it equals the previous one.
    pub fn set_program<C>(&mut self, gl: &mut C, program: Option<ProgramHandle>)
    where
        C: GraphicsContext + ?Sized,
    {
        self.current_state.program = program;

        match program {
            Some(program) => self.applied.use_program(program).apply(gl),
            None => self.applied.forget_program(),
        }
    }

    pub fn set_blending<C>(
        &mut self,
        gl: &mut C,
        enabled: bool,
        source: BlendFactor,
        destination: BlendFactor,
    ) where
        C: GraphicsContext + ?Sized,
    {
        let state = &mut self.current_state;

        state.blend_enabled = enabled;
        state.blend_source = source;
        state.blend_destination = destination;

        let state = self.current_state;

        self.apply_blending(gl, &state);
    }

    pub fn set_depth_test<C>(
        &mut self,
        gl: &mut C,
        enabled: bool,
        write: bool,
        function: DepthFunction,
    ) where
        C: GraphicsContext + ?Sized,
    {
        let state = &mut self.current_state;

        state.depth_enabled = enabled;
        state.depth_write = write;
        state.depth_function = function;

        let state = self.current_state;

        self.apply_depth_test(gl, &state);
    }

    pub fn set_culling<C>(&mut self, gl: &mut C, enabled: bool, face: CullFace)
    where
        C: GraphicsContext + ?Sized,
    {
        self.current_state.cull_enabled = enabled;
        self.current_state.cull_face = face;

        let state = self.current_state;

        self.apply_culling(gl, &state);
    }

    pub fn set_viewport<C>(&mut self, gl: &mut C, x: i32, y: i32, width: i32, height: i32)
    where
        C: GraphicsContext + ?Sized,
    {
        let viewport = Viewport::new(x, y, width, height);

        self.current_state.viewport = viewport;

        gl.viewport(viewport);
    }

    pub fn set_wireframe<C>(&mut self, gl: &mut C, enabled: bool)
    where
        C: GraphicsContext + ?Sized,
    {
        self.current_state.wireframe = enabled;

        gl.polygon_mode(polygon_mode(enabled));
    }

    /// Clears the buffers selected by `mask` of the current render target.
    pub fn clear<C>(&mut self, gl: &mut C, mask: ClearMask)
    where
        C: GraphicsContext + ?Sized,
    {
        if !mask.is_empty() {
            gl.clear(mask);
        }
    }

    pub fn set_clear_color<C>(&mut self, gl: &mut C, r: f32, g: f32, b: f32, a: f32)
    where
        C: GraphicsContext + ?Sized,
    {
        gl.clear_color([r, g, b, a]);
    }

    /// Forgets everything this pipeline assumed about the context.
    ///
    /// The next application re-sends every toggle and rebinds the next program.
    pub fn invalidate_cache(&mut self) {
        log::debug!("pipeline cache invalidated");

        self.applied.invalidate();
    }

    fn apply_blending<C>(&mut self, gl: &mut C, state: &State)
    where
        C: GraphicsContext + ?Sized,
    {
        self.applied.set_blend_enabled(state.blend_enabled).apply(gl);

        if state.blend_enabled {
            gl.blend_func(state.blend_source, state.blend_destination);
        }
    }

    fn apply_depth_test<C>(&mut self, gl: &mut C, state: &State)
    where
        C: GraphicsContext + ?Sized,
    {
        self.applied
            .set_depth_test_enabled(state.depth_enabled)
            .apply(gl);

        if state.depth_enabled {
            gl.depth_func(state.depth_function);
            gl.depth_mask(state.depth_write);
        }
    }

    fn apply_culling<C>(&mut self, gl: &mut C, state: &State)
    where
        C: GraphicsContext + ?Sized,
    {
        if state.cull_enabled && state.cull_face == CullFace::None {
            log::warn!("culling enabled without a face to cull, treating as disabled");
        }

        let culls_faces = state.culls_faces();

        self.applied.set_cull_face_enabled(culls_faces).apply(gl);

        if culls_faces {
            gl.cull_face(state.cull_face);
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}

fn polygon_mode(wireframe: bool) -> PolygonMode {
    if wireframe {
        PolygonMode::Line
    } else {
        PolygonMode::Fill
    }
}
