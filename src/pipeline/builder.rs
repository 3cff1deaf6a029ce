use crate::context::ProgramHandle;

use super::state::{BlendFactor, CullFace, DepthFunction, Primitive, State, Viewport};

/// Assembles a [State] starting from [State::default].
///
/// Every method overrides one group of settings and returns the builder; [finish] yields the
/// state. No validation is performed, call [State::validate] on the result where required.
///
/// ```
/// use glitz_pipeline::pipeline::{BlendFactor, DepthFunction, State};
///
/// let state = State::begin()
///     .blending(true, BlendFactor::SourceAlpha, BlendFactor::OneMinusSourceAlpha)
///     .depth_test(false, false, DepthFunction::Less)
///     .viewport(0, 0, 1920, 1080)
///     .finish();
///
/// assert!(state.blend_enabled);
/// assert!(!state.depth_enabled);
/// assert_eq!(state.viewport.width, 1920);
/// ```
///
/// [finish]: StateBuilder::finish
#[derive(Clone, Debug)]
pub struct StateBuilder {
    state: State,
}

impl StateBuilder {
    pub fn new() -> Self {
        StateBuilder {
            state: State::default(),
        }
    }

    pub fn program(mut self, program: ProgramHandle) -> Self {
        self.state.program = Some(program);

        self
    }

    pub fn blending(
        mut self,
        enabled: bool,
        source: BlendFactor,
        destination: BlendFactor,
    ) -> Self {
        self.state.blend_enabled = enabled;
        self.state.blend_source = source;
        self.state.blend_destination = destination;

        self
    }

    pub fn depth_test(mut self, enabled: bool, write: bool, function: DepthFunction) -> Self {
        self.state.depth_enabled = enabled;
        self.state.depth_write = write;
        self.state.depth_function = function;

        self
    }

    pub fn culling(mut self, enabled: bool, face: CullFace) -> Self {
        self.state.cull_enabled = enabled;
        self.state.cull_face = face;

        self
    }

    pub fn viewport(mut self, x: i32, y: i32, width: i32, height: i32) -> Self {
        self.state.viewport = Viewport::new(x, y, width, height);

        self
    }

    pub fn wireframe(mut self, enabled: bool) -> Self {
        self.state.wireframe = enabled;

        self
    }

    pub fn primitive(mut self, primitive: Primitive) -> Self {
        self.state.primitive = primitive;

        self
    }

    pub fn finish(self) -> State {
        self.state
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        StateBuilder::new()
    }
}
