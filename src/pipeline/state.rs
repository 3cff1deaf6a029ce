use crate::context::ProgramHandle;

use super::builder::StateBuilder;
use super::validate::{self, ValidationError};

/// Enumerates the factors that may be applied to the source and destination colors when
/// [State::blend_enabled] is set.
///
/// With blending enabled, the output color `O` of a fragment is computed as
/// `O = F_s * S + F_d * D`, where `S` is the fragment's color, `D` is the color already in the
/// color buffer and `F_s`/`F_d` are the source and destination factors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BlendFactor {
    Zero,
    One,
    SourceColor,
    OneMinusSourceColor,
    DestinationColor,
    OneMinusDestinationColor,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestinationAlpha,
    OneMinusDestinationAlpha,
}

/// Enumerates the comparison functions for the depth test.
///
/// A fragment passes the test when `function(fragment_depth, stored_depth)` holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DepthFunction {
    NeverPass,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    AlwaysPass,
}

/// Enumerates the face-culling modes.
///
/// [CullFace::None] culls nothing: a [State] that enables culling with [CullFace::None] is
/// applied as if culling were disabled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CullFace {
    None,
    Front,
    Back,
    FrontAndBack,
}

/// Enumerates the primitive topologies used to assemble vertices.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Rectangle of the render target that normalized device coordinates map onto.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Viewport {
            x,
            y,
            width,
            height,
        }
    }
}

/// A declarative snapshot of the desired rendering configuration.
///
/// A [State] does nothing on its own; hand it to [Pipeline::set_state] to apply it to a context.
/// [State::default] yields the baseline configuration:
///
/// ```
/// use glitz_pipeline::pipeline::{
///     BlendFactor, CullFace, DepthFunction, Primitive, State, Viewport,
/// };
///
/// let state = State::default();
///
/// assert_eq!(state.program, None);
/// assert!(!state.blend_enabled);
/// assert_eq!(state.blend_source, BlendFactor::SourceAlpha);
/// assert_eq!(state.blend_destination, BlendFactor::OneMinusSourceAlpha);
/// assert!(state.depth_enabled);
/// assert!(state.depth_write);
/// assert_eq!(state.depth_function, DepthFunction::Less);
/// assert!(state.cull_enabled);
/// assert_eq!(state.cull_face, CullFace::Back);
/// assert_eq!(state.viewport, Viewport::new(0, 0, 800, 600));
/// assert!(!state.wireframe);
/// assert_eq!(state.primitive, Primitive::Triangles);
/// ```
///
/// [Pipeline::set_state]: crate::pipeline::Pipeline::set_state
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct State {
    /// The program to activate, borrowed from the shader subsystem.
    ///
    /// `None` leaves whatever program is currently active in place.
    pub program: Option<ProgramHandle>,

    pub blend_enabled: bool,
    pub blend_source: BlendFactor,
    pub blend_destination: BlendFactor,

    pub depth_enabled: bool,
    pub depth_write: bool,
    pub depth_function: DepthFunction,

    pub cull_enabled: bool,
    pub cull_face: CullFace,

    pub viewport: Viewport,

    /// Rasterize polygons as outlines rather than filled.
    pub wireframe: bool,

    /// Topology used by draw calls issued under this state.
    pub primitive: Primitive,
}

impl State {
    /// Starts a [StateBuilder] from [State::default].
    pub fn begin() -> StateBuilder {
        StateBuilder::new()
    }

    /// Whether face culling is in effect: enabled and with a face other than [CullFace::None].
    pub fn culls_faces(&self) -> bool {
        self.cull_enabled && self.cull_face != CullFace::None
    }

    /// Checks the invariants of this state, see [validate::validate].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::validate(self)
    }
}

impl Default for State {
    fn default() -> Self {
        State {
            program: None,
            blend_enabled: false,
            blend_source: BlendFactor::SourceAlpha,
            blend_destination: BlendFactor::OneMinusSourceAlpha,
            depth_enabled: true,
            depth_write: true,
            depth_function: DepthFunction::Less,
            cull_enabled: true,
            cull_face: CullFace::Back,
            viewport: Viewport::new(0, 0, 800, 600),
            wireframe: false,
            primitive: Primitive::Triangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_culls_faces() {
        let mut state = State::default();

        assert!(state.culls_faces());

        state.cull_face = CullFace::None;

        assert!(!state.culls_faces());

        state.cull_face = CullFace::Front;
        state.cull_enabled = false;

        assert!(!state.culls_faces());
    }

    #[test]
    fn test_state_is_copied_by_value() {
        let original = State::default();
        let mut copy = original;

        copy.wireframe = true;
        copy.viewport.width = 1;

        assert!(!original.wireframe);
        assert_eq!(original.viewport.width, 800);
    }
}
