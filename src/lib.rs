//! Render-state tracking and GPU resource management on top of OpenGL ES 3.0 / WebGL 2.0 style
//! graphics contexts.
//!
//! The crate is split into three layers:
//!
//! - [context]: the [GraphicsContext] boundary every other module talks to the device through,
//!   with a WebGL 2.0 implementation ([context::WebGlContext]) and a call-recording one
//!   ([context::RecordingContext]).
//! - [pipeline]: declarative render [State](pipeline::State) descriptions and the
//!   [Pipeline](pipeline::Pipeline) that applies them with as few redundant driver calls as
//!   possible.
//! - [resource]: buffers, a buffer pool, vertex layouts, vertex arrays and meshes.
//!
//! All operations are synchronous and must be called from the thread that owns the context.
//!
//! [GraphicsContext]: context::GraphicsContext

pub mod context;
pub mod pipeline;
pub mod resource;

mod error;
pub use self::error::Error;
