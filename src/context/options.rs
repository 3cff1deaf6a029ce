use serde_derive::Serialize;

/// Hint to the browser about the kind of GPU that should back a context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerPreference {
    Default,
    HighPerformance,
    LowPower,
}

impl Default for PowerPreference {
    fn default() -> Self {
        PowerPreference::Default
    }
}

/// Attributes used when obtaining a WebGL 2.0 context from a canvas element.
///
/// May be instantiated with the WebGL defaults through [Default], or built up from those
/// defaults with [ContextOptions::begin]:
///
/// ```
/// use glitz_pipeline::context::{ContextOptions, PowerPreference};
///
/// let options = ContextOptions::begin()
///     .antialias(false)
///     .power_preference(PowerPreference::HighPerformance)
///     .finish();
///
/// assert!(!options.antialias());
/// assert!(options.depth());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    alpha: bool,
    antialias: bool,
    depth: bool,
    stencil: bool,
    preserve_drawing_buffer: bool,
    fail_if_major_performance_caveat: bool,
    premultiplied_alpha: bool,
    power_preference: PowerPreference,
}

impl ContextOptions {
    pub fn begin() -> ContextOptionsBuilder {
        ContextOptionsBuilder {
            options: ContextOptions::default(),
        }
    }

    pub fn alpha(&self) -> bool {
        self.alpha
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    pub fn depth(&self) -> bool {
        self.depth
    }

    pub fn stencil(&self) -> bool {
        self.stencil
    }

    pub fn preserve_drawing_buffer(&self) -> bool {
        self.preserve_drawing_buffer
    }

    pub fn fail_if_major_performance_caveat(&self) -> bool {
        self.fail_if_major_performance_caveat
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    pub fn power_preference(&self) -> PowerPreference {
        self.power_preference
    }

    pub(crate) fn to_attributes(&self) -> ContextAttributes {
        ContextAttributes {
            alpha: self.alpha,
            antialias: self.antialias,
            depth: self.depth,
            fail_if_major_performance_caveat: self.fail_if_major_performance_caveat,
            power_preference: self.power_preference,
            premultiplied_alpha: self.premultiplied_alpha,
            preserve_drawing_buffer: self.preserve_drawing_buffer,
            stencil: self.stencil,
        }
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            alpha: true,
            antialias: true,
            depth: true,
            stencil: true,
            preserve_drawing_buffer: false,
            fail_if_major_performance_caveat: false,
            premultiplied_alpha: true,
            power_preference: PowerPreference::default(),
        }
    }
}

pub struct ContextOptionsBuilder {
    options: ContextOptions,
}

impl ContextOptionsBuilder {
    pub fn alpha(mut self, alpha: bool) -> Self {
        self.options.alpha = alpha;

        self
    }

    pub fn antialias(mut self, antialias: bool) -> Self {
        self.options.antialias = antialias;

        self
    }

    pub fn depth(mut self, depth: bool) -> Self {
        self.options.depth = depth;

        self
    }

    pub fn stencil(mut self, stencil: bool) -> Self {
        self.options.stencil = stencil;

        self
    }

    pub fn preserve_drawing_buffer(mut self, preserve_drawing_buffer: bool) -> Self {
        self.options.preserve_drawing_buffer = preserve_drawing_buffer;

        self
    }

    pub fn fail_if_major_performance_caveat(
        mut self,
        fail_if_major_performance_caveat: bool,
    ) -> Self {
        self.options.fail_if_major_performance_caveat = fail_if_major_performance_caveat;

        self
    }

    pub fn premultiplied_alpha(mut self, premultiplied_alpha: bool) -> Self {
        self.options.premultiplied_alpha = premultiplied_alpha;

        self
    }

    pub fn power_preference(mut self, power_preference: PowerPreference) -> Self {
        self.options.power_preference = power_preference;

        self
    }

    pub fn finish(self) -> ContextOptions {
        self.options
    }
}

/// The JS-side `WebGLContextAttributes` dictionary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContextAttributes {
    alpha: bool,
    antialias: bool,
    depth: bool,
    fail_if_major_performance_caveat: bool,
    power_preference: PowerPreference,
    premultiplied_alpha: bool,
    preserve_drawing_buffer: bool,
    stencil: bool,
}
