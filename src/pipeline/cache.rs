use crate::context::{Capability, ContextUpdate, GraphicsContext, ProgramHandle};

/// Memo of the program and capability toggles most recently sent to a context.
///
/// This is not semantic state: it only exists to elide redundant program binds and
/// enable/disable calls. Each setter updates the memo and returns the [ContextUpdate] that still
/// has to be applied to the context, which is `None` when the context is already known to be in
/// the requested state.
///
/// A toggle recorded as `None` is unknown; the next setter call for it always reaches the context.
/// The memo is only correct as long as nothing else changes the tracked context state. When
/// another writer may have touched the context, call [AppliedState::invalidate].
#[derive(Clone, PartialEq, Debug)]
pub struct AppliedState {
    program: Option<ProgramHandle>,
    blend_enabled: Option<bool>,
    depth_test_enabled: Option<bool>,
    cull_face_enabled: Option<bool>,
}

impl AppliedState {
    /// The memo for a freshly created context: no program and all toggles disabled.
    pub fn initial() -> Self {
        AppliedState {
            program: None,
            blend_enabled: Some(false),
            depth_test_enabled: Some(false),
            cull_face_enabled: Some(false),
        }
    }

    /// A memo that knows nothing about the context.
    pub fn unknown() -> Self {
        AppliedState {
            program: None,
            blend_enabled: None,
            depth_test_enabled: None,
            cull_face_enabled: None,
        }
    }

    pub fn invalidate(&mut self) {
        *self = AppliedState::unknown();
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    pub fn blend_enabled(&self) -> Option<bool> {
        self.blend_enabled
    }

    pub fn depth_test_enabled(&self) -> Option<bool> {
        self.depth_test_enabled
    }

    pub fn cull_face_enabled(&self) -> Option<bool> {
        self.cull_face_enabled
    }

    pub fn use_program<C>(&mut self, program: ProgramHandle) -> impl ContextUpdate<C>
    where
        C: GraphicsContext + ?Sized,
    {
        if self.program != Some(program) {
            log::trace!("binding {} (was {:?})", program, self.program);

            self.program = Some(program);

            Some(move |context: &mut C| context.use_program(Some(program)))
        } else {
            log::trace!("{} already bound, skipping", program);

            None
        }
    }

    /// Drops the remembered program identity, so that the next [use_program] always binds.
    ///
    /// [use_program]: AppliedState::use_program
    pub fn forget_program(&mut self) {
        self.program = None;
    }

    pub fn set_blend_enabled<C>(&mut self, blend_enabled: bool) -> impl ContextUpdate<C>
    where
        C: GraphicsContext + ?Sized,
    {
        toggle(&mut self.blend_enabled, Capability::Blend, blend_enabled)
    }

    pub fn set_depth_test_enabled<C>(&mut self, depth_test_enabled: bool) -> impl ContextUpdate<C>
    where
        C: GraphicsContext + ?Sized,
    {
        toggle(
            &mut self.depth_test_enabled,
            Capability::DepthTest,
            depth_test_enabled,
        )
    }

    pub fn set_cull_face_enabled<C>(&mut self, cull_face_enabled: bool) -> impl ContextUpdate<C>
    where
        C: GraphicsContext + ?Sized,
    {
        toggle(
            &mut self.cull_face_enabled,
            Capability::CullFace,
            cull_face_enabled,
        )
    }
}

impl Default for AppliedState {
    fn default() -> Self {
        AppliedState::initial()
    }
}

fn toggle<C>(
    memo: &mut Option<bool>,
    capability: Capability,
    enabled: bool,
) -> impl ContextUpdate<C>
where
    C: GraphicsContext + ?Sized,
{
    if *memo != Some(enabled) {
        log::trace!("{:?}: {:?} -> {}", capability, memo, enabled);

        *memo = Some(enabled);

        Some(move |context: &mut C| {
            if enabled {
                context.enable(capability);
            } else {
                context.disable(capability);
            }
        })
    } else {
        None
    }
}
