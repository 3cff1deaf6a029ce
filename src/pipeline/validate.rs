use thiserror::Error;

use super::state::{BlendFactor, State};

/// Returned by [validate] when a [State] violates one of its invariants.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ValidationError {
    #[error("invalid viewport dimensions: {width}x{height}")]
    InvalidViewport { width: i32, height: i32 },

    #[error("invalid blend function: both source and destination factors are zero")]
    InvalidBlendFunction,
}

/// Checks that `state` describes a usable configuration.
///
/// The viewport must have a positive width and height. When blending is enabled, the source and
/// destination factors must not both be [BlendFactor::Zero], as such a blend function makes every
/// fragment invisible. The first violation found is returned; `state` is never modified.
pub fn validate(state: &State) -> Result<(), ValidationError> {
    let viewport = &state.viewport;

    if viewport.width <= 0 || viewport.height <= 0 {
        return Err(ValidationError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }

    if state.blend_enabled
        && state.blend_source == BlendFactor::Zero
        && state.blend_destination == BlendFactor::Zero
    {
        return Err(ValidationError::InvalidBlendFunction);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::pipeline::Viewport;

    #[rstest]
    #[case(800, 600, false, BlendFactor::Zero, BlendFactor::Zero, None)]
    #[case(1, 1, true, BlendFactor::Zero, BlendFactor::One, None)]
    #[case(1, 1, true, BlendFactor::One, BlendFactor::Zero, None)]
    #[case(
        0,
        600,
        false,
        BlendFactor::One,
        BlendFactor::Zero,
        Some(ValidationError::InvalidViewport { width: 0, height: 600 })
    )]
    #[case(
        800,
        -1,
        false,
        BlendFactor::One,
        BlendFactor::Zero,
        Some(ValidationError::InvalidViewport { width: 800, height: -1 })
    )]
    #[case(
        800,
        600,
        true,
        BlendFactor::Zero,
        BlendFactor::Zero,
        Some(ValidationError::InvalidBlendFunction)
    )]
    #[case(
        0,
        0,
        true,
        BlendFactor::Zero,
        BlendFactor::Zero,
        Some(ValidationError::InvalidViewport { width: 0, height: 0 })
    )]
    fn test_validate(
        #[case] width: i32,
        #[case] height: i32,
        #[case] blend_enabled: bool,
        #[case] blend_source: BlendFactor,
        #[case] blend_destination: BlendFactor,
        #[case] expected: Option<ValidationError>,
    ) {
        let state = State {
            viewport: Viewport::new(0, 0, width, height),
            blend_enabled,
            blend_source,
            blend_destination,
            ..State::default()
        };

        assert_eq!(validate(&state).err(), expected);
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let state = State {
            blend_enabled: true,
            blend_source: BlendFactor::Zero,
            blend_destination: BlendFactor::Zero,
            ..State::default()
        };
        let before = state;

        let _ = validate(&state);

        assert_eq!(state, before);
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::InvalidViewport {
            width: 0,
            height: 600,
        };

        assert_eq!(err.to_string(), "invalid viewport dimensions: 0x600");
    }
}
