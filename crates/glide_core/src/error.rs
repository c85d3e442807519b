use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f32 },

    #[error("{what} must not be negative, got {value}")]
    Negative { what: &'static str, value: f32 },

    #[error("percentage {0} is outside 0.0..=1.0")]
    PercentOutOfRange(f32),
}

impl GeometryError {
    /// Check that `value` is a finite, non-negative length
    pub fn check_length(what: &'static str, value: f32) -> Result<f32, GeometryError> {
        if !value.is_finite() {
            return Err(GeometryError::NonFinite { what, value });
        }
        if value < 0.0 {
            return Err(GeometryError::Negative { what, value });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_length() {
        assert_eq!(GeometryError::check_length("width", 10.0), Ok(10.0));
        assert!(matches!(
            GeometryError::check_length("width", f32::NAN),
            Err(GeometryError::NonFinite { what: "width", .. })
        ));
        assert_eq!(
            GeometryError::check_length("height", -1.0),
            Err(GeometryError::Negative {
                what: "height",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = GeometryError::PercentOutOfRange(1.5);
        assert_eq!(err.to_string(), "percentage 1.5 is outside 0.0..=1.0");
    }
}
