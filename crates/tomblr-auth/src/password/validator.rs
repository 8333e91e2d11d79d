//! PIN format rules for registration.

use tomblr_core::error::AppError;

/// Number of digits in an account PIN.
pub const PIN_LENGTH: usize = 6;

/// Validates new account PINs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinValidator;

impl PinValidator {
    /// Checks that `pin` is exactly six ASCII digits and equals `confirm`.
    pub fn validate(pin: &str, confirm: &str) -> Result<(), AppError> {
        if pin.len() != PIN_LENGTH || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(format!(
                "PIN must be exactly {PIN_LENGTH} digits"
            )));
        }
        if pin != confirm {
            return Err(AppError::validation("PINs do not match"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_six_digits() {
        assert!(PinValidator::validate("012345", "012345").is_ok());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(PinValidator::validate("12345", "12345").is_err());
        assert!(PinValidator::validate("1234567", "1234567").is_err());
        assert!(PinValidator::validate("12a456", "12a456").is_err());
        assert!(PinValidator::validate("١٢٣٤٥٦", "١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_rejects_mismatch() {
        assert!(PinValidator::validate("123456", "123457").is_err());
    }
}
