use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

/// Constant-time string comparison for editor tokens
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a write request's token against the configured editor token.
///
/// With no token configured every write is allowed.
pub fn authorize(expected: Option<&str>, provided: Option<&str>) -> Result<()> {
    let Some(expected) = expected.filter(|t| !t.is_empty()) else {
        return Ok(());
    };

    match provided {
        Some(token) if constant_time_compare(expected, token) => Ok(()),
        Some(_) => {
            tracing::warn!("Rejected write with invalid editor token");
            Err(AppError::Unauthorized("invalid editor token".into()))
        }
        None => Err(AppError::Unauthorized("editor token required".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret123", "secret123"));
        assert!(!constant_time_compare("secret123", "secret124"));
        assert!(!constant_time_compare("secret123", "secret12"));
        assert!(!constant_time_compare("", "secret"));
    }

    #[test]
    fn test_authorize() {
        tokio_test::assert_ok!(authorize(None, None));
        tokio_test::assert_ok!(authorize(Some(""), None));
        tokio_test::assert_ok!(authorize(Some("s3cret"), Some("s3cret")));
        assert!(matches!(
            authorize(Some("s3cret"), Some("guess")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(Some("s3cret"), None),
            Err(AppError::Unauthorized(_))
        ));
    }
}
