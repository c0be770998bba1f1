//! Environment variable expansion for configuration strings.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` is the config path reported when a variable is unset.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(expand_env("127.0.0.1", "server.host").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDSAFE_EXPAND_UNSET");
        }
        assert_eq!(
            expand_env("${MDSAFE_EXPAND_UNSET:-fallback}", "render.id_prefix").unwrap(),
            "fallback"
        );
    }

    #[test]
    fn test_unset_without_default_is_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDSAFE_EXPAND_MISSING");
        }
        let err = expand_env("${MDSAFE_EXPAND_MISSING}", "server.host").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable error in server.host: ${MDSAFE_EXPAND_MISSING} not set"
        );
    }
}
