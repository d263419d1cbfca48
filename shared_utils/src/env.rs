use thiserror::Error;

/// A credential or setting the pipeline needs is not set in the environment.
///
/// Variables that are present but blank (a common leftover in `.env`
/// templates) are reported the same way.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables. Surrounding
/// whitespace is trimmed.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn reads_and_trims_present_variable() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_TOKEN", "  abc123 \n") };
        assert_eq!(get_env_var("SHARED_UTILS_TEST_TOKEN").unwrap(), "abc123");
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_TOKEN") };
    }

    #[test]
    #[serial]
    fn blank_variable_is_missing() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_TOKEN", "   ") };
        let err = get_env_var("SHARED_UTILS_TEST_TOKEN").unwrap_err();
        assert_eq!(err.to_string(), "Missing environment variable: SHARED_UTILS_TEST_TOKEN");
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_TOKEN") };
    }
}
