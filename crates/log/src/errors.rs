use std::error::Error;

/// Logs an error together with all its sources on a single line.
///
/// The argument is a reference to the error, e.g. `&err` for errors
/// implementing [`Error`] or `err.as_ref()` for `anyhow::Error`.
#[macro_export]
macro_rules! log_full_error {
    ($err:expr) => {
        tracing::error!("{}", $crate::full_error_message($err));
    };
}

/// Returns the error message followed by messages of all its sources.
pub fn full_error_message(err: &dyn Error) -> String {
    let mut error_message = format!("{}", err);
    let mut error = err;
    while let Some(source) = error.source() {
        error = source;
        error_message.push_str(&format!(": {}", error));
    }
    error_message
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_full_error_message() {
        let err = std::fs::read("/nonexistent/grids.json")
            .context("Failed to load grids")
            .unwrap_err();
        let source: &dyn Error = err.as_ref();
        let message = full_error_message(source);
        assert!(message.starts_with("Failed to load grids: "));
        assert!(message.len() > "Failed to load grids: ".len());
    }
}
