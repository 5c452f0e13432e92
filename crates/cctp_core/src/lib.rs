pub mod annotate;
pub mod domain;
pub mod error;
pub mod markers;
pub mod outline;
pub mod render;
pub mod structure;
pub mod xref;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("EXPORT_TEST", "export failed")
            .with_details("path=out.pdf; err=denied")
            .with_retryable(false);
        assert_eq!(err.code, "EXPORT_TEST");
        assert_eq!(err.message, "export failed");
        assert!(!err.retryable);
        assert_eq!(
            err.to_string(),
            "[EXPORT_TEST] export failed (path=out.pdf; err=denied)"
        );
    }
}
