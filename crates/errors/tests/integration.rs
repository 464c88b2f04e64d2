//! Integration tests for error types

#[cfg(test)]
mod tests {
    use cfgcache_errors::*;

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::InvalidValue {
            field: "CFGCACHE_PROBLEMS".into(),
            value: "sometimes".into(),
        };
        let err: Error = config_err.into();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.user_code(), Some("config.invalid_value"));
        assert_eq!(err.user_hint(), Some("Use either `fail` or `warn`."));
    }

    #[test]
    fn test_error_display() {
        let err = ReportError::WriteFailed {
            path: "/tmp/report.html".into(),
            message: "disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to write report /tmp/report.html: disk full"
        );
    }

    #[test]
    fn test_problems_failures_are_not_retryable() {
        let err: Error = ProblemsError::Disallowed {
            causes: vec![ProblemCause::new("cannot serialize Thread").with_location("task `:a`")],
            message: ConsoleText::ready("1 problem was found storing the configuration cache."),
        }
        .into();

        assert!(err.is_problems_failure());
        assert!(!err.is_retryable());
        assert_eq!(err.user_code(), Some("problems.disallowed"));
        assert!(err
            .user_message()
            .starts_with("Configuration cache problems found in this build."));
    }

    #[test]
    fn test_internal_problems_errors_are_not_failures() {
        let err: Error = ProblemsError::ActionNotSet.into();
        assert!(!err.is_problems_failure());
        if let Error::Problems(inner) = &err {
            assert!(inner.causes().is_empty());
            assert!(inner.console_text().is_none());
        }
    }

    #[test]
    fn test_error_clone() {
        let err = ProblemsError::MissingInvalidation {
            action: "store".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_names_the_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::io_with_path(&io_err, "/work/problems.json");
        assert!(matches!(err, Error::Io { path: Some(_), .. }));
        assert_eq!(err.to_string(), "cannot access /work/problems.json: missing");
        assert_eq!(err.user_code(), Some("error.io"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_cause_display_includes_location() {
        let cause = ProblemCause::new("boom").with_location("build file 'build.toml': line 3");
        assert_eq!(cause.to_string(), "build file 'build.toml': line 3: boom");
    }
}
