//! Integration tests for error types

#[cfg(test)]
mod tests {
    use dlsim_errors::*;

    #[test]
    fn test_error_conversion() {
        let alloc_err = AllocationError::UnknownProcess { process: 7 };
        let err: Error = alloc_err.into();
        assert!(matches!(err, Error::Allocation(_)));
    }

    #[test]
    fn test_error_display() {
        let err = AllocationError::InsufficientResources {
            process: 1,
            resource: 2,
            available: 0,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient resources for proc 1: resource 2 has 0 available, 3 requested"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = ConfigError::MissingField {
            field: "resources".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_fatal_classification() {
        let ledger: Error = AllocationError::ReleaseExceedsAllocation {
            process: 0,
            resource: 0,
            held: 1,
            released: 2,
        }
        .into();
        assert!(ledger.is_fatal());

        let rejected: Error = AllocationError::ExceedsDeclaredMaximum {
            process: 0,
            requested: "[2, 0]".into(),
            allocated: "[0, 0]".into(),
            maximum: "[1, 1]".into(),
        }
        .into();
        assert!(!rejected.is_fatal());
    }

    #[test]
    fn test_user_codes() {
        let err: Error = ConfigError::InvalidValue {
            field: "DLSIM_SEED".into(),
            value: "abc".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("config.invalid_value"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert!(err.is_retryable());
    }
}
