//! Tests for error types

use corescale::core::ControllerError;

#[test]
fn test_invalid_argument_error() {
    let err = ControllerError::InvalidArgument("max_active_units: must be within 2..=4, got 1".into());
    assert_eq!(
        err.to_string(),
        "invalid argument: max_active_units: must be within 2..=4, got 1"
    );
}

#[test]
fn test_unknown_parameter_error() {
    let err = ControllerError::UnknownParameter("turbo".into());
    assert_eq!(err.to_string(), "unknown parameter: turbo");
}

#[test]
fn test_startup_error() {
    let err = ControllerError::Startup("notifier unavailable".into());
    assert_eq!(err.to_string(), "startup failed: notifier unavailable");
}

#[test]
fn test_error_converts_into_anyhow() {
    fn fails() -> corescale::core::AppResult<()> {
        Err::<(), _>(ControllerError::Pool("cpu3 busy".into()))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "pool operation failed: cpu3 busy");
    assert!(err.downcast_ref::<ControllerError>().is_some());
}
