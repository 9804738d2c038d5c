//! Tests for error types

use fleet_dispatch::core::{DispatchError, ErrorClass};
use fleet_dispatch::nav::PathError;
use fleet_dispatch::util::RegionId;

#[test]
fn test_no_vehicle_error() {
    let err = DispatchError::NoVehicleAvailable;
    assert_eq!(format!("{err}"), "no vehicle available");
    assert_eq!(err.class(), ErrorClass::Capacity);
    assert!(err.is_retryable());
}

#[test]
fn test_placement_exhausted_error() {
    let err = DispatchError::PlacementExhausted {
        region: RegionId::new("docks"),
        attempts: 20,
    };
    assert_eq!(format!("{err}"), "no valid spawn point in region `docks` after 20 attempts");
    assert!(err.is_retryable());
}

#[test]
fn test_task_limit_error() {
    let err = DispatchError::TaskLimitReached { live: 8, max: 8 };
    assert_eq!(format!("{err}"), "task limit reached: 8 live of 8");
}

#[test]
fn test_path_error_converts() {
    let err: DispatchError = PathError::EmptyGraph.into();
    assert_eq!(err.class(), ErrorClass::Pathfinding);
    assert!(err.is_retryable());
}

#[test]
fn test_integrity_errors_are_not_retried() {
    for err in [
        DispatchError::UnknownRegion(RegionId::new("x")),
        DispatchError::UnknownPreset("x".into()),
        DispatchError::InvalidConfig("bad".into()),
    ] {
        assert_eq!(err.class(), ErrorClass::Integrity);
        assert!(!err.is_retryable());
    }
}

#[test]
fn test_backend_error() {
    let err = DispatchError::Persistence("disk full".to_string());
    assert_eq!(format!("{err}"), "persistence error: disk full");
    assert_eq!(err.class(), ErrorClass::Backend);
}
