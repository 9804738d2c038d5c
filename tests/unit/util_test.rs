//! Tests for shared utilities

use fleet_dispatch::util::{init_tracing, init_tracing_with, now_ms, point_along, PayloadKind, RegionId, TaskPayload, Vec3};

#[test]
fn test_now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing_with("fleet_dispatch=debug");
    init_tracing();
    init_tracing();
}

#[test]
fn test_region_id_is_a_plain_json_string() {
    let id = RegionId::from("harbor");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"harbor\"");
    assert_eq!(id.to_string(), "harbor");
}

#[test]
fn test_payload_kinds_and_defaults() {
    let payload: TaskPayload = serde_json::from_str(r#"{"kinds":["entity","money"]}"#).unwrap();
    assert!(payload.has_kind(PayloadKind::Money));
    assert!(payload.has_kind(PayloadKind::Entity));
    assert_eq!(payload.reward, 0);
    assert!(payload.entity.is_none());
}

#[test]
fn test_point_along_walks_segments() {
    let path = [Vec3::xy(0.0, 0.0), Vec3::xy(10.0, 0.0), Vec3::xy(10.0, 10.0)];
    let (mid, segment) = point_along(&path, 0.75).unwrap();
    assert_eq!(segment, 1);
    assert!((mid.x - 10.0).abs() < 1e-4);
    assert!((mid.y - 5.0).abs() < 1e-4);
    assert!(point_along(&[], 0.5).is_none());
}
