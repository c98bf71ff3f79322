#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

fn params() -> ArParams {
    ArParams { max_distance: 100.0, perspective: 1000.0 }
}

// --- ar_visibility ---

#[test]
fn visible_straight_ahead_in_range() {
    assert!(ar_visibility(0.0, 50.0, 100.0));
}

#[test]
fn angular_boundary_is_excluded() {
    assert!(!ar_visibility(90.0, 10.0, 100.0));
    assert!(!ar_visibility(-90.0, 10.0, 100.0));
    assert!(ar_visibility(89.999, 10.0, 100.0));
    assert!(ar_visibility(-89.999, 10.0, 100.0));
}

#[test]
fn distance_boundary_is_included() {
    assert!(ar_visibility(0.0, 100.0, 100.0));
    assert!(!ar_visibility(0.0, 100.000_1, 100.0));
}

#[test]
fn behind_viewer_is_hidden() {
    assert!(!ar_visibility(180.0, 1.0, 100.0));
    assert!(!ar_visibility(-135.0, 1.0, 100.0));
}

// --- ar_transform ---

#[test]
fn transform_straight_ahead() {
    let t = ar_transform(0.0, 50.0, 100.0, 1000.0);
    assert_eq!(t.rotation_deg, 0.0);
    assert!(approx_eq(t.tx, 0.0, EPSILON));
    assert_eq!(t.ty, 0.0);
    assert!(approx_eq(t.tz, 500.0, EPSILON));
    assert_eq!(t.z_index, 5001);
}

#[test]
fn transform_off_axis() {
    let t = ar_transform(30.0, 100.0, 100.0, 1000.0);
    assert_eq!(t.rotation_deg, -30.0);
    assert!(approx_eq(t.tx, 500.0, 1e-6));
    assert!(approx_eq(t.tz, 1000.0 * 30f64.to_radians().cos(), 1e-6));
    assert_eq!(t.z_index, 1);
}

#[test]
fn transform_left_side_is_negative_x() {
    let t = ar_transform(-45.0, 10.0, 100.0, 1000.0);
    assert!(t.tx < 0.0);
    assert_eq!(t.rotation_deg, 45.0);
}

#[test]
fn closer_objects_stack_higher() {
    let near = ar_transform(0.0, 10.0, 100.0, 1000.0);
    let far = ar_transform(0.0, 90.0, 100.0, 1000.0);
    assert!(near.z_index > far.z_index);
}

#[test]
fn z_index_rounds_fractional_meters() {
    let t = ar_transform(0.0, 60.006, 100.0, 1000.0);
    assert_eq!(t.z_index, 4000);
}

#[test]
fn css_negates_depth() {
    let t = ArTransform { rotation_deg: -10.0, tx: 1.0, ty: 0.0, tz: 2.5, z_index: 3 };
    assert_eq!(t.css(), "translate3d(1.000px, 0.000px, -2.500px) rotateY(-10.000deg)");
}

// --- project ---

#[test]
fn scenario_object_due_east_facing_east() {
    let viewer = LatLon::new(52.0, 13.0);
    let target = LatLon::new(52.0, 13.0009);
    let (_, distance) = bearing_and_distance(viewer, target);
    let t = project(viewer, 90.0, target, params());
    let Some(t) = t else {
        panic!("object ahead should be visible");
    };
    assert!(t.rotation_deg.abs() < 0.01);
    assert!(t.tx.abs() < 0.2);
    #[allow(clippy::cast_possible_truncation)]
    let expected = ((100.0 - distance) * 100.0 + 1.0).round() as i64;
    assert_eq!(t.z_index, expected);
    assert!(t.z_index > 3000 && t.z_index < 4600);
}

#[test]
fn scenario_object_due_south_facing_east_is_hidden() {
    let viewer = LatLon::new(52.0, 13.0);
    let target = LatLon::new(51.9995, 13.0);
    assert!(project(viewer, 90.0, target, params()).is_none());
}

#[test]
fn object_beyond_draw_distance_is_hidden() {
    let viewer = LatLon::new(52.0, 13.0);
    let target = LatLon::new(52.01, 13.0);
    assert!(project(viewer, 0.0, target, params()).is_none());
}
