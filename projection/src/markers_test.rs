use super::*;

fn spec(id: i64, icon: &str, on_map: bool) -> MarkerSpec<i64> {
    MarkerSpec { id, icon_url: icon.to_owned(), on_map }
}

fn live(entries: &[(i64, &str)]) -> HashMap<i64, String> {
    entries.iter().map(|(id, icon)| (*id, (*icon).to_owned())).collect()
}

#[test]
fn empty_to_empty_is_noop() {
    let diff = map_marker_diff::<i64, String>(&HashMap::new(), &[]);
    assert!(diff.is_noop());
    assert!(diff.keep.is_empty());
}

#[test]
fn new_on_map_objects_are_created() {
    let diff = map_marker_diff(&live(&[]), &[spec(1, "a.png", true), spec(2, "b.png", true)]);
    assert_eq!(diff.create, vec![1, 2]);
    assert!(diff.keep.is_empty());
    assert!(diff.remove.is_empty());
}

#[test]
fn off_map_objects_are_never_created() {
    let diff = map_marker_diff(&live(&[]), &[spec(1, "a.png", false)]);
    assert!(diff.is_noop());
}

#[test]
fn unchanged_icon_keeps_marker() {
    let diff = map_marker_diff(&live(&[(1, "a.png")]), &[spec(1, "a.png", true)]);
    assert_eq!(diff.keep, vec![1]);
    assert!(diff.is_noop());
}

#[test]
fn changed_icon_forces_recreate() {
    let diff = map_marker_diff(&live(&[(1, "a.png")]), &[spec(1, "a2.png", true)]);
    assert!(diff.keep.is_empty());
    assert_eq!(diff.remove, vec![1]);
    assert_eq!(diff.create, vec![1]);
}

#[test]
fn icon_comparison_is_byte_exact() {
    let diff = map_marker_diff(&live(&[(1, "/img/A.png")]), &[spec(1, "/img/a.png", true)]);
    assert_eq!(diff.remove, vec![1]);
    assert_eq!(diff.create, vec![1]);
}

#[test]
fn object_leaving_map_is_removed_only() {
    let diff = map_marker_diff(&live(&[(1, "a.png")]), &[spec(1, "a.png", false)]);
    assert_eq!(diff.remove, vec![1]);
    assert!(diff.create.is_empty());
}

#[test]
fn vanished_objects_are_removed_sorted() {
    let diff = map_marker_diff(&live(&[(3, "c.png"), (1, "a.png"), (2, "b.png")]), &[spec(2, "b.png", true)]);
    assert_eq!(diff.keep, vec![2]);
    assert_eq!(diff.remove, vec![1, 3]);
}

#[test]
fn duplicate_ids_are_considered_once() {
    let diff = map_marker_diff(&live(&[]), &[spec(1, "a.png", true), spec(1, "a.png", true)]);
    assert_eq!(diff.create, vec![1]);
}

#[test]
fn mixed_update() {
    let previous = live(&[(1, "keep.png"), (2, "old.png"), (4, "gone.png")]);
    let current = [spec(1, "keep.png", true), spec(2, "new.png", true), spec(3, "fresh.png", true)];
    let diff = map_marker_diff(&previous, &current);
    assert_eq!(diff.keep, vec![1]);
    assert_eq!(diff.create, vec![2, 3]);
    assert_eq!(diff.remove, vec![2, 4]);
}
