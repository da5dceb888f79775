use super::*;

#[test]
fn bounds_clamp_inverted_edges() {
    let b = Bounds::new(50, 40, 10, 20);
    assert_eq!(b.right, 50);
    assert_eq!(b.bottom, 40);
    assert_eq!(b.width(), 0);
    assert_eq!(b.height(), 0);
    assert!(b.is_empty());
}

#[test]
fn bounds_spans_handle_negative_origins() {
    let b = Bounds::new(-30, -10, 70, 15);
    assert_eq!(b.width(), 100);
    assert_eq!(b.height(), 25);
    assert!(!b.is_empty());
}

#[test]
fn bounds_span_does_not_overflow_at_extremes() {
    let b = Bounds::new(i32::MIN, 0, i32::MAX, 1);
    assert_eq!(b.width(), u32::MAX);
}
