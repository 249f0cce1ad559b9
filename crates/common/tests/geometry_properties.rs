//! Property tests for rectangle geometry

use fonttik_common::Rect;
use proptest::prelude::*;

fn rect() -> impl Strategy<Value = Rect> {
    (-500i32..2000, -500i32..2000, 0i32..800, 0i32..800)
        .prop_map(|(x, y, width, height)| Rect::new(x, y, width, height))
}

#[test]
fn proptest_union_encloses_both() {
    proptest!(|(a in rect(), b in rect())| {
        let union = a.union(&b);
        prop_assert!(union.contains_rect(&a));
        prop_assert!(union.contains_rect(&b));
        prop_assert_eq!(union, b.union(&a));
    });
}

#[test]
fn proptest_intersection_is_inside_both() {
    proptest!(|(a in rect(), b in rect())| {
        match a.intersection(&b) {
            Some(common) => {
                prop_assert!(a.contains_rect(&common));
                prop_assert!(b.contains_rect(&common));
                prop_assert!(!common.is_empty());
            }
            None => prop_assert!(b.intersection(&a).is_none()),
        }
    });
}

#[test]
fn proptest_clamp_stays_in_frame() {
    proptest!(|(r in rect(), width in 1u32..1920, height in 1u32..1080)| {
        let clamped = r.clamp_to(width, height);
        prop_assert!(clamped.x >= 0 && clamped.y >= 0);
        prop_assert!(clamped.right() <= width as i32);
        prop_assert!(clamped.bottom() <= height as i32);
        prop_assert!(clamped.width >= 0 && clamped.height >= 0);
    });
}
