pub fn assert_near(actual: f64, expected: f64, tolerance: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

pub fn assert_all_near(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch: {actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert_near(*a, *e, tolerance);
    }
}
