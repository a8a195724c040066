use crate::algebra::*;

#[test]
fn test_dot_and_norms() {
    let x = vec![1., -4., 2.];
    let y = vec![2., 1., 0.5];
    assert_eq!(x.dot(&y), -1.);
    assert_eq!(x.norm_inf(), 4.);
    assert_eq!(x.dist_inf(&y), 5.);

    let z = vec![1., f64::NAN];
    assert!(z.norm_inf().is_nan());
}

#[test]
fn test_clip() {
    let mut x = vec![-1., 0.5, 7., -3.];
    let lo = vec![0., 0., 0., f64::NEG_INFINITY];
    let hi = vec![1., 1., f64::INFINITY, 0.];
    x.clip(&lo, &hi);
    assert_eq!(x, vec![0., 0.5, 7., -3.]);

    assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
    assert_eq!(clamp(-2.0, f64::NEG_INFINITY, 1.0), -2.0);
}

#[test]
fn test_set() {
    let mut x = vec![1.0f32; 4];
    x.set(-2.);
    assert!(x.iter().all(|&v| v == -2.));
}
