#![cfg(feature = "simd")]

use inspectvision::lowlevel::{dot_and_norms_scalar, dot_and_norms_simd};
use inspectvision::{Frame, Region};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn noise(width: usize, height: usize, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    Frame::from_fn(width, height, |_, _| {
        [rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>()]
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-5 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn simd_sums_match_scalar_for_odd_shapes() {
    for (width, height, seed) in [(1, 1, 1), (3, 5, 2), (17, 9, 3), (64, 48, 4)] {
        let a = noise(width, height, seed);
        let b = noise(width, height, seed + 100);
        let scalar = dot_and_norms_scalar(a.view(), b.view());
        let simd = dot_and_norms_simd(a.view(), b.view());
        assert!(close(scalar.0, simd.0), "dot {scalar:?} vs {simd:?}");
        assert!(close(scalar.1, simd.1));
        assert!(close(scalar.2, simd.2));
    }
}

#[test]
fn simd_sums_match_scalar_on_strided_crops() {
    let a = noise(80, 60, 7);
    let b = noise(80, 60, 8);
    let region = Region::new(3, 5, 29, 21);
    let ca = a.view().crop(region).unwrap();
    let cb = b.view().crop(region).unwrap();
    let scalar = dot_and_norms_scalar(ca, cb);
    let simd = dot_and_norms_simd(ca, cb);
    assert!(close(scalar.0, simd.0));
    assert!(close(scalar.1, simd.1));
    assert!(close(scalar.2, simd.2));
}
