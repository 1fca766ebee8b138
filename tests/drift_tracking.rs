use inspectvision::tracking::converge;
use inspectvision::{ErrorKind, Frame, ObjectStatus, Region, TrackedObject};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const REGION: Region = Region::new(100, 100, 50, 50);

/// Two soft colour blobs on a grey background, content shifted by `(dx, dy)`.
fn blobs(width: usize, height: usize, dx: f32, dy: f32) -> Frame {
    Frame::from_fn(width, height, |x, y| {
        let fx = x as f32 - dx;
        let fy = y as f32 - dy;
        let blob = |cx: f32, cy: f32, sigma: f32| {
            let d2 = (fx - cx).powi(2) + (fy - cy).powi(2);
            (-d2 / (2.0 * sigma * sigma)).exp()
        };
        let a = blob(125.0, 125.0, 8.0);
        let b = blob(115.0, 135.0, 5.0);
        [0.2 + 0.7 * a, 0.2 + 0.6 * b, 0.2 + 0.4 * a + 0.3 * b]
    })
}

fn noise(width: usize, height: usize, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    Frame::from_fn(width, height, |_, _| {
        [rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>()]
    })
}

fn shifted(frame: &Frame, dx: usize, dy: usize) -> Frame {
    Frame::from_fn(frame.width(), frame.height(), |x, y| {
        if x < dx || y < dy {
            [0.0; 3]
        } else {
            frame.pixel(x - dx, y - dy).unwrap_or([0.0; 3])
        }
    })
}

fn bright_square(x0: usize, y0: usize) -> Frame {
    Frame::from_fn(300, 300, |x, y| {
        if (x0..x0 + 50).contains(&x) && (y0..y0 + 50).contains(&y) {
            [0.9, 0.9, 0.8]
        } else {
            [0.1, 0.1, 0.1]
        }
    })
}

#[test]
fn bright_square_is_followed_after_shift() {
    let base = bright_square(100, 100);
    let mut object = TrackedObject::binary("lamp", REGION, base.view(), true).unwrap();

    let moved = bright_square(102, 102);
    let before = object.update_similarity(moved.view()).unwrap();
    assert!(before < 0.999);
    let mut last = before;
    for _ in 0..50 {
        let step = object.update_coordinates(moved.view()).unwrap();
        assert!(step.after >= last);
        last = step.after;
        if step.moved.is_none() {
            break;
        }
    }

    assert!((object.similarity() - 1.0).abs() < 1e-5);
    assert_eq!(object.region().origin(), (102, 102));
}

#[test]
fn textured_square_is_recovered_after_small_shift() {
    let base = noise(300, 300, 42);
    let mut object = TrackedObject::binary("lamp", REGION, base.view(), true).unwrap();

    let moved = shifted(&base, 2, 2);
    let outcome = converge(&mut object, moved.view(), 50).unwrap();

    assert!(outcome.converged);
    assert_eq!(object.region().origin(), (102, 102));
    assert_eq!(object.region().size(), (50, 50));
    assert!((object.similarity() - 1.0).abs() < 1e-5);
    assert_eq!(object.status(), ObjectStatus::Locked);
}

#[test]
fn smooth_scene_is_followed_over_several_steps() {
    let base = blobs(300, 300, 0.0, 0.0);
    let mut object = TrackedObject::binary("lamp", REGION, base.view(), true).unwrap();

    let moved = blobs(300, 300, 4.0, 4.0);
    let outcome = converge(&mut object, moved.view(), 50).unwrap();

    assert!(outcome.converged);
    assert!(outcome.iterations >= 2);
    assert_eq!(object.region().origin(), (104, 104));
    assert!(object.similarity() > 0.999, "similarity {}", object.similarity());
}

#[test]
fn stored_similarity_never_decreases_while_climbing() {
    let base = blobs(300, 300, 0.0, 0.0);
    let mut object = TrackedObject::binary("lamp", REGION, base.view(), true).unwrap();
    let moved = blobs(300, 300, 6.0, -4.0);

    let mut previous = object.update_similarity(moved.view()).unwrap();
    for _ in 0..10 {
        let step = object.update_coordinates(moved.view()).unwrap();
        assert!(step.after >= step.before);
        assert!(step.after >= previous - 1e-6);
        assert_eq!(object.region().size(), REGION.size());
        previous = step.after;
        if step.moved.is_none() {
            break;
        }
    }
}

#[test]
fn iteration_cap_stops_the_search() {
    let base = blobs(300, 300, 0.0, 0.0);
    let mut object = TrackedObject::binary("lamp", REGION, base.view(), true).unwrap();
    let moved = blobs(300, 300, 8.0, 8.0);

    let outcome = converge(&mut object, moved.view(), 1).unwrap();
    assert_eq!(outcome.iterations, 1);
    assert!(!outcome.converged);
    assert_ne!(object.region().origin(), (100, 100));
    assert_eq!(object.status(), ObjectStatus::Locked);
}

#[test]
fn regions_at_the_frame_border_only_try_valid_neighbours() {
    let base = noise(40, 40, 3);
    let corner = Region::new(0, 0, 20, 20);
    let mut object = TrackedObject::binary("corner", corner, base.view(), false).unwrap();

    let outcome = converge(&mut object, base.view(), 50).unwrap();
    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(object.region(), corner);
    assert!((object.similarity() - 1.0).abs() < 1e-5);
}

#[test]
fn failed_gate_is_terminal() {
    let base = blobs(300, 300, 0.0, 0.0);
    let mut object = TrackedObject::binary("lamp", REGION, base.view(), true).unwrap();
    let black = Frame::filled(300, 300, [0.0; 3]);

    let similarity = object.update_similarity(black.view()).unwrap();
    assert!(similarity < 0.7);
    let err = object.gate().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Drift);
    assert!(matches!(object.status(), ObjectStatus::Failed { .. }));

    object.update_similarity(base.view()).unwrap();
    assert!(object.gate().is_err());
}

#[test]
fn zero_pixel_step_is_rejected() {
    use inspectvision::{Capabilities, Category, ObjectSpec, TrackConfig};

    let base = blobs(300, 300, 0.0, 0.0);
    let config = TrackConfig {
        pixel_step: 0,
        ..TrackConfig::default()
    };
    let spec = ObjectSpec::new("lamp", Category::Binary, REGION);
    let err = TrackedObject::new(spec, base.view(), config, &Capabilities::default())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Input);
}
