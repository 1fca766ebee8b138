//! Greedy local search over the compass neighbourhood of a region.

use crate::image::{FrameView, Region};
use crate::trace::{trace_event, trace_span};
use crate::tracking::{ObjectStatus, TrackedObject};
use crate::util::math::allclose;
use crate::util::InspectResult;

/// Unit offsets of the eight compass neighbours, clockwise from east
/// (image rows grow downwards).
pub const COMPASS: [(isize, isize); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Candidate regions offset from `region` by `step` pixels in each compass
/// direction. Candidates whose origin would be negative are `None`.
pub fn neighbor_regions(region: Region, step: usize) -> [Option<Region>; 8] {
    let step = step as isize;
    COMPASS.map(|(dx, dy)| region.translated(dx * step, dy * step))
}

/// Result of one hill-climbing step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftStep {
    /// Similarity at the region before the step.
    pub before: f32,
    /// Stored similarity after the step, `max(best_neighbour, before)`.
    pub after: f32,
    /// Origin offset applied, if a neighbour improved on the current region.
    pub moved: Option<(isize, isize)>,
}

/// Outcome of repeated hill-climbing on one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Convergence {
    /// Number of `update_coordinates` calls made.
    pub iterations: usize,
    /// Stored similarity when the search stopped.
    pub similarity: f32,
    /// False when the iteration cap was hit before the similarity settled.
    pub converged: bool,
}

/// Calls `update_coordinates` until the similarity stops changing or
/// `max_iterations` steps were taken.
///
/// The similarity is refreshed on `frame` first, so the sequence of stored
/// similarities observed here is non-decreasing.
pub fn converge(
    object: &mut TrackedObject,
    frame: FrameView<'_>,
    max_iterations: usize,
) -> InspectResult<Convergence> {
    let _span = trace_span!("drift_search", object = object.name()).entered();
    object.state.status = ObjectStatus::Searching;

    let mut old = object.update_similarity(frame)?;
    let mut iterations = 0usize;
    let mut converged = false;
    while iterations < max_iterations.max(1) {
        let step = object.update_coordinates(frame)?;
        iterations += 1;
        if allclose(old, step.after) {
            converged = true;
            break;
        }
        old = step.after;
    }

    object.state.status = ObjectStatus::Locked;
    let similarity = object.similarity();
    trace_event!(
        "drift_converged",
        iterations = iterations,
        similarity = similarity,
        x = object.region().x(),
        y = object.region().y()
    );
    Ok(Convergence {
        iterations,
        similarity,
        converged,
    })
}
