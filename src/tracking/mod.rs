//! Tracked objects: one region, its reference image and its value model.
//!
//! All mutable per-object state lives in one [`TrackState`] record with three
//! named mutation points:
//!
//! - [`TrackedObject::update_similarity`] rescores the region in place;
//! - [`TrackedObject::update_coordinates`] takes one hill-climbing step;
//! - [`TrackedObject::get_value`] refreshes the debounced value.
//!
//! The region size and the reference image never change after construction.

use crate::image::{max_abs_diff, Frame, FrameView, Region};
use crate::similarity::{SimilarityMetric, SimilarityWeights, StructuralConfig};
use crate::trace::trace_event;
use crate::util::{InspectError, InspectResult};
use crate::value::{
    BinaryConfig, Calibration, Capabilities, Category, ReferenceValue, Value, ValueModel,
};

pub mod drift;

pub use drift::{converge, neighbor_regions, Convergence, DriftStep, COMPASS};

/// Per-object tracking parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackConfig {
    /// Blend weights of the similarity metric.
    pub weights: SimilarityWeights,
    /// Window settings of the structural term.
    pub structural: StructuralConfig,
    /// Lowest acceptable similarity after drift correction.
    pub min_similarity: f32,
    /// Neighbour offset, in pixels, of one drift-correction step.
    pub pixel_step: usize,
    /// Per-sample change that invalidates the cached value.
    pub epsilon: f32,
    /// Lamp model parameters, used by binary objects.
    pub binary: BinaryConfig,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            structural: StructuralConfig::default(),
            min_similarity: 0.7,
            pixel_step: 2,
            epsilon: 0.01,
            binary: BinaryConfig::default(),
        }
    }
}

/// Setup-time description of a device to track.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    pub category: Category,
    pub region: Region,
    pub reference_value: Option<ReferenceValue>,
}

impl ObjectSpec {
    pub fn new(name: impl Into<String>, category: Category, region: Region) -> Self {
        Self {
            name: name.into(),
            category,
            region,
            reference_value: None,
        }
    }

    /// Sets the value the device showed in the initial frame.
    pub fn with_reference_value(mut self, value: impl Into<ReferenceValue>) -> Self {
        self.reference_value = Some(value.into());
        self
    }
}

/// Lock state of a tracked object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectStatus {
    /// The region matches the reference image.
    Locked,
    /// Drift correction is in progress.
    ///
    /// Only held inside [`converge`]; the object is back to `Locked` by the
    /// time the call returns, so callers never observe it between cycles.
    Searching,
    /// Similarity fell below the minimum; terminal for the session.
    Failed { similarity: f32 },
}

/// Mutable state of one tracked object.
#[derive(Clone, Debug)]
pub struct TrackState {
    pub(crate) region: Region,
    pub(crate) similarity: f32,
    pub(crate) status: ObjectStatus,
    pub(crate) last_image: Option<Frame>,
    pub(crate) last_value: Option<Value>,
    pub(crate) evaluations: u64,
}

impl TrackState {
    fn new(region: Region) -> Self {
        Self {
            region,
            similarity: 1.0,
            status: ObjectStatus::Locked,
            last_image: None,
            last_value: None,
            evaluations: 0,
        }
    }

    /// Current region.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Last stored similarity.
    pub fn similarity(&self) -> f32 {
        self.similarity
    }

    pub fn status(&self) -> ObjectStatus {
        self.status
    }

    /// Sub-image the cached value was computed from.
    pub fn last_image(&self) -> Option<&Frame> {
        self.last_image.as_ref()
    }

    /// Cached value, absent until the first extraction.
    pub fn last_value(&self) -> Option<&Value> {
        self.last_value.as_ref()
    }

    /// Number of value-model invocations so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

/// One monitored device.
pub struct TrackedObject {
    name: String,
    category: Category,
    config: TrackConfig,
    metric: SimilarityMetric,
    reference: Frame,
    model: Box<dyn ValueModel>,
    calibration: Calibration,
    pub(crate) state: TrackState,
}

impl TrackedObject {
    /// Crops the reference image from `init_frame` and binds the category's model.
    pub fn new(
        spec: ObjectSpec,
        init_frame: FrameView<'_>,
        config: TrackConfig,
        capabilities: &Capabilities,
    ) -> InspectResult<Self> {
        if config.pixel_step == 0 {
            return Err(InspectError::InvalidInput("pixel_step must be positive"));
        }
        let reference = init_frame.crop(spec.region)?.to_frame();
        let bound = spec.category.bind_model(
            spec.reference_value.as_ref(),
            reference.view(),
            capabilities,
            &config.binary,
        )?;
        let metric = SimilarityMetric::new(config.weights).with_structural(config.structural);
        Ok(Self {
            name: spec.name,
            category: spec.category,
            config,
            metric,
            reference,
            model: bound.model,
            calibration: bound.calibration,
            state: TrackState::new(spec.region),
        })
    }

    /// Binary object with default settings and no extra capabilities.
    pub fn binary(
        name: impl Into<String>,
        region: Region,
        init_frame: FrameView<'_>,
        reference_on: bool,
    ) -> InspectResult<Self> {
        let spec =
            ObjectSpec::new(name, Category::Binary, region).with_reference_value(reference_on);
        Self::new(spec, init_frame, TrackConfig::default(), &Capabilities::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn region(&self) -> Region {
        self.state.region
    }

    pub fn similarity(&self) -> f32 {
        self.state.similarity
    }

    pub fn status(&self) -> ObjectStatus {
        self.state.status
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    /// Outcome of the model's self-check on the reference image.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn reference_image(&self) -> FrameView<'_> {
        self.reference.view()
    }

    fn score_region(&self, frame: FrameView<'_>, region: Region) -> InspectResult<f32> {
        let image = frame.crop(region)?;
        self.metric.score(image, self.reference.view())
    }

    /// Rescores the current region on `frame` without moving it.
    pub fn update_similarity(&mut self, frame: FrameView<'_>) -> InspectResult<f32> {
        let similarity = self.score_region(frame, self.state.region)?;
        self.state.similarity = similarity;
        Ok(similarity)
    }

    /// Takes one greedy step towards the most similar compass neighbour.
    ///
    /// The current region is rescored on `frame`, then the eight neighbours
    /// `pixel_step` pixels away. Neighbours that leave the frame are skipped.
    /// The region moves only if the best neighbour beats the current region,
    /// so the stored similarity never drops below the rescored current value.
    pub fn update_coordinates(&mut self, frame: FrameView<'_>) -> InspectResult<DriftStep> {
        let current = self.score_region(frame, self.state.region)?;

        let mut best: Option<(f32, Region, (isize, isize))> = None;
        let candidates = neighbor_regions(self.state.region, self.config.pixel_step);
        for (candidate, (dx, dy)) in candidates.into_iter().zip(COMPASS) {
            let Some(candidate) = candidate else {
                continue;
            };
            if !candidate.fits_within(frame.width(), frame.height()) {
                continue;
            }
            let score = self.score_region(frame, candidate)?;
            let better = match best {
                Some((best_score, _, _)) => score > best_score,
                None => true,
            };
            if better {
                let step = self.config.pixel_step as isize;
                best = Some((score, candidate, (dx * step, dy * step)));
            }
        }

        let mut moved = None;
        let mut after = current;
        if let Some((best_score, region, offset)) = best {
            if best_score > current {
                self.state.region = region;
                moved = Some(offset);
                after = best_score;
            }
        }
        self.state.similarity = after;
        Ok(DriftStep {
            before: current,
            after,
            moved,
        })
    }

    /// Sub-image at the current region.
    pub fn get_current_image<'a>(&self, frame: FrameView<'a>) -> InspectResult<FrameView<'a>> {
        frame.crop(self.state.region)
    }

    /// Debounced value of the current sub-image.
    ///
    /// The model runs when no value is cached yet, or when some sample of the
    /// current sub-image differs from the last evaluated one by at least
    /// `epsilon`. Otherwise the cached value is returned unchanged.
    pub fn get_value(&mut self, frame: FrameView<'_>) -> InspectResult<Value> {
        let image = self.get_current_image(frame)?;
        let stale = match (&self.state.last_value, &self.state.last_image) {
            (Some(_), Some(last)) => max_abs_diff(image, last.view())? >= self.config.epsilon,
            _ => true,
        };
        if !stale {
            if let Some(value) = &self.state.last_value {
                return Ok(value.clone());
            }
        }

        let value = self.model.evaluate(image)?;
        self.state.evaluations += 1;
        self.state.last_image = Some(image.to_frame());
        self.state.last_value = Some(value.clone());
        trace_event!(
            "value_evaluated",
            object = self.name.as_str(),
            evaluations = self.state.evaluations
        );
        Ok(value)
    }

    /// Checks the stored similarity against `min_similarity`.
    ///
    /// On failure the object enters [`ObjectStatus::Failed`] and stays there.
    pub fn gate(&mut self) -> InspectResult<()> {
        if let ObjectStatus::Failed { similarity } = self.state.status {
            return Err(self.drift_error(similarity));
        }
        let similarity = self.state.similarity;
        // NaN similarities fail the gate as well.
        if !(similarity >= self.config.min_similarity) {
            self.state.status = ObjectStatus::Failed { similarity };
            return Err(self.drift_error(similarity));
        }
        Ok(())
    }

    fn drift_error(&self, similarity: f32) -> InspectError {
        InspectError::Drift {
            name: self.name.clone(),
            similarity,
            min_similarity: self.config.min_similarity,
        }
    }
}

impl std::fmt::Debug for TrackedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedObject")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("state", &self.state)
            .field("calibration", &self.calibration)
            .finish_non_exhaustive()
    }
}
