use crate::{
    angle::joint_angle,
    engine::CancelFlag,
    error::Error,
    estimate::PoseEstimator,
    joint::{JointDefinition, JointTable},
    point::Point,
    pose::LandmarkFrame,
};
use indicatif::ProgressBar;
use serde::Serialize;
use std::{collections::BTreeMap, num::NonZeroUsize};
use tracing::{debug, info, trace, warn};

/// One joint measured in one frame: the angle at the vertex plus the two raw
/// ray vectors, `upper = vertex - ray_a` and `lower = ray_b - vertex`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct JointReading {
    pub angle: f64,
    pub upper: Point,
    pub lower: Point,
}

impl JointReading {
    /// Measure `joint` in `frame`, or `None` if any of its landmarks is
    /// missing or hidden, or if a ray has zero length.
    pub fn measure(joint: &JointDefinition, frame: &LandmarkFrame) -> Option<Self> {
        let (a, vertex, b) = joint.locate(frame)?;
        let angle = joint_angle(a, vertex, b)?;
        Some(Self {
            angle,
            upper: vertex - a,
            lower: b - vertex,
        })
    }
}

/// Per-frame joint readings, keyed by joint name.
///
/// A joint is absent when it could not be measured in the frame; it is never
/// defaulted to zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleVector {
    readings: BTreeMap<String, JointReading>,
}

impl AngleVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure every joint of `table` in `frame`.
    pub fn measure(table: &JointTable, frame: &LandmarkFrame) -> Self {
        table
            .iter()
            .filter_map(|joint| {
                let reading = JointReading::measure(joint, frame);
                if reading.is_none() {
                    trace!(joint = %joint.name, "joint not measurable in frame");
                }
                reading.map(|reading| (joint.name.clone(), reading))
            })
            .collect()
    }

    pub fn with<S: Into<String>>(mut self, joint: S, reading: JointReading) -> Self {
        self.readings.insert(joint.into(), reading);
        self
    }

    pub fn get(&self, joint: &str) -> Option<&JointReading> {
        self.readings.get(joint)
    }

    pub fn angle(&self, joint: &str) -> Option<f64> {
        self.get(joint).map(|reading| reading.angle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JointReading)> {
        self.readings
            .iter()
            .map(|(name, reading)| (name.as_str(), reading))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl std::iter::FromIterator<(String, JointReading)> for AngleVector {
    fn from_iter<I: IntoIterator<Item = (String, JointReading)>>(iter: I) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}

/// Angle vectors in source frame order. Frames without a single usable joint
/// are not part of the sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleSequence {
    frames: Vec<AngleVector>,
}

impl AngleSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AngleVector> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AngleVector> {
        self.frames.iter()
    }
}

impl std::iter::FromIterator<AngleVector> for AngleSequence {
    fn from_iter<I: IntoIterator<Item = AngleVector>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().filter(|v| !v.is_empty()).collect(),
        }
    }
}

impl IntoIterator for AngleSequence {
    type Item = AngleVector;
    type IntoIter = std::vec::IntoIter<AngleVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

/// Counters describing what happened to the frames of one build.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub decoded: usize,
    pub sampled: usize,
    pub no_pose: usize,
    pub estimate_failures: usize,
    pub unusable: usize,
    pub kept: usize,
}

/// Turns a stream of decoded frames into an [`AngleSequence`].
pub struct SequenceBuilder<'a> {
    table: &'a JointTable,
    stride: NonZeroUsize,
    cancel: CancelFlag,
    progress: Option<&'a ProgressBar>,
}

impl<'a> SequenceBuilder<'a> {
    pub fn new(table: &'a JointTable) -> Self {
        Self {
            table,
            stride: NonZeroUsize::MIN,
            cancel: CancelFlag::default(),
            progress: None,
        }
    }

    /// Only every `stride`-th decoded frame is sent to the estimator, counting
    /// from 1: with a stride of 2, frames 2, 4, 6, ... are analyzed.
    pub fn stride(mut self, stride: NonZeroUsize) -> Self {
        self.stride = stride;
        self
    }

    pub fn cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn progress(mut self, progress: Option<&'a ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Run the estimator over `frames`, in order, exactly once each.
    ///
    /// Per-frame problems (no pose, estimator error, no measurable joint) skip
    /// the frame. A source error before the first frame is a decode failure; a
    /// source error later ends the stream early. The cancel flag is checked
    /// before each frame is pulled from the source.
    pub fn build<I, E>(&self, frames: I, estimator: &mut E) -> Result<AngleSequence, Error>
    where
        I: IntoIterator<Item = Result<E::Frame, Error>>,
        E: PoseEstimator,
    {
        self.build_with_stats(frames, estimator)
            .map(|(sequence, _)| sequence)
    }

    pub fn build_with_stats<I, E>(
        &self,
        frames: I,
        estimator: &mut E,
    ) -> Result<(AngleSequence, BuildStats), Error>
    where
        I: IntoIterator<Item = Result<E::Frame, Error>>,
        E: PoseEstimator,
    {
        let stride = self.stride.get();
        let mut stats = BuildStats::default();
        let mut vectors = Vec::new();
        let mut frames = frames.into_iter();

        loop {
            if self.cancel.is_cancelled() {
                warn!(decoded = stats.decoded, "sequence build cancelled");
                return Err(Error::Cancelled);
            }

            let frame = match frames.next() {
                None => break,
                Some(Ok(frame)) => frame,
                Some(Err(e)) if stats.decoded == 0 => {
                    return Err(Error::DecodeFailure(Box::new(e)));
                }
                Some(Err(e)) => {
                    warn!(
                        error = %e,
                        decoded = stats.decoded,
                        "frame source failed, ending sequence early"
                    );
                    break;
                }
            };
            stats.decoded += 1;

            if stats.decoded % stride != 0 {
                continue;
            }
            stats.sampled += 1;
            if let Some(progress) = self.progress {
                progress.inc(1);
            }

            let landmarks = match estimator.estimate(&frame) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    warn!(
                        error = %e,
                        frame = stats.decoded,
                        "pose estimation failed, skipping frame"
                    );
                    stats.estimate_failures += 1;
                    continue;
                }
            };

            if landmarks.is_empty() {
                trace!(frame = stats.decoded, "no pose detected");
                stats.no_pose += 1;
                continue;
            }

            let vector = AngleVector::measure(self.table, &landmarks);
            if vector.is_empty() {
                debug!(frame = stats.decoded, "no measurable joint in frame");
                stats.unusable += 1;
                continue;
            }

            vectors.push(vector);
        }

        stats.kept = vectors.len();
        info!(
            decoded = stats.decoded,
            sampled = stats.sampled,
            no_pose = stats.no_pose,
            estimate_failures = stats.estimate_failures,
            unusable = stats.unusable,
            kept = stats.kept,
            "built angle sequence"
        );

        Ok((AngleSequence { frames: vectors }, stats))
    }
}
