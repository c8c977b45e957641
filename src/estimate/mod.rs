use crate::{error::Error, pose::LandmarkFrame};

pub mod heatmap;
#[cfg(feature = "video")]
pub mod dnn;

/// Locates named landmarks in a single decoded frame.
pub trait PoseEstimator {
    /// The decoded frame type this estimator consumes.
    type Frame;

    /// Estimate the landmarks in `frame`.
    ///
    /// Returning an empty [`LandmarkFrame`] means no pose was found. An `Err`
    /// is a per-frame failure: the caller skips the frame and keeps going.
    fn estimate(&mut self, frame: &Self::Frame) -> Result<LandmarkFrame, Error>;
}

impl<E> PoseEstimator for &mut E
where
    E: PoseEstimator + ?Sized,
{
    type Frame = E::Frame;

    fn estimate(&mut self, frame: &Self::Frame) -> Result<LandmarkFrame, Error> {
        (**self).estimate(frame)
    }
}

impl<E> PoseEstimator for Box<E>
where
    E: PoseEstimator + ?Sized,
{
    type Frame = E::Frame;

    fn estimate(&mut self, frame: &Self::Frame) -> Result<LandmarkFrame, Error> {
        (**self).estimate(frame)
    }
}

/// Passes through landmarks that were computed ahead of time.
///
/// Each "frame" is already a [`LandmarkFrame`], which makes this the
/// estimator of choice for replaying recorded landmark streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct Precomputed;

impl PoseEstimator for Precomputed {
    type Frame = LandmarkFrame;

    fn estimate(&mut self, frame: &Self::Frame) -> Result<LandmarkFrame, Error> {
        Ok(frame.clone())
    }
}
