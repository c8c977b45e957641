//! Compare the joint articulation in a user's exercise video against a
//! reference video of the same exercise, frame by frame.
//!
//! Landmarks come from a [`estimate::PoseEstimator`], are turned into joint
//! angles by a [`sequence::SequenceBuilder`], paired by [`align::align`],
//! measured by [`deviation::analyze`] and rendered by [`feedback::Formatter`].
//! [`engine::ComparisonEngine`] wires the stages together.

pub mod align;
pub mod angle;
pub mod capture;
pub mod deviation;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod feedback;
pub mod joint;
pub mod overlay;
pub mod point;
pub mod pose;
pub mod sequence;
#[cfg(feature = "video")]
pub mod video;

pub use engine::{CancelFlag, Comparison, ComparisonEngine, Input};
pub use error::Error;
