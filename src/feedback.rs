use crate::{deviation::DeviationReport, error::Error, point::Point, sequence::AngleVector};
use ordered_float::NotNan;
use serde::Serialize;
use std::{cmp::Reverse, collections::BTreeMap, fmt, str::FromStr};

pub const DEFAULT_ANGLE_THRESHOLD: f64 = 10.0;
pub const DEFAULT_VECTOR_THRESHOLD: f64 = 0.1;

const INSUFFICIENT_DATA: &str = "Could not analyze the video due to insufficient data.";
const LOOKS_GOOD: &str = "Your form looks good!";
const MATCH_REFERENCE: &str = "Try to match the professional's form.";

/// Which deviation metric decides the verdict.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerdictPolicy {
    /// Angle deviation at the first pair where each joint is present.
    FirstFrame,
    /// Mean angle deviation over the whole sequence.
    MeanDeviation,
    /// Largest angle deviation seen at any point.
    WorstOverTime,
    /// Mean distance between the user's and the reference's ray vectors.
    VectorDifference,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self::FirstFrame
    }
}

impl VerdictPolicy {
    fn metric(self, report: &DeviationReport) -> &BTreeMap<String, f64> {
        match self {
            Self::FirstFrame => &report.first_frame,
            Self::MeanDeviation => &report.per_joint_mean,
            Self::WorstOverTime => &report.per_joint_max,
            Self::VectorDifference => &report.per_joint_mean_vector,
        }
    }

    /// The joint with the largest deviation under this policy. Ties go to the
    /// joint whose name sorts first.
    pub fn worst_joint(self, report: &DeviationReport) -> Option<(&str, f64)> {
        self.metric(report)
            .iter()
            .filter_map(|(joint, &value)| {
                NotNan::new(value)
                    .ok()
                    .map(|value| (joint.as_str(), value))
            })
            .min_by_key(|&(joint, value)| (Reverse(value), joint))
            .map(|(joint, value)| (joint, value.into_inner()))
    }
}

impl FromStr for VerdictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-frame" | "first_frame" => Ok(Self::FirstFrame),
            "mean" | "mean-deviation" => Ok(Self::MeanDeviation),
            "worst" | "worst-over-time" => Ok(Self::WorstOverTime),
            "vector" | "vector-difference" => Ok(Self::VectorDifference),
            _ => Err(Error::UnknownVerdictPolicy(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    InsufficientData,
    LooksGood,
    OffBy {
        joint: String,
        amount: f64,
        policy: VerdictPolicy,
    },
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData => f.write_str(INSUFFICIENT_DATA),
            Self::LooksGood => f.write_str(LOOKS_GOOD),
            Self::OffBy {
                joint,
                amount,
                policy,
            } => {
                let joint = joint.replace('_', " ");
                match policy {
                    VerdictPolicy::VectorDifference => write!(
                        f,
                        "Your {} movement is off by an average of {:.2}. {}",
                        joint, amount, MATCH_REFERENCE
                    ),
                    VerdictPolicy::MeanDeviation => write!(
                        f,
                        "Your {} angle is off by an average of {:.2} degrees. {}",
                        joint, amount, MATCH_REFERENCE
                    ),
                    VerdictPolicy::FirstFrame | VerdictPolicy::WorstOverTime => write!(
                        f,
                        "Your {} angle is off by {:.2} degrees. {}",
                        joint, amount, MATCH_REFERENCE
                    ),
                }
            }
        }
    }
}

/// One row of the vector comparison table: a joint in one aligned pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRow {
    pub index: usize,
    pub joint: String,
    pub user: RayPair,
    pub reference: RayPair,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub verdict: Verdict,
    pub table: Vec<VectorRow>,
}

impl Feedback {
    pub fn message(&self) -> String {
        self.verdict.to_string()
    }
}

/// Renders a [`DeviationReport`] into a verdict and a vector table.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Formatter {
    pub policy: VerdictPolicy,
    /// Degrees above which an angle-based policy reports a deviation.
    pub threshold: f64,
    /// Distance above which [`VerdictPolicy::VectorDifference`] reports a deviation.
    pub vector_threshold: f64,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            policy: VerdictPolicy::default(),
            threshold: DEFAULT_ANGLE_THRESHOLD,
            vector_threshold: DEFAULT_VECTOR_THRESHOLD,
        }
    }
}

impl Formatter {
    pub fn format(&self, report: &DeviationReport) -> Feedback {
        Feedback {
            verdict: self.verdict(report),
            table: vector_table(report),
        }
    }

    pub fn verdict(&self, report: &DeviationReport) -> Verdict {
        if report.frames_compared == 0 {
            return Verdict::InsufficientData;
        }
        let (joint, amount) = match self.policy.worst_joint(report) {
            Some(worst) => worst,
            None => return Verdict::InsufficientData,
        };
        let threshold = match self.policy {
            VerdictPolicy::VectorDifference => self.vector_threshold,
            _ => self.threshold,
        };
        if amount > threshold {
            Verdict::OffBy {
                joint: joint.to_owned(),
                amount,
                policy: self.policy,
            }
        } else {
            Verdict::LooksGood
        }
    }
}

/// First-frame verdict against `threshold` degrees.
pub fn format(report: &DeviationReport, threshold: f64) -> Feedback {
    Formatter {
        threshold,
        ..Formatter::default()
    }
    .format(report)
}

fn vector_table(report: &DeviationReport) -> Vec<VectorRow> {
    report
        .pairs
        .iter()
        .flat_map(|pair| {
            pair.joints.iter().map(move |(joint, deviation)| VectorRow {
                index: pair.index,
                joint: joint.clone(),
                user: [deviation.user.upper, deviation.user.lower],
                reference: [deviation.reference.upper, deviation.reference.lower],
            })
        })
        .collect()
}

/// Ray vectors of one joint on one side of a pair, `[upper, lower]`.
pub type RayPair = [Point; 2];

/// Response body for a completed comparison.
#[derive(Debug, Clone, Serialize)]
pub struct Response<'a> {
    pub feedback: String,
    pub user_vectors: Vec<Option<RayPair>>,
    pub professional_vectors: Vec<Option<RayPair>>,
    pub frames_compared: usize,
    pub deviation: &'a DeviationReport,
    pub vector_table: &'a [VectorRow],
}

impl<'a> Response<'a> {
    /// `user_vectors[i]` and `professional_vectors[i]` are the rays of
    /// `primary_joint` in aligned pair `i`, or `None` where that side could not
    /// measure it. Both arrays hold exactly one entry per aligned pair.
    pub fn new(
        feedback: &'a Feedback,
        report: &'a DeviationReport,
        primary_joint: &str,
    ) -> Self {
        let rays = |vector: &AngleVector| {
            vector
                .get(primary_joint)
                .map(|reading| [reading.upper, reading.lower])
        };
        let (user_vectors, professional_vectors) = report
            .pairs
            .iter()
            .map(|pair| (rays(&pair.user), rays(&pair.reference)))
            .unzip();
        Self {
            feedback: feedback.message(),
            user_vectors,
            professional_vectors,
            frames_compared: report.frames_compared,
            deviation: report,
            vector_table: &feedback.table,
        }
    }
}

/// Response body when the comparison could not run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub feedback: String,
    pub error: &'static str,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        Self {
            feedback: error.user_message(),
            error: error.code(),
        }
    }
}
