use crate::{
    align::AlignedPair,
    sequence::{AngleVector, JointReading},
};
use num_traits::cast::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;

/// How far one joint of one aligned pair is from the reference.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct JointDeviation {
    /// `|user angle - reference angle|` in degrees.
    pub angle: f64,
    /// Mean Euclidean distance between corresponding ray vectors.
    pub vector: f64,
    pub user: JointReading,
    pub reference: JointReading,
}

impl JointDeviation {
    fn between(user: &JointReading, reference: &JointReading) -> Self {
        let upper = (user.upper - reference.upper).norm();
        let lower = (user.lower - reference.lower).norm();
        Self {
            angle: (user.angle - reference.angle).abs(),
            vector: (upper + lower) / 2.0,
            user: *user,
            reference: *reference,
        }
    }
}

/// One aligned pair: the joints shared by both sides, plus everything each
/// side measured on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PairDeviation {
    pub index: usize,
    pub joints: BTreeMap<String, JointDeviation>,
    #[serde(skip)]
    pub user: AngleVector,
    #[serde(skip)]
    pub reference: AngleVector,
}

/// Aggregated deviation over all aligned pairs.
///
/// A joint that was never present on both sides of any pair appears in none
/// of the maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviationReport {
    #[serde(rename = "mean")]
    pub per_joint_mean: BTreeMap<String, f64>,
    #[serde(rename = "max")]
    pub per_joint_max: BTreeMap<String, f64>,
    #[serde(rename = "first_frame")]
    pub first_frame: BTreeMap<String, f64>,
    #[serde(rename = "mean_vector")]
    pub per_joint_mean_vector: BTreeMap<String, f64>,
    pub frames_compared: usize,
    #[serde(skip)]
    pub pairs: Vec<PairDeviation>,
}

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    sum: f64,
    vector_sum: f64,
    max: f64,
    first: f64,
}

impl Accumulator {
    fn push(&mut self, deviation: &JointDeviation) {
        if self.count == 0 {
            self.first = deviation.angle;
        }
        self.count += 1;
        self.sum += deviation.angle;
        self.vector_sum += deviation.vector;
        self.max = self.max.max(deviation.angle);
    }
}

/// Compare every joint present on both sides of each pair.
pub fn analyze(pairs: &[AlignedPair]) -> DeviationReport {
    let mut accumulators: BTreeMap<&str, Accumulator> = BTreeMap::new();
    let mut per_pair = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let joints: BTreeMap<String, JointDeviation> = pair
            .user
            .iter()
            .filter_map(|(joint, user)| {
                pair.reference
                    .get(joint)
                    .map(|reference| (joint, JointDeviation::between(user, reference)))
            })
            .map(|(joint, deviation)| {
                accumulators.entry(joint).or_default().push(&deviation);
                (joint.to_owned(), deviation)
            })
            .collect();

        per_pair.push(PairDeviation {
            index: pair.index,
            joints,
            user: pair.user.clone(),
            reference: pair.reference.clone(),
        });
    }

    let mut report = DeviationReport {
        frames_compared: pairs.len(),
        pairs: per_pair,
        ..Default::default()
    };

    for (joint, acc) in accumulators {
        let count = match acc.count.to_f64() {
            Some(count) if acc.count > 0 => count,
            _ => continue,
        };
        report.per_joint_mean.insert(joint.to_owned(), acc.sum / count);
        report
            .per_joint_mean_vector
            .insert(joint.to_owned(), acc.vector_sum / count);
        report.per_joint_max.insert(joint.to_owned(), acc.max);
        report.first_frame.insert(joint.to_owned(), acc.first);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        align::align,
        point::Point,
        sequence::{AngleSequence, AngleVector},
    };
    use assert_approx_eq::assert_approx_eq;

    fn reading(angle: f64) -> JointReading {
        JointReading {
            angle,
            upper: Point::default(),
            lower: Point::default(),
        }
    }

    fn frame(joints: &[(&str, f64)]) -> AngleVector {
        joints
            .iter()
            .fold(AngleVector::new(), |v, &(name, angle)| v.with(name, reading(angle)))
    }

    fn sequence(frames: Vec<AngleVector>) -> AngleSequence {
        frames.into_iter().collect()
    }

    #[test]
    fn self_alignment_has_zero_deviation() {
        let seq = sequence(vec![
            frame(&[("elbow", 170.0), ("knee", 90.0)]),
            frame(&[("elbow", 120.0)]),
            frame(&[("knee", 45.0)]),
        ]);
        let report = analyze(&align(seq.clone(), seq.clone()));
        assert_eq!(report.frames_compared, seq.len());
        for map in &[
            &report.per_joint_mean,
            &report.per_joint_max,
            &report.first_frame,
            &report.per_joint_mean_vector,
        ] {
            assert_eq!(map.len(), 2);
            assert!(map.values().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn mean_max_and_first() {
        let user = sequence(vec![
            frame(&[("elbow", 170.0)]),
            frame(&[("elbow", 140.0)]),
            frame(&[("elbow", 100.0)]),
        ]);
        let reference = sequence(vec![
            frame(&[("elbow", 150.0)]),
            frame(&[("elbow", 145.0)]),
            frame(&[("elbow", 130.0)]),
        ]);
        let report = analyze(&align(user, reference));
        assert_eq!(report.frames_compared, 3);
        assert_approx_eq!(report.first_frame["elbow"], 20.0);
        assert_approx_eq!(report.per_joint_max["elbow"], 30.0);
        assert_approx_eq!(report.per_joint_mean["elbow"], 55.0 / 3.0);
    }

    #[test]
    fn one_sided_joint_is_excluded_not_zeroed() {
        let user = sequence(vec![
            frame(&[("elbow", 100.0), ("knee", 90.0)]),
            frame(&[("elbow", 100.0), ("knee", 80.0)]),
        ]);
        let reference = sequence(vec![
            frame(&[("elbow", 110.0)]),
            frame(&[("elbow", 100.0), ("knee", 60.0)]),
        ]);
        let report = analyze(&align(user, reference));

        assert!(!report.pairs[0].joints.contains_key("knee"));
        assert!(report.pairs[0].user.get("knee").is_some());
        assert_approx_eq!(report.per_joint_mean["knee"], 20.0);
        assert_approx_eq!(report.first_frame["knee"], 20.0);
        assert_approx_eq!(report.per_joint_mean["elbow"], 5.0);
        assert_approx_eq!(report.first_frame["elbow"], 10.0);
    }

    #[test]
    fn never_shared_joint_is_omitted() {
        let user = sequence(vec![frame(&[("elbow", 100.0)])]);
        let reference = sequence(vec![frame(&[("knee", 100.0)])]);
        let report = analyze(&align(user, reference));
        assert_eq!(report.frames_compared, 1);
        assert!(report.per_joint_mean.is_empty());
        assert!(report.per_joint_max.is_empty());
        assert!(report.first_frame.is_empty());
    }

    #[test]
    fn no_pairs() {
        let report = analyze(&[]);
        assert_eq!(report.frames_compared, 0);
        assert!(report.per_joint_mean.is_empty());
    }

    #[test]
    fn vector_deviation_averages_both_rays() {
        let user = JointReading {
            angle: 90.0,
            upper: Point::new(0.0, 0.3).unwrap(),
            lower: Point::new(0.3, 0.0).unwrap(),
        };
        let reference = JointReading {
            angle: 90.0,
            upper: Point::new(0.0, 0.1).unwrap(),
            lower: Point::new(0.3, 0.4).unwrap(),
        };
        let deviation = JointDeviation::between(&user, &reference);
        assert_approx_eq!(deviation.angle, 0.0);
        assert_approx_eq!(deviation.vector, (0.2 + 0.4) / 2.0);
    }
}
