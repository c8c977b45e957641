use formcheck::{
    align::align,
    deviation::analyze,
    engine::{CancelFlag, ComparisonEngine, Input},
    error::Error,
    estimate::PoseEstimator,
    feedback::{format, Formatter, Verdict},
    joint::{JointDefinition, JointTable},
    point::Point,
    pose::{Landmark, LandmarkFrame, LandmarkPoint},
    sequence::SequenceBuilder,
};

/// Stands in for a pose model: frame `i` is answered with `script[i]`.
struct ScriptedEstimator {
    script: Vec<LandmarkFrame>,
}

impl PoseEstimator for ScriptedEstimator {
    type Frame = usize;

    fn estimate(&mut self, frame: &usize) -> Result<LandmarkFrame, Error> {
        self.script
            .get(*frame)
            .cloned()
            .ok_or_else(|| Error::Estimate(format!("no scripted frame {}", frame)))
    }
}

fn frame_indices(n: usize) -> impl Iterator<Item = Result<usize, Error>> + Send {
    (0..n).map(Ok)
}

fn point(landmark: Landmark, x: f64, y: f64) -> LandmarkPoint {
    LandmarkPoint {
        landmark,
        point: Point::new(x, y).unwrap(),
        visible: true,
    }
}

/// A left arm whose elbow is bent to `degrees`, upper arm pointing straight up.
fn arm(degrees: f64) -> LandmarkFrame {
    let radians = degrees.to_radians();
    let (ex, ey) = (0.5, 0.5);
    LandmarkFrame::new()
        .with(point(Landmark::LeftShoulder, ex, ey - 0.25))
        .with(point(Landmark::LeftElbow, ex, ey))
        .with(point(
            Landmark::LeftWrist,
            ex + 0.25 * radians.sin(),
            ey - 0.25 * radians.cos(),
        ))
}

fn build(table: &JointTable, script: Vec<LandmarkFrame>) -> formcheck::sequence::AngleSequence {
    let n = script.len();
    SequenceBuilder::new(table)
        .build(frame_indices(n), &mut ScriptedEstimator { script })
        .unwrap()
}

#[test]
fn elbow_off_by_twenty_degrees() {
    let table = JointTable::default();
    let user = build(&table, vec![arm(170.0)]);
    let reference = build(&table, vec![arm(150.0)]);

    let feedback = format(&analyze(&align(user, reference)), 10.0);

    assert_eq!(
        feedback.message(),
        "Your elbow angle is off by 20.00 degrees. Try to match the professional's form."
    );
}

#[test]
fn elbow_within_threshold() {
    let table = JointTable::default();
    let user = build(&table, vec![arm(152.0)]);
    let reference = build(&table, vec![arm(150.0)]);

    let feedback = format(&analyze(&align(user, reference)), 10.0);

    assert_eq!(feedback.verdict, Verdict::LooksGood);
}

#[test]
fn self_comparison_is_exact() {
    let table = JointTable::default();
    let script: Vec<LandmarkFrame> = [30.0, 60.0, 90.0, 120.0].iter().map(|&d| arm(d)).collect();
    let sequence = build(&table, script);

    let report = analyze(&align(sequence.clone(), sequence.clone()));

    assert_eq!(report.frames_compared, sequence.len());
    assert!(report.per_joint_mean.values().all(|&d| d < 1e-9));
    assert!(report.per_joint_max.values().all(|&d| d < 1e-9));
}

#[test]
fn added_joint_needs_only_a_table_entry() {
    let table = JointTable::new(vec![
        JointTable::default().primary().clone(),
        "knee=left_hip,left_knee,left_ankle".parse::<JointDefinition>().unwrap(),
    ])
    .unwrap();

    let with_leg = |knee_x: f64| {
        arm(90.0)
            .with(point(Landmark::LeftHip, 0.5, 0.6))
            .with(point(Landmark::LeftKnee, 0.5, 0.8))
            .with(point(Landmark::LeftAnkle, knee_x, 0.95))
    };

    let user = build(&table, vec![with_leg(0.5), with_leg(0.5)]);
    let reference = build(&table, vec![with_leg(0.65), with_leg(0.5)]);
    let report = analyze(&align(user, reference));

    assert!(report.first_frame["knee"] > 10.0);
    assert!(report.first_frame["elbow"] < 1e-9);

    let feedback = Formatter::default().format(&report);
    match feedback.verdict {
        Verdict::OffBy { joint, .. } => assert_eq!(joint, "knee"),
        other => panic!("unexpected verdict: {:?}", other),
    }
    assert_eq!(feedback.table.len(), 4);
}

#[test]
fn engine_end_to_end_with_missing_pose() {
    let engine = ComparisonEngine::new(JointTable::default(), Formatter::default());
    let user_script = vec![arm(170.0), LandmarkFrame::new(), arm(160.0)];
    let reference_script = vec![arm(150.0), arm(150.0)];

    let comparison = engine
        .compare(
            Input::new(frame_indices(3), ScriptedEstimator { script: user_script }),
            Input::new(frame_indices(2), ScriptedEstimator { script: reference_script }),
            &CancelFlag::default(),
        )
        .unwrap();

    assert_eq!(comparison.report.frames_compared, 2);

    let json = serde_json::to_value(comparison.response()).unwrap();
    assert_eq!(json["user_vectors"].as_array().unwrap().len(), 2);
    assert_eq!(json["professional_vectors"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["feedback"],
        "Your elbow angle is off by 20.00 degrees. Try to match the professional's form."
    );
}

#[test]
fn engine_reports_insufficient_data_for_empty_user_video() {
    let engine = ComparisonEngine::new(JointTable::default(), Formatter::default());
    let comparison = engine
        .compare(
            Input::new(frame_indices(0), ScriptedEstimator { script: vec![] }),
            Input::new(frame_indices(1), ScriptedEstimator { script: vec![arm(150.0)] }),
            &CancelFlag::default(),
        )
        .unwrap();

    assert_eq!(comparison.feedback.verdict, Verdict::InsufficientData);
    assert!(comparison.feedback.message().starts_with("Could not analyze"));
}

#[test]
fn response_vectors_stay_paired_when_primary_joint_is_one_sided() {
    let table = JointTable::new(vec![
        JointTable::default().primary().clone(),
        "knee=left_hip,left_knee,left_ankle".parse::<JointDefinition>().unwrap(),
    ])
    .unwrap();
    let leg = |frame: LandmarkFrame| {
        frame
            .with(point(Landmark::LeftHip, 0.5, 0.6))
            .with(point(Landmark::LeftKnee, 0.5, 0.8))
            .with(point(Landmark::LeftAnkle, 0.6, 0.95))
    };
    let user_script = vec![leg(arm(90.0)), leg(arm(170.0))];
    let reference_script = vec![leg(LandmarkFrame::new()), leg(arm(150.0))];

    let engine = ComparisonEngine::new(table, Formatter::default());
    let comparison = engine
        .compare(
            Input::new(frame_indices(2), ScriptedEstimator { script: user_script }),
            Input::new(frame_indices(2), ScriptedEstimator { script: reference_script }),
            &CancelFlag::default(),
        )
        .unwrap();
    assert_eq!(comparison.report.frames_compared, 2);

    let json = serde_json::to_value(comparison.response()).unwrap();
    let user_vectors = json["user_vectors"].as_array().unwrap();
    let professional_vectors = json["professional_vectors"].as_array().unwrap();
    assert_eq!(user_vectors.len(), 2);
    assert_eq!(professional_vectors.len(), 2);

    // pair 0: the user's 90 degree arm, whose lower ray points along +x
    assert!(professional_vectors[0].is_null());
    assert!((user_vectors[0][1][0].as_f64().unwrap() - 0.25).abs() < 1e-9);
    assert!(user_vectors[0][1][1].as_f64().unwrap().abs() < 1e-9);

    // pair 1: both sides have the elbow
    assert!(!user_vectors[1].is_null());
    assert!(!professional_vectors[1].is_null());
}
