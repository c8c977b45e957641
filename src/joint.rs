use crate::{
    error::Error,
    point::Point,
    pose::{Landmark, LandmarkFrame},
};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// A joint is the angle at `vertex` bounded by the rays towards `ray_a` and `ray_b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointDefinition {
    pub name: String,
    pub vertex: Landmark,
    pub ray_a: Landmark,
    pub ray_b: Landmark,
}

impl JointDefinition {
    pub fn new<S>(name: S, ray_a: Landmark, vertex: Landmark, ray_b: Landmark) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            vertex,
            ray_a,
            ray_b,
        }
    }

    /// The `(ray_a, vertex, ray_b)` positions, only if all three are visible.
    pub fn locate(&self, frame: &LandmarkFrame) -> Option<(Point, Point, Point)> {
        Some((
            frame.visible(self.ray_a)?,
            frame.visible(self.vertex)?,
            frame.visible(self.ray_b)?,
        ))
    }
}

impl fmt::Display for JointDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={},{},{}", self.name, self.ray_a, self.vertex, self.ray_b)
    }
}

/// Parses `name=ray_a,vertex,ray_b`, e.g. `elbow=left_shoulder,left_elbow,left_wrist`.
impl FromStr for JointDefinition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = || Error::ParseJointDefinition(s.to_owned());
        let mut halves = s.splitn(2, '=');
        let name = halves
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(parse_error)?;
        let landmarks = halves
            .next()
            .ok_or_else(parse_error)?
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<Landmark>, _>>()?;
        match landmarks.as_slice() {
            &[ray_a, vertex, ray_b] => Ok(Self::new(name, ray_a, vertex, ray_b)),
            _ => Err(parse_error()),
        }
    }
}

/// The static set of joints measured in every frame.
///
/// Built once at start-up; the first entry is the primary joint whose ray
/// vectors are reported in the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointTable {
    joints: Vec<JointDefinition>,
}

impl JointTable {
    pub fn new(joints: Vec<JointDefinition>) -> Result<Self, Error> {
        if joints.is_empty() {
            return Err(Error::EmptyJointTable);
        }
        let mut seen = BTreeSet::new();
        for joint in &joints {
            if !seen.insert(joint.name.as_str()) {
                return Err(Error::DuplicateJoint(joint.name.clone()));
            }
        }
        Ok(Self { joints })
    }

    /// Elbow, shoulder, hip and knee on both sides of the body.
    pub fn full_body() -> Self {
        use Landmark::*;
        Self {
            joints: vec![
                JointDefinition::new("left_elbow", LeftShoulder, LeftElbow, LeftWrist),
                JointDefinition::new("right_elbow", RightShoulder, RightElbow, RightWrist),
                JointDefinition::new("left_shoulder", LeftElbow, LeftShoulder, LeftHip),
                JointDefinition::new("right_shoulder", RightElbow, RightShoulder, RightHip),
                JointDefinition::new("left_hip", LeftShoulder, LeftHip, LeftKnee),
                JointDefinition::new("right_hip", RightShoulder, RightHip, RightKnee),
                JointDefinition::new("left_knee", LeftHip, LeftKnee, LeftAnkle),
                JointDefinition::new("right_knee", RightHip, RightKnee, RightAnkle),
            ],
        }
    }

    pub fn primary(&self) -> &JointDefinition {
        &self.joints[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JointDefinition> {
        self.joints.iter()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

impl Default for JointTable {
    fn default() -> Self {
        Self {
            joints: vec![JointDefinition::new(
                "elbow",
                Landmark::LeftShoulder,
                Landmark::LeftElbow,
                Landmark::LeftWrist,
            )],
        }
    }
}

impl<'a> IntoIterator for &'a JointTable {
    type Item = &'a JointDefinition;
    type IntoIter = std::slice::Iter<'a, JointDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
