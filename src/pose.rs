use crate::{error::Error, point::Point};
use std::{fmt, str::FromStr};

/// Named anatomical landmarks, in COCO keypoint order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Landmark {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Landmark {
    pub const ALL: [Landmark; 17] = [
        Landmark::Nose,
        Landmark::LeftEye,
        Landmark::RightEye,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
    ];

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

pub const NUM_LANDMARKS: usize = Landmark::ALL.len();

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Landmark {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|landmark| landmark.name() == needle)
            .ok_or_else(|| Error::UnknownLandmark(s.to_owned()))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LandmarkPoint {
    pub landmark: Landmark,
    pub point: Point,
    pub visible: bool,
}

/// The landmarks the estimator located in a single frame.
///
/// An empty frame means no pose was detected, which is a valid state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    points: [Option<LandmarkPoint>; NUM_LANDMARKS],
}

impl LandmarkFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a landmark, replacing any previous entry with the same name.
    pub fn insert(&mut self, point: LandmarkPoint) {
        self.points[point.landmark.idx()] = Some(point);
    }

    pub fn with(mut self, point: LandmarkPoint) -> Self {
        self.insert(point);
        self
    }

    pub fn get(&self, landmark: Landmark) -> Option<&LandmarkPoint> {
        self.points[landmark.idx()].as_ref()
    }

    /// The position of `landmark`, if it was detected and marked visible.
    pub fn visible(&self, landmark: Landmark) -> Option<Point> {
        self.get(landmark)
            .filter(|point| point.visible)
            .map(|point| point.point)
    }

    pub fn len(&self) -> usize {
        self.points.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LandmarkPoint> {
        self.points.iter().flatten()
    }
}

impl std::iter::FromIterator<LandmarkPoint> for LandmarkFrame {
    fn from_iter<I: IntoIterator<Item = LandmarkPoint>>(iter: I) -> Self {
        let mut frame = Self::new();
        iter.into_iter().for_each(|point| frame.insert(point));
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(landmark: Landmark, x: f64, y: f64, visible: bool) -> LandmarkPoint {
        LandmarkPoint {
            landmark,
            point: Point::new(x, y).unwrap(),
            visible,
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!(
            "left_shoulder".parse::<Landmark>().unwrap(),
            Landmark::LeftShoulder
        );
        assert_eq!("Right-Knee".parse::<Landmark>().unwrap(), Landmark::RightKnee);
        assert!("tail".parse::<Landmark>().is_err());
    }

    #[test]
    fn index_matches_coco_order() {
        for (i, landmark) in Landmark::ALL.iter().enumerate() {
            assert_eq!(landmark.idx(), i);
        }
    }

    #[test]
    fn empty_frame_is_no_pose() {
        let frame = LandmarkFrame::new();
        assert!(frame.is_empty());
        assert_eq!(frame.len(), 0);
    }

    #[test]
    fn names_are_unique_within_frame() {
        let frame = LandmarkFrame::new()
            .with(point(Landmark::LeftElbow, 0.1, 0.1, true))
            .with(point(Landmark::LeftElbow, 0.2, 0.2, true));
        assert_eq!(frame.len(), 1);
        assert_eq!(
            frame.visible(Landmark::LeftElbow),
            Some(Point::new(0.2, 0.2).unwrap())
        );
    }

    #[test]
    fn hidden_landmark_is_not_visible() {
        let frame: LandmarkFrame = vec![point(Landmark::LeftWrist, 0.3, 0.4, false)]
            .into_iter()
            .collect();
        assert!(frame.get(Landmark::LeftWrist).is_some());
        assert_eq!(frame.visible(Landmark::LeftWrist), None);
    }
}
