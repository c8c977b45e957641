//! Pixel geometry for drawing landmarks and joint rays over a frame.

use crate::{error::Error, joint::JointTable, point::Point, pose::LandmarkFrame};
use num_traits::cast::ToPrimitive;

/// Integer pixel position, origin at the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

/// What to draw on one frame: a dot per visible landmark and a segment per
/// ray of every joint that could be measured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    pub dots: Vec<Pixel>,
    pub segments: Vec<(Pixel, Pixel)>,
}

fn to_pixel(point: Point, width: f64, height: f64) -> Result<Pixel, Error> {
    Ok(Pixel {
        x: (point.x() * width).round().to_i32().ok_or(Error::ConvertToI32)?,
        y: (point.y() * height).round().to_i32().ok_or(Error::ConvertToI32)?,
    })
}

impl Overlay {
    /// Map the normalized landmarks of `landmarks` onto a `width` x `height`
    /// frame. Hidden landmarks are not drawn.
    pub fn new(
        landmarks: &LandmarkFrame,
        table: &JointTable,
        width: i32,
        height: i32,
    ) -> Result<Self, Error> {
        let (width, height) = (f64::from(width), f64::from(height));

        let dots = landmarks
            .iter()
            .filter(|landmark| landmark.visible)
            .map(|landmark| to_pixel(landmark.point, width, height))
            .collect::<Result<Vec<_>, _>>()?;

        let mut segments = Vec::new();
        for (a, vertex, b) in table.iter().filter_map(|joint| joint.locate(landmarks)) {
            let vertex = to_pixel(vertex, width, height)?;
            segments.push((to_pixel(a, width, height)?, vertex));
            segments.push((vertex, to_pixel(b, width, height)?));
        }

        Ok(Self { dots, segments })
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty() && self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LandmarkPoint};

    fn landmark(landmark: Landmark, x: f64, y: f64, visible: bool) -> LandmarkPoint {
        LandmarkPoint {
            landmark,
            point: Point::new(x, y).unwrap(),
            visible,
        }
    }

    fn arm() -> LandmarkFrame {
        LandmarkFrame::new()
            .with(landmark(Landmark::LeftShoulder, 0.5, 0.25, true))
            .with(landmark(Landmark::LeftElbow, 0.5, 0.5, true))
            .with(landmark(Landmark::LeftWrist, 0.75, 0.5, true))
    }

    #[test]
    fn scales_to_frame_size() {
        let overlay = Overlay::new(&arm(), &JointTable::default(), 640, 480).unwrap();

        assert_eq!(overlay.dots.len(), 3);
        assert!(overlay.dots.contains(&Pixel { x: 320, y: 120 }));
        assert_eq!(
            overlay.segments,
            vec![
                (Pixel { x: 320, y: 120 }, Pixel { x: 320, y: 240 }),
                (Pixel { x: 320, y: 240 }, Pixel { x: 480, y: 240 }),
            ]
        );
    }

    #[test]
    fn hidden_landmark_breaks_the_joint() {
        let frame = arm().with(landmark(Landmark::LeftWrist, 0.75, 0.5, false));
        let overlay = Overlay::new(&frame, &JointTable::default(), 100, 100).unwrap();
        assert_eq!(overlay.dots.len(), 2);
        assert!(overlay.segments.is_empty());
    }

    #[test]
    fn no_pose_draws_nothing() {
        let table = JointTable::full_body();
        let overlay = Overlay::new(&LandmarkFrame::new(), &table, 100, 100).unwrap();
        assert!(overlay.is_empty());
    }
}
