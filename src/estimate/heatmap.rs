use crate::{
    error::Error,
    point::Point,
    pose::{Landmark, LandmarkFrame, LandmarkPoint},
};
use num_traits::cast::ToPrimitive;
use ordered_float::NotNan;

pub const DEFAULT_INPUT_SIZE: u16 = 368;
pub const DEFAULT_KEYPOINT_THRESHOLD: f32 = 0.1;

/// Part order of the OpenPose COCO body model. Index 1 is the neck, which has
/// no counterpart among the COCO keypoints.
pub const OPENPOSE_COCO_PARTS: [Option<Landmark>; 18] = [
    Some(Landmark::Nose),
    None,
    Some(Landmark::RightShoulder),
    Some(Landmark::RightElbow),
    Some(Landmark::RightWrist),
    Some(Landmark::LeftShoulder),
    Some(Landmark::LeftElbow),
    Some(Landmark::LeftWrist),
    Some(Landmark::RightHip),
    Some(Landmark::RightKnee),
    Some(Landmark::RightAnkle),
    Some(Landmark::LeftHip),
    Some(Landmark::LeftKnee),
    Some(Landmark::LeftAnkle),
    Some(Landmark::RightEye),
    Some(Landmark::LeftEye),
    Some(Landmark::RightEar),
    Some(Landmark::LeftEar),
];

#[derive(Debug, Clone, Copy, structopt::StructOpt)]
pub struct HeatmapConfig {
    /// The width of the image the model expects.
    #[structopt(long, default_value = "368")]
    pub input_width: u16,

    /// The height of the image the model expects.
    #[structopt(long, default_value = "368")]
    pub input_height: u16,

    /// Heatmap peak score below which a landmark is reported as not visible.
    #[structopt(long, default_value = "0.1")]
    pub keypoint_threshold: f32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            input_width: DEFAULT_INPUT_SIZE,
            input_height: DEFAULT_INPUT_SIZE,
            keypoint_threshold: DEFAULT_KEYPOINT_THRESHOLD,
        }
    }
}

/// `(height, width)` of the heatmap planes in a network output blob shaped
/// `[batch, parts, height, width]`.
pub fn grid_from_shape(shape: &[i32]) -> Result<(usize, usize), Error> {
    let invalid = || Error::OutputShape(shape.to_vec());
    match *shape {
        [1, parts, height, width] => {
            let parts = parts.to_usize().ok_or_else(invalid)?;
            let height = height.to_usize().ok_or_else(invalid)?;
            let width = width.to_usize().ok_or_else(invalid)?;
            if parts < OPENPOSE_COCO_PARTS.len() || height == 0 || width == 0 {
                return Err(invalid());
            }
            Ok((height, width))
        }
        _ => Err(invalid()),
    }
}

/// Index and score of the highest peak in a heatmap plane, ignoring NaNs.
fn argmax(plane: &[f32]) -> Option<(usize, NotNan<f32>)> {
    plane
        .iter()
        .enumerate()
        .filter_map(|(i, &score)| NotNan::new(score).ok().map(|score| (i, score)))
        .max_by_key(|&(_, score)| score)
}

/// Decode per-part confidence maps laid out as `[part, row, col]` into a
/// landmark frame with coordinates normalized to `[0, 1]`.
///
/// Only the first [`OPENPOSE_COCO_PARTS`] planes are read; any trailing planes
/// (background, part affinity fields) are ignored. A frame in which no part
/// clears `threshold` is reported as having no pose.
pub fn decode_heatmaps(
    scores: &[f32],
    height: usize,
    width: usize,
    threshold: f32,
) -> Result<LandmarkFrame, Error> {
    let plane_len = height * width;
    let expected = plane_len * OPENPOSE_COCO_PARTS.len();
    if plane_len == 0 || scores.len() < expected {
        return Err(Error::HeatmapShape {
            expected,
            actual: scores.len(),
        });
    }

    let width_f = width.to_f64().ok_or(Error::ConvertToF64)?;
    let height_f = height.to_f64().ok_or(Error::ConvertToF64)?;

    let mut frame = LandmarkFrame::new();
    for (part, plane) in OPENPOSE_COCO_PARTS
        .iter()
        .zip(scores.chunks_exact(plane_len))
    {
        let landmark = match part {
            Some(landmark) => *landmark,
            None => continue,
        };
        let (index, score) = match argmax(plane) {
            Some(peak) => peak,
            None => continue,
        };
        let row = (index / width).to_f64().ok_or(Error::ConvertToF64)?;
        let col = (index % width).to_f64().ok_or(Error::ConvertToF64)?;

        frame.insert(LandmarkPoint {
            landmark,
            point: Point::new((col + 0.5) / width_f, (row + 0.5) / height_f)?,
            visible: score.into_inner() >= threshold,
        });
    }

    if frame.iter().any(|point| point.visible) {
        Ok(frame)
    } else {
        Ok(LandmarkFrame::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const HEIGHT: usize = 4;
    const WIDTH: usize = 5;

    fn blank() -> Vec<f32> {
        vec![0.0; HEIGHT * WIDTH * (OPENPOSE_COCO_PARTS.len() + 1)]
    }

    fn set(scores: &mut [f32], part: usize, row: usize, col: usize, value: f32) {
        scores[part * HEIGHT * WIDTH + row * WIDTH + col] = value;
    }

    mod argmax_tests {
        use super::*;

        #[test]
        fn skips_nan() {
            let (index, score) = argmax(&[0.1, f32::NAN, 0.7, 0.2]).unwrap();
            assert_eq!(index, 2);
            assert_eq!(score.into_inner(), 0.7);
        }

        #[test]
        fn all_nan() {
            assert!(argmax(&[f32::NAN, f32::NAN]).is_none());
        }
    }

    #[test]
    fn peaks_become_normalized_landmarks() {
        let mut scores = blank();
        // left elbow is part 6 in the OpenPose ordering
        set(&mut scores, 6, 1, 2, 0.9);
        set(&mut scores, 5, 3, 4, 0.05);

        let frame = decode_heatmaps(&scores, HEIGHT, WIDTH, 0.1).unwrap();

        let elbow = frame.get(Landmark::LeftElbow).unwrap();
        assert!(elbow.visible);
        assert_approx_eq!(elbow.point.x(), 2.5 / 5.0);
        assert_approx_eq!(elbow.point.y(), 1.5 / 4.0);

        let shoulder = frame.get(Landmark::LeftShoulder).unwrap();
        assert!(!shoulder.visible);
    }

    #[test]
    fn no_visible_part_is_no_pose() {
        let scores = blank();
        let frame = decode_heatmaps(&scores, HEIGHT, WIDTH, 0.1).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn short_blob_is_rejected() {
        let scores = vec![0.0; HEIGHT * WIDTH];
        assert!(matches!(
            decode_heatmaps(&scores, HEIGHT, WIDTH, 0.1),
            Err(Error::HeatmapShape { .. })
        ));
    }

    mod shape_tests {
        use super::*;

        #[test]
        fn openpose_coco_output() {
            assert_eq!(grid_from_shape(&[1, 57, 46, 46]).unwrap(), (46, 46));
            assert_eq!(grid_from_shape(&[1, 19, 30, 40]).unwrap(), (30, 40));
        }

        #[test]
        fn too_few_parts() {
            assert!(matches!(
                grid_from_shape(&[1, 17, 46, 46]),
                Err(Error::OutputShape(_))
            ));
        }

        #[test]
        fn wrong_rank_or_batch() {
            assert!(grid_from_shape(&[57, 46, 46]).is_err());
            assert!(grid_from_shape(&[2, 57, 46, 46]).is_err());
            assert!(grid_from_shape(&[1, 57, 0, 46]).is_err());
            assert!(grid_from_shape(&[1, 57, -1, 46]).is_err());
        }
    }
}
