use crate::{
    error::Error,
    estimate::{
        heatmap::{decode_heatmaps, grid_from_shape, HeatmapConfig},
        PoseEstimator,
    },
    pose::LandmarkFrame,
};
use opencv::{
    core::{Mat, Scalar, Size, CV_32F},
    dnn,
    prelude::*,
};
use std::{path::Path, time::Instant};
use tracing::trace;

/// A heatmap-producing body model run through OpenCV's DNN module.
pub struct DnnEstimator {
    net: dnn::Net,
    config: HeatmapConfig,
}

fn path_str(path: &Path) -> Result<&str, Error> {
    path.to_str()
        .ok_or_else(|| Error::GetPathAsStr(path.to_path_buf()))
}

impl DnnEstimator {
    /// Load a model from `weights`, with an optional network description
    /// (e.g. a Caffe `.prototxt`) in `config_path`.
    pub fn new<P>(
        weights: P,
        config_path: Option<&Path>,
        config: HeatmapConfig,
    ) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let weights = weights.as_ref();
        let description = config_path.map(path_str).transpose()?.unwrap_or("");
        let net = dnn::read_net(path_str(weights)?, description, "")
            .map_err(|e| Error::ReadNet(weights.to_path_buf(), e))?;
        Ok(Self { net, config })
    }
}

impl PoseEstimator for DnnEstimator {
    type Frame = Mat;

    fn estimate(&mut self, frame: &Mat) -> Result<LandmarkFrame, Error> {
        let input_size = Size::new(
            i32::from(self.config.input_width),
            i32::from(self.config.input_height),
        );
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            input_size,
            Scalar::default(),
            false, // swap_rb
            false, // crop
            CV_32F,
        )
        .map_err(Error::BlobFromImage)?;

        let start_inference = Instant::now();
        self.net
            .set_input(&blob, "", 1.0, Scalar::default())
            .map_err(Error::Forward)?;
        let output = self.net.forward_single("").map_err(Error::Forward)?;
        trace!(inference = ?start_inference.elapsed());

        let (height, width) = grid_from_shape(&output.mat_size())?;
        let scores = output.data_typed::<f32>().map_err(Error::GetMatData)?;
        decode_heatmaps(scores, height, width, self.config.keypoint_threshold)
    }
}
