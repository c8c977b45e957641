use crate::{
    error::Error,
    estimate::PoseEstimator,
    joint::JointTable,
    overlay::{Overlay, Pixel},
    pose::LandmarkFrame,
};
use num_traits::cast::ToPrimitive;
use opencv::{
    core::{Mat, Point as CvPoint, Scalar, Size},
    imgproc::{self, LINE_8, LINE_AA},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Frame rate used for annotated output when the source does not report one.
pub const FALLBACK_FPS: f64 = 30.0;

const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const YELLOW: (f64, f64, f64) = (0.0, 255.0, 255.0);

fn path_str(path: &Path) -> Result<&str, Error> {
    path.to_str()
        .ok_or_else(|| Error::GetPathAsStr(path.to_path_buf()))
}

/// Forward-only stream of decoded frames from a video file.
///
/// Frames are decoded lazily, one per call to `next`. Once the stream ends or
/// a read fails it is exhausted for good; reopen the file to start over.
pub struct VideoFrames {
    capture: VideoCapture,
    path: PathBuf,
    frames_read: usize,
    finished: bool,
}

impl VideoFrames {
    pub fn open<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let capture = VideoCapture::from_file(path_str(path)?, videoio::CAP_ANY)
            .map_err(|_| Error::OpenVideo(path.to_path_buf()))?;
        if !capture.is_opened().map_err(Error::QueryCapture)? {
            return Err(Error::OpenVideo(path.to_path_buf()));
        }

        info!(
            path = %path.display(),
            fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or_default(),
            frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT).unwrap_or_default(),
            "opened video"
        );

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            frames_read: 0,
            finished: false,
        })
    }

    /// Frame rate reported by the container, or [`FALLBACK_FPS`].
    pub fn fps(&self) -> Result<f64, Error> {
        let fps = self
            .capture
            .get(videoio::CAP_PROP_FPS)
            .map_err(Error::QueryCapture)?;
        if fps.is_finite() && fps > 0.0 {
            Ok(fps)
        } else {
            warn!(path = %self.path.display(), fps, "video reports no frame rate");
            Ok(FALLBACK_FPS)
        }
    }

    pub fn frame_size(&self) -> Result<Size, Error> {
        let dimension = |prop: i32| -> Result<i32, Error> {
            self.capture
                .get(prop)
                .map_err(Error::QueryCapture)?
                .round()
                .to_i32()
                .ok_or(Error::ConvertToI32)
        };
        Ok(Size::new(
            dimension(videoio::CAP_PROP_FRAME_WIDTH)?,
            dimension(videoio::CAP_PROP_FRAME_HEIGHT)?,
        ))
    }
}

impl Iterator for VideoFrames {
    type Item = Result<Mat, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut frame = Mat::default();
        match self.capture.read(&mut frame) {
            Ok(true) if !frame.empty() => {
                self.frames_read += 1;
                Some(Ok(frame))
            }
            Ok(_) => {
                debug!(path = %self.path.display(), frames = self.frames_read, "end of video");
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(Error::ReadFrame(e)))
            }
        }
    }
}

/// An mp4 file that annotated frames are appended to.
pub struct AnnotatedVideo {
    writer: VideoWriter,
    path: PathBuf,
    frames_written: usize,
}

impl AnnotatedVideo {
    pub fn create<P>(path: P, fps: f64, size: Size) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')
            .map_err(|_| Error::OpenVideoWriter(path.to_path_buf()))?;
        let writer = VideoWriter::new(path_str(path)?, fourcc, fps, size, true)
            .map_err(|_| Error::OpenVideoWriter(path.to_path_buf()))?;
        if !writer.is_opened().map_err(|_| Error::OpenVideoWriter(path.to_path_buf()))? {
            return Err(Error::OpenVideoWriter(path.to_path_buf()));
        }
        info!(path = %path.display(), fps, ?size, "writing annotated video");

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            frames_written: 0,
        })
    }

    /// Draw `overlay` over a copy of `frame` and append it.
    pub fn write(&mut self, frame: &Mat, overlay: &Overlay) -> Result<(), Error> {
        let mut canvas = frame.try_clone().map_err(Error::CopyFrame)?;
        draw(&mut canvas, overlay)?;
        self.writer.write(&canvas).map_err(Error::WriteFrame)?;
        self.frames_written += 1;
        Ok(())
    }
}

impl Drop for AnnotatedVideo {
    fn drop(&mut self) {
        debug!(
            path = %self.path.display(),
            frames = self.frames_written,
            "closing annotated video"
        );
    }
}

fn cv_point(pixel: Pixel) -> CvPoint {
    CvPoint::new(pixel.x, pixel.y)
}

fn draw(canvas: &mut Mat, overlay: &Overlay) -> Result<(), Error> {
    for &(a, b) in &overlay.segments {
        imgproc::line(
            canvas,
            cv_point(a),
            cv_point(b),
            Scalar::from(YELLOW),
            2,       // thickness
            LINE_AA, // line_type
            0,       // shift
        )
        .map_err(Error::DrawLine)?;
    }
    for &dot in &overlay.dots {
        imgproc::circle(
            canvas,
            cv_point(dot),
            4,
            Scalar::from(GREEN),
            -1,     // thickness, filled
            LINE_8, // line_type
            0,      // shift
        )
        .map_err(Error::DrawCircle)?;
    }
    Ok(())
}

/// Wraps a frame-based estimator and records every frame it sees, with the
/// estimated landmarks and joint rays drawn on top.
pub struct Annotating<E> {
    inner: E,
    table: JointTable,
    output: AnnotatedVideo,
}

impl<E> Annotating<E> {
    pub fn new(inner: E, table: JointTable, output: AnnotatedVideo) -> Self {
        Self {
            inner,
            table,
            output,
        }
    }
}

impl<E> PoseEstimator for Annotating<E>
where
    E: PoseEstimator<Frame = Mat>,
{
    type Frame = Mat;

    fn estimate(&mut self, frame: &Mat) -> Result<LandmarkFrame, Error> {
        let landmarks = self.inner.estimate(frame)?;
        let overlay = Overlay::new(&landmarks, &self.table, frame.cols(), frame.rows())?;
        self.output.write(frame, &overlay)?;
        Ok(landmarks)
    }
}
