use crate::{
    align::align,
    deviation::{analyze, DeviationReport},
    error::Error,
    estimate::PoseEstimator,
    feedback::{Feedback, Formatter, Response},
    joint::JointTable,
    sequence::{AngleSequence, SequenceBuilder},
};
use indicatif::ProgressBar;
use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, RecvTimeoutError, Sender},
        Arc,
    },
    time::{Duration, Instant},
};
use tracing::{info, warn};

/// Shared flag checked between frames; once set, in-flight builds stop at
/// the next frame boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel automatically once `timeout` elapses, unless the returned guard
    /// is dropped first.
    pub fn cancel_after(&self, timeout: Duration) -> TimeoutGuard {
        let (disarm_tx, disarm_rx) = channel::<()>();
        let flag = self.clone();
        std::thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = disarm_rx.recv_timeout(timeout) {
                warn!(?timeout, "comparison timed out, cancelling");
                flag.cancel();
            }
        });
        TimeoutGuard { _disarm: disarm_tx }
    }
}

/// Disarms the timeout started by [`CancelFlag::cancel_after`] when dropped.
#[derive(Debug)]
pub struct TimeoutGuard {
    _disarm: Sender<()>,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Timing {
    pub user: Duration,
    pub reference: Duration,
    pub analysis: Duration,
}

/// Everything a comparison produced.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub report: DeviationReport,
    pub feedback: Feedback,
    pub timing: Timing,
    primary_joint: String,
}

impl Comparison {
    pub fn response(&self) -> Response<'_> {
        Response::new(&self.feedback, &self.report, &self.primary_joint)
    }
}

/// One side of a comparison: a frame source plus the estimator for it.
pub struct Input<I, E> {
    pub frames: I,
    pub estimator: E,
}

impl<I, E> Input<I, E> {
    pub fn new(frames: I, estimator: E) -> Self {
        Self { frames, estimator }
    }
}

/// The motion comparison engine: builds one angle sequence per video, aligns
/// them, and turns the deviation into feedback.
pub struct ComparisonEngine {
    table: JointTable,
    formatter: Formatter,
    stride: NonZeroUsize,
    progress: Option<ProgressBar>,
}

impl ComparisonEngine {
    pub fn new(table: JointTable, formatter: Formatter) -> Self {
        Self {
            table,
            formatter,
            stride: NonZeroUsize::MIN,
            progress: None,
        }
    }

    pub fn with_frame_stride(mut self, stride: NonZeroUsize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    fn builder(&self, cancel: &CancelFlag) -> SequenceBuilder<'_> {
        SequenceBuilder::new(&self.table)
            .stride(self.stride)
            .cancel(cancel.clone())
            .progress(self.progress.as_ref())
    }

    /// Build both sequences concurrently, then align, analyze and format.
    ///
    /// The user video is processed on a scoped worker thread while the
    /// reference video is processed on the calling thread.
    pub fn compare<UI, UE, RI, RE>(
        &self,
        user: Input<UI, UE>,
        reference: Input<RI, RE>,
        cancel: &CancelFlag,
    ) -> Result<Comparison, Error>
    where
        UI: IntoIterator<Item = Result<UE::Frame, Error>> + Send,
        UE: PoseEstimator + Send,
        RI: IntoIterator<Item = Result<RE::Frame, Error>>,
        RE: PoseEstimator,
    {
        let user_builder = self.builder(cancel);
        let reference_builder = self.builder(cancel);

        let (user_result, reference_result) = crossbeam::thread::scope(|scope| {
            let Input {
                frames: user_frames,
                estimator: mut user_estimator,
            } = user;
            let user_builder = &user_builder;
            let user_handle = scope.spawn(move |_| {
                let start = Instant::now();
                let sequence = user_builder.build(user_frames, &mut user_estimator);
                (sequence, start.elapsed())
            });

            let Input {
                frames: reference_frames,
                estimator: mut reference_estimator,
            } = reference;
            let start = Instant::now();
            let reference_sequence =
                reference_builder.build(reference_frames, &mut reference_estimator);
            let reference_result = (reference_sequence, start.elapsed());

            let user_result = user_handle.join().map_err(|_| Error::WorkerPanicked)?;
            Ok::<_, Error>((user_result, reference_result))
        })
        .map_err(|_| Error::WorkerPanicked)??;

        let (user_sequence, user_elapsed) = user_result;
        let (reference_sequence, reference_elapsed) = reference_result;
        let user_sequence = user_sequence?;
        let reference_sequence = reference_sequence?;

        let mut comparison = self.evaluate(user_sequence, reference_sequence);
        comparison.timing.user = user_elapsed;
        comparison.timing.reference = reference_elapsed;
        Ok(comparison)
    }

    /// The synchronous tail of the pipeline over already-built sequences.
    pub fn evaluate(&self, user: AngleSequence, reference: AngleSequence) -> Comparison {
        let start = Instant::now();
        let user_len = user.len();
        let reference_len = reference.len();

        let pairs = align(user, reference);
        let report = analyze(&pairs);
        let feedback = self.formatter.format(&report);
        let analysis = start.elapsed();

        info!(
            user_frames = user_len,
            reference_frames = reference_len,
            frames_compared = report.frames_compared,
            verdict = %feedback.verdict,
            "comparison complete"
        );

        Comparison {
            report,
            feedback,
            timing: Timing {
                analysis,
                ..Timing::default()
            },
            primary_joint: self.table.primary().name.clone(),
        }
    }
}
