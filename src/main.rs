use anyhow::{Context, Result};
use formcheck::{
    engine::{CancelFlag, Comparison, ComparisonEngine, Input},
    error::Error,
    estimate::{dnn::DnnEstimator, heatmap::HeatmapConfig, PoseEstimator},
    feedback::{ErrorResponse, Formatter, VerdictPolicy},
    joint::{JointDefinition, JointTable},
    video::{AnnotatedVideo, Annotating, VideoFrames},
};
use opencv::core::Mat;
use indicatif::{ProgressBar, ProgressStyle};
use std::{num::NonZeroUsize, path::PathBuf, time::Duration};
use structopt::StructOpt;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;

#[derive(structopt::StructOpt)]
struct CompareOpt {
    /// The user's exercise video.
    user_video: Option<PathBuf>,

    /// The reference video of the same exercise.
    #[structopt(short, long)]
    reference: PathBuf,

    /// Pose model weights, e.g. the OpenPose COCO .caffemodel.
    #[structopt(short, long)]
    model: PathBuf,

    /// Network description for the weights, e.g. a Caffe .prototxt.
    #[structopt(long)]
    model_config: Option<PathBuf>,

    #[structopt(flatten)]
    heatmap: HeatmapConfig,

    /// Angle deviation in degrees above which the form is reported as off.
    #[structopt(short, long, default_value = "10.0")]
    threshold: f64,

    /// Mean ray vector distance above which the `vector` policy reports the form as off.
    #[structopt(long, default_value = "0.1")]
    vector_threshold: f64,

    /// Verdict heuristic: first-frame, mean, worst or vector.
    #[structopt(short, long, default_value = "first-frame")]
    policy: VerdictPolicy,

    /// Joint to measure, as name=ray_a,vertex,ray_b. The first one is the primary joint.
    #[structopt(short, long = "joint")]
    joints: Vec<JointDefinition>,

    /// Measure elbows, shoulders, hips and knees on both sides of the body.
    #[structopt(long, conflicts_with = "joints")]
    full_body: bool,

    /// Analyze only every Nth decoded frame.
    #[structopt(short = "-s", long, default_value = "1")]
    frame_stride: NonZeroUsize,

    /// Cancel the comparison if it takes longer than this.
    #[structopt(long)]
    timeout_secs: Option<u64>,

    /// Write the analyzed frames of the user's video, with landmarks and joint
    /// rays drawn on them, to this mp4 file.
    #[structopt(long)]
    output_video: Option<PathBuf>,
}

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(flatten)]
    compare: CompareOpt,

    #[structopt(long)]
    show_progress: bool,

    /// Pretty-print the JSON response.
    #[structopt(long)]
    pretty: bool,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,
}

fn joint_table(joints: Vec<JointDefinition>, full_body: bool) -> Result<JointTable, Error> {
    if full_body {
        Ok(JointTable::full_body())
    } else if joints.is_empty() {
        Ok(JointTable::default())
    } else {
        JointTable::new(joints)
    }
}

type FrameEstimator = Box<dyn PoseEstimator<Frame = Mat> + Send>;

fn compare(
    opt: CompareOpt,
    cancel: &CancelFlag,
    progress: Option<ProgressBar>,
) -> Result<Comparison, Error> {
    let user_video = opt.user_video.ok_or(Error::InputMissing)?;
    let formatter = Formatter {
        policy: opt.policy,
        threshold: opt.threshold,
        vector_threshold: opt.vector_threshold,
    };
    let table = joint_table(opt.joints, opt.full_body)?;

    let model_config = opt.model_config.as_deref();
    let user_frames = VideoFrames::open(&user_video)?;
    let mut user_estimator: FrameEstimator =
        Box::new(DnnEstimator::new(&opt.model, model_config, opt.heatmap)?);
    if let Some(output_video) = &opt.output_video {
        let output = AnnotatedVideo::create(
            output_video,
            user_frames.fps()?,
            user_frames.frame_size()?,
        )?;
        user_estimator = Box::new(Annotating::new(user_estimator, table.clone(), output));
    }

    let mut engine = ComparisonEngine::new(table, formatter).with_frame_stride(opt.frame_stride);
    if let Some(progress) = progress {
        engine = engine.with_progress(progress);
    }

    let user = Input::new(user_frames, user_estimator);
    let reference = Input::new(
        VideoFrames::open(&opt.reference)?,
        DnnEstimator::new(&opt.model, model_config, opt.heatmap)?,
    );

    let _timeout = opt
        .timeout_secs
        .map(|secs| cancel.cancel_after(Duration::from_secs(secs)));

    engine.compare(user, reference, cancel)
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(opt.log_level),
    )?;

    let cancel = CancelFlag::default();
    let cancel_ctrl_c = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_ctrl_c.cancel();
    })
    .context("failed setting Ctrl-C handler")?;

    let progress = if opt.show_progress {
        Some(
            ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                    .template("{spinner} {pos} frames analyzed {wide_msg}"),
            ),
        )
    } else {
        None
    };

    let outcome = compare(opt.compare, &cancel, progress.clone());
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    let body = match &outcome {
        Ok(comparison) => {
            info!(
                user = ?comparison.timing.user,
                reference = ?comparison.timing.reference,
                analysis = ?comparison.timing.analysis,
                "timing"
            );
            serde_json::to_value(comparison.response())
        }
        Err(e) => {
            error!(error = %e, code = e.code(), "comparison failed");
            serde_json::to_value(ErrorResponse::from(e))
        }
    }
    .context("failed to serialize response")?;

    let rendered = if opt.pretty {
        serde_json::to_string_pretty(&body)
    } else {
        serde_json::to_string(&body)
    }
    .context("failed to render response")?;
    println!("{}", rendered);

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
