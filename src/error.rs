#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no video file was supplied")]
    InputMissing,

    #[error("failed to open video file: {0:?}")]
    OpenVideo(std::path::PathBuf),

    #[error("failed to decode any frame from the video")]
    DecodeFailure(#[source] Box<Error>),

    #[error("comparison was cancelled")]
    Cancelled,

    #[error("failed to construct NotNan from f64: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f64),

    #[error("coordinate is not finite: {0}")]
    NonFiniteCoordinate(f64),

    #[error("unknown landmark name: {0}")]
    UnknownLandmark(String),

    #[error("failed to parse joint definition {0:?}: expected name=ray_a,vertex,ray_b")]
    ParseJointDefinition(String),

    #[error("joint {0:?} is defined more than once")]
    DuplicateJoint(String),

    #[error("cannot construct joint table from empty definitions")]
    EmptyJointTable,

    #[error("unknown verdict policy: {0}")]
    UnknownVerdictPolicy(String),

    #[error("pose estimation failed: {0}")]
    Estimate(String),

    #[error("unexpected pose model output shape: {0:?}")]
    OutputShape(Vec<i32>),

    #[error("expected heatmap blob with {expected} values, got {actual}")]
    HeatmapShape { expected: usize, actual: usize },

    #[error("a sequence build worker panicked")]
    WorkerPanicked,

    #[error("failed to get path as &str: {0:?}")]
    GetPathAsStr(std::path::PathBuf),

    #[error("failed to convert value to f64")]
    ConvertToF64,

    #[error("failed to convert value to i32")]
    ConvertToI32,

    #[error("invalid recorder transition from {from:?} on {event:?}")]
    RecorderTransition {
        from: crate::capture::RecorderState,
        event: crate::capture::RecorderEvent,
    },

    #[cfg(feature = "video")]
    #[error("failed to read frame")]
    ReadFrame(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to query video capture")]
    QueryCapture(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to load pose model from {0:?}")]
    ReadNet(std::path::PathBuf, #[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to build input blob from frame")]
    BlobFromImage(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to run pose model forward pass")]
    Forward(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to get Mat data")]
    GetMatData(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to copy frame")]
    CopyFrame(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to draw line")]
    DrawLine(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to draw circle")]
    DrawCircle(#[source] opencv::Error),

    #[cfg(feature = "video")]
    #[error("failed to open video writer for {0:?}")]
    OpenVideoWriter(std::path::PathBuf),

    #[cfg(feature = "video")]
    #[error("failed to write frame")]
    WriteFrame(#[source] opencv::Error),
}

impl Error {
    /// Stable, machine-readable code reported alongside the feedback message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputMissing => "input_missing",
            Self::OpenVideo(_) | Self::DecodeFailure(_) => "decode_failure",
            Self::Cancelled => "cancelled",
            Self::UnknownLandmark(_)
            | Self::ParseJointDefinition(_)
            | Self::DuplicateJoint(_)
            | Self::EmptyJointTable
            | Self::UnknownVerdictPolicy(_) => "invalid_configuration",
            Self::RecorderTransition { .. } => "invalid_transition",
            _ => "internal",
        }
    }

    /// Message shown to the end user in place of a raw error trace.
    pub fn user_message(&self) -> String {
        match self {
            Self::InputMissing => "No video file uploaded".to_owned(),
            Self::OpenVideo(_) | Self::DecodeFailure(_) => {
                "Could not analyze the video: the file could not be decoded.".to_owned()
            }
            Self::Cancelled => "Could not analyze the video: processing timed out.".to_owned(),
            other => format!("Could not analyze the video: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn codes_are_distinct_per_category() {
        assert_eq!(Error::InputMissing.code(), "input_missing");
        assert_eq!(
            Error::DecodeFailure(Box::new(Error::Estimate("x".into()))).code(),
            "decode_failure"
        );
        assert_eq!(Error::Cancelled.code(), "cancelled");
        assert_eq!(Error::EmptyJointTable.code(), "invalid_configuration");
        assert_eq!(Error::ConvertToF64.code(), "internal");
    }

    #[test]
    fn user_message_hides_internals() {
        assert_eq!(Error::InputMissing.user_message(), "No video file uploaded");
        assert!(Error::OpenVideo("a.mp4".into())
            .user_message()
            .starts_with("Could not analyze"));
    }
}
