// ============================================================================
// ERRORS — everything that can end an edit cycle
// ============================================================================

use std::fmt;

/// Which precondition of an edit cycle was not met.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingInput {
    /// No working image has been loaded into the session.
    Image,
    /// The paint layer has no marked pixels.
    Mask,
    /// The prompt is empty or whitespace only.
    Prompt,
}

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingInput::Image => write!(f, "please load an image first"),
            MissingInput::Mask => write!(f, "paint over the area you want to edit"),
            MissingInput::Prompt => write!(f, "please describe the edit"),
        }
    }
}

/// Terminal failure of one edit cycle.
///
/// Every variant maps to exactly one user-visible status line; the session is
/// left untouched so the whole cycle can be retried.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("missing input: {0}")]
    InputMissing(MissingInput),

    #[error("API error: {status} - {message}")]
    Network { status: u16, message: String },

    #[error("no image received from the API; check the model response")]
    ResponseShape,

    #[error("failed to load the edited image: {0}")]
    ImageDecode(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

impl From<reqwest::Error> for EditError {
    fn from(e: reqwest::Error) -> Self {
        EditError::Transport(e.to_string())
    }
}

impl EditError {
    /// True for errors detected before anything was sent over the network.
    pub fn is_input_missing(&self) -> bool {
        matches!(self, EditError::InputMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_embeds_status_code() {
        let err = EditError::Network {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error: 500 - Internal Server Error");
    }

    #[test]
    fn input_missing_names_the_input() {
        let err = EditError::InputMissing(MissingInput::Prompt);
        assert!(err.is_input_missing());
        assert!(err.to_string().contains("describe the edit"));
    }

    #[test]
    fn codec_errors_are_direction_neutral() {
        let decode = image::load_from_memory(b"not an image").unwrap_err();
        let err = EditError::from(decode);
        assert!(matches!(err, EditError::Codec(_)));
        assert!(err.to_string().starts_with("image codec error: "));
        assert!(!err.is_input_missing());
    }
}
