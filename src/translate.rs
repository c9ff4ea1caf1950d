//! Translation-step invocation.
//!
//! The generation of translated samples is an external collaborator. This
//! crate treats it as a callback returning a process-style outcome, so the
//! pipeline composes cleanly with both a real subprocess (see the CLI's
//! command translator) and in-process fakes in tests.

use std::path::PathBuf;

use crate::artifacts::{EvalSelector, Split};
use crate::error::{Error, Result};

/// Parameters passed to the translation collaborator.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Checkpoint directory holding the model weights.
    pub checkpoint: PathBuf,

    /// Number of samples to generate.
    pub sample_count: usize,

    /// Dataset split to draw inputs from.
    pub split: Split,

    /// Specific epoch to evaluate; `None` uses the final weights.
    pub epoch: Option<u32>,
}

impl TranslationRequest {
    /// Build a request from a checkpoint path and selector.
    #[must_use]
    pub fn new(checkpoint: impl Into<PathBuf>, selector: &EvalSelector, sample_count: usize) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            sample_count,
            split: selector.split,
            epoch: selector.epoch,
        }
    }
}

/// Process-style outcome of a translation invocation.
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    /// Exit status; zero means success.
    pub status: i32,

    /// Captured error stream, verbatim.
    pub diagnostic: String,
}

impl TranslationOutcome {
    /// A successful outcome with no diagnostic.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: 0,
            diagnostic: String::new(),
        }
    }

    /// `true` when the collaborator exited cleanly.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.status == 0
    }
}

/// Translation collaborator callback.
///
/// On success the collaborator must have written arrays under a layout the
/// artifact resolver can find.
pub type TranslateFn =
    Box<dyn Fn(&TranslationRequest) -> Result<TranslationOutcome> + Send + Sync>;

/// Run the translation collaborator and fail fast on a non-zero status.
///
/// The failure carries the collaborator's diagnostic stream verbatim. No
/// retry is attempted here: generation is expensive, and a failed run means
/// there is nothing new on disk to resolve.
pub fn invoke_translation(translate: &TranslateFn, request: &TranslationRequest) -> Result<()> {
    tracing::debug!(
        checkpoint = %request.checkpoint.display(),
        samples = request.sample_count,
        split = %request.split,
        epoch = ?request.epoch,
        "invoking translation collaborator"
    );

    let outcome = translate(request)?;
    if outcome.ok() {
        Ok(())
    } else {
        Err(Error::Translation {
            status: outcome.status,
            diagnostic: outcome.diagnostic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TranslationRequest {
        TranslationRequest::new(
            "/ckpt",
            &EvalSelector::epoch(5, Split::Test),
            10,
        )
    }

    #[test]
    fn test_request_carries_selector() {
        let req = request();
        assert_eq!(req.split, Split::Test);
        assert_eq!(req.epoch, Some(5));
        assert_eq!(req.sample_count, 10);
    }

    #[test]
    fn test_zero_status_is_ok() {
        let translate: TranslateFn = Box::new(|_| Ok(TranslationOutcome::success()));
        assert!(invoke_translation(&translate, &request()).is_ok());
    }

    #[test]
    fn test_nonzero_status_carries_diagnostic_verbatim() {
        let translate: TranslateFn = Box::new(|_| {
            Ok(TranslationOutcome {
                status: 2,
                diagnostic: "Traceback: missing weights\n".to_string(),
            })
        });
        let err = invoke_translation(&translate, &request()).unwrap_err();
        let Error::Translation { status, diagnostic } = err else {
            panic!("expected translation error");
        };
        assert_eq!(status, 2);
        assert_eq!(diagnostic, "Traceback: missing weights\n");
    }
}
