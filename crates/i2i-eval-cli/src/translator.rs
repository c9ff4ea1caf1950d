//! Subprocess-backed translation collaborator.

use std::process::Command;

use anyhow::{bail, Result};
use i2i_eval::{TranslateFn, TranslationOutcome, TranslationRequest};

/// Runs the external translation step as a subprocess.
///
/// The command template is split on whitespace into program and leading
/// arguments; the checkpoint path, sample count, split, and optional epoch
/// are appended in the collaborator's expected order. Stderr is captured and
/// carried verbatim in the outcome.
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
}

impl CommandTranslator {
    /// Parse a command template such as `python scripts/translate_data.py`.
    pub fn new(template: &str) -> Result<Self> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            bail!("translation command template is empty");
        };
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Assemble the full command line for one request.
    fn build_command(&self, request: &TranslationRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.arg(&request.checkpoint);
        cmd.arg("--n-eval").arg(request.sample_count.to_string());
        cmd.arg("--split").arg(request.split.as_str());
        if let Some(epoch) = request.epoch {
            cmd.arg("--epoch").arg(epoch.to_string());
        }
        cmd
    }

    /// Turn the translator into the pipeline's callback form.
    #[must_use]
    pub fn into_translate_fn(self) -> TranslateFn {
        Box::new(move |request| {
            let output = self.build_command(request).output()?;
            Ok(TranslationOutcome {
                status: output.status.code().unwrap_or(-1),
                diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}
