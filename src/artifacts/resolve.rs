//! Layout search across historical on-disk schemas.
//!
//! Different versions of the translation step have written their arrays to
//! different places under `<checkpoint>/evals`. Resolution tries a fixed,
//! prioritized list of candidate roots and stops at the first one holding a
//! matching container. Supporting a new layout means appending a candidate,
//! never rewriting the existing ones, so older checkpoints keep resolving.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifacts::{ArtifactSet, EvalSelector, OutputKind, ARRAY_DIR_PREFIX};
use crate::error::{Error, Result};

/// Candidate evaluation roots for `selector`, in priority order.
///
/// 1. epoch-keyed: `evals/epoch_NNNN` or `evals/final`
/// 2. split-keyed: `evals/<split>`
/// 3. flat: `evals`
#[must_use]
pub fn candidate_roots(checkpoint_dir: &Path, selector: &EvalSelector) -> Vec<PathBuf> {
    let evals = checkpoint_dir.join("evals");
    vec![
        evals.join(selector.epoch_key()),
        evals.join(selector.split.as_str()),
        evals,
    ]
}

/// One candidate root examined during resolution.
#[derive(Debug, Clone, Serialize)]
pub struct RootAttempt {
    /// The candidate root path.
    pub path: PathBuf,

    /// Whether the root existed as a directory.
    pub existed: bool,

    /// Names of the root's immediate children (empty when it did not exist).
    pub children: Vec<String>,
}

/// Diagnostic payload for a failed resolution.
///
/// Carries everything a human needs to see the real on-disk state without
/// re-running: every root tried, plus the actual children of a container
/// that was selected but held no known output kind.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionFailure {
    /// The selector the search ran for.
    pub selector: EvalSelector,

    /// Every candidate root examined, in the order tried.
    pub attempts: Vec<RootAttempt>,

    /// The container that matched but held no known kind, with its children.
    pub empty_container: Option<(PathBuf, Vec<String>)>,
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "no evaluation arrays found for {} (expected a `{ARRAY_DIR_PREFIX}*` directory)",
            self.selector
        )?;
        writeln!(f, "candidate roots tried, in priority order:")?;
        for attempt in &self.attempts {
            if attempt.existed {
                if attempt.children.is_empty() {
                    writeln!(f, "  {}: exists, empty", attempt.path.display())?;
                } else {
                    writeln!(
                        f,
                        "  {}: exists, contains: {}",
                        attempt.path.display(),
                        attempt.children.join(", ")
                    )?;
                }
            } else {
                writeln!(f, "  {}: does not exist", attempt.path.display())?;
            }
        }
        if let Some((container, children)) = &self.empty_container {
            writeln!(
                f,
                "matched container {} holds no known output subfolder; contains: {}",
                container.display(),
                if children.is_empty() {
                    "(nothing)".to_string()
                } else {
                    children.join(", ")
                }
            )?;
        }
        Ok(())
    }
}

/// Resolve the array container directory for one evaluation run.
///
/// Idempotent: identical on-disk state yields an identical [`ArtifactSet`].
/// Within a candidate root, ties between matching containers break to the
/// lexicographically greatest name, since container names are designed to
/// sort chronologically.
pub fn resolve(checkpoint_dir: &Path, selector: &EvalSelector) -> Result<ArtifactSet> {
    let mut attempts = Vec::new();

    for root in candidate_roots(checkpoint_dir, selector) {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "candidate root absent");
            attempts.push(RootAttempt {
                path: root,
                existed: false,
                children: Vec::new(),
            });
            continue;
        }

        let children = sorted_child_names(&root)?;
        // Only directories can be containers; a stray file with the prefix
        // still shows up in `children` for diagnostics.
        let matching: Vec<&String> = children
            .iter()
            .filter(|name| {
                name.starts_with(ARRAY_DIR_PREFIX) && root.join(name.as_str()).is_dir()
            })
            .collect();

        if let Some(best) = matching.last() {
            // Earlier-listed layouts win; no fall-through once matched.
            let dir = root.join(best);
            tracing::debug!(dir = %dir.display(), "selected container");

            let kinds: Vec<OutputKind> = OutputKind::ALL
                .into_iter()
                .filter(|kind| dir.join(kind.dir_name()).is_dir())
                .collect();

            if kinds.is_empty() {
                let container_children = sorted_child_names(&dir)?;
                attempts.push(RootAttempt {
                    path: root,
                    existed: true,
                    children,
                });
                return Err(Error::Resolution(ResolutionFailure {
                    selector: *selector,
                    attempts,
                    empty_container: Some((dir, container_children)),
                }));
            }

            return Ok(ArtifactSet { dir, kinds });
        }

        tracing::debug!(root = %root.display(), "candidate root has no matching container");
        attempts.push(RootAttempt {
            path: root,
            existed: true,
            children,
        });
    }

    Err(Error::Resolution(ResolutionFailure {
        selector: *selector,
        attempts,
        empty_container: None,
    }))
}

/// Immediate child names of `dir`, files included, sorted ascending.
///
/// Diagnostics report everything present; stray files are part of the
/// on-disk state a reader needs to see.
fn sorted_child_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        if let Some(name) = entry?.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
