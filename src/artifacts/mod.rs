//! Evaluation-artifact model and resolution.
//!
//! The upstream translation step has written its output arrays under several
//! directory conventions over time. This module models the selector that
//! disambiguates one evaluation run ([`EvalSelector`]), the known per-sample
//! output kinds ([`OutputKind`]), and the resolved result ([`ArtifactSet`]).
//! The actual layout search lives in [`resolve`].

mod resolve;

pub use resolve::{candidate_roots, resolve, ResolutionFailure, RootAttempt};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directory-name prefix of array container directories.
pub const ARRAY_DIR_PREFIX: &str = "ndarrays_eval";

/// Dataset split selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Training partition.
    Train,
    /// Held-out test partition.
    Test,
}

impl Split {
    /// The split's directory-name form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "test" => Ok(Self::Test),
            other => Err(format!("invalid split {other:?} (expected `train` or `test`)")),
        }
    }
}

/// The (epoch-or-final, split) pair naming one evaluation run.
///
/// Constructed once per invocation; immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalSelector {
    /// Specific epoch to evaluate; `None` selects the final weights.
    pub epoch: Option<u32>,

    /// Dataset split the evaluation ran on.
    pub split: Split,
}

impl EvalSelector {
    /// Selector for a specific epoch.
    #[must_use]
    pub fn epoch(epoch: u32, split: Split) -> Self {
        Self {
            epoch: Some(epoch),
            split,
        }
    }

    /// Selector for the final weights.
    #[must_use]
    pub fn final_epoch(split: Split) -> Self {
        Self { epoch: None, split }
    }

    /// Directory key of the epoch-keyed layout: `epoch_NNNN` or `final`.
    #[must_use]
    pub fn epoch_key(&self) -> String {
        match self.epoch {
            Some(epoch) => format!("epoch_{epoch:04}"),
            None => "final".to_string(),
        }
    }
}

impl std::fmt::Display for EvalSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.epoch_key(), self.split)
    }
}

/// The named per-sample output subfolders an evaluation run can produce.
///
/// `fake_*` are generated translations, `real_*` ground truth, `reco_*`
/// cycle reconstructions; A and B are the two image domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    FakeA,
    FakeB,
    RealA,
    RealB,
    RecoA,
    RecoB,
}

impl OutputKind {
    /// Every known kind, in fixed order.
    pub const ALL: [Self; 6] = [
        Self::FakeA,
        Self::FakeB,
        Self::RealA,
        Self::RealB,
        Self::RecoA,
        Self::RecoB,
    ];

    /// Subfolder name of this kind inside a container directory.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::FakeA => "fake_a",
            Self::FakeB => "fake_b",
            Self::RealA => "real_a",
            Self::RealB => "real_b",
            Self::RecoA => "reco_a",
            Self::RecoB => "reco_b",
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A resolved array container directory and the output kinds present in it.
///
/// Resolution is deterministic for identical on-disk state; see [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    /// The selected container directory (`ndarrays_eval*`).
    pub dir: PathBuf,

    /// Output kinds whose subfolder exists, in [`OutputKind::ALL`] order.
    pub kinds: Vec<OutputKind>,
}

impl ArtifactSet {
    /// `true` when the given kind's subfolder is present.
    #[must_use]
    pub fn has(&self, kind: OutputKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Path of the given kind's subfolder, if present.
    #[must_use]
    pub fn kind_dir(&self, kind: OutputKind) -> Option<PathBuf> {
        self.has(kind).then(|| self.dir.join(kind.dir_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_round_trip() {
        assert_eq!("train".parse::<Split>().unwrap(), Split::Train);
        assert_eq!("test".parse::<Split>().unwrap(), Split::Test);
        assert!("validation".parse::<Split>().is_err());
        assert_eq!(Split::Test.to_string(), "test");
    }

    #[test]
    fn test_epoch_key() {
        assert_eq!(EvalSelector::final_epoch(Split::Test).epoch_key(), "final");
        assert_eq!(EvalSelector::epoch(7, Split::Test).epoch_key(), "epoch_0007");
        assert_eq!(
            EvalSelector::epoch(12345, Split::Train).epoch_key(),
            "epoch_12345"
        );
    }

    #[test]
    fn test_kind_dir() {
        let set = ArtifactSet {
            dir: PathBuf::from("/tmp/ndarrays_eval-test"),
            kinds: vec![OutputKind::FakeB, OutputKind::RealB],
        };
        assert!(set.has(OutputKind::FakeB));
        assert!(!set.has(OutputKind::RecoA));
        assert_eq!(
            set.kind_dir(OutputKind::RealB).unwrap(),
            PathBuf::from("/tmp/ndarrays_eval-test/real_b")
        );
        assert_eq!(set.kind_dir(OutputKind::RecoA), None);
    }
}
