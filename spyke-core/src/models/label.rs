use std::fmt;

use serde::{Deserialize, Serialize};

/// Curation verdict for a unit or a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// No refractory violations; trusted as-is.
    Clean,
    /// Too few spikes or an unresolvable distribution; left untouched.
    Raw,
    /// Discarded, optionally deleted from the sorting.
    Noise,
    /// Multi-unit activity, decomposable into sub-clusters.
    Mua,
    /// One dominant cluster with a low-correlation tail.
    Noisy,
    /// One dominant cluster.
    Good,
    /// Spikes without a home, candidates for reassignment.
    Trash,
    /// Sub-cluster produced by an MUA split.
    Child,
}

impl Label {
    pub const ALL: [Label; 8] = [
        Label::Clean,
        Label::Raw,
        Label::Noise,
        Label::Mua,
        Label::Noisy,
        Label::Good,
        Label::Trash,
        Label::Child,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Clean => "clean",
            Label::Raw => "raw",
            Label::Noise => "noise",
            Label::Mua => "mua",
            Label::Noisy => "noisy",
            Label::Good => "good",
            Label::Trash => "trash",
            Label::Child => "child",
        }
    }

    /// Labels the executor never mutates.
    pub fn is_terminal(self) -> bool {
        matches!(self, Label::Clean | Label::Raw)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
