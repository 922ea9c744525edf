use std::fmt;

use serde::{Deserialize, Serialize};

/// A shank of a probe. Executor mutations are serialized per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub probe: u32,
    pub shank: u32,
}

impl ChannelGroup {
    pub fn new(probe: u32, shank: u32) -> Self {
        Self { probe, shank }
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "probe{}/shank{}", self.probe, self.shank)
    }
}
