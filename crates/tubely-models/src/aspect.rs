//! Aspect-ratio classification labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry class of a video, used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    /// Anything else
    Other,
}

impl AspectClass {
    /// Classify integer dimensions.
    ///
    /// Comparison is exact after truncating integer division: `1920x1080` is
    /// landscape, `854x480` is `Other`.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let (w, h) = (u64::from(width), u64::from(height));
        if w == 16 * h / 9 {
            AspectClass::Landscape
        } else if h == 16 * w / 9 {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        }
    }

    /// Storage key prefix for this class.
    pub fn prefix(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}
