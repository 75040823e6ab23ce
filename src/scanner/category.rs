//! Asset categories and the configuration slice each one walks.

#![allow(missing_docs)]

use std::fmt;
use std::path::PathBuf;

use crate::core::config::Config;

/// Kind of deletable asset. Categories are enumerated, resolved and reported
/// independently; they only share the reference corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetCategory {
    Image,
    Audio,
}

impl AssetCategory {
    /// Every category, in reporting order.
    pub const ALL: [Self; 2] = [Self::Image, Self::Audio];

    /// Lowercase label used in output lines and log entries.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }

    pub fn roots(self, config: &Config) -> &[PathBuf] {
        match self {
            Self::Image => &config.assets.image_roots,
            Self::Audio => &config.assets.audio_roots,
        }
    }

    pub fn extensions(self, config: &Config) -> &[String] {
        match self {
            Self::Image => &config.assets.image_extensions,
            Self::Audio => &config.assets.audio_extensions,
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
