//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use asset_sweeper::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SweepError};

// Logger
pub use crate::logger::activity::{ActivityEvent, ActivityLogger};
pub use crate::logger::jsonl::JsonlConfig;

// Scanner
pub use crate::scanner::category::AssetCategory;
pub use crate::scanner::deletion::{DeletionExecutor, DeletionPlan, DeletionRecord, DeletionReport};
pub use crate::scanner::resolver::{ReferenceCorpus, UsageResolver, decode_best_effort};
pub use crate::scanner::walker::{FileWalker, WalkedFile, WalkerConfig};

// Pipeline
pub use crate::sweep::{SweepPlan, SweepReport, Sweeper};
