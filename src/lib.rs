#![forbid(unsafe_code)]

//! Asset Sweeper: deletes image and audio assets that no project text file
//! mentions by name.
//!
//! One linear pass:
//! 1. **Enumerate** image assets, audio assets and the reference corpus
//!    (`.js .json .txt .html .css` files under the project root)
//! 2. **Resolve** each asset: used iff its file name occurs verbatim in the
//!    decoded text of some reference file
//! 3. **Delete** every unused asset, images first, each category in path order
//!
//! # Library usage
//!
//! ```rust,no_run
//! use asset_sweeper::prelude::*;
//!
//! let config = Config::load(None)?;
//! let mut logger = ActivityLogger::disabled();
//! let report = Sweeper::new(&config).run(&mut logger)?;
//! for record in &report.deletion.records {
//!     println!("{record}");
//! }
//! # Ok::<(), SweepError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod scanner;
pub mod sweep;
