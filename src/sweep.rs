//! The sweep pipeline: enumerate → resolve → delete.
//!
//! Stages run strictly in sequence. Image assets, audio assets and the
//! reference corpus are all enumerated before any resolution starts, and every
//! asset is classified before the first deletion. Nothing in here is fatal:
//! unreadable directories, unreadable reference files and failed removals all
//! end up as entries in the returned report.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::scanner::category::AssetCategory;
use crate::scanner::deletion::{DeletionExecutor, DeletionPlan, DeletionRecord, DeletionReport};
use crate::scanner::resolver::{ReferenceCorpus, UnreadableReference, UsageResolver};
use crate::scanner::walker::{
    FileWalker, SkippedDirectory, SuffixMatch, WalkOutcome, WalkedFile, WalkerConfig,
};

/// Resolution result for one asset category.
#[derive(Debug, Clone)]
pub struct CategoryResolution {
    pub category: AssetCategory,
    pub used: Vec<WalkedFile>,
    /// Sorted by display path.
    pub unused: Vec<WalkedFile>,
}

impl CategoryResolution {
    pub fn found(&self) -> usize {
        self.used.len() + self.unused.len()
    }
}

/// Everything known after enumeration and resolution, before any deletion.
#[derive(Debug, Clone, Default)]
pub struct SweepPlan {
    /// One entry per category, in reporting order.
    pub categories: Vec<CategoryResolution>,
    pub references_scanned: usize,
    pub skipped_directories: Vec<SkippedDirectory>,
    pub unreadable_references: Vec<UnreadableReference>,
}

impl SweepPlan {
    pub fn assets_found(&self) -> usize {
        self.categories.iter().map(CategoryResolution::found).sum()
    }

    pub fn unused(&self, category: AssetCategory) -> &[WalkedFile] {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.unused.as_slice())
            .unwrap_or_default()
    }

    pub fn deletion_plan(&self) -> DeletionPlan {
        DeletionPlan::new(
            self.categories
                .iter()
                .map(|c| (c.category, c.unused.clone()))
                .collect(),
        )
    }
}

/// Outcome of a full sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub plan: SweepPlan,
    pub deletion: DeletionReport,
    pub duration: Duration,
}

/// Runs the pipeline against one immutable configuration.
pub struct Sweeper<'c> {
    config: &'c Config,
}

impl<'c> Sweeper<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Walk one category's roots for files with that category's extensions.
    pub fn enumerate_assets(&self, category: AssetCategory) -> WalkOutcome {
        FileWalker::new(WalkerConfig {
            base: self.config.paths.project_root.clone(),
            root_paths: category.roots(self.config).to_vec(),
            extensions: category.extensions(self.config).to_vec(),
            suffix_match: SuffixMatch::CaseInsensitive,
        })
        .walk()
    }

    /// Walk the reference roots for text-like files.
    pub fn enumerate_references(&self) -> WalkOutcome {
        FileWalker::new(WalkerConfig {
            base: self.config.paths.project_root.clone(),
            root_paths: self.config.references.reference_roots.clone(),
            extensions: self.config.references.reference_extensions.clone(),
            suffix_match: SuffixMatch::CaseSensitive,
        })
        .walk()
    }

    /// Enumerate and classify; nothing is deleted.
    pub fn plan(&self) -> SweepPlan {
        let mut skipped = Vec::new();

        let asset_sets: Vec<(AssetCategory, Vec<WalkedFile>)> = AssetCategory::ALL
            .into_iter()
            .map(|category| {
                let outcome = self.enumerate_assets(category);
                skipped.extend(outcome.skipped);
                (category, outcome.files)
            })
            .collect();

        let references = self.enumerate_references();
        skipped.extend(references.skipped);

        let corpus = ReferenceCorpus::new(references.files, self.config.resolver.cache_contents);
        let resolver = UsageResolver::new(&corpus, self.config.resolver.parallelism);

        let categories = asset_sets
            .into_iter()
            .map(|(category, files)| {
                let resolution = resolver.resolve(files);
                CategoryResolution {
                    category,
                    used: resolution.used,
                    unused: resolution.unused,
                }
            })
            .collect();

        SweepPlan {
            categories,
            references_scanned: corpus.len(),
            skipped_directories: skipped,
            unreadable_references: corpus.unreadable(),
        }
    }

    /// Plan, then delete every unused asset.
    pub fn run(&self, logger: &mut ActivityLogger) -> Result<SweepReport> {
        self.run_with(logger, |_| {})
    }

    /// Like [`run`](Self::run), calling `observer` after each removal attempt.
    pub fn run_with<F>(&self, logger: &mut ActivityLogger, observer: F) -> Result<SweepReport>
    where
        F: FnMut(&DeletionRecord),
    {
        let start = Instant::now();
        logger.log(&ActivityEvent::SweepStarted {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_hash: self.config.stable_hash(),
            project_root: self.config.paths.project_root.display().to_string(),
        });

        let plan = self.plan();
        for skipped in &plan.skipped_directories {
            logger.log(&ActivityEvent::DirectorySkipped {
                path: skipped.path.display().to_string(),
                error_message: skipped.error.clone(),
            });
        }
        for unreadable in &plan.unreadable_references {
            logger.log(&ActivityEvent::ReferenceUnreadable {
                path: unreadable.path.display().to_string(),
                error_message: unreadable.error.clone(),
            });
        }

        let deletion =
            DeletionExecutor::new(logger).execute_with(&plan.deletion_plan(), observer);

        let duration = start.elapsed();
        logger.log(&ActivityEvent::SweepCompleted {
            references_scanned: plan.references_scanned,
            assets_found: plan.assets_found(),
            assets_deleted: deletion.items_deleted,
            assets_failed: deletion.items_failed,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        });
        logger.flush();

        Ok(SweepReport {
            plan,
            deletion,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config_for(root: &Path) -> Config {
        let mut cfg = Config::default();
        cfg.paths.project_root = root.to_path_buf();
        cfg
    }

    fn paths(files: &[WalkedFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn referenced_asset_survives_unreferenced_is_deleted() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "img/a.png", b"png");
        write(tmp.path(), "img/b.png", b"png");
        write(tmp.path(), "data.json", br#"{"face": "a.png"}"#);

        let cfg = config_for(tmp.path());
        let mut logger = ActivityLogger::disabled();
        let report = Sweeper::new(&cfg).run(&mut logger).unwrap();

        assert!(tmp.path().join("img/a.png").exists());
        assert!(!tmp.path().join("img/b.png").exists());
        let lines: Vec<String> = report.deletion.records.iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["Removed unused image: img/b.png"]);
        assert_eq!(report.plan.references_scanned, 1);
    }

    #[test]
    fn categories_share_corpus_but_not_assets() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "img/click.png", b"png");
        write(tmp.path(), "audio/se/click.wav", b"wav");
        write(tmp.path(), "audio/bgm/theme.ogg", b"ogg");
        write(tmp.path(), "js/plugins/sound.js", b"AudioManager.playSe('click.wav');");

        let cfg = config_for(tmp.path());
        let plan = Sweeper::new(&cfg).plan();

        assert_eq!(paths(plan.unused(AssetCategory::Image)), ["img/click.png"]);
        assert_eq!(paths(plan.unused(AssetCategory::Audio)), ["audio/bgm/theme.ogg"]);
        assert_eq!(plan.assets_found(), 3);
    }

    #[test]
    fn absent_audio_roots_are_fine() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "img/a.png", b"png");
        write(tmp.path(), "index.html", b"<img src=\"img/a.png\">");

        let cfg = config_for(tmp.path());
        let plan = Sweeper::new(&cfg).plan();

        assert!(plan.unused(AssetCategory::Audio).is_empty());
        assert!(plan.unused(AssetCategory::Image).is_empty());
        assert!(plan.skipped_directories.is_empty());
    }

    #[test]
    fn second_run_deletes_nothing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "img/keep.jpg", b"jpg");
        write(tmp.path(), "img/drop.jpg", b"jpg");
        write(tmp.path(), "audio/me/fanfare.m4a", b"m4a");
        write(tmp.path(), "notes.txt", b"keep.jpg");

        let cfg = config_for(tmp.path());
        let mut logger = ActivityLogger::disabled();
        let first = Sweeper::new(&cfg).run(&mut logger).unwrap();
        assert_eq!(first.deletion.items_deleted, 2);

        let second = Sweeper::new(&cfg).run(&mut logger).unwrap();
        assert!(second.deletion.records.is_empty());
        assert!(tmp.path().join("img/keep.jpg").exists());
    }

    #[test]
    fn parallel_and_cached_runs_classify_identically() {
        let tmp = TempDir::new().unwrap();
        for i in 0..12 {
            write(tmp.path(), &format!("img/tile{i:02}.png"), b"png");
        }
        write(tmp.path(), "data/Map001.json", br#"["tile03.png", "tile07.png"]"#);
        write(tmp.path(), "css/site.css", b"background: url(tile11.png);");

        let base = config_for(tmp.path());
        let mut tuned = base.clone();
        tuned.resolver.parallelism = 4;
        tuned.resolver.cache_contents = true;

        let a = Sweeper::new(&base).plan();
        let b = Sweeper::new(&tuned).plan();
        assert_eq!(
            paths(a.unused(AssetCategory::Image)),
            paths(b.unused(AssetCategory::Image))
        );
        assert_eq!(a.unused(AssetCategory::Image).len(), 9);
    }

    #[test]
    fn run_writes_activity_log() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "img/b.png", b"png");
        let log_path = tmp.path().join("logs/activity.jsonl");

        let cfg = config_for(tmp.path());
        let mut logger =
            ActivityLogger::to_jsonl(crate::logger::jsonl::JsonlConfig::at(PathBuf::from(&log_path)));
        Sweeper::new(&cfg).run(&mut logger).unwrap();

        let log = fs::read_to_string(&log_path).unwrap();
        let events: Vec<serde_json::Value> = log
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.first().unwrap()["event"], "sweep_start");
        assert_eq!(events[1]["event"], "asset_delete");
        assert_eq!(events.last().unwrap()["event"], "sweep_complete");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_project_root_still_sweeps() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(OsStr::from_bytes(b"proj\xff"));
        // Some filesystems reject non-UTF-8 names; nothing to check then.
        if fs::create_dir_all(&root).is_err() {
            return;
        }
        write(&root, "img/b.png", b"png");
        let log_path = tmp.path().join("activity.jsonl");

        let cfg = config_for(&root);
        let mut logger =
            ActivityLogger::to_jsonl(crate::logger::jsonl::JsonlConfig::at(&log_path));
        let report = Sweeper::new(&cfg).run(&mut logger).unwrap();

        assert_eq!(report.deletion.items_deleted, 1);
        assert!(!root.join("img/b.png").exists());
        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("\"sweep_start\""));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_skipped_and_logged() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "img/locked/hidden.png", b"png");
        write(tmp.path(), "img/open.png", b"png");
        let locked = tmp.path().join("img/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root reads through mode bits; nothing to observe then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let log_path = tmp.path().join("activity.jsonl");
        let cfg = config_for(tmp.path());
        let mut logger =
            ActivityLogger::to_jsonl(crate::logger::jsonl::JsonlConfig::at(&log_path));
        let report = Sweeper::new(&cfg).run(&mut logger);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let report = report.unwrap();

        assert_eq!(report.plan.skipped_directories.len(), 1);
        assert_eq!(
            report.plan.skipped_directories[0].path,
            PathBuf::from("img/locked")
        );
        let lines: Vec<String> = report.deletion.records.iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["Removed unused image: img/open.png"]);
        assert!(tmp.path().join("img/locked/hidden.png").exists());

        let log = fs::read_to_string(&log_path).unwrap();
        let skip = log
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .find(|v| v["event"] == "directory_skip")
            .unwrap();
        assert_eq!(skip["path"], "img/locked");
        assert_eq!(skip["severity"], "warning");
    }
}
