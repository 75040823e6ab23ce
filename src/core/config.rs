//! Configuration system: optional TOML file + env var overrides + built-in defaults.
//!
//! The defaults reproduce the stock project layout (`img/` for images,
//! `audio/{bgm,bgs,me,se}` for audio, the whole tree as reference corpus), so
//! running without any file or environment yields the classic behavior.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SweepError};

/// File name probed in the working directory when no explicit config is given.
pub const DEFAULT_CONFIG_FILE: &str = "sweeper.toml";

/// Text-like formats scanned for asset mentions. Not user-configurable.
pub const REFERENCE_EXTENSIONS: [&str; 5] = [".js", ".json", ".txt", ".html", ".css"];

/// Full sweeper configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub assets: AssetsConfig,
    pub references: ReferencesConfig,
    pub resolver: ResolverConfig,
    pub paths: PathsConfig,
}

/// Where deletable assets live and which suffixes qualify, per category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssetsConfig {
    pub image_roots: Vec<PathBuf>,
    /// Matched against the lowercased file name.
    pub image_extensions: Vec<String>,
    pub audio_roots: Vec<PathBuf>,
    /// Matched against the lowercased file name.
    pub audio_extensions: Vec<String>,
}

/// The reference corpus: text files searched for asset file names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReferencesConfig {
    pub reference_roots: Vec<PathBuf>,
    /// Case-sensitive suffixes. Fixed to [`REFERENCE_EXTENSIONS`] when loaded
    /// from file or environment.
    #[serde(skip, default = "default_reference_extensions")]
    pub reference_extensions: Vec<String>,
}

/// Usage-resolution tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Worker threads used to resolve assets. `1` keeps resolution on the
    /// calling thread.
    pub parallelism: usize,
    /// Keep each reference file's decoded text for the rest of the run instead
    /// of re-reading it for every asset.
    pub cache_contents: bool,
}

/// Filesystem locations used by the sweeper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory every asset and reference root is resolved against.
    pub project_root: PathBuf,
    /// Config file the effective configuration was loaded from.
    pub config_file: PathBuf,
    /// JSONL activity log; `None` disables it.
    pub jsonl_log: Option<PathBuf>,
}

fn default_reference_extensions() -> Vec<String> {
    REFERENCE_EXTENSIONS.iter().map(ToString::to_string).collect()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            image_roots: vec![PathBuf::from("img")],
            image_extensions: owned(&[".png", ".jpg", ".jpeg", ".gif", ".webp"]),
            audio_roots: ["audio/bgm", "audio/bgs", "audio/me", "audio/se"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            audio_extensions: owned(&[".ogg", ".mp3", ".wav", ".m4a"]),
        }
    }
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            reference_roots: vec![PathBuf::from(".")],
            reference_extensions: default_reference_extensions(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            parallelism: 1,
            cache_contents: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            jsonl_log: None,
        }
    }
}

impl Config {
    /// Default configuration path (relative to the working directory).
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SweepError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Self::from_toml_str(&raw)?
        } else if is_explicit_path {
            return Err(SweepError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document on top of the defaults. Does not touch the
    /// environment and does not validate.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let parsed: Self = toml::from_str(raw)?;
        Ok(parsed)
    }

    /// Deterministic digest of the settings that decide which assets get
    /// deleted, recorded in the activity log.
    ///
    /// FNV-1a over the project root plus every root and extension list,
    /// reference extensions included. Resolver tuning and log location do not
    /// change the outcome of a sweep and are left out. Paths are hashed as raw
    /// OS bytes, so any project root can be hashed.
    pub fn stable_hash(&self) -> String {
        let mut hash = Fnv1a::new();
        hash.field(self.paths.project_root.as_os_str().as_encoded_bytes());
        for roots in [
            &self.assets.image_roots,
            &self.assets.audio_roots,
            &self.references.reference_roots,
        ] {
            hash.list(roots.iter().map(|p| p.as_os_str().as_encoded_bytes()));
        }
        for exts in [
            &self.assets.image_extensions,
            &self.assets.audio_extensions,
            &self.references.reference_extensions,
        ] {
            hash.list(exts.iter().map(String::as_bytes));
        }
        format!("{:016x}", hash.finish())
    }

    /// Apply `SWEEPER_*` overrides read through `lookup`.
    pub fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SWEEPER_PROJECT_ROOT") {
            self.paths.project_root = PathBuf::from(raw);
        }

        if let Some(raw) = lookup("SWEEPER_JSONL_LOG") {
            self.paths.jsonl_log = Some(PathBuf::from(raw));
        }

        if let Some(raw) = lookup("SWEEPER_RESOLVER_PARALLELISM") {
            self.resolver.parallelism = parse_env_usize("SWEEPER_RESOLVER_PARALLELISM", &raw)?;
        }

        if let Some(raw) = lookup("SWEEPER_RESOLVER_CACHE_CONTENTS") {
            self.resolver.cache_contents =
                parse_env_bool("SWEEPER_RESOLVER_CACHE_CONTENTS", &raw)?;
        }

        Ok(())
    }

    /// Lowercase asset extensions and ensure every extension carries its dot.
    pub fn normalize(&mut self) {
        for ext in self
            .assets
            .image_extensions
            .iter_mut()
            .chain(self.assets.audio_extensions.iter_mut())
        {
            *ext = dotted(&ext.trim().to_lowercase());
        }
        for ext in &mut self.references.reference_extensions {
            *ext = dotted(ext.trim());
        }
        if self
            .paths
            .jsonl_log
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.paths.jsonl_log = None;
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.resolver.parallelism == 0 {
            return Err(SweepError::InvalidConfig {
                details: "resolver.parallelism must be >= 1".to_string(),
            });
        }

        if self.references.reference_extensions.is_empty() {
            return Err(SweepError::InvalidConfig {
                details: "references.reference_extensions must not be empty".to_string(),
            });
        }

        for (name, list) in [
            ("assets.image_extensions", &self.assets.image_extensions),
            ("assets.audio_extensions", &self.assets.audio_extensions),
            (
                "references.reference_extensions",
                &self.references.reference_extensions,
            ),
        ] {
            if let Some(bad) = list.iter().find(|ext| ext.trim_start_matches('.').is_empty()) {
                return Err(SweepError::InvalidConfig {
                    details: format!("{name} contains an empty extension: {bad:?}"),
                });
            }
        }

        if self.paths.project_root.as_os_str().is_empty() {
            return Err(SweepError::InvalidConfig {
                details: "paths.project_root must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Length-prefixed FNV-1a, so `["ab", "c"]` and `["a", "bc"]` differ.
struct Fnv1a(u64);

impl Fnv1a {
    const fn new() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn field(&mut self, bytes: &[u8]) {
        self.bytes(&(bytes.len() as u64).to_le_bytes());
        self.bytes(bytes);
    }

    fn list<'a>(&mut self, items: impl ExactSizeIterator<Item = &'a [u8]>) {
        self.bytes(&(items.len() as u64).to_le_bytes());
        for item in items {
            self.field(item);
        }
    }

    const fn finish(&self) -> u64 {
        self.0
    }
}

fn dotted(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|error| SweepError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SweepError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: expected a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, REFERENCE_EXTENSIONS, SweepError};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn defaults_match_stock_layout() {
        let cfg = Config::default();
        assert_eq!(cfg.assets.image_roots, vec![PathBuf::from("img")]);
        assert_eq!(
            cfg.assets.audio_roots,
            vec![
                PathBuf::from("audio/bgm"),
                PathBuf::from("audio/bgs"),
                PathBuf::from("audio/me"),
                PathBuf::from("audio/se"),
            ]
        );
        assert_eq!(
            cfg.assets.image_extensions,
            [".png", ".jpg", ".jpeg", ".gif", ".webp"]
        );
        assert_eq!(cfg.assets.audio_extensions, [".ogg", ".mp3", ".wav", ".m4a"]);
        assert_eq!(cfg.references.reference_roots, vec![PathBuf::from(".")]);
        assert_eq!(cfg.references.reference_extensions, REFERENCE_EXTENSIONS);
        assert_eq!(cfg.resolver.parallelism, 1);
        assert!(cfg.paths.jsonl_log.is_none());
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let cfg = Config::from_toml_str(
            r#"
            [assets]
            image_roots = ["sprites", "ui"]

            [resolver]
            parallelism = 4
            "#,
        )
        .expect("parse");
        assert_eq!(
            cfg.assets.image_roots,
            vec![PathBuf::from("sprites"), PathBuf::from("ui")]
        );
        assert_eq!(cfg.resolver.parallelism, 4);
        assert_eq!(cfg.assets.audio_roots.len(), 4);
        assert_eq!(cfg.references.reference_extensions, REFERENCE_EXTENSIONS);
    }

    #[test]
    fn reference_extensions_cannot_be_set_from_file() {
        let cfg = Config::from_toml_str(
            r#"
            [references]
            reference_extensions = [".md"]
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.references.reference_extensions, REFERENCE_EXTENSIONS);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("[assets\nimage_roots = 3").expect_err("should fail");
        assert_eq!(err.code(), "SWP-1003");
    }

    #[test]
    fn env_overrides_apply() {
        let env = vars(&[
            ("SWEEPER_PROJECT_ROOT", "/srv/game"),
            ("SWEEPER_JSONL_LOG", "/tmp/sweep.jsonl"),
            ("SWEEPER_RESOLVER_PARALLELISM", "8"),
            ("SWEEPER_RESOLVER_CACHE_CONTENTS", "yes"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
            .expect("apply");
        assert_eq!(cfg.paths.project_root, PathBuf::from("/srv/game"));
        assert_eq!(cfg.paths.jsonl_log, Some(PathBuf::from("/tmp/sweep.jsonl")));
        assert_eq!(cfg.resolver.parallelism, 8);
        assert!(cfg.resolver.cache_contents);
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let env = vars(&[("SWEEPER_RESOLVER_CACHE_CONTENTS", "maybe")]);
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_overrides_from(|name| env.get(name).cloned())
            .expect_err("expected parse error");
        assert_eq!(err.code(), "SWP-1003");
        assert!(err.to_string().contains("SWEEPER_RESOLVER_CACHE_CONTENTS"));
    }

    #[test]
    fn zero_parallelism_rejected() {
        let mut cfg = Config::default();
        cfg.resolver.parallelism = 0;
        let err = cfg.validate().expect_err("expected validation error");
        match err {
            SweepError::InvalidConfig { details } => assert!(details.contains("parallelism")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_extension_rejected() {
        let mut cfg = Config::default();
        cfg.assets.audio_extensions.push(".".to_string());
        let err = cfg.validate().expect_err("expected validation error");
        assert!(err.to_string().contains("assets.audio_extensions"));
    }

    #[test]
    fn normalize_lowercases_and_dots_asset_extensions() {
        let mut cfg = Config::default();
        cfg.assets.image_extensions = vec!["PNG".to_string(), " .Tga ".to_string()];
        cfg.paths.jsonl_log = Some(PathBuf::new());
        cfg.normalize();
        assert_eq!(cfg.assets.image_extensions, [".png", ".tga"]);
        assert!(cfg.paths.jsonl_log.is_none());
    }

    #[test]
    fn stable_hash_tracks_classification_inputs_only() {
        let base = Config::default().stable_hash();
        assert_eq!(base, Config::default().stable_hash());

        let mut refs = Config::default();
        refs.references.reference_extensions.pop();
        assert_ne!(base, refs.stable_hash());

        let mut roots = Config::default();
        roots.assets.audio_roots.clear();
        assert_ne!(base, roots.stable_hash());

        let mut tuned = Config::default();
        tuned.resolver.parallelism = 8;
        tuned.resolver.cache_contents = true;
        tuned.paths.jsonl_log = Some(PathBuf::from("sweeper.jsonl"));
        assert_eq!(base, tuned.stable_hash());
    }

    #[test]
    fn stable_hash_separates_list_items() {
        let mut a = Config::default();
        a.assets.image_extensions = vec![".ab".to_string(), ".c".to_string()];
        let mut b = Config::default();
        b.assets.image_extensions = vec![".a".to_string(), "b.c".to_string()];
        assert_ne!(a.stable_hash(), b.stable_hash());
    }

    #[cfg(unix)]
    #[test]
    fn stable_hash_accepts_non_utf8_project_root() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut cfg = Config::default();
        cfg.paths.project_root = PathBuf::from(OsStr::from_bytes(b"proj\xff"));
        assert_eq!(cfg.stable_hash().len(), 16);
        assert_ne!(cfg.stable_hash(), Config::default().stable_hash());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).expect_err("should fail");
        assert_eq!(err.code(), "SWP-1002");
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sweeper.toml");
        std::fs::write(&path, "[assets]\naudio_roots = []\n").expect("write");
        let cfg = Config::load(Some(&path)).expect("load");
        assert!(cfg.assets.audio_roots.is_empty());
        assert_eq!(cfg.paths.config_file, path);
    }
}
