//! Usage resolver: decides which assets are mentioned by name in the reference corpus.
//!
//! An asset is *used* when its base file name (last path segment, extension
//! included) occurs as a contiguous, case-sensitive substring of the decoded
//! text of at least one reference file. Matching is not path-aware and not
//! word-bounded: `foo.png` matches inside `myfoo.png2`.
//!
//! Reference text is decoded best-effort: invalid UTF-8 sequences are dropped,
//! never fatal. Files that cannot be read at all contribute no matches and are
//! reported once through [`ReferenceCorpus::unreadable`].

#![allow(missing_docs)]

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel as channel;
use memchr::memmem::Finder;
use parking_lot::{Mutex, RwLock};

use crate::scanner::walker::WalkedFile;

/// Decode `bytes` as UTF-8, dropping every invalid sequence.
///
/// Lossy but never failing: valid input is borrowed unchanged; otherwise the
/// valid runs are concatenated in order. Nothing is substituted for the
/// dropped bytes, so text split only by garbage reads as if it were joined.
pub fn decode_best_effort(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let mut text = String::with_capacity(bytes.len());
            for chunk in bytes.utf8_chunks() {
                text.push_str(chunk.valid());
            }
            Cow::Owned(text)
        }
    }
}

fn decode_owned(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => decode_best_effort(err.as_bytes()).into_owned(),
    }
}

/// A reference file that could not be opened or read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableReference {
    pub path: PathBuf,
    pub error: String,
}

/// The enumerated reference files plus optional decoded-text cache.
///
/// Without the cache every lookup re-reads the file from disk, so edits made
/// during a run are observed. With it, each file is read at most once.
pub struct ReferenceCorpus {
    files: Vec<WalkedFile>,
    cache: Option<RwLock<HashMap<usize, Option<Arc<str>>>>>,
    unreadable: Mutex<BTreeMap<usize, String>>,
}

impl ReferenceCorpus {
    pub fn new(files: Vec<WalkedFile>, cache_contents: bool) -> Self {
        Self {
            files,
            cache: cache_contents.then(|| RwLock::new(HashMap::new())),
            unreadable: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Whether `name` occurs in any reference file. Stops at the first hit.
    pub fn mentions(&self, name: &str) -> bool {
        let finder = Finder::new(name.as_bytes());
        (0..self.files.len()).any(|idx| self.file_contains(idx, &finder))
    }

    /// Reference files that failed to load so far, in corpus order.
    pub fn unreadable(&self) -> Vec<UnreadableReference> {
        self.unreadable
            .lock()
            .iter()
            .map(|(idx, error)| UnreadableReference {
                path: self.files[*idx].path.clone(),
                error: error.clone(),
            })
            .collect()
    }

    fn file_contains(&self, idx: usize, finder: &Finder<'_>) -> bool {
        let Some(cache) = &self.cache else {
            return self
                .load(idx)
                .is_some_and(|text| finder.find(text.as_bytes()).is_some());
        };

        if let Some(entry) = cache.read().get(&idx) {
            return entry
                .as_deref()
                .is_some_and(|text| finder.find(text.as_bytes()).is_some());
        }

        let loaded: Option<Arc<str>> = self.load(idx).map(Arc::from);
        let hit = loaded
            .as_deref()
            .is_some_and(|text| finder.find(text.as_bytes()).is_some());
        cache.write().entry(idx).or_insert(loaded);
        hit
    }

    fn load(&self, idx: usize) -> Option<String> {
        match fs::read(&self.files[idx].location) {
            Ok(bytes) => Some(decode_owned(bytes)),
            Err(err) => {
                self.unreadable
                    .lock()
                    .entry(idx)
                    .or_insert_with(|| err.to_string());
                None
            }
        }
    }
}

/// Used/unused split for one asset collection.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Assets mentioned at least once, in input order.
    pub used: Vec<WalkedFile>,
    /// Assets mentioned nowhere, in input order.
    pub unused: Vec<WalkedFile>,
}

/// Classifies assets against a shared, read-only reference corpus.
pub struct UsageResolver<'a> {
    corpus: &'a ReferenceCorpus,
    parallelism: usize,
}

impl<'a> UsageResolver<'a> {
    pub fn new(corpus: &'a ReferenceCorpus, parallelism: usize) -> Self {
        Self {
            corpus,
            parallelism: parallelism.max(1),
        }
    }

    /// Whether the asset's base file name appears in any reference file.
    pub fn is_used(&self, asset: &WalkedFile) -> bool {
        asset
            .base_name()
            .is_some_and(|name| self.corpus.mentions(name))
    }

    /// Split `assets` into used and unused, preserving input order in both.
    pub fn resolve(&self, assets: Vec<WalkedFile>) -> Resolution {
        let flags = if self.parallelism > 1 && assets.len() > 1 {
            self.classify_parallel(&assets)
        } else {
            assets.iter().map(|asset| self.is_used(asset)).collect()
        };

        let mut resolution = Resolution::default();
        for (asset, used) in assets.into_iter().zip(flags) {
            if used {
                resolution.used.push(asset);
            } else {
                resolution.unused.push(asset);
            }
        }
        resolution
    }

    /// Fan per-asset lookups out over scoped workers fed from a shared queue.
    fn classify_parallel(&self, assets: &[WalkedFile]) -> Vec<bool> {
        let workers = self.parallelism.min(assets.len());
        let (work_tx, work_rx) = channel::unbounded::<usize>();
        let (result_tx, result_rx) = channel::unbounded::<(usize, bool)>();

        for idx in 0..assets.len() {
            let _ = work_tx.send(idx);
        }
        drop(work_tx);

        thread::scope(|scope| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok(idx) = work_rx.recv() {
                        let _ = result_tx.send((idx, self.is_used(&assets[idx])));
                    }
                });
            }
        });
        drop(result_tx);

        let mut flags = vec![false; assets.len()];
        for (idx, used) in result_rx.iter() {
            flags[idx] = used;
        }
        flags
    }
}
