use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, SystemTime};

const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Modified(PathBuf),
    Removed(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FsDelta {
    Deleted { path: PathBuf },
    Renamed { from: PathBuf, to: PathBuf },
    Modified { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileFingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

/// Watches a directory tree and reports changes to the documents currently open.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    raw_event_rx: mpsc::Receiver<notify::Event>,
    root: PathBuf,
    open_file_keys: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
    fingerprints: FxHashMap<PathBuf, FileFingerprint>,
}

impl FileWatcher {
    pub fn new(root: &Path) -> Result<Self, notify::Error> {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let _ = tx.send(event);
            },
            Config::default().with_poll_interval(WATCHER_POLL_INTERVAL),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        Ok(Self {
            watcher,
            raw_event_rx: rx,
            root,
            open_file_keys: FxHashMap::default(),
            fingerprints: FxHashMap::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sync_open_files<'a, I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut open_file_keys: FxHashMap<PathBuf, FxHashSet<PathBuf>> = FxHashMap::default();
        let mut fingerprints = FxHashMap::default();

        for path in paths {
            let path = path.to_path_buf();
            for key in path_identity_keys(path.as_path(), self.root.as_path()) {
                open_file_keys.entry(key).or_default().insert(path.clone());
            }
            if let Some(existing) = self.fingerprints.get(&path).cloned() {
                fingerprints.insert(path, existing);
            } else if let Some(fingerprint) = file_fingerprint(path.as_path()) {
                fingerprints.insert(path, fingerprint);
            }
        }

        self.open_file_keys = open_file_keys;
        self.fingerprints = fingerprints;
    }

    /// Records our own write so the echo event is not reported as external.
    pub fn acknowledge_write(&mut self, path: &Path) {
        for open_path in self.match_open_paths(path) {
            match file_fingerprint(open_path.as_path()) {
                Some(fingerprint) => {
                    self.fingerprints.insert(open_path, fingerprint);
                }
                None => {
                    self.fingerprints.remove(&open_path);
                }
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<WatchEvent> {
        let mut removed = FxHashSet::default();
        let mut modified = FxHashSet::default();

        while let Ok(event) = self.raw_event_rx.try_recv() {
            for delta in normalize_notify_event(event) {
                self.route_delta(delta, &mut removed, &mut modified);
            }
        }

        let mut removed = removed.into_iter().collect::<Vec<_>>();
        removed.sort_unstable();
        let mut modified = modified
            .into_iter()
            .filter(|p| !removed.contains(p))
            .collect::<Vec<_>>();
        modified.sort_unstable();

        removed
            .into_iter()
            .map(WatchEvent::Removed)
            .chain(modified.into_iter().map(WatchEvent::Modified))
            .collect()
    }

    fn route_delta(
        &mut self,
        delta: FsDelta,
        removed: &mut FxHashSet<PathBuf>,
        modified: &mut FxHashSet<PathBuf>,
    ) {
        match delta {
            FsDelta::Modified { path } => {
                for open_path in self.match_open_paths(path.as_path()) {
                    if self.refresh_fingerprint(open_path.as_path()) {
                        if open_path.exists() {
                            removed.remove(&open_path);
                            modified.insert(open_path);
                        } else {
                            removed.insert(open_path);
                        }
                    }
                }
            }
            FsDelta::Deleted { path } => {
                for open_path in self.match_open_paths(path.as_path()) {
                    self.fingerprints.remove(&open_path);
                    removed.insert(open_path);
                }
            }
            FsDelta::Renamed { from, to } => {
                for open_path in self.match_open_paths(from.as_path()) {
                    self.fingerprints.remove(&open_path);
                    removed.insert(open_path);
                }
                for open_path in self.match_open_paths(to.as_path()) {
                    let _ = self.refresh_fingerprint(open_path.as_path());
                    removed.remove(&open_path);
                    modified.insert(open_path);
                }
            }
        }
    }

    fn refresh_fingerprint(&mut self, path: &Path) -> bool {
        match file_fingerprint(path) {
            Some(fingerprint) => self
                .fingerprints
                .insert(path.to_path_buf(), fingerprint.clone())
                .map_or(true, |previous| previous != fingerprint),
            None => self.fingerprints.remove(path).is_some(),
        }
    }

    fn match_open_paths(&self, path: &Path) -> FxHashSet<PathBuf> {
        let _watcher_guard = &self.watcher;
        let mut matched = FxHashSet::default();
        for key in path_identity_keys(path, self.root.as_path()) {
            if let Some(paths) = self.open_file_keys.get(&key) {
                matched.extend(paths.iter().cloned());
            }
        }
        matched
    }
}

fn raw_absolute_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn path_identity_keys(path: &Path, root: &Path) -> Vec<PathBuf> {
    let raw = raw_absolute_path(path, root);
    let mut keys = vec![raw.clone()];
    if let Ok(canonical) = raw.canonicalize() {
        if canonical != raw {
            keys.push(canonical);
        }
    }
    keys
}

fn file_fingerprint(path: &Path) -> Option<FileFingerprint> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    Some(FileFingerprint {
        len: metadata.len(),
        modified: metadata.modified().ok(),
    })
}

fn normalize_notify_event(event: notify::Event) -> Vec<FsDelta> {
    match event.kind {
        EventKind::Create(_) => event
            .paths
            .into_iter()
            .map(|path| FsDelta::Modified { path })
            .collect(),
        EventKind::Remove(_) => event
            .paths
            .into_iter()
            .map(|path| FsDelta::Deleted { path })
            .collect(),
        EventKind::Modify(kind) => normalize_modify_event(kind, event.paths),
        _ => Vec::new(),
    }
}

fn normalize_modify_event(kind: ModifyKind, paths: Vec<PathBuf>) -> Vec<FsDelta> {
    match kind {
        ModifyKind::Name(RenameMode::Both) if paths.len() >= 2 => vec![FsDelta::Renamed {
            from: paths[0].clone(),
            to: paths[1].clone(),
        }],
        ModifyKind::Name(RenameMode::From) => paths
            .into_iter()
            .map(|path| FsDelta::Deleted { path })
            .collect(),
        _ => paths
            .into_iter()
            .map(|path| FsDelta::Modified { path })
            .collect(),
    }
}
