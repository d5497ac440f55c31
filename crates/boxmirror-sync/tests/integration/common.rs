//! Shared test utilities for sync integration tests
//!
//! Provides an in-memory [`IRemoteStore`] that behaves like a small remote
//! drive: case-insensitive keys, display casing preserved, tombstones for
//! deleted paths, paginated listings, and failure injection.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use boxmirror_core::{
    config::TransferMode,
    domain::{
        entry::Entry,
        newtypes::{RemoteKey, RemotePath},
    },
    ports::remote_store::{IRemoteStore, ListPage},
};
use boxmirror_sync::{
    engine::ReconciliationEngine, filesystem::LocalFileSystemAdapter, path_mapper::PathMapper,
    transfer::TransferScheduler,
};

pub fn rpath(s: &str) -> RemotePath {
    RemotePath::new(s.to_string()).expect("valid remote path")
}

#[derive(Debug, Clone)]
enum Node {
    File { path: RemotePath, data: Vec<u8> },
    Folder { path: RemotePath },
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<RemoteKey, Node>,
    tombstones: BTreeMap<RemoteKey, RemotePath>,
    cursors: HashMap<String, VecDeque<Entry>>,
    next_cursor: usize,
    failing_downloads: HashSet<RemoteKey>,
    fail_metadata: bool,
    fail_listing: bool,
}

/// In-memory remote drive
pub struct MemoryRemoteStore {
    state: Mutex<State>,
    page_size: usize,
    pub list_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub uploads: AtomicUsize,
    pub downloads: AtomicUsize,
    pub folders_created: AtomicUsize,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::with_page_size(500)
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
            list_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            folders_created: AtomicUsize::new(0),
        }
    }

    // --- setup ---

    pub fn add_folder(&self, path: &str) {
        let path = rpath(path);
        let mut state = self.state.lock().unwrap();
        state.tombstones.remove(&path.key());
        state.nodes.insert(path.key(), Node::Folder { path });
    }

    pub fn add_file(&self, path: &str, data: &[u8]) {
        let path = rpath(path);
        let mut state = self.state.lock().unwrap();
        state.tombstones.remove(&path.key());
        state.nodes.insert(
            path.key(),
            Node::File {
                path,
                data: data.to_vec(),
            },
        );
    }

    /// Removes `path` and everything below it, leaving tombstones behind
    pub fn delete(&self, path: &str) {
        let root = rpath(path).key();
        let prefix = format!("{}/", root.as_str());
        let mut state = self.state.lock().unwrap();
        let doomed: Vec<RemoteKey> = state
            .nodes
            .keys()
            .filter(|k| **k == root || k.as_str().starts_with(&prefix))
            .cloned()
            .collect();
        for key in doomed {
            if let Some(node) = state.nodes.remove(&key) {
                let path = match node {
                    Node::File { path, .. } | Node::Folder { path } => path,
                };
                state.tombstones.insert(key, path);
            }
        }
    }

    /// Records a tombstone for a path that never existed in this store
    pub fn add_tombstone(&self, path: &str) {
        let path = rpath(path);
        self.state
            .lock()
            .unwrap()
            .tombstones
            .insert(path.key(), path);
    }

    pub fn fail_download(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_downloads
            .insert(rpath(path).key());
    }

    pub fn set_fail_metadata(&self, fail: bool) {
        self.state.lock().unwrap().fail_metadata = fail;
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    // --- inspection ---

    pub fn file_data(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(&rpath(path).key()) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn has_folder(&self, path: &str) -> bool {
        matches!(
            self.state.lock().unwrap().nodes.get(&rpath(path).key()),
            Some(Node::Folder { .. })
        )
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn entry_for(node: &Node) -> Entry {
        match node {
            Node::File { path, data } => Entry::file(path.clone(), data.len() as u64),
            Node::Folder { path } => Entry::folder(path.clone()),
        }
    }

    fn page_from(&self, state: &mut State, mut remaining: VecDeque<Entry>) -> ListPage {
        let take = remaining.len().min(self.page_size);
        let entries: Vec<Entry> = remaining.drain(..take).collect();
        let has_more = !remaining.is_empty();

        state.next_cursor += 1;
        let cursor = format!("cursor-{}", state.next_cursor);
        if has_more {
            state.cursors.insert(cursor.clone(), remaining);
        }

        ListPage {
            entries,
            cursor,
            has_more,
        }
    }
}

fn under(key: &RemoteKey, root: &RemotePath) -> bool {
    if root.is_root() {
        return true;
    }
    let root_key = root.key();
    *key == root_key || key.as_str().starts_with(&format!("{}/", root_key.as_str()))
}

#[async_trait]
impl IRemoteStore for MemoryRemoteStore {
    async fn list_folder(
        &self,
        path: &RemotePath,
        recursive: bool,
        include_deleted: bool,
    ) -> anyhow::Result<ListPage> {
        assert!(recursive, "engine always lists recursively");
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        if state.fail_listing {
            anyhow::bail!("listing unavailable");
        }

        let mut entries = VecDeque::new();
        if include_deleted {
            for (key, tombstone) in &state.tombstones {
                if under(key, path) {
                    entries.push_back(Entry::deleted(tombstone.clone()));
                }
            }
        }
        for (key, node) in &state.nodes {
            if under(key, path) {
                entries.push_back(Self::entry_for(node));
            }
        }

        Ok(self.page_from(&mut state, entries))
    }

    async fn list_folder_continue(&self, cursor: &str) -> anyhow::Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let remaining = state
            .cursors
            .remove(cursor)
            .ok_or_else(|| anyhow::anyhow!("unknown cursor {cursor}"))?;
        Ok(self.page_from(&mut state, remaining))
    }

    async fn get_metadata(&self, path: &RemotePath) -> anyhow::Result<Option<Entry>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_metadata {
            anyhow::bail!("invalid_access_token");
        }
        Ok(state.nodes.get(&path.key()).map(Self::entry_for))
    }

    async fn download(&self, path: &RemotePath) -> anyhow::Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing_downloads.contains(&path.key()) {
            anyhow::bail!("download of {path} failed");
        }
        match state.nodes.get(&path.key()) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            _ => anyhow::bail!("path/not_found: {path}"),
        }
    }

    async fn upload(&self, data: Vec<u8>, path: &RemotePath) -> anyhow::Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(&path.key()) {
            anyhow::bail!("path/conflict: {path}");
        }

        let mut parent = path.parent();
        while let Some(dir) = parent {
            if !dir.is_root() && !state.nodes.contains_key(&dir.key()) {
                state.nodes.insert(dir.key(), Node::Folder { path: dir.clone() });
            }
            parent = dir.parent();
        }

        state.tombstones.remove(&path.key());
        state.nodes.insert(
            path.key(),
            Node::File {
                path: path.clone(),
                data,
            },
        );
        Ok(())
    }

    async fn create_folder(&self, path: &RemotePath) -> anyhow::Result<()> {
        self.folders_created.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(&path.key()) {
            anyhow::bail!("path/conflict/folder: {path}");
        }
        state.tombstones.remove(&path.key());
        state
            .nodes
            .insert(path.key(), Node::Folder { path: path.clone() });
        Ok(())
    }
}

/// Builds an engine over `store` and the real filesystem under `local_root`
pub fn engine(
    store: &Arc<MemoryRemoteStore>,
    local_root: &Path,
    remote_root: &str,
    mode: TransferMode,
) -> ReconciliationEngine {
    let fs = Arc::new(LocalFileSystemAdapter::new());
    let remote: Arc<dyn IRemoteStore> = store.clone();
    let mapper = PathMapper::new(
        local_root.to_path_buf(),
        RemotePath::normalize(remote_root).expect("valid remote root"),
    )
    .expect("absolute local root");
    let scheduler = TransferScheduler::new(Arc::clone(&remote), fs.clone(), 4, mode);
    ReconciliationEngine::new(remote, fs, mapper, scheduler)
}

/// Writes a local file, creating parent directories
pub fn write_local(root: &Path, relative: &str, data: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, data).expect("write local file");
}
