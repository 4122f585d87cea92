//! In-memory filesystem that records every call.

use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::fs::{FileSystem, StatRecord};

/// A call observed by [`MemoryFs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FsCall {
    /// `stat(path)`.
    Stat(String),
    /// `read_dir(path)`.
    ReadDir(String),
}

#[derive(Debug)]
struct Node {
    stat: StatRecord,
    children: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<String, Node>,
    stat_failures: HashMap<String, io::ErrorKind>,
    read_dir_failures: HashMap<String, io::ErrorKind>,
    calls: Vec<FsCall>,
}

/// Tree of entries kept in memory.
///
/// Directory children are listed in insertion order. Missing parents are
/// created as directories on insert.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<State>,
}

fn parent_and_name(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('/')
        .filter(|(parent, name)| !parent.is_empty() && !name.is_empty())
}

impl MemoryFs {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts `path` with `stat`, replacing the metadata of an existing entry.
    pub fn insert(&self, path: &str, stat: StatRecord) -> &Self {
        insert_node(&mut self.state(), path, stat);
        self
    }

    /// Inserts a directory.
    pub fn dir(&self, path: &str) -> &Self {
        self.insert(path, StatRecord::dir())
    }

    /// Inserts a regular file of `len` bytes.
    pub fn file(&self, path: &str, len: u64) -> &Self {
        self.insert(path, StatRecord::file(len))
    }

    /// Makes `stat(path)` fail with `kind`.
    pub fn fail_stat(&self, path: &str, kind: io::ErrorKind) -> &Self {
        self.state().stat_failures.insert(path.to_owned(), kind);
        self
    }

    /// Makes `read_dir(path)` fail with `kind`.
    pub fn fail_read_dir(&self, path: &str, kind: io::ErrorKind) -> &Self {
        self.state().read_dir_failures.insert(path.to_owned(), kind);
        self
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<FsCall> {
        self.state().calls.clone()
    }

    /// Returns `true` if any call touched `path` or something below it.
    pub fn touched_below(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        self.state().calls.iter().any(|call| {
            let (FsCall::Stat(called) | FsCall::ReadDir(called)) = call;
            called.starts_with(&prefix)
        })
    }

    /// Returns `true` if `read_dir(path)` was called.
    pub fn listed(&self, path: &str) -> bool {
        self.state()
            .calls
            .iter()
            .any(|call| matches!(call, FsCall::ReadDir(called) if called == path))
    }
}

fn insert_node(state: &mut State, path: &str, stat: StatRecord) {
    if let Some(node) = state.nodes.get_mut(path) {
        node.stat = stat;
        return;
    }
    if let Some((parent, name)) = parent_and_name(path) {
        if !state.nodes.contains_key(parent) {
            insert_node(state, parent, StatRecord::dir());
        }
        if let Some(parent) = state.nodes.get_mut(parent) {
            parent.children.push(name.to_owned());
        }
    }
    state.nodes.insert(
        path.to_owned(),
        Node {
            stat,
            children: Vec::new(),
        },
    );
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn stat(&self, path: &str) -> io::Result<StatRecord> {
        let mut state = self.state();
        state.calls.push(FsCall::Stat(path.to_owned()));
        if let Some(kind) = state.stat_failures.get(path) {
            return Err(io::Error::from(*kind));
        }
        state
            .nodes
            .get(path)
            .map(|node| node.stat.clone())
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let mut state = self.state();
        state.calls.push(FsCall::ReadDir(path.to_owned()));
        if let Some(kind) = state.read_dir_failures.get(path) {
            return Err(io::Error::from(*kind));
        }
        match state.nodes.get(path) {
            Some(node) if node.stat.is_dir() => Ok(node.children.clone()),
            Some(_) => Err(io::Error::from(io::ErrorKind::NotADirectory)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}
