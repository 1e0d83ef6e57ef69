//! Stale-set computation.

use crate::snapshot::Snapshot;
use hdrdep_graph::{IncludeGraph, SourceRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a translation unit has to be recompiled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "reason", content = "path", rename_all = "snake_case")]
pub enum StaleReason {
    /// There is no usable snapshot.
    ColdStart,
    /// The unit was not part of the previous build.
    NewFile,
    /// The unit's own bytes changed.
    ContentChanged,
    /// A header in the unit's transitive set was not seen by the previous
    /// build.
    HeaderMissing(PathBuf),
    /// A header in the unit's transitive set changed.
    HeaderChanged(PathBuf),
    /// Headers were added to or dropped from the unit's transitive set.
    HeaderSetChanged,
    /// The macro definitions visible to the unit's macro includes changed.
    MacroEnvironmentChanged,
    /// The unit has an include that could not be resolved.
    UnresolvedInclude,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::ColdStart => write!(f, "no previous build"),
            StaleReason::NewFile => write!(f, "new file"),
            StaleReason::ContentChanged => write!(f, "content changed"),
            StaleReason::HeaderMissing(p) => write!(f, "new header {}", p.display()),
            StaleReason::HeaderChanged(p) => write!(f, "header {} changed", p.display()),
            StaleReason::HeaderSetChanged => write!(f, "included headers changed"),
            StaleReason::MacroEnvironmentChanged => write!(f, "macro environment changed"),
            StaleReason::UnresolvedInclude => write!(f, "unresolved include"),
        }
    }
}

/// The translation units that must be recompiled, with reasons, and the
/// units that disappeared since the previous build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaleSet {
    /// Stale units, each with its reasons in detection order.
    pub stale: BTreeMap<PathBuf, Vec<StaleReason>>,
    /// Units of the previous build that are no longer roots.
    pub removed: BTreeSet<PathBuf>,
}

impl StaleSet {
    /// `true` if nothing needs recompiling and nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.stale.is_empty() && self.removed.is_empty()
    }

    /// Number of stale units.
    pub fn len(&self) -> usize {
        self.stale.len()
    }

    /// `true` if `path` is stale.
    pub fn contains(&self, path: &Path) -> bool {
        self.stale.contains_key(path)
    }

    /// The reasons `path` is stale, empty if it is not.
    pub fn reasons(&self, path: &Path) -> &[StaleReason] {
        self.stale.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stale unit paths, sorted.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.stale.keys().map(PathBuf::as_path)
    }
}

/// Compares every root of `graph` against `previous`.
///
/// With no snapshot every root is stale with [`StaleReason::ColdStart`].
pub fn compute_stale(graph: &IncludeGraph, previous: Option<&Snapshot>) -> StaleSet {
    let mut set = StaleSet::default();
    for root in graph.roots() {
        let reasons = root_reasons(graph, root, previous);
        if !reasons.is_empty() {
            set.stale.insert(root.path.clone(), reasons);
        }
    }
    if let Some(previous) = previous {
        set.removed = previous
            .records()
            .filter(|r| r.is_root)
            .filter(|r| !graph.get(&r.path).is_some_and(|now| now.is_root))
            .map(|r| r.path.clone())
            .collect();
    }
    tracing::debug!(stale = set.len(), removed = set.removed.len(), "computed stale set");
    set
}

fn root_reasons(
    graph: &IncludeGraph,
    root: &SourceRecord,
    previous: Option<&Snapshot>,
) -> Vec<StaleReason> {
    let mut reasons = Vec::new();
    match previous.map(|s| (s, s.get(&root.path))) {
        None => reasons.push(StaleReason::ColdStart),
        Some((_, None)) => reasons.push(StaleReason::NewFile),
        Some((snapshot, Some(before))) => {
            if before.fingerprint != root.fingerprint {
                reasons.push(StaleReason::ContentChanged);
            }
            for header in root.transitive_headers.iter().filter(|h| **h != root.path) {
                let Some(now) = graph.get(header).map(|r| r.fingerprint) else {
                    continue;
                };
                match snapshot.get(header) {
                    None => reasons.push(StaleReason::HeaderMissing(header.clone())),
                    Some(old) if old.fingerprint != now => {
                        reasons.push(StaleReason::HeaderChanged(header.clone()))
                    }
                    Some(_) => {}
                }
            }
            if before.header_set() != root.transitive_headers {
                reasons.push(StaleReason::HeaderSetChanged);
            }
            if before.macro_environment != root.macro_environment {
                reasons.push(StaleReason::MacroEnvironmentChanged);
            }
        }
    }
    if root.has_unresolved {
        reasons.push(StaleReason::UnresolvedInclude);
    }
    reasons
}
