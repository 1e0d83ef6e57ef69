//! Parallel construction of the include graph.
//!
//! Each translation-unit root is an independent unit of work on the `rayon`
//! pool. A unit walks its includes depth-first with an explicit stack, keeps
//! its own [`MacroTable`], and shares parsed files with every other unit
//! through the build's [`HeaderCache`]. Once all units finish, their results
//! are merged in root order, so the graph does not depend on scheduling.

use crate::error::GraphError;
use crate::graph::{adjacency, reachable, IncludeGraph, Resolution, ResolvedInclude, SourceRecord};
use crate::memo::{HeaderCache, ScannedHeader};
use crate::search::SearchPaths;
use hdrdep_common::InternalError;
use hdrdep_scan::{resolve_macro, IncludeDirective, IncludeKind, MacroResolution, MacroTable};
use hdrdep_source::{normalize_path, FileSystem};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag that stops a running build.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// An include that did not resolve to exactly one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncludeIssue {
    /// The file containing the directive.
    pub file: PathBuf,
    /// The directive as written.
    pub directive: IncludeDirective,
    /// [`Resolution::Ambiguous`] or [`Resolution::Unresolved`].
    pub resolution: Resolution,
    /// Files the directive may include (empty when unresolved).
    pub candidates: BTreeSet<PathBuf>,
    /// Byte offset of the directive line.
    pub start: u32,
    /// Byte offset one past the directive line.
    pub end: u32,
}

/// The result of one graph build.
#[derive(Debug)]
pub struct BuildOutcome {
    /// The assembled include graph.
    pub graph: IncludeGraph,
    /// Number of files read and scanned during the build.
    pub parse_count: usize,
}

impl BuildOutcome {
    /// Every ambiguous or unresolved include, ordered by file then position.
    pub fn unresolved_report(&self) -> Vec<IncludeIssue> {
        self.graph
            .records()
            .flat_map(|record| {
                record
                    .resolved
                    .iter()
                    .filter(|r| r.resolution != Resolution::Exact)
                    .map(|r| IncludeIssue {
                        file: record.path.clone(),
                        directive: r.directive.clone(),
                        resolution: r.resolution,
                        candidates: r.candidates.clone(),
                        start: r.start,
                        end: r.end,
                    })
            })
            .collect()
    }
}

/// Builds include graphs for a set of translation-unit roots.
pub struct GraphBuilder {
    fs: Arc<dyn FileSystem>,
    search: Arc<SearchPaths>,
    predefined: Vec<(String, String)>,
    jobs: Option<usize>,
    cancel: CancellationToken,
}

impl GraphBuilder {
    /// Creates a builder reading through `fs` and searching `search`.
    pub fn new(fs: Arc<dyn FileSystem>, search: SearchPaths) -> Self {
        Self {
            fs,
            search: Arc::new(search),
            predefined: Vec::new(),
            jobs: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the predefined object-like macros every unit starts with.
    pub fn with_predefined(mut self, defines: impl IntoIterator<Item = (String, String)>) -> Self {
        self.predefined = defines.into_iter().collect();
        self
    }

    /// Limits the worker pool to `jobs` threads. `None` uses the global pool.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Uses `token` to observe cancellation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A clone of the builder's cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Builds the include graph for `roots`.
    ///
    /// Roots are normalized and deduplicated, keeping the first occurrence.
    /// An unreadable root fails the build with [`GraphError::Io`]; unreadable
    /// headers only make their includes unresolved.
    pub fn build(&self, roots: &[PathBuf]) -> Result<BuildOutcome, GraphError> {
        let mut seen = HashSet::new();
        let roots: Vec<PathBuf> = roots
            .iter()
            .map(|r| normalize_path(r))
            .filter(|r| seen.insert(r.clone()))
            .collect();
        tracing::debug!(roots = roots.len(), jobs = ?self.jobs, "building include graph");

        let cache = HeaderCache::new(Arc::clone(&self.fs));
        let run = || {
            roots
                .par_iter()
                .map(|root| self.build_unit(root, &cache))
                .collect::<Result<Vec<_>, _>>()
        };
        let units = match self.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| InternalError::new(format!("failed to start worker pool: {e}")))?
                .install(run)?,
            None => run()?,
        };

        let graph = assemble(units);
        tracing::debug!(
            files = graph.len(),
            edges = graph.edges().len(),
            parses = cache.parse_count(),
            "include graph built"
        );
        Ok(BuildOutcome {
            graph,
            parse_count: cache.parse_count(),
        })
    }

    fn check_cancelled(&self) -> Result<(), GraphError> {
        if self.cancel.is_cancelled() {
            Err(GraphError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn build_unit(&self, root: &Path, cache: &HeaderCache) -> Result<UnitResult, GraphError> {
        self.check_cancelled()?;
        let root_scan = cache.get(root, &self.search).map_err(|e| GraphError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(e.kind(), e.to_string()),
        })?;

        let mut table = MacroTable::with_predefined(
            self.predefined.iter().map(|(n, v)| (n.as_str(), v.as_str())),
        );
        let mut in_progress: HashSet<PathBuf> = HashSet::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut edges: BTreeSet<(PathBuf, PathBuf)> = BTreeSet::new();
        let mut entered: Vec<(Arc<ScannedHeader>, Vec<ResolvedInclude>)> = Vec::new();
        let mut root_resolved = Vec::new();
        let mut macro_sensitive = false;
        let mut has_unresolved = false;

        let mut stack = vec![Frame::enter(Arc::clone(&root_scan), &mut table, &mut in_progress)];
        loop {
            self.check_cancelled()?;
            let Some(top) = stack.last_mut() else {
                break;
            };

            if let Some(child) = top.pending.pop() {
                if in_progress.contains(&child) || visited.contains(&child) {
                    continue;
                }
                if let Ok(scan) = cache.get(&child, &self.search) {
                    stack.push(Frame::enter(scan, &mut table, &mut in_progress));
                }
                continue;
            }

            if top.next < top.scan.directives.includes.len() {
                let index = top.next;
                top.next += 1;
                let resolved = self.resolve_include(&top.scan, index, &table, cache);
                macro_sensitive |= resolved.directive.kind() == IncludeKind::Macro;
                has_unresolved |= resolved.resolution == Resolution::Unresolved;
                for target in &resolved.candidates {
                    edges.insert((top.scan.path.clone(), target.clone()));
                }
                top.pending = resolved.candidates.iter().rev().cloned().collect();
                top.resolved.push(resolved);
                continue;
            }

            let Some(frame) = stack.pop() else {
                break;
            };
            in_progress.remove(&frame.scan.path);
            visited.insert(frame.scan.path.clone());
            if stack.is_empty() {
                root_resolved = frame.resolved;
            } else {
                entered.push((frame.scan, frame.resolved));
            }
        }

        let mut transitive_headers = reachable(&adjacency(&edges), root);
        let macro_environment = if macro_sensitive {
            transitive_headers.extend(table.defining_files().into_iter().filter(|f| f != root));
            Some(table.environment_hash())
        } else {
            None
        };
        tracing::debug!(
            root = %root.display(),
            headers = transitive_headers.len(),
            unresolved = has_unresolved,
            "unit traversed"
        );

        Ok(UnitResult {
            record: SourceRecord {
                path: root.to_path_buf(),
                is_root: true,
                direct_directives: directives_of(&root_scan),
                resolved: root_resolved,
                transitive_headers,
                fingerprint: root_scan.fingerprint,
                macro_environment,
                has_unresolved,
            },
            edges,
            entered,
        })
    }

    fn resolve_include(
        &self,
        scan: &ScannedHeader,
        index: usize,
        table: &MacroTable,
        cache: &HeaderCache,
    ) -> ResolvedInclude {
        let entry = &scan.directives.includes[index];
        let directive = &entry.directive;
        let current_dir = scan.path.parent().unwrap_or_else(|| Path::new(""));
        let fs = self.fs.as_ref();
        let lookup = |literal: &IncludeDirective| {
            if entry.is_next {
                self.search.resolve_next(literal, &scan.path, fs)
            } else {
                self.search.resolve(literal, current_dir, fs)
            }
        };

        let (found, ambiguous): (Vec<PathBuf>, bool) = match directive.kind() {
            IncludeKind::Macro => {
                match resolve_macro(directive.value(), directive.is_import(), table) {
                    MacroResolution::Exact(literal) => (lookup(&literal).into_iter().collect(), false),
                    MacroResolution::Ambiguous(literals) => (
                        literals
                            .iter()
                            .filter_map(lookup)
                            .collect(),
                        true,
                    ),
                    MacroResolution::Unresolved => (Vec::new(), false),
                }
            }
            _ => (
                scan.literal_targets.get(index).cloned().flatten().into_iter().collect(),
                false,
            ),
        };

        let candidates: BTreeSet<PathBuf> = found
            .into_iter()
            .filter(|path| match cache.get(path, &self.search) {
                Ok(_) => true,
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "unreadable header");
                    false
                }
            })
            .collect();
        let resolution = if candidates.is_empty() {
            Resolution::Unresolved
        } else if ambiguous {
            Resolution::Ambiguous
        } else {
            Resolution::Exact
        };
        ResolvedInclude {
            directive: directive.clone(),
            candidates,
            resolution,
            start: entry.start,
            end: entry.end,
        }
    }
}

impl std::fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("search", &self.search)
            .field("predefined", &self.predefined)
            .field("jobs", &self.jobs)
            .finish()
    }
}

struct Frame {
    scan: Arc<ScannedHeader>,
    next: usize,
    pending: Vec<PathBuf>,
    resolved: Vec<ResolvedInclude>,
}

impl Frame {
    /// Makes the file's macros visible and marks it in progress.
    fn enter(
        scan: Arc<ScannedHeader>,
        table: &mut MacroTable,
        in_progress: &mut HashSet<PathBuf>,
    ) -> Self {
        for define in &scan.directives.defines {
            table.define(Some(&scan.path), define.definition.clone());
        }
        in_progress.insert(scan.path.clone());
        Self {
            scan,
            next: 0,
            pending: Vec::new(),
            resolved: Vec::new(),
        }
    }
}

struct UnitResult {
    record: SourceRecord,
    edges: BTreeSet<(PathBuf, PathBuf)>,
    /// Files other than the root, in the order the unit finished them.
    entered: Vec<(Arc<ScannedHeader>, Vec<ResolvedInclude>)>,
}

fn directives_of(scan: &ScannedHeader) -> Vec<IncludeDirective> {
    scan.directives
        .includes
        .iter()
        .map(|e| e.directive.clone())
        .collect()
}

/// Merges unit results in root order. A header's resolutions come from the
/// first unit that reached it; its transitive set comes from the union of
/// every unit's edges.
fn assemble(units: Vec<UnitResult>) -> IncludeGraph {
    let mut records: BTreeMap<PathBuf, SourceRecord> = BTreeMap::new();
    let mut edges: BTreeSet<(PathBuf, PathBuf)> = BTreeSet::new();
    let mut headers = Vec::new();
    for unit in units {
        edges.extend(unit.edges);
        records.insert(unit.record.path.clone(), unit.record);
        headers.extend(unit.entered);
    }

    let adjacency = adjacency(&edges);
    for (scan, resolved) in headers {
        if records.contains_key(&scan.path) {
            continue;
        }
        let has_unresolved = resolved
            .iter()
            .any(|r| r.resolution == Resolution::Unresolved);
        records.insert(
            scan.path.clone(),
            SourceRecord {
                path: scan.path.clone(),
                is_root: false,
                direct_directives: directives_of(&scan),
                resolved,
                transitive_headers: reachable(&adjacency, &scan.path),
                fingerprint: scan.fingerprint,
                macro_environment: None,
                has_unresolved,
            },
        );
    }
    IncludeGraph::new(records, edges)
}
