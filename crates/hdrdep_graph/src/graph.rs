//! The include graph and its per-file records.

use hdrdep_common::ContentHash;
use hdrdep_scan::IncludeDirective;
use petgraph::algo::tarjan_scc;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// How an include directive was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Resolution {
    /// Exactly one file.
    Exact,
    /// A macro include with several possible files; every one is a dependency.
    Ambiguous,
    /// No file could be determined.
    Unresolved,
}

/// A directive together with the files it may name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedInclude {
    /// The directive as written.
    pub directive: IncludeDirective,
    /// Every file the directive may include, normalized.
    pub candidates: BTreeSet<PathBuf>,
    /// Whether the candidate set is exact, ambiguous or empty.
    pub resolution: Resolution,
    /// Byte offset of the directive line in the including file.
    pub start: u32,
    /// Byte offset one past the directive line.
    pub end: u32,
}

/// Everything the engine knows about one file after a build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    /// Normalized path.
    pub path: PathBuf,
    /// `true` for translation-unit roots, `false` for headers.
    pub is_root: bool,
    /// Include directives in file order.
    pub direct_directives: Vec<IncludeDirective>,
    /// Resolution of each directive, parallel to `direct_directives`.
    pub resolved: Vec<ResolvedInclude>,
    /// Every file reachable through at least one include edge.
    pub transitive_headers: BTreeSet<PathBuf>,
    /// Hash of the file bytes.
    pub fingerprint: ContentHash,
    /// Digest of the visible macro table, recorded for units that contain a
    /// macro include.
    pub macro_environment: Option<ContentHash>,
    /// `true` if an include could not be resolved. For roots this covers
    /// every file the unit reached.
    pub has_unresolved: bool,
}

/// A directed include graph. May contain cycles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncludeGraph {
    records: BTreeMap<PathBuf, SourceRecord>,
    edges: BTreeSet<(PathBuf, PathBuf)>,
}

impl IncludeGraph {
    /// Assembles a graph from its records and `includer -> included` edges.
    pub fn new(records: BTreeMap<PathBuf, SourceRecord>, edges: BTreeSet<(PathBuf, PathBuf)>) -> Self {
        Self { records, edges }
    }

    /// The record for `path`, if the file was reached.
    pub fn get(&self, path: &Path) -> Option<&SourceRecord> {
        self.records.get(path)
    }

    /// All records, ordered by path.
    pub fn records(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.values()
    }

    /// Translation-unit records, ordered by path.
    pub fn roots(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.values().filter(|r| r.is_root)
    }

    /// All `includer -> included` edges, ordered.
    pub fn edges(&self) -> &BTreeSet<(PathBuf, PathBuf)> {
        &self.edges
    }

    /// Number of files in the graph.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if the graph has no files.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Include cycles: strongly connected components with more than one file,
    /// plus files that include themselves. Each cycle is sorted, and the list
    /// is ordered by its first file.
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut graph: DiGraphMap<&Path, ()> = DiGraphMap::new();
        for path in self.records.keys() {
            graph.add_node(path.as_path());
        }
        for (from, to) in &self.edges {
            graph.add_edge(from.as_path(), to.as_path(), ());
        }
        let mut cycles: Vec<Vec<PathBuf>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut files: Vec<PathBuf> = scc.into_iter().map(Path::to_path_buf).collect();
                files.sort();
                files
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Renders the graph in Graphviz DOT format, nodes in path order.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<String, &str> = DiGraph::new();
        let mut index: HashMap<&Path, NodeIndex> = HashMap::new();
        for path in self.records.keys() {
            index.insert(path, graph.add_node(path.display().to_string()));
        }
        for (from, to) in &self.edges {
            if let (Some(a), Some(b)) = (index.get(from.as_path()), index.get(to.as_path())) {
                graph.add_edge(*a, *b, "");
            }
        }
        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

/// Every node reachable from `start` through at least one edge of
/// `adjacency`. `start` itself is included only if it lies on a cycle.
pub(crate) fn reachable(
    adjacency: &BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    start: &Path,
) -> BTreeSet<PathBuf> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<&Path> = VecDeque::new();
    queue.push_back(start);
    while let Some(node) = queue.pop_front() {
        let Some(next) = adjacency.get(node) else {
            continue;
        };
        for target in next {
            if seen.insert(target.clone()) {
                queue.push_back(target);
            }
        }
    }
    seen
}

/// Groups edges by source.
pub(crate) fn adjacency(
    edges: &BTreeSet<(PathBuf, PathBuf)>,
) -> BTreeMap<PathBuf, BTreeSet<PathBuf>> {
    let mut map: BTreeMap<PathBuf, BTreeSet<PathBuf>> = BTreeMap::new();
    for (from, to) in edges {
        map.entry(from.clone()).or_default().insert(to.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> SourceRecord {
        SourceRecord {
            path: PathBuf::from(path),
            is_root: path.ends_with(".c"),
            direct_directives: Vec::new(),
            resolved: Vec::new(),
            transitive_headers: BTreeSet::new(),
            fingerprint: ContentHash::from_bytes(path.as_bytes()),
            macro_environment: None,
            has_unresolved: false,
        }
    }

    fn graph(files: &[&str], edges: &[(&str, &str)]) -> IncludeGraph {
        IncludeGraph::new(
            files.iter().map(|f| (PathBuf::from(f), record(f))).collect(),
            edges
                .iter()
                .map(|(a, b)| (PathBuf::from(a), PathBuf::from(b)))
                .collect(),
        )
    }

    #[test]
    fn reachability_excludes_start_unless_cyclic() {
        let g = graph(
            &["/a.c", "/b.h", "/c.h"],
            &[("/a.c", "/b.h"), ("/b.h", "/c.h"), ("/c.h", "/b.h")],
        );
        let adj = adjacency(g.edges());
        assert_eq!(
            reachable(&adj, Path::new("/a.c")),
            BTreeSet::from([PathBuf::from("/b.h"), PathBuf::from("/c.h")])
        );
        assert!(reachable(&adj, Path::new("/b.h")).contains(Path::new("/b.h")));
    }

    #[test]
    fn cycles_are_reported_sorted() {
        let g = graph(
            &["/a.c", "/x.h", "/y.h", "/self.h", "/z.h"],
            &[
                ("/a.c", "/y.h"),
                ("/y.h", "/x.h"),
                ("/x.h", "/y.h"),
                ("/self.h", "/self.h"),
                ("/a.c", "/z.h"),
            ],
        );
        assert_eq!(
            g.cycles(),
            vec![
                vec![PathBuf::from("/self.h")],
                vec![PathBuf::from("/x.h"), PathBuf::from("/y.h")],
            ]
        );
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let g = graph(&["/a.c", "/b.h"], &[("/a.c", "/b.h")]);
        assert!(g.cycles().is_empty());
    }

    #[test]
    fn roots_filter() {
        let g = graph(&["/a.c", "/b.h"], &[("/a.c", "/b.h")]);
        let roots: Vec<_> = g.roots().map(|r| r.path.clone()).collect();
        assert_eq!(roots, vec![PathBuf::from("/a.c")]);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn dot_export_lists_nodes_and_edges() {
        let g = graph(&["/a.c", "/b.h"], &[("/a.c", "/b.h")]);
        let dot = g.to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("\"/a.c\""));
        assert!(dot.contains("\"/b.h\""));
        assert!(dot.contains("0 -> 1"));
    }
}
