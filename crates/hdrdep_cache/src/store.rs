//! The incremental store for one module.

use crate::error::CacheError;
use crate::snapshot::{Snapshot, SNAPSHOT_FILE};
use crate::stale::{compute_stale, StaleSet};
use hdrdep_graph::IncludeGraph;
use std::path::{Path, PathBuf};

/// Previous-build state for one module, loaded from its cache directory.
///
/// All reads are fail-safe: a missing, corrupt or incompatible snapshot
/// leaves the store cold and every root stale. [`commit`](Self::commit) is
/// the only write and replaces the snapshot in a single rename.
#[derive(Debug)]
pub struct IncrementalStore {
    cache_dir: PathBuf,
    module: String,
    engine_version: String,
    previous: Option<Snapshot>,
}

impl IncrementalStore {
    /// Loads the snapshot of `module` from `cache_dir`, if there is a usable
    /// one.
    pub fn load(cache_dir: &Path, module: &str, engine_version: &str) -> Self {
        let previous = Snapshot::load(cache_dir, engine_version, module);
        if previous.is_none() {
            tracing::info!(module, "no usable snapshot; every unit is stale");
        }
        Self {
            cache_dir: cache_dir.to_path_buf(),
            module: module.to_string(),
            engine_version: engine_version.to_string(),
            previous,
        }
    }

    /// `true` if there was no usable snapshot.
    pub fn is_cold(&self) -> bool {
        self.previous.is_none()
    }

    /// The snapshot of the previous build.
    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    /// The roots of `graph` that must be recompiled.
    pub fn stale_files(&self, graph: &IncludeGraph) -> StaleSet {
        compute_stale(graph, self.previous.as_ref())
    }

    /// Records `graph` as the new previous build.
    ///
    /// On error the old snapshot is still in place.
    pub fn commit(&mut self, graph: &IncludeGraph) -> Result<(), CacheError> {
        let snapshot = Snapshot::from_graph(graph);
        snapshot.save(&self.cache_dir, &self.engine_version, &self.module)?;
        self.previous = Some(snapshot);
        Ok(())
    }

    /// Deletes the snapshot in `cache_dir`. Returns `false` if there was none.
    pub fn clean(cache_dir: &Path) -> Result<bool, CacheError> {
        let path = cache_dir.join(SNAPSHOT_FILE);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stale::StaleReason;
    use hdrdep_graph::{GraphBuilder, SearchPaths};
    use hdrdep_source::MemoryFileSystem;
    use std::sync::Arc;

    const VERSION: &str = "0.1.0";

    fn build(fs: &MemoryFileSystem, roots: &[&str]) -> IncludeGraph {
        build_with(fs, roots, &[])
    }

    fn build_with(fs: &MemoryFileSystem, roots: &[&str], defines: &[(&str, &str)]) -> IncludeGraph {
        let roots: Vec<PathBuf> = roots.iter().map(PathBuf::from).collect();
        GraphBuilder::new(Arc::new(fs.clone()), SearchPaths::default())
            .with_predefined(defines.iter().map(|(n, v)| (n.to_string(), v.to_string())))
            .build(&roots)
            .unwrap()
            .graph
    }

    /// Builds, commits, and returns a store reloaded from disk.
    fn committed(dir: &Path, graph: &IncludeGraph) -> IncrementalStore {
        let mut store = IncrementalStore::load(dir, "core", VERSION);
        store.commit(graph).unwrap();
        IncrementalStore::load(dir, "core", VERSION)
    }

    fn macro_project() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.add_file("/p/s.c", "#include \"env.h\"\n#include M\n");
        fs.add_file("/p/t.c", "#include \"x.h\"\n");
        fs.add_file("/p/env.h", "#define M \"x.h\"\n");
        fs.add_file("/p/x.h", "int x;\n");
        fs.add_file("/p/y.h", "int y;\n");
        fs
    }

    #[test]
    fn cold_start_then_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let graph = build(&fs, &["/p/s.c", "/p/t.c"]);

        let store = IncrementalStore::load(dir.path(), "core", VERSION);
        assert!(store.is_cold());
        assert_eq!(store.stale_files(&graph).len(), 2);

        let store = committed(dir.path(), &graph);
        assert!(!store.is_cold());
        assert_eq!(store.previous().map(Snapshot::len), Some(graph.len()));
        assert!(store.stale_files(&build(&fs, &["/p/s.c", "/p/t.c"])).is_empty());
    }

    #[test]
    fn content_change_marks_only_that_unit() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let store = committed(dir.path(), &build(&fs, &["/p/s.c", "/p/t.c"]));
        fs.add_file("/p/t.c", "#include \"x.h\"\nint t;\n");
        let set = store.stale_files(&build(&fs, &["/p/s.c", "/p/t.c"]));
        assert_eq!(set.reasons(Path::new("/p/t.c")), &[StaleReason::ContentChanged]);
        assert!(!set.contains(Path::new("/p/s.c")));
    }

    #[test]
    fn shared_header_change_marks_every_dependent() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let store = committed(dir.path(), &build(&fs, &["/p/s.c", "/p/t.c"]));
        fs.add_file("/p/x.h", "long x;\n");
        let set = store.stale_files(&build(&fs, &["/p/s.c", "/p/t.c"]));
        let expected = [StaleReason::HeaderChanged(PathBuf::from("/p/x.h"))];
        assert_eq!(set.reasons(Path::new("/p/s.c")), &expected);
        assert_eq!(set.reasons(Path::new("/p/t.c")), &expected);
    }

    #[test]
    fn macro_redefinition_invalidates_its_users() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let store = committed(dir.path(), &build(&fs, &["/p/s.c", "/p/t.c"]));
        fs.add_file("/p/env.h", "#define M \"y.h\"\n");
        let set = store.stale_files(&build(&fs, &["/p/s.c", "/p/t.c"]));
        let reasons = set.reasons(Path::new("/p/s.c"));
        assert!(reasons.contains(&StaleReason::HeaderChanged(PathBuf::from("/p/env.h"))));
        assert!(reasons.contains(&StaleReason::HeaderMissing(PathBuf::from("/p/y.h"))));
        assert!(reasons.contains(&StaleReason::HeaderSetChanged));
        assert!(reasons.contains(&StaleReason::MacroEnvironmentChanged));
        assert!(!set.contains(Path::new("/p/t.c")));
    }

    #[test]
    fn predefined_change_only_touches_macro_users() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let roots = ["/p/s.c", "/p/t.c"];
        let store = committed(dir.path(), &build_with(&fs, &roots, &[("DEBUG", "0")]));
        let set = store.stale_files(&build_with(&fs, &roots, &[("DEBUG", "1")]));
        assert_eq!(
            set.reasons(Path::new("/p/s.c")),
            &[StaleReason::MacroEnvironmentChanged]
        );
        assert!(!set.contains(Path::new("/p/t.c")));
    }

    #[test]
    fn dropped_include_changes_header_set() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let store = committed(dir.path(), &build(&fs, &["/p/s.c", "/p/t.c"]));
        fs.add_file("/p/t.c", "int t_only;\n");
        let set = store.stale_files(&build(&fs, &["/p/s.c", "/p/t.c"]));
        assert_eq!(
            set.reasons(Path::new("/p/t.c")),
            &[StaleReason::ContentChanged, StaleReason::HeaderSetChanged]
        );
    }

    #[test]
    fn new_and_removed_units() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let store = committed(dir.path(), &build(&fs, &["/p/s.c", "/p/t.c"]));
        fs.add_file("/p/u.c", "");
        let set = store.stale_files(&build(&fs, &["/p/s.c", "/p/u.c"]));
        assert_eq!(set.reasons(Path::new("/p/u.c")), &[StaleReason::NewFile]);
        assert!(set.removed.contains(Path::new("/p/t.c")));
        assert!(!set.contains(Path::new("/p/s.c")));
    }

    #[test]
    fn unresolved_include_is_always_stale() {
        let dir = tempfile::tempdir().unwrap();
        let fs = MemoryFileSystem::new();
        fs.add_file("/p/a.c", "#include <missing.h>\n");
        let store = committed(dir.path(), &build(&fs, &["/p/a.c"]));
        for _ in 0..2 {
            let set = store.stale_files(&build(&fs, &["/p/a.c"]));
            assert_eq!(
                set.reasons(Path::new("/p/a.c")),
                &[StaleReason::UnresolvedInclude]
            );
        }
    }

    #[test]
    fn corrupt_snapshot_is_cold() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let store = committed(dir.path(), &build(&fs, &["/p/s.c"]));
        let mut bytes = std::fs::read(store.snapshot_path()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x55;
        std::fs::write(store.snapshot_path(), bytes).unwrap();
        assert!(IncrementalStore::load(dir.path(), "core", VERSION).is_cold());
    }

    #[test]
    fn other_module_or_version_is_cold() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        committed(dir.path(), &build(&fs, &["/p/s.c"]));
        assert!(IncrementalStore::load(dir.path(), "ui", VERSION).is_cold());
        assert!(IncrementalStore::load(dir.path(), "core", "9.9.9").is_cold());
        assert!(!IncrementalStore::load(dir.path(), "core", VERSION).is_cold());
    }

    #[test]
    fn commit_leaves_only_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        let store = committed(dir.path(), &build(&fs, &["/p/s.c"]));
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(names, vec![store.snapshot_path()]);
    }

    #[test]
    fn clean_removes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let fs = macro_project();
        committed(dir.path(), &build(&fs, &["/p/s.c"]));
        assert!(IncrementalStore::clean(dir.path()).unwrap());
        assert!(!IncrementalStore::clean(dir.path()).unwrap());
        assert!(IncrementalStore::load(dir.path(), "core", VERSION).is_cold());
    }
}
