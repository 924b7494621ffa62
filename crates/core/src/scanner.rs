use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::TreeError;
use crate::metadata::RawEntry;
use crate::model::*;

/// Walks a directory and assembles it into a [`Tree`].
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root: PathBuf,
    follow_links: bool,
}

impl TreeBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: false,
        }
    }

    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    pub fn build(&self) -> Result<Tree, TreeError> {
        let root = absolute_root(&self.root)?;
        debug!(root = %root.display(), follow_links = self.follow_links, "building tree");

        let walk_root = root.clone();
        let entries = WalkDir::new(&root)
            .follow_links(self.follow_links)
            .follow_root_links(self.follow_links)
            .into_iter()
            .map(move |res| -> Result<(PathBuf, RawEntry), TreeError> {
                let ent = res.map_err(|e| TreeError::from_walk(&walk_root, e))?;
                // `DirEntry::metadata` only follows links when the walk does
                let md = ent
                    .metadata()
                    .map_err(|e| TreeError::from_walk(&walk_root, e))?;
                let name = ent.file_name().to_string_lossy().into_owned();
                Ok((ent.into_path(), RawEntry::from_metadata(name, &md)))
            });
        assemble(entries)
    }
}

/// Builds the tree for `root` with default options.
pub fn build(root: impl AsRef<Path>) -> Result<Tree, TreeError> {
    TreeBuilder::new(root.as_ref()).build()
}

fn absolute_root(root: &Path) -> Result<PathBuf, TreeError> {
    let abs = std::path::absolute(root).map_err(|source| TreeError::PathResolution {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(clean_path(&abs))
}

/// Lexical clean: drops `.` and trailing separators, resolves `..` against
/// the preceding component. Never climbs above the root.
fn clean_path(path: &Path) -> PathBuf {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }
    clean
}

/// Links a sequence of `(path, entry)` pairs into a tree.
///
/// The first error in `entries` aborts assembly. Exactly one entry must lack
/// a parent among the others; that entry becomes the root.
pub fn assemble<I>(entries: I) -> Result<Tree, TreeError>
where
    I: IntoIterator<Item = Result<(PathBuf, RawEntry), TreeError>>,
{
    let mut nodes: Vec<TreeNode> = Vec::with_capacity(1024);
    let mut id_by_path: HashMap<PathBuf, NodeId> = HashMap::new();

    for item in entries {
        let (path, raw) = item?;
        match id_by_path.entry(path) {
            Entry::Occupied(e) => {
                warn!(path = %e.key().display(), "duplicate entry in walk, keeping the first");
            }
            Entry::Vacant(e) => {
                let id = NodeId(nodes.len() as u64);
                nodes.push(TreeNode {
                    id,
                    parent: None,
                    path: e.key().clone(),
                    info: FileInfo::extract(&raw),
                    children: Vec::new(),
                });
                e.insert(id);
            }
        }
    }

    // Link in arena order so that siblings keep discovery order.
    let mut roots: Vec<NodeId> = Vec::new();
    for idx in 0..nodes.len() {
        let pid = nodes[idx]
            .path
            .parent()
            .and_then(|p| id_by_path.get(p).copied());
        match pid {
            Some(pid) => {
                let id = nodes[idx].id;
                nodes[idx].parent = Some(pid);
                nodes[pid.index()].children.push(id);
                trace!(path = %nodes[idx].path.display(), "linked");
            }
            None => roots.push(nodes[idx].id),
        }
    }

    let root = match roots.as_slice() {
        [] => return Err(TreeError::EmptyWalk),
        [root] => *root,
        _ => {
            return Err(TreeError::AmbiguousRoot {
                roots: roots
                    .iter()
                    .map(|id| nodes[id.index()].path.clone())
                    .collect(),
            })
        }
    };

    debug!(
        nodes = nodes.len(),
        root = %nodes[root.index()].path.display(),
        "tree assembled"
    );
    Ok(Tree::from_parts(root, nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::SystemTime;

    fn entry(path: &str, is_dir: bool) -> Result<(PathBuf, RawEntry), TreeError> {
        let path = PathBuf::from(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok((
            path,
            RawEntry {
                name,
                size: 1,
                mode: 0,
                modified: SystemTime::UNIX_EPOCH,
                is_dir,
            },
        ))
    }

    fn names<'a>(tree: &'a Tree, id: NodeId) -> Vec<&'a str> {
        tree.children(id).map(|n| n.name()).collect()
    }

    #[test]
    fn test_assemble_scenario() {
        let tree = assemble(vec![
            entry("/root", true),
            entry("/root/a.txt", false),
            entry("/root/sub", true),
            entry("/root/sub/b.go", false),
        ])
        .unwrap();

        let root = tree.root_node();
        assert_eq!(root.path, PathBuf::from("/root"));
        assert!(root.parent.is_none());
        assert_eq!(names(&tree, root.id), vec!["a.txt", "sub"]);

        let sub = tree.find(Path::new("/root/sub")).unwrap();
        assert_eq!(names(&tree, sub.id), vec!["b.go"]);
        assert_eq!(sub.parent, Some(root.id));
    }

    #[test]
    fn test_root_found_regardless_of_order() {
        let tree = assemble(vec![
            entry("/r/x/y/z.txt", false),
            entry("/r/x/y", true),
            entry("/r/x", true),
            entry("/r", true),
        ])
        .unwrap();
        assert_eq!(tree.root_node().path, PathBuf::from("/r"));
        assert_eq!(tree.len(), 4);
        let z = tree.find(Path::new("/r/x/y/z.txt")).unwrap();
        assert_eq!(tree.ancestors(z.id).count(), 3);
    }

    #[test]
    fn test_filesystem_root_is_never_its_own_parent() {
        let tree = assemble(vec![entry("/", true), entry("/etc", true)]).unwrap();
        assert_eq!(tree.root_node().path, PathBuf::from("/"));
        assert_eq!(names(&tree, tree.root()), vec!["etc"]);
    }

    #[test]
    fn test_disconnected_input_is_ambiguous() {
        let err = assemble(vec![
            entry("/a", true),
            entry("/a/one", false),
            entry("/b/two", false),
        ])
        .unwrap_err();
        match err {
            TreeError::AmbiguousRoot { roots } => {
                assert_eq!(roots, vec![PathBuf::from("/a"), PathBuf::from("/b/two")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let none: Vec<Result<(PathBuf, RawEntry), TreeError>> = Vec::new();
        assert!(matches!(assemble(none), Err(TreeError::EmptyWalk)));
    }

    #[test]
    fn test_walk_error_aborts() {
        let denied = Err(TreeError::Enumeration {
            path: PathBuf::from("/root/sub"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        let err = assemble(vec![entry("/root", true), entry("/root/a.txt", false), denied])
            .unwrap_err();
        match err {
            TreeError::Enumeration { path, source } => {
                assert_eq!(path, PathBuf::from("/root/sub"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let tree = assemble(vec![
            entry("/root", true),
            entry("/root/a", false),
            entry("/root/a", true),
        ])
        .unwrap();
        assert_eq!(tree.len(), 2);
        assert!(!tree.find(Path::new("/root/a")).unwrap().is_dir());
    }

    #[test]
    fn test_build_walks_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"aaaa").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.go"), b"package b").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let tree = build(dir.path()).unwrap();
        let root = tree.root_node();
        assert_eq!(root.path, std::path::absolute(dir.path()).unwrap());
        assert!(root.is_dir());
        assert_eq!(tree.len(), 5);

        let mut top = names(&tree, root.id);
        top.sort();
        assert_eq!(top, vec!["a.txt", "empty", "sub"]);

        let b = tree.find(&root.path.join("sub").join("b.go")).unwrap();
        assert_eq!(b.info.size, 9);
        assert_eq!(b.info.extension(), ".go");
        assert_eq!(tree.parent(b.id).unwrap().name(), "sub");

        let empty = tree.find(&root.path.join("empty")).unwrap();
        assert!(empty.children.is_empty());
    }

    #[test]
    fn test_build_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.rs");
        fs::write(&file, b"fn main() {}").unwrap();

        let tree = build(&file).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_node().info.extension(), ".rs");
        assert!(tree.root_node().children.is_empty());
    }

    #[test]
    fn test_build_trailing_separator() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), b"x").unwrap();
        let mut with_slash = dir.path().as_os_str().to_owned();
        with_slash.push(std::path::MAIN_SEPARATOR_STR);

        let tree = build(PathBuf::from(with_slash)).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(names(&tree, tree.root()), vec!["x.txt"]);
    }

    #[test]
    fn test_clean_path_resolves_parent_dirs() {
        assert_eq!(clean_path(Path::new("/a/b/../c/./d/")), PathBuf::from("/a/c/d"));
        assert_eq!(clean_path(Path::new("/a/../../..")), PathBuf::from("/"));
        assert_eq!(clean_path(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_build_parent_dir_root_is_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("x")).unwrap();
        fs::write(dir.path().join("a.go"), b"package a").unwrap();

        let tree = build(dir.path().join("x").join("..")).unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        assert_eq!(tree.root_node().path, root);
        let a = tree.find(&root.join("a.go")).unwrap();
        assert_eq!(a.path, root.join("a.go"));
        assert!(tree.find(&root.join("x")).unwrap().is_dir());
    }

    #[test]
    fn test_build_missing_path_is_enumeration_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        match build(&missing) {
            Err(TreeError::Enumeration { path, .. }) => {
                assert_eq!(path, std::path::absolute(&missing).unwrap());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real").join("f.txt"), b"f").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let tree = TreeBuilder::new(dir.path()).build().unwrap();
        let link = tree.find(&tree.root_node().path.join("link")).unwrap();
        assert!(!link.is_dir());
        assert!(link.children.is_empty());

        let followed = TreeBuilder::new(dir.path()).follow_links(true).build().unwrap();
        let link = followed.find(&followed.root_node().path.join("link")).unwrap();
        assert!(link.is_dir());
        assert_eq!(followed.children(link.id).count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_not_followed_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real").join("f.txt"), b"f").unwrap();
        let link = dir.path().join("link.d");
        std::os::unix::fs::symlink(dir.path().join("real"), &link).unwrap();

        let tree = build(&link).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.root_node().is_dir());
        assert_eq!(tree.root_node().info.extension(), ".d");

        let followed = TreeBuilder::new(&link).follow_links(true).build().unwrap();
        assert!(followed.root_node().is_dir());
        assert_eq!(followed.collect_files(followed.root(), ".txt").len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_lossy() {
        use std::os::unix::ffi::OsStrExt;
        let dir = tempfile::tempdir().unwrap();
        let name = std::ffi::OsStr::from_bytes(b"bad\xff.go");
        fs::write(dir.path().join(name), b"x").unwrap();

        let tree = build(dir.path()).unwrap();
        let node = tree.children(tree.root()).next().unwrap();
        assert_eq!(node.name(), "bad\u{fffd}.go");
        assert_eq!(node.info.extension(), ".go");
        assert_eq!(node.path.file_name(), Some(name));
    }
}
