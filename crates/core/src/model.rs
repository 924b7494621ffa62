use chrono::{DateTime, Utc};
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct DirStats {
    pub bytes: u128,
    pub files: u64,
    pub dirs: u64,
}

/// Snapshot of one entry's metadata, taken at walk time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mode: u32,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
    pub(crate) extension: String,
}

impl FileInfo {
    /// Extension derived from `name`, including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub path: PathBuf,
    pub info: FileInfo,
    /// In walk-discovery order.
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        self.info.is_dir
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }
}

/// A walked directory hierarchy. Nodes live in an arena; `parent` and
/// `children` are indices into it.
#[derive(Debug, Clone)]
pub struct Tree {
    root: NodeId,
    nodes: Vec<TreeNode>,
}

impl Tree {
    pub(crate) fn from_parts(root: NodeId, nodes: Vec<TreeNode>) -> Self {
        Tree { root, nodes }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &TreeNode {
        &self.nodes[self.root.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in walk order.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn parent(&self, id: NodeId) -> Option<&TreeNode> {
        self.get(id)?.parent.and_then(|p| self.get(p))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |c| self.get(*c))
    }

    /// Walks `parent` links upward, starting with the node's own parent.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|n| n.parent),
        }
    }

    /// Looks a path up by descending from the root one component at a time.
    pub fn find(&self, path: &Path) -> Option<&TreeNode> {
        let root = self.root_node();
        let rel = path.strip_prefix(&root.path).ok()?;
        let mut cur = root;
        for component in rel.components() {
            let name = component.as_os_str();
            cur = self
                .children(cur.id)
                .find(|c| c.path.file_name() == Some(name))?;
        }
        Some(cur)
    }

    /// Totals for everything below `id`; the node itself is not counted.
    pub fn stats(&self, id: NodeId) -> DirStats {
        let mut stats = DirStats::default();
        let mut stack: Vec<NodeId> = match self.get(id) {
            Some(n) => n.children.clone(),
            None => return stats,
        };
        while let Some(cur) = stack.pop() {
            let Some(node) = self.get(cur) else { continue };
            if node.is_dir() {
                stats.dirs += 1;
                stack.extend(node.children.iter().copied());
            } else {
                stats.files += 1;
                stats.bytes = stats.bytes.saturating_add(node.info.size as u128);
            }
        }
        stats
    }

    /// Serializable view of the subtree starting at `id`.
    pub fn subtree(&self, id: NodeId) -> Subtree<'_> {
        Subtree { tree: self, id }
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.get(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}

/// Nested `{ path, info, children }` form of a node. The parent link is
/// left out.
#[derive(Clone, Copy)]
pub struct Subtree<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl Serialize for Subtree<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self
            .tree
            .get(self.id)
            .ok_or_else(|| <S::Error as serde::ser::Error>::custom("node id out of range"))?;
        let mut s = serializer.serialize_struct("Node", 3)?;
        s.serialize_field("path", &node.path)?;
        s.serialize_field("info", &node.info)?;
        s.serialize_field(
            "children",
            &ChildList {
                tree: self.tree,
                ids: &node.children,
            },
        )?;
        s.end()
    }
}

struct ChildList<'a> {
    tree: &'a Tree,
    ids: &'a [NodeId],
}

impl Serialize for ChildList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.ids.len()))?;
        for id in self.ids {
            seq.serialize_element(&self.tree.subtree(*id))?;
        }
        seq.end()
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.subtree(self.root).serialize(serializer)
    }
}
