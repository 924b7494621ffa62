use crate::model::{NodeId, Tree, TreeNode};

impl TreeNode {
    /// An empty filter matches everything; otherwise the extension must be
    /// equal, dot included.
    pub fn matches_extension(&self, ext: &str) -> bool {
        ext.is_empty() || self.info.extension() == ext
    }
}

impl Tree {
    /// Lazily yields every non-directory below `id` whose extension matches
    /// `ext`, depth first in discovery order. `id` itself is never yielded.
    pub fn files<'a, 'e>(&'a self, id: NodeId, ext: &'e str) -> Files<'a, 'e> {
        let start = self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[]);
        Files {
            tree: self,
            ext,
            stack: vec![start.iter()],
        }
    }

    pub fn collect_files(&self, id: NodeId, ext: &str) -> Vec<&TreeNode> {
        self.files(id, ext).collect()
    }
}

/// Iterator returned by [`Tree::files`].
pub struct Files<'a, 'e> {
    tree: &'a Tree,
    ext: &'e str,
    stack: Vec<std::slice::Iter<'a, NodeId>>,
}

impl<'a> Iterator for Files<'a, '_> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let Some(id) = top.next() else {
                self.stack.pop();
                continue;
            };
            let Some(node) = self.tree.get(*id) else { continue };
            if node.is_dir() {
                self.stack.push(node.children.iter());
            } else if node.matches_extension(self.ext) {
                return Some(node);
            }
        }
    }
}
