//! Hierarchy builder: turns a flat issue list into an arena-backed forest.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. Structure comes
//! only from `parent-child` edges. An issue whose parent is missing, itself, or
//! reachable only through a cycle is promoted to a root, so every issue appears
//! exactly once.

use crate::data::{compare_issues, Issue, SortDirection, SortField};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Index of a node inside a [`Forest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub issue: Issue,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub expanded: bool,
    pub depth: usize,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.issue.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Default expand state for a node at `depth`: only roots start expanded.
pub fn default_expanded(depth: usize) -> bool {
    depth == 0
}

#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    by_id: HashMap<String, NodeId>,
}

impl Forest {
    /// Build a forest from `issues`.
    ///
    /// Identical input always yields the same shape. Duplicate identifiers keep
    /// the first occurrence.
    pub fn build(issues: &[Issue]) -> Self {
        let mut unique: Vec<&Issue> = Vec::with_capacity(issues.len());
        let mut position: HashMap<&str, usize> = HashMap::with_capacity(issues.len());
        for issue in issues {
            if position.contains_key(issue.id.as_str()) {
                tracing::debug!("Ignoring duplicate issue id {}", issue.id);
                continue;
            }
            position.insert(issue.id.as_str(), unique.len());
            unique.push(issue);
        }

        // parent index -> child indices, in input order
        let mut children_of: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut has_parent = vec![false; unique.len()];
        for (idx, issue) in unique.iter().enumerate() {
            let Some(parent_id) = issue.parent_id() else {
                continue;
            };
            match position.get(parent_id) {
                Some(&parent) if parent != idx => {
                    children_of.entry(parent).or_default().push(idx);
                    has_parent[idx] = true;
                }
                Some(_) => tracing::debug!("Issue {} names itself as parent", issue.id),
                None => tracing::debug!("Issue {} has missing parent {}", issue.id, parent_id),
            }
        }

        let mut builder = Builder {
            unique: &unique,
            children_of: &children_of,
            forest: Forest::default(),
            placed: vec![false; unique.len()],
            on_path: HashSet::new(),
        };

        for idx in 0..unique.len() {
            if !has_parent[idx] {
                let root = builder.build_node(idx, 0, None);
                builder.forest.roots.push(root);
            }
        }

        // Whatever is still unplaced hangs off a parent cycle; promote the
        // first member of each cycle to a root and build beneath it.
        for idx in 0..unique.len() {
            if !builder.placed[idx] {
                tracing::debug!("Breaking parent cycle at {}", unique[idx].id);
                let root = builder.build_node(idx, 0, None);
                builder.forest.roots.push(root);
            }
        }

        builder.forest
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, issue_id: &str) -> Option<NodeId> {
        self.by_id.get(issue_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Every node in pre-order, ignoring expand state.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    /// `id` and all of its descendants in pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(id, &mut out);
        out
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            out.push(parent);
            current = self.nodes[parent.0].parent;
        }
        out
    }

    /// Siblings of `id` including itself: its parent's children, or the roots.
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.nodes[id.0].parent {
            Some(parent) => &self.nodes[parent.0].children,
            None => &self.roots,
        }
    }

    /// Set `expanded` on `id` and every descendant that has children.
    pub fn set_expanded_recursive(&mut self, id: NodeId, expanded: bool) {
        for node in self.subtree(id) {
            let node = &mut self.nodes[node.0];
            if node.has_children() {
                node.expanded = expanded;
            }
        }
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        for node in self.nodes.iter_mut().filter(|n| n.has_children()) {
            node.expanded = expanded;
        }
    }

    /// True when every descendant that has children is expanded.
    pub fn all_descendants_expanded(&self, id: NodeId) -> bool {
        self.subtree(id)
            .into_iter()
            .skip(1)
            .all(|n| !self.nodes[n.0].has_children() || self.nodes[n.0].expanded)
    }

    pub fn any_collapsed(&self) -> bool {
        self.nodes.iter().any(|n| n.has_children() && !n.expanded)
    }

    /// Sort the roots and, recursively, every sibling group.
    pub fn sort(&mut self, field: SortField, direction: SortDirection, pagerank: &HashMap<String, f64>) {
        let nodes = &self.nodes;
        let cmp = |a: &NodeId, b: &NodeId| -> Ordering {
            compare_issues(&nodes[a.0].issue, &nodes[b.0].issue, field, direction, pagerank)
        };

        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by(cmp);

        let mut sorted_children = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut children = node.children.clone();
            children.sort_by(cmp);
            sorted_children.push(children);
        }

        self.roots = roots;
        for (node, children) in self.nodes.iter_mut().zip(sorted_children) {
            node.children = children;
        }
    }
}

struct Builder<'a> {
    unique: &'a [&'a Issue],
    children_of: &'a HashMap<usize, Vec<usize>>,
    forest: Forest,
    placed: Vec<bool>,
    on_path: HashSet<usize>,
}

impl Builder<'_> {
    fn push_node(&mut self, idx: usize, depth: usize, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.forest.nodes.len());
        let issue = self.unique[idx];
        self.forest.nodes.push(TreeNode {
            issue: issue.clone(),
            children: Vec::new(),
            parent,
            expanded: default_expanded(depth),
            depth,
        });
        self.forest.by_id.insert(issue.id.clone(), id);
        self.placed[idx] = true;
        self.on_path.insert(idx);
        id
    }

    /// Depth-first build below `idx` with an explicit stack. Each frame is
    /// `(issue index, node, next child position)`; an issue sits in `on_path`
    /// exactly while its frame is on the stack.
    fn build_node(&mut self, idx: usize, depth: usize, parent: Option<NodeId>) -> NodeId {
        let root = self.push_node(idx, depth, parent);
        let mut stack: Vec<(usize, NodeId, usize)> = vec![(idx, root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (current, node, pos) = *frame;
            let next = self
                .children_of
                .get(&current)
                .and_then(|kids| kids.get(pos))
                .copied();
            match next {
                Some(child) => {
                    frame.2 += 1;
                    if self.on_path.contains(&child) || self.placed[child] {
                        continue;
                    }
                    let child_depth = self.forest.nodes[node.0].depth + 1;
                    let child_id = self.push_node(child, child_depth, Some(node));
                    self.forest.nodes[node.0].children.push(child_id);
                    stack.push((child, child_id, 0));
                }
                None => {
                    self.on_path.remove(&current);
                    stack.pop();
                }
            }
        }
        root
    }
}
