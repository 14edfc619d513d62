//! Category hierarchy traversal over an in-memory snapshot.
//!
//! Children are never stored on a node. They are derived once per snapshot by grouping the
//! nodes on `parent_id`, and every traversal reads only that grouping.

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::Serialize;

pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Level assigned to a node that has no parent.
pub const ROOT_LEVEL: i32 = 1;

pub trait HierarchyNode {
	fn node_id(&self) -> i64;

	fn parent_id(&self) -> Option<i64>;
}
impl HierarchyNode for (i64, Option<i64>) {
	fn node_id(&self) -> i64 {
		self.0
	}

	fn parent_id(&self) -> Option<i64> {
		self.1
	}
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HierarchyError {
	#[error("Cannot make entity {id} its own parent.")]
	SelfParent { id: i64 },
	#[error("Cannot move entity {id} under its own descendant {parent_id}.")]
	Cycle { id: i64, parent_id: i64 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeNode<T> {
	#[serde(flatten)]
	pub node: T,
	pub children: Vec<TreeNode<T>>,
}

/// Adjacency view of a flat node list, keyed by parent (`None` holds the roots).
pub struct ChildIndex<'a, T> {
	by_parent: HashMap<Option<i64>, Vec<&'a T>>,
	by_id: HashMap<i64, &'a T>,
}
impl<'a, T> ChildIndex<'a, T>
where
	T: HierarchyNode,
{
	pub fn new(nodes: &'a [T]) -> Self {
		let mut by_parent: HashMap<Option<i64>, Vec<&'a T>> = HashMap::new();
		let mut by_id = HashMap::with_capacity(nodes.len());

		for node in nodes {
			by_parent.entry(node.parent_id()).or_default().push(node);
			by_id.insert(node.node_id(), node);
		}

		Self { by_parent, by_id }
	}

	pub fn get(&self, id: i64) -> Option<&'a T> {
		self.by_id.get(&id).copied()
	}

	pub fn children_of(&self, parent_id: Option<i64>) -> &[&'a T] {
		self.by_parent.get(&parent_id).map(Vec::as_slice).unwrap_or_default()
	}

	/// Breadth-first closure of `root_id`, the root itself included at level 1.
	///
	/// Nodes at `max_depth` are kept but not expanded. An unknown root yields an empty set.
	pub fn descendants(&self, root_id: i64, max_depth: u32) -> BTreeSet<i64> {
		let mut seen = BTreeSet::new();

		if max_depth == 0 || !self.by_id.contains_key(&root_id) {
			return seen;
		}

		let mut queue = VecDeque::from([(root_id, 1_u32)]);

		seen.insert(root_id);

		while let Some((id, level)) = queue.pop_front() {
			if level >= max_depth {
				continue;
			}

			for child in self.children_of(Some(id)) {
				let child_id = child.node_id();

				if seen.insert(child_id) {
					queue.push_back((child_id, level + 1));
				}
			}
		}

		seen
	}

	/// Whether `ancestor_id` appears on the parent chain of `id` (or is `id` itself).
	pub fn is_within(&self, id: i64, ancestor_id: i64) -> bool {
		let mut cursor = Some(id);
		let mut steps = 0;

		while let Some(current) = cursor {
			if current == ancestor_id {
				return true;
			}
			// No acyclic chain is longer than the node count.
			if steps > self.by_id.len() {
				return false;
			}

			steps += 1;
			cursor = self.get(current).and_then(|node| node.parent_id());
		}

		false
	}

	/// Rejects attaching `id` below `parent_id` when that would close a loop.
	pub fn check_reparent(&self, id: i64, parent_id: Option<i64>) -> Result<(), HierarchyError> {
		let Some(parent_id) = parent_id else {
			return Ok(());
		};

		if parent_id == id {
			return Err(HierarchyError::SelfParent { id });
		}
		if self.is_within(parent_id, id) {
			return Err(HierarchyError::Cycle { id, parent_id });
		}

		Ok(())
	}

	/// Levels for `root_id` and its whole subtree when the root sits at `root_level`.
	pub fn relevel(&self, root_id: i64, root_level: i32) -> Vec<(i64, i32)> {
		let mut out = Vec::new();
		let mut seen = BTreeSet::from([root_id]);
		let mut queue = VecDeque::from([(root_id, root_level)]);

		while let Some((id, level)) = queue.pop_front() {
			out.push((id, level));

			for child in self.children_of(Some(id)) {
				let child_id = child.node_id();

				if seen.insert(child_id) {
					queue.push_back((child_id, level + 1));
				}
			}
		}

		out
	}
}
impl<T> ChildIndex<'_, T>
where
	T: HierarchyNode + Clone,
{
	/// Nested view of every root, truncating children below `max_depth`.
	pub fn tree(&self, max_depth: u32) -> Vec<TreeNode<T>> {
		self.emit(None, 1, max_depth)
	}

	/// Nested view rooted at a single node, which counts as level 1.
	pub fn subtree(&self, root_id: i64, max_depth: u32) -> Option<TreeNode<T>> {
		let node = self.get(root_id)?;

		Some(TreeNode { node: node.clone(), children: self.emit(Some(root_id), 2, max_depth) })
	}

	fn emit(&self, parent_id: Option<i64>, level: u32, max_depth: u32) -> Vec<TreeNode<T>> {
		if level > max_depth {
			return Vec::new();
		}

		self.children_of(parent_id)
			.iter()
			.map(|node| TreeNode {
				node: (*node).clone(),
				children: self.emit(Some(node.node_id()), level + 1, max_depth),
			})
			.collect()
	}
}

pub fn resolve_descendants<T>(nodes: &[T], root_id: i64, max_depth: u32) -> BTreeSet<i64>
where
	T: HierarchyNode,
{
	ChildIndex::new(nodes).descendants(root_id, max_depth)
}

pub fn build_tree<T>(nodes: &[T], max_depth: u32) -> Vec<TreeNode<T>>
where
	T: HierarchyNode + Clone,
{
	ChildIndex::new(nodes).tree(max_depth)
}

pub fn level_under(parent_level: Option<i32>) -> i32 {
	parent_level.map_or(ROOT_LEVEL, |level| level + 1)
}
