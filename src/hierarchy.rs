//! Hierarchy normalization and depth annotation
//!
//! Both transforms copy the input: the caller's records are never modified.
//! Every walk uses an explicit stack, so arbitrarily deep inputs cannot
//! exhaust the call stack.

use std::collections::HashMap;

use crate::config::DataStructure;
use crate::types::{IdKey, Record, Value};

/// A record with its ordered children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
    pub record: Record,
    pub items: Vec<TreeNode>,
}

// Children are released iteratively so deep trees cannot overflow on drop
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.items);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.items);
        }
    }
}

impl TreeNode {
    pub fn new(record: Record) -> Self {
        TreeNode {
            record,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<TreeNode>) -> Self {
        self.items = items;
        self
    }
}

/// A tree node stamped with its zero-based depth
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedNode {
    pub record: Record,
    pub depth: u32,
    pub items: Vec<AnnotatedNode>,
}

impl Drop for AnnotatedNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.items);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.items);
        }
    }
}

impl AnnotatedNode {
    pub fn has_children(&self) -> bool {
        !self.items.is_empty()
    }
}

/// Outcome of a normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Input records that appear at least once in the tree
    pub placed: usize,
    /// Input records never reached from a root
    pub dropped: usize,
}

/// Builds a uniform tree out of flat or nested records
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    pub structure: DataStructure,
    pub root_value: &'a Value,
    pub parent_field: &'a str,
    pub key_field: &'a str,
    pub items_field: &'a str,
}

impl<'a> Normalizer<'a> {
    /// Normalize records and report how many were left out
    pub fn normalize(&self, records: &[Record]) -> (Vec<TreeNode>, NormalizeReport) {
        match self.structure {
            DataStructure::Plain => self.build_from_plain(records),
            DataStructure::Tree => self.build_from_nested(records),
        }
    }

    fn build_from_plain(&self, records: &[Record]) -> (Vec<TreeNode>, NormalizeReport) {
        let mut by_parent: HashMap<IdKey, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            if let Some(key) = record.get(self.parent_field).and_then(Value::id_key) {
                by_parent.entry(key).or_default().push(idx);
            }
        }

        let mut on_path = vec![false; records.len()];
        let mut placed = vec![false; records.len()];
        let mut roots = Vec::new();

        for &root in children_of(&by_parent, self.root_value.id_key()) {
            on_path[root] = true;
            placed[root] = true;
            let mut stack = vec![PlainFrame {
                record: root,
                children: self.children_of_record(&by_parent, &records[root]),
                next: 0,
                built: Vec::new(),
            }];

            while let Some(top) = stack.last_mut() {
                let children = top.children;
                if let Some(&child) = children.get(top.next) {
                    top.next += 1;
                    // A record already on the ancestor path would close a cycle
                    if on_path[child] {
                        continue;
                    }
                    on_path[child] = true;
                    placed[child] = true;
                    let children = self.children_of_record(&by_parent, &records[child]);
                    stack.push(PlainFrame {
                        record: child,
                        children,
                        next: 0,
                        built: Vec::new(),
                    });
                    continue;
                }

                let Some(frame) = stack.pop() else { break };
                on_path[frame.record] = false;
                let node = TreeNode {
                    record: records[frame.record].clone(),
                    items: frame.built,
                };
                match stack.last_mut() {
                    Some(parent) => parent.built.push(node),
                    None => roots.push(node),
                }
            }
        }

        let placed = placed.iter().filter(|p| **p).count();
        let report = NormalizeReport {
            placed,
            dropped: records.len() - placed,
        };
        (roots, report)
    }

    fn children_of_record<'m>(
        &self,
        by_parent: &'m HashMap<IdKey, Vec<usize>>,
        record: &Record,
    ) -> &'m [usize] {
        children_of(by_parent, record.get(self.key_field).and_then(Value::id_key))
    }

    fn build_from_nested(&self, records: &[Record]) -> (Vec<TreeNode>, NormalizeReport) {
        let mut roots = Vec::new();
        let mut placed = 0;

        for root in records {
            let (record, children) = self.detach_items(root);
            placed += 1;
            let mut stack = vec![NestedFrame {
                record,
                children,
                next: 0,
                built: Vec::new(),
            }];

            while let Some(top) = stack.last_mut() {
                let children = top.children;
                if let Some(child) = children.get(top.next) {
                    top.next += 1;
                    let (record, children) = self.detach_items(child);
                    placed += 1;
                    stack.push(NestedFrame {
                        record,
                        children,
                        next: 0,
                        built: Vec::new(),
                    });
                    continue;
                }

                let Some(frame) = stack.pop() else { break };
                let node = TreeNode {
                    record: frame.record,
                    items: frame.built,
                };
                match stack.last_mut() {
                    Some(parent) => parent.built.push(node),
                    None => roots.push(node),
                }
            }
        }

        let report = NormalizeReport { placed, dropped: 0 };
        (roots, report)
    }

    /// Copy a record without its items field and borrow its children
    ///
    /// An items field holding anything other than records counts as empty.
    fn detach_items<'r>(&self, record: &'r Record) -> (Record, &'r [Record]) {
        let children = match record.get(self.items_field) {
            Some(Value::Records(items)) => items.as_slice(),
            _ => &[],
        };
        let own = record
            .iter()
            .filter(|(field, _)| field.as_str() != self.items_field)
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        (own, children)
    }
}

struct PlainFrame<'m> {
    record: usize,
    children: &'m [usize],
    next: usize,
    built: Vec<TreeNode>,
}

struct NestedFrame<'r> {
    record: Record,
    children: &'r [Record],
    next: usize,
    built: Vec<TreeNode>,
}

fn children_of(by_parent: &HashMap<IdKey, Vec<usize>>, key: Option<IdKey>) -> &[usize] {
    key.and_then(|k| by_parent.get(&k))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Convert records into a tree
///
/// In [`DataStructure::Plain`] mode a record is a child of `id` when
/// `record[parent_field] == id`; roots are the records whose parent equals
/// `root_value`. Records that are never reached are dropped silently. In
/// [`DataStructure::Tree`] mode the nested `items` field is used as is.
pub fn normalize(
    records: &[Record],
    structure: DataStructure,
    root_value: &Value,
    parent_field: &str,
    key_field: &str,
) -> Vec<TreeNode> {
    let normalizer = Normalizer {
        structure,
        root_value,
        parent_field,
        key_field,
        items_field: "items",
    };
    normalizer.normalize(records).0
}

/// Stamp every node with its depth, starting at `depth`
///
/// Returns fresh nodes; the input tree is left untouched.
pub fn annotate(nodes: &[TreeNode], depth: u32) -> Vec<AnnotatedNode> {
    struct Frame<'n> {
        node: &'n TreeNode,
        depth: u32,
        next: usize,
        built: Vec<AnnotatedNode>,
    }

    let mut result = Vec::with_capacity(nodes.len());
    for root in nodes {
        let mut stack = vec![Frame {
            node: root,
            depth,
            next: 0,
            built: Vec::with_capacity(root.items.len()),
        }];

        while let Some(top) = stack.last_mut() {
            let node = top.node;
            if let Some(child) = node.items.get(top.next) {
                top.next += 1;
                let child_depth = top.depth + 1;
                stack.push(Frame {
                    node: child,
                    depth: child_depth,
                    next: 0,
                    built: Vec::with_capacity(child.items.len()),
                });
                continue;
            }

            let Some(frame) = stack.pop() else { break };
            let annotated = AnnotatedNode {
                record: frame.node.record.clone(),
                depth: frame.depth,
                items: frame.built,
            };
            match stack.last_mut() {
                Some(parent) => parent.built.push(annotated),
                None => result.push(annotated),
            }
        }
    }
    result
}

/// Pre-order iterator over an annotated forest
///
/// Yields a parent, then its whole subtree, before the parent's next sibling.
pub struct PreOrder<'a> {
    stack: Vec<std::slice::Iter<'a, AnnotatedNode>>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a AnnotatedNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(node) => {
                    if node.has_children() {
                        self.stack.push(node.items.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Walk `nodes` in pre-order
pub fn preorder(nodes: &[AnnotatedNode]) -> PreOrder<'_> {
    PreOrder {
        stack: vec![nodes.iter()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record;

    fn flat(id: i64, parent: i64, name: &str) -> Record {
        record([
            ("id", Value::Int(id)),
            ("parent", Value::Int(parent)),
            ("name", Value::from(name)),
        ])
    }

    fn plain(records: &[Record]) -> (Vec<TreeNode>, NormalizeReport) {
        let root = Value::Int(0);
        Normalizer {
            structure: DataStructure::Plain,
            root_value: &root,
            parent_field: "parent",
            key_field: "id",
            items_field: "items",
        }
        .normalize(records)
    }

    fn names(nodes: &[AnnotatedNode]) -> Vec<(String, u32)> {
        preorder(nodes)
            .map(|n| (n.record["name"].as_string(), n.depth))
            .collect()
    }

    fn strip(nodes: &[AnnotatedNode]) -> Vec<TreeNode> {
        nodes
            .iter()
            .map(|n| TreeNode::new(n.record.clone()).with_items(strip(&n.items)))
            .collect()
    }

    #[test]
    fn test_plain_scenario() {
        let records = vec![flat(1, 0, "A"), flat(2, 1, "B"), flat(3, 1, "C")];
        let (tree, report) = plain(&records);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].items.len(), 2);
        assert_eq!(report, NormalizeReport { placed: 3, dropped: 0 });

        let annotated = annotate(&tree, 0);
        assert_eq!(
            names(&annotated),
            vec![("A".into(), 0), ("B".into(), 1), ("C".into(), 1)]
        );
    }

    #[test]
    fn test_plain_preserves_sibling_order() {
        let records = vec![
            flat(5, 0, "first"),
            flat(9, 5, "x"),
            flat(2, 0, "second"),
            flat(7, 5, "y"),
            flat(1, 0, "third"),
        ];
        let (tree, _) = plain(&records);
        let annotated = annotate(&tree, 0);

        let order: Vec<_> = names(&annotated).into_iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["first", "x", "y", "second", "third"]);
    }

    #[test]
    fn test_plain_drops_unreachable_and_cycles() {
        let mut missing_parent = flat(10, 0, "orphan");
        missing_parent.shift_remove("parent");

        let records = vec![
            flat(1, 0, "A"),
            flat(2, 99, "dangling"),
            flat(3, 4, "cycle-a"),
            flat(4, 3, "cycle-b"),
            missing_parent,
        ];
        let (tree, report) = plain(&records);

        assert_eq!(tree.len(), 1);
        assert!(tree[0].items.is_empty());
        assert_eq!(report, NormalizeReport { placed: 1, dropped: 4 });
    }

    #[test]
    fn test_plain_cycle_through_root_terminates() {
        // Duplicate key 1 makes "loop" its own grandparent
        let records = vec![flat(1, 0, "A"), flat(2, 1, "B"), flat(1, 2, "loop")];
        let (tree, report) = plain(&records);
        let annotated = annotate(&tree, 0);

        assert_eq!(
            names(&annotated),
            vec![("A".into(), 0), ("B".into(), 1), ("loop".into(), 2)]
        );
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn test_plain_matches_numbers_across_types() {
        let records = vec![
            record([("id", Value::Float(1.0)), ("parent", Value::Int(0))]),
            record([("id", Value::Int(2)), ("parent", Value::Int(1))]),
            record([("id", Value::Int(3)), ("parent", Value::from("1"))]),
        ];
        let (tree, report) = plain(&records);

        assert_eq!(tree[0].items.len(), 1);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn test_plain_null_root() {
        let records = vec![
            record([("id", Value::Int(1)), ("parentId", Value::Null)]),
            record([("id", Value::Int(2)), ("parentId", Value::Int(1))]),
        ];
        let tree = normalize(&records, DataStructure::Plain, &Value::Null, "parentId", "id");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].items.len(), 1);
    }

    #[test]
    fn test_nested_scenario() {
        let leaf = record([("name", Value::from("Y")), ("items", Value::Records(vec![]))]);
        let records = vec![record([
            ("name", Value::from("X")),
            ("items", Value::Records(vec![leaf])),
        ])];

        let tree = normalize(&records, DataStructure::Tree, &Value::Int(0), "parentId", "id");
        assert!(!tree[0].record.contains_key("items"));

        let annotated = annotate(&tree, 0);
        assert_eq!(names(&annotated), vec![("X".into(), 0), ("Y".into(), 1)]);
        assert!(!annotated[0].items[0].has_children());
    }

    #[test]
    fn test_nested_missing_items_is_leaf() {
        let records = vec![
            record([("name", "solo")]),
            record([("name", Value::from("odd")), ("items", Value::Null)]),
        ];
        let tree = normalize(&records, DataStructure::Tree, &Value::Int(0), "parentId", "id");
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|n| n.items.is_empty()));
    }

    #[test]
    fn test_annotate_depth_invariant() {
        let tree = vec![TreeNode::new(record([("name", "r")])).with_items(vec![
            TreeNode::new(record([("name", "a")]))
                .with_items(vec![TreeNode::new(record([("name", "a1")]))]),
            TreeNode::new(record([("name", "b")])),
        ])];
        let annotated = annotate(&tree, 0);

        fn check(nodes: &[AnnotatedNode], expected: u32) {
            for node in nodes {
                assert_eq!(node.depth, expected);
                check(&node.items, expected + 1);
            }
        }
        check(&annotated, 0);

        // Annotating again after stripping yields the same depths
        let again = annotate(&strip(&annotated), 0);
        assert_eq!(again, annotated);

        assert!(annotate(&[], 0).is_empty());
        assert_eq!(annotate(&tree, 3)[0].items[0].depth, 4);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 100_000;
        let records: Vec<Record> = (1..=depth).map(|i| flat(i, i - 1, "n")).collect();
        let (tree, report) = plain(&records);
        assert_eq!(report.placed, depth as usize);

        let annotated = annotate(&tree, 0);
        let last = preorder(&annotated).last().map(|n| n.depth);
        assert_eq!(last, Some(depth as u32 - 1));
    }
}
