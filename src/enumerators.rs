//! Lazy walks over the elements below a root.
//!
//! Neither enumerator yields the root itself, and children are only fetched
//! when the walk actually reaches the node that owns them. A malformed
//! children list is yielded as an error once, after which the walk is over.

use std::collections::VecDeque;

use tracing::warn;

use crate::element::Node;
use crate::error::Result;

// ------------- BreadthFirst -------------
/// Level order, left to right.
pub struct BreadthFirst {
    // nodes whose children have not been fetched yet
    queue: VecDeque<Node>,
    // fetched children waiting to be yielded
    batch: VecDeque<Node>,
    done: bool,
}

impl BreadthFirst {
    pub fn new(root: &Node) -> Self {
        Self {
            queue: VecDeque::from([root.clone()]),
            batch: VecDeque::new(),
            done: false,
        }
    }

    /// The first node accepted by `accept`.
    ///
    /// Nothing is pulled from the tree once a node is accepted; pulls may be
    /// round trips to another process and some applications react to them.
    pub fn find<P>(&mut self, mut accept: P) -> Result<Option<Node>>
    where
        P: FnMut(&Node) -> Result<bool>,
    {
        while let Some(node) = self.next() {
            let node = node?;
            if accept(&node)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

impl Iterator for BreadthFirst {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some(child) = self.batch.pop_front() {
                // leaves are yielded but never expanded
                if child.has_children_relation() {
                    self.queue.push_back(child.clone());
                }
                return Some(Ok(child));
            }
            let Some(parent) = self.queue.pop_front() else {
                self.done = true;
                break;
            };
            match parent.children() {
                Ok(children) => self.batch.extend(children),
                Err(e) => {
                    warn!(element = %parent.handle(), error = %e, "abandoning breadth first walk");
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

// ------------- DepthFirst -------------
/// Pre-order, children in document order.
pub struct DepthFirst {
    root: Node,
    stack: Vec<Node>,
    // the node yielded last, expanded on the following pull
    expand: Option<Node>,
    done: bool,
}

impl DepthFirst {
    pub fn new(root: &Node) -> Self {
        Self {
            root: root.clone(),
            stack: Vec::new(),
            expand: Some(root.clone()),
            done: false,
        }
    }

    /// Same contract as [`BreadthFirst::find`].
    pub fn find<P>(&mut self, mut accept: P) -> Result<Option<Node>>
    where
        P: FnMut(&Node) -> Result<bool>,
    {
        while let Some(node) = self.next() {
            let node = node?;
            if accept(&node)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// Visit every node below the root together with its depth (children of
    /// the root are at depth 1). Meant for dumping a subtree.
    pub fn each_with_level<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Node, usize),
    {
        for child in self.root.children()? {
            recursive_each_with_level(&child, 1, &mut visit)?;
        }
        Ok(())
    }
}

fn recursive_each_with_level<F>(node: &Node, depth: usize, visit: &mut F) -> Result<()>
where
    F: FnMut(&Node, usize),
{
    visit(node, depth);
    for child in node.children()? {
        recursive_each_with_level(&child, depth + 1, visit)?;
    }
    Ok(())
}

impl Iterator for DepthFirst {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(node) = self.expand.take() {
            match node.children() {
                // reversed so that popping follows document order
                Ok(children) => self.stack.extend(children.into_iter().rev()),
                Err(e) => {
                    warn!(element = %node.handle(), error = %e, "abandoning depth first walk");
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        match self.stack.pop() {
            Some(node) => {
                self.expand = Some(node.clone());
                Some(Ok(node))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
