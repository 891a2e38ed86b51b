//! Helpers for figuring out why a search did not find what it should have.

use crate::element::Node;
use crate::enumerators::DepthFirst;
use crate::error::Result;

/// `element` followed by its ancestors, up to the top level element.
pub fn path(element: &Node) -> Vec<Node> {
    element.ancestry()
}

/// One line per element below `element`, indented one tab per level.
pub fn text_subtree(element: &Node) -> Result<String> {
    let mut output = format!("{element}\n");
    DepthFirst::new(element).each_with_level(|node, depth| {
        output.push_str(&"\t".repeat(depth));
        output.push_str(&node.to_string());
        output.push('\n');
    })?;
    Ok(output)
}
