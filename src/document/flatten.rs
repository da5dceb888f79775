use crate::document::model::{Document, LayerNode};

/// Every node of the tree in pre-order, in stacking order (bottom-most first).
///
/// Groups appear before their descendants. Visibility is not considered here.
pub fn flatten_layers(doc: &Document) -> Vec<&LayerNode> {
    flatten_layers_with_depth(doc)
        .into_iter()
        .map(|(_, node)| node)
        .collect()
}

/// Like [`flatten_layers`], paired with each node's nesting depth (0 for top-level layers).
pub fn flatten_layers_with_depth(doc: &Document) -> Vec<(usize, &LayerNode)> {
    let mut out = Vec::new();
    let mut stack: Vec<(usize, &LayerNode)> = doc.children.iter().rev().map(|n| (0, n)).collect();
    while let Some((depth, node)) = stack.pop() {
        out.push((depth, node));
        stack.extend(node.children().iter().rev().map(|c| (depth + 1, c)));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/document/flatten.rs"]
mod tests;
