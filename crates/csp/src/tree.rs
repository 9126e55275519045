//! Parse tree queries.

use crate::grammar::{ParseNode, Rule};

/// Collect the nodes matching any of `targets`, depth-first and in document
/// order. `node` itself sits at depth 0; nothing deeper than `max_depth` is
/// visited. A matching node is collected and its subtree is not searched.
pub fn search<'a>(
    node: &'a ParseNode,
    targets: &[Rule],
    max_depth: usize,
    first_only: bool,
) -> Vec<&'a ParseNode> {
    let mut found = Vec::new();
    collect(node, targets, 0, max_depth, first_only, &mut found);
    found
}

fn collect<'a>(
    node: &'a ParseNode,
    targets: &[Rule],
    depth: usize,
    max_depth: usize,
    first_only: bool,
    found: &mut Vec<&'a ParseNode>,
) {
    if targets.contains(&node.rule) {
        found.push(node);
        return;
    }

    if depth >= max_depth {
        return;
    }

    for child in &node.children {
        if first_only && !found.is_empty() {
            return;
        }
        collect(child, targets, depth + 1, max_depth, first_only, found);
    }
}

/// First node matching `rule` within `max_depth`, if any.
pub fn search_single(node: &ParseNode, rule: Rule, max_depth: usize) -> Option<&ParseNode> {
    search(node, &[rule], max_depth, true).into_iter().next()
}

/// The input text matched by `node`.
///
/// `input` must be the text the tree was produced from; a node whose span
/// does not fit yields an empty string.
pub fn extract<'i>(input: &'i str, node: &ParseNode) -> &'i str {
    input.get(node.span.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::match_rule;

    fn policy_tree(input: &str) -> ParseNode {
        match_rule(Rule::serialized_policy, input).unwrap().remove(0)
    }

    #[test]
    fn test_search_preserves_document_order() {
        let input = "img-src a.com; script-src b.com; img-src c.com";
        let tree = policy_tree(input);

        let names: Vec<_> = search(&tree, &[Rule::directive_name], 2, false)
            .into_iter()
            .map(|node| extract(input, node))
            .collect();
        assert_eq!(names, vec!["img-src", "script-src", "img-src"]);
    }

    #[test]
    fn test_search_respects_depth() {
        let input = "img-src a.com";
        let tree = policy_tree(input);

        assert!(search(&tree, &[Rule::directive_name], 1, false).is_empty());
        assert_eq!(search(&tree, &[Rule::directive_name], 2, false).len(), 1);
    }

    #[test]
    fn test_search_first_only() {
        let input = "a; b; c";
        let tree = policy_tree(input);

        let found = search(&tree, &[Rule::serialized_directive], 2, true);
        assert_eq!(found.len(), 1);
        assert_eq!(extract(input, found[0]), "a");
    }

    #[test]
    fn test_search_single_absent() {
        let input = "upgrade-insecure-requests";
        let tree = policy_tree(input);
        let directive = search_single(&tree, Rule::serialized_directive, 2).unwrap();

        assert!(search_single(directive, Rule::directive_value, 1).is_none());
        assert_eq!(
            extract(input, search_single(directive, Rule::directive_name, 1).unwrap()),
            "upgrade-insecure-requests"
        );
    }
}
