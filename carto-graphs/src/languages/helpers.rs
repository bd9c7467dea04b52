use tree_sitter::Node;

/// Extract the source text for a tree-sitter node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Find a child by field name.
pub fn child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Find the first child with a specific kind.
pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| child.kind() == kind)
}

/// Convert a tree-sitter node to a `TextRange`.
pub fn node_range(node: Node<'_>) -> crate::TextRange {
    node.range().into()
}

/// Collect the text of every leaf identifier-like node under `node`, in tree
/// order. Used to name destructuring patterns (`const {a, b} = ...`).
pub fn collect_identifiers(node: Node<'_>, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    collect_identifiers_into(node, source, &mut names);
    names
}

fn collect_identifiers_into(node: Node<'_>, source: &str, names: &mut Vec<String>) {
    // Pattern-element kinds vary per grammar (`identifier`,
    // `shorthand_property_identifier_pattern`, ...); all carry "identifier".
    if node.child_count() == 0 && node.kind().contains("identifier") {
        names.push(node_text(node, source).to_string());
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_identifiers_into(child, source, names);
    }
}

/// Strip matching string quotes from a literal's text.
pub fn strip_quotes(text: &str) -> &str {
    let t = text.trim();
    for q in ["\"", "'", "`"] {
        if let Some(inner) = t.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    t
}

/// Deterministic string hash for content keys. Uses the stdlib's fixed-key
/// `DefaultHasher` so identical input always produces the identical digest.
pub fn hash_string(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_all_quote_styles() {
        assert_eq!(strip_quotes("\"./util\""), "./util");
        assert_eq!(strip_quotes("'./util'"), "./util");
        assert_eq!(strip_quotes("`./util`"), "./util");
        assert_eq!(strip_quotes("bare"), "bare");
    }

    proptest! {
        #[test]
        fn hash_is_deterministic(content in ".{0,256}") {
            prop_assert_eq!(hash_string(&content), hash_string(&content));
        }

        #[test]
        fn quoted_text_round_trips(inner in "[a-z./_-]{0,32}") {
            let quoted = format!("\"{inner}\"");
            prop_assert_eq!(strip_quotes(&quoted), inner.as_str());
        }
    }
}
