//! Path Evaluation and Generation
//!
//! Evaluation works over any [`DocumentAccess`], so the same compiled path
//! can be run against the arena tree or a token table view.

use std::collections::{HashMap, HashSet};

use super::parser::{Axis, NodeTest, PathExpr, Predicate};
use crate::dom::{DocumentAccess, NodeId};

/// Every element matched by `path`, in document order
pub fn select_all<D: DocumentAccess>(doc: &D, path: &PathExpr) -> Vec<NodeId> {
    let Some(root) = doc.root_element_id() else {
        return Vec::new();
    };

    // `None` stands for the document node above the root
    let mut context: Vec<Option<NodeId>> = vec![None];
    for step in &path.steps {
        let mut next = Vec::new();
        let mut seen = HashSet::new();
        for &node in &context {
            let parents = match step.axis {
                Axis::Child => vec![node],
                Axis::Descendant => {
                    let mut all = vec![node];
                    match node {
                        Some(id) => all.extend(doc.descendant_elements_vec(id).into_iter().map(Some)),
                        None => {
                            all.push(Some(root));
                            all.extend(doc.descendant_elements_vec(root).into_iter().map(Some));
                        }
                    }
                    all
                }
            };

            for parent in parents {
                let children = match parent {
                    Some(id) => doc.child_elements_vec(id),
                    None => vec![root],
                };
                let candidates: Vec<NodeId> = children
                    .into_iter()
                    .filter(|&child| matches_test(doc, child, &step.node_test))
                    .collect();
                for id in apply_predicates(doc, candidates, &step.predicates) {
                    if seen.insert(id) {
                        next.push(id);
                    }
                }
            }
        }
        context = next.into_iter().map(Some).collect();
    }

    let mut matched: Vec<NodeId> = context.into_iter().flatten().collect();
    if matched.len() > 1 {
        let order: HashMap<NodeId, usize> = std::iter::once(root)
            .chain(doc.descendant_elements_vec(root))
            .enumerate()
            .map(|(index, id)| (id, index))
            .collect();
        matched.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    }
    matched
}

/// First element matched by `path` in document order
pub fn select_first<D: DocumentAccess>(doc: &D, path: &PathExpr) -> Option<NodeId> {
    select_all(doc, path).into_iter().next()
}

fn matches_test<D: DocumentAccess>(doc: &D, id: NodeId, test: &NodeTest) -> bool {
    match test {
        NodeTest::Any => true,
        NodeTest::Name(name) => doc.node_name(id) == Some(name.as_str()),
    }
}

fn apply_predicates<D: DocumentAccess>(doc: &D, mut nodes: Vec<NodeId>, predicates: &[Predicate]) -> Vec<NodeId> {
    for predicate in predicates {
        nodes = match predicate {
            Predicate::Position(n) => nodes.get(n - 1).map(|&id| vec![id]).unwrap_or_default(),
            Predicate::AttributeEquals { name, value } => nodes
                .into_iter()
                .filter(|&id| doc.get_attribute(id, name) == Some(value.as_str()))
                .collect(),
        };
    }
    nodes
}

/// Path addressing `element`.
///
/// Walks up from `element`; the first ancestor-or-self carrying an `xml:id`
/// anchors the path as `//tag[@xml:id='..']`, every other level is written
/// as `/tag[n]` with `n` counting same-named siblings.
pub fn path_to<D: DocumentAccess>(doc: &D, element: NodeId) -> String {
    let mut segments = Vec::new();
    let mut anchored = false;
    let mut current = Some(element);

    while let Some(id) = current {
        let name = doc.node_name(id).unwrap_or_default();
        if let Some(xml_id) = doc.get_attribute(id, "xml:id") {
            let quote = if xml_id.contains('\'') { '"' } else { '\'' };
            segments.push(format!("{name}[@xml:id={quote}{xml_id}{quote}]"));
            anchored = true;
            break;
        }

        let parent = doc.parent_element(id);
        let siblings = match parent {
            Some(p) => doc.child_elements_vec(p),
            None => vec![id],
        };
        let index = 1 + siblings
            .iter()
            .take_while(|&&s| s != id)
            .filter(|&&s| doc.node_name(s) == Some(name))
            .count();
        segments.push(format!("{name}[{index}]"));
        current = parent;
    }

    let mut path = String::from(if anchored { "/" } else { "" });
    for segment in segments.iter().rev() {
        path.push('/');
        path.push_str(segment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::pointer::parse_path;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const DOC: &str = r#"<TEI><text><body><div><p n="a">1</p><p n="b">2</p><div><p n="c">3</p></div></div><p xml:id="last">4</p></body></text></TEI>"#;

    fn labels(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| doc.text_content(id))
            .collect()
    }

    #[rstest]
    #[case("/TEI[1]/text[1]/body[1]/div[1]/p[2]", vec!["2"])]
    #[case("//p", vec!["1", "2", "3", "4"])]
    #[case("//p[1]", vec!["1", "3", "4"])]
    #[case("//div/p", vec!["1", "2", "3"])]
    #[case("//p[@n='c']", vec!["3"])]
    #[case("//p[@xml:id='last']", vec!["4"])]
    #[case("/TEI/*/*/p", vec!["4"])]
    #[case("/text", vec![])]
    fn test_select(#[case] path: &str, #[case] expected: Vec<&str>) {
        let doc = Document::parse(DOC).unwrap();
        let found = select_all(&doc, &parse_path(path).unwrap());
        assert_eq!(labels(&doc, &found), expected);
    }

    #[test]
    fn test_select_first_in_document_order() {
        let doc = Document::parse("<r><a><b>x</b></a><b>y</b></r>").unwrap();
        let first = select_first(&doc, &parse_path("//b").unwrap()).unwrap();
        assert_eq!(doc.text_content(first), "x");
    }

    #[test]
    fn test_path_to() {
        let doc = Document::parse(DOC).unwrap();
        let paths: Vec<String> = select_all(&doc, &parse_path("//p").unwrap())
            .into_iter()
            .map(|id| path_to(&doc, id))
            .collect();
        assert_eq!(
            paths,
            vec![
                "/TEI[1]/text[1]/body[1]/div[1]/p[1]",
                "/TEI[1]/text[1]/body[1]/div[1]/p[2]",
                "/TEI[1]/text[1]/body[1]/div[1]/div[1]/p[1]",
                "//p[@xml:id='last']",
            ]
        );
        for (path, expected) in paths.iter().zip(["1", "2", "3", "4"]) {
            let found = select_first(&doc, &parse_path(path).unwrap()).unwrap();
            assert_eq!(doc.text_content(found), expected);
        }
    }
}
