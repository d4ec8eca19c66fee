//! Node helpers for walking the results DOM.

use snafu::OptionExt;

use roxmltree::Node;

use crate::results::*;

/// All descendant elements with the given tag name, in document order.
///
/// The results exports nest precinct rows under intermediate grouping
/// elements (one per reporting channel), so descendant traversal is used
/// rather than direct children.
pub fn descendants_with_tag<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// An attribute that must be present on the element.
pub fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> ResultsResult<&'a str> {
    node.attribute(name).context(MissingAttributeSnafu {
        tag: node.tag_name().name(),
        attribute: name,
    })
}
