//! Text output for evaluated templates

use std::borrow::Cow;

use crate::document::Node;

/// A piece of output produced by the evaluator
///
/// Literal template text is borrowed from the parsed template; interpolated
/// values are owned.
pub type Fragment<'t> = Cow<'t, str>;

/// Placeholder written for a null value
pub const NO_VALUE: &str = "<no value>";

/// Convert a value to the text written for `{{ expr }}`
///
/// Scalars use their display form, null renders as `<no value>`, and
/// mappings and sequences render as compact JSON.
pub fn value_text(node: &Node) -> String {
    match node {
        Node::Scalar(scalar) => scalar.to_string(),
        Node::Null => NO_VALUE.to_string(),
        Node::Mapping(_) | Node::Sequence(_) => node.to_json().to_string(),
    }
}

/// Join fragments in order with no separators
pub fn concat<'t>(fragments: impl IntoIterator<Item = Fragment<'t>>) -> String {
    let mut output = String::new();
    for fragment in fragments {
        output.push_str(&fragment);
    }
    output
}
