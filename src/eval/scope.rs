//! Variable environment for one evaluation pass

use std::borrow::Cow;
use std::collections::HashMap;

use crate::document::Node;

/// A value seen by the evaluator
///
/// Values taken from the document are borrowed; values made by the template
/// itself (literals, comparison results) are owned.
pub type Value<'d> = Cow<'d, Node>;

/// Name of the variable bound to the root document
pub const ROOT_VARIABLE: &str = "$";

/// Current value `.` plus `$`-prefixed variables
///
/// Variables live for the whole template: a declaration inside a block stays
/// visible after the block ends.
#[derive(Debug, Clone)]
pub struct Scope<'d> {
    dot: Value<'d>,
    vars: HashMap<String, Value<'d>>,
}

impl<'d> Scope<'d> {
    /// Start a scope with `.` and `$` bound to the root document
    pub fn new(root: &'d Node) -> Self {
        let mut vars = HashMap::new();
        vars.insert(ROOT_VARIABLE.to_string(), Cow::Borrowed(root));
        Self {
            dot: Cow::Borrowed(root),
            vars,
        }
    }

    pub fn dot(&self) -> &Value<'d> {
        &self.dot
    }

    /// Rebind `.` and hand back the previous value
    pub fn replace_dot(&mut self, value: Value<'d>) -> Value<'d> {
        std::mem::replace(&mut self.dot, value)
    }

    pub fn get(&self, name: &str) -> Option<&Value<'d>> {
        self.vars.get(name)
    }

    /// Bind `name`, overwriting any previous binding
    pub fn declare(&mut self, name: &str, value: Value<'d>) {
        self.vars.insert(name.to_string(), value);
    }

    /// Update an existing binding; returns false if `name` was never declared
    pub fn assign(&mut self, name: &str, value: Value<'d>) -> bool {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
