//! Template evaluation
//!
//! Walks a parsed [`Template`] depth-first against a document, producing the
//! output fragments in order. The first failure aborts the walk; no partial
//! output is returned.

mod error;
mod scope;

pub use error::EvalError;
pub use scope::{Scope, Value, ROOT_VARIABLE};

use std::borrow::Cow;

use tracing::trace;

use crate::document::{AccessError, Node, Scalar};
use crate::parser::ast::*;
use crate::renderer::{self, Fragment};

/// A single lookup step applied to a value
enum Step<'k> {
    Field(&'k str),
    Position(i64),
}

fn lookup<'n>(node: &'n Node, step: &Step) -> Result<&'n Node, AccessError> {
    match step {
        Step::Field(name) => node.get_field(name),
        Step::Position(index) => node.get_index(*index),
    }
}

/// Apply `step`, keeping the result borrowed from the document when possible
fn project<'d>(value: Value<'d>, step: Step) -> Result<Value<'d>, AccessError> {
    match value {
        Cow::Borrowed(node) => lookup(node, &step).map(Cow::Borrowed),
        Cow::Owned(node) => lookup(&node, &step).cloned().map(Cow::Owned),
    }
}

/// Evaluator state for one render pass
pub struct Evaluator<'d, 't> {
    scope: Scope<'d>,
    fragments: Vec<Fragment<'t>>,
}

impl<'d, 't> Evaluator<'d, 't> {
    pub fn new(root: &'d Node) -> Self {
        Self {
            scope: Scope::new(root),
            fragments: Vec::new(),
        }
    }

    /// Evaluate the whole template, returning its fragments in output order
    pub fn run(mut self, template: &'t Template) -> Result<Vec<Fragment<'t>>, EvalError> {
        self.eval_body(&template.nodes)?;
        Ok(self.fragments)
    }

    fn eval_body(&mut self, body: &'t [Spanned<TemplateNode>]) -> Result<(), EvalError> {
        for node in body {
            self.eval_node(node)?;
        }
        Ok(())
    }

    fn eval_node(&mut self, node: &'t Spanned<TemplateNode>) -> Result<(), EvalError> {
        match &node.node {
            TemplateNode::Text(text) => {
                self.fragments.push(Cow::Borrowed(text.as_str()));
            }
            TemplateNode::Output(expr) => {
                let value = self.eval_expr(expr)?;
                self.fragments.push(Cow::Owned(renderer::value_text(&value)));
            }
            TemplateNode::Declare { name, value } => {
                let value = self.eval_expr(value)?;
                trace!(name = %name.node, value = %renderer::value_text(&value), "declare");
                self.scope.declare(name.node.as_str(), value);
            }
            TemplateNode::Assign { name, value } => {
                let value = self.eval_expr(value)?;
                trace!(name = %name.node, value = %renderer::value_text(&value), "assign");
                if !self.scope.assign(name.node.as_str(), value) {
                    return Err(EvalError::UndefinedVariable {
                        name: name.node.to_string(),
                        span: name.span.clone(),
                    });
                }
            }
            TemplateNode::Range(block) => self.eval_range(block)?,
            TemplateNode::If(block) => {
                if self.eval_bool(&block.test, "if")? {
                    self.eval_body(&block.then_body)?;
                } else if let Some(else_body) = &block.else_body {
                    self.eval_body(else_body)?;
                }
            }
        }
        Ok(())
    }

    fn eval_range(&mut self, block: &'t RangeBlock) -> Result<(), EvalError> {
        let source = self.eval_expr(&block.source)?;
        let items: Vec<Value<'d>> = match source {
            Cow::Borrowed(Node::Sequence(items)) => items.iter().map(Cow::Borrowed).collect(),
            Cow::Owned(Node::Sequence(items)) => items.into_iter().map(Cow::Owned).collect(),
            other => {
                return Err(EvalError::mismatch(
                    "range",
                    "sequence",
                    other.kind_name(),
                    block.source.span.clone(),
                ))
            }
        };

        if items.is_empty() {
            if let Some(else_body) = &block.else_body {
                self.eval_body(else_body)?;
            }
            return Ok(());
        }

        let saved_dot = self.scope.dot().clone();
        for (position, item) in items.into_iter().enumerate() {
            trace!(position, "range iteration");
            if let Some(index_var) = &block.index_var {
                let position = i64::try_from(position).unwrap_or(i64::MAX);
                self.scope
                    .declare(index_var.node.as_str(), Cow::Owned(Node::from(position)));
            }
            if let Some(value_var) = &block.value_var {
                self.scope.declare(value_var.node.as_str(), item.clone());
            }
            self.scope.replace_dot(item);
            self.eval_body(&block.body)?;
        }
        self.scope.replace_dot(saved_dot);
        Ok(())
    }

    fn eval_expr(&self, expr: &Spanned<Expr>) -> Result<Value<'d>, EvalError> {
        match &expr.node {
            Expr::Dot => Ok(self.scope.dot().clone()),
            Expr::Var(name) => self.scope.get(name.as_str()).cloned().ok_or_else(|| {
                EvalError::UndefinedVariable {
                    name: name.to_string(),
                    span: expr.span.clone(),
                }
            }),
            Expr::Field { target, path } => {
                let mut value = self.eval_expr(target)?;
                let mut label = target.node.base_label();
                for segment in path {
                    label.push('.');
                    label.push_str(segment.as_str());
                    value = project(value, Step::Field(segment.as_str())).map_err(|source| {
                        EvalError::Access {
                            path: label.clone(),
                            source,
                            span: expr.span.clone(),
                        }
                    })?;
                }
                Ok(value)
            }
            Expr::Index { target, indices } => {
                let mut value = self.eval_expr(target)?;
                let mut label = target.node.base_label();
                for index in indices {
                    let key = self.eval_expr(index)?;
                    let step = match &*key {
                        Node::Scalar(Scalar::Int(position)) => Step::Position(*position),
                        // String keys select mapping entries
                        Node::Scalar(Scalar::String(name)) => Step::Field(name.as_str()),
                        other => {
                            return Err(EvalError::mismatch(
                                "index",
                                "integer or string",
                                other.kind_name(),
                                index.span.clone(),
                            ))
                        }
                    };
                    label.push_str(&match &step {
                        Step::Field(name) => format!("[{:?}]", name),
                        Step::Position(position) => format!("[{}]", position),
                    });
                    value = project(value, step).map_err(|source| EvalError::Access {
                        path: label.clone(),
                        source,
                        span: expr.span.clone(),
                    })?;
                }
                Ok(value)
            }
            Expr::Literal(scalar) => Ok(Cow::Owned(Node::Scalar(scalar.clone()))),
            Expr::Bool { op, operands } => {
                let result = self.eval_bool_op(*op, operands)?;
                Ok(Cow::Owned(Node::from(result)))
            }
            Expr::Compare { op, left, right } => {
                let context = match op {
                    CompareOp::Eq => "eq",
                    CompareOp::Ne => "ne",
                };
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                let equal = left
                    .structural_eq(&right)
                    .map_err(|source| EvalError::Access {
                        path: context.to_string(),
                        source,
                        span: expr.span.clone(),
                    })?;
                Ok(Cow::Owned(Node::from(match op {
                    CompareOp::Eq => equal,
                    CompareOp::Ne => !equal,
                })))
            }
        }
    }

    /// Evaluate `expr` and require a boolean result
    fn eval_bool(&self, expr: &Spanned<Expr>, context: &str) -> Result<bool, EvalError> {
        let value = self.eval_expr(expr)?;
        value.as_bool().ok_or_else(|| {
            EvalError::mismatch(context, "boolean", value.kind_name(), expr.span.clone())
        })
    }

    fn eval_bool_op(&self, op: BoolOp, operands: &[Spanned<Expr>]) -> Result<bool, EvalError> {
        match op {
            BoolOp::And => {
                for operand in operands {
                    if !self.eval_bool(operand, "and")? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            BoolOp::Or => {
                for operand in operands {
                    if self.eval_bool(operand, "or")? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            // `not` has exactly one operand; this reads as "none is true"
            BoolOp::Not => {
                for operand in operands {
                    if self.eval_bool(operand, "not")? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

/// Evaluate `template` against `document`, returning the output fragments
pub fn evaluate<'t>(template: &'t Template, document: &Node) -> Result<Vec<Fragment<'t>>, EvalError> {
    Evaluator::new(document).run(template)
}

impl Template {
    /// Render this template against a document
    ///
    /// A template can be parsed once and rendered any number of times.
    pub fn render(&self, document: &Node) -> Result<String, EvalError> {
        evaluate(self, document).map(renderer::concat)
    }
}
