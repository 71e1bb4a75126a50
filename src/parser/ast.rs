//! Abstract Syntax Tree types for templates

use crate::document::Scalar;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Field name or variable name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed template, ready to be rendered any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Spanned<TemplateNode>>,
}

/// One element of a template body
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal text copied to the output verbatim
    Text(String),
    /// An action whose value is written to the output
    Output(Spanned<Expr>),
    /// `$name := expr`
    Declare {
        name: Spanned<Identifier>,
        value: Spanned<Expr>,
    },
    /// `$name = expr`
    Assign {
        name: Spanned<Identifier>,
        value: Spanned<Expr>,
    },
    Range(RangeBlock),
    If(IfBlock),
}

/// `range [$index,] [$value :=] source` ... [`else` ...] `end`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBlock {
    pub index_var: Option<Spanned<Identifier>>,
    pub value_var: Option<Spanned<Identifier>>,
    pub source: Spanned<Expr>,
    pub body: Vec<Spanned<TemplateNode>>,
    /// Rendered instead of the body when the sequence is empty
    pub else_body: Option<Vec<Spanned<TemplateNode>>>,
}

/// `if test` ... [`else` ...] `end`
///
/// `else if` chains are represented as an `IfBlock` nested alone in the
/// else body.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub test: Spanned<Expr>,
    pub then_body: Vec<Spanned<TemplateNode>>,
    pub else_body: Option<Vec<Spanned<TemplateNode>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// An expression inside an action
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The current value `.`
    Dot,
    /// A variable reference such as `$available` or the root `$`
    Var(Identifier),
    /// Field chain applied to a base expression: `.a.b`, `$x.a`, `(expr).a`
    Field {
        target: Box<Spanned<Expr>>,
        path: Vec<Identifier>,
    },
    /// `index target i j ...`
    Index {
        target: Box<Spanned<Expr>>,
        indices: Vec<Spanned<Expr>>,
    },
    Literal(Scalar),
    Bool {
        op: BoolOp,
        operands: Vec<Spanned<Expr>>,
    },
    Compare {
        op: CompareOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// Short label for the expression a field chain starts from
    pub fn base_label(&self) -> String {
        match self {
            Expr::Dot => String::new(),
            Expr::Var(name) => name.to_string(),
            Expr::Field { target, path } => {
                let mut label = target.node.base_label();
                for segment in path {
                    label.push('.');
                    label.push_str(segment.as_str());
                }
                label
            }
            Expr::Index { .. } => "(index)".to_string(),
            Expr::Literal(scalar) => scalar.to_string(),
            Expr::Bool { .. } | Expr::Compare { .. } => "(expr)".to_string(),
        }
    }
}
