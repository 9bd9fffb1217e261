// PL/SQL Abstract Syntax Tree (AST) Implementation
//
// Nodes are generic: each one is tagged with the grammar rule (or, for
// leaves, the token type) that produced it and owns its children in
// production order.

use crate::common::types::{Position, Span};

use super::grammar::{GrammarRule, NodeKind};
use super::lexer::Token;

/// A node of the syntax tree
#[derive(Debug, Clone)]
pub struct AstNode {
    kind: NodeKind,
    token: Option<Token>,
    span: Span,
    children: Vec<AstNode>,
}

impl AstNode {
    /// Create a leaf node holding a single token
    pub fn leaf(token: Token) -> Self {
        AstNode {
            kind: NodeKind::Token(token.token_type),
            span: token.span,
            token: Some(token),
            children: Vec::new(),
        }
    }

    /// Create an interior node. Its span is the union of the children's
    /// spans, or an empty span at `fallback` when there are no children.
    pub fn rule(rule: GrammarRule, children: Vec<AstNode>, fallback: Position) -> Self {
        let span = children
            .iter()
            .map(|child| child.span)
            .reduce(Span::union)
            .unwrap_or_else(|| Span::empty(fallback));
        AstNode {
            kind: NodeKind::Rule(rule),
            token: None,
            span,
            children,
        }
    }

    /// Replace a node that has exactly one child by that child
    pub(crate) fn into_single_child(mut self) -> AstNode {
        if self.children.len() == 1 {
            if let Some(child) = self.children.pop() {
                return child;
            }
        }
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Grammar rule of an interior node
    pub fn rule_kind(&self) -> Option<GrammarRule> {
        match self.kind {
            NodeKind::Rule(rule) => Some(rule),
            NodeKind::Token(_) => None,
        }
    }

    pub fn is(&self, kind: impl Into<NodeKind>) -> bool {
        self.kind == kind.into()
    }

    pub fn is_leaf(&self) -> bool {
        self.token.is_some()
    }

    /// Token of a leaf node
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }

    pub fn number_of_children(&self) -> usize {
        self.children.len()
    }

    pub fn first_child(&self) -> Option<&AstNode> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&AstNode> {
        self.children.last()
    }

    pub fn child(&self, index: usize) -> Option<&AstNode> {
        self.children.get(index)
    }

    /// First direct child of the given kind
    pub fn first_child_of(&self, kind: impl Into<NodeKind>) -> Option<&AstNode> {
        let kind = kind.into();
        self.children.iter().find(|child| child.kind == kind)
    }

    /// Last direct child of the given kind
    pub fn last_child_of(&self, kind: impl Into<NodeKind>) -> Option<&AstNode> {
        let kind = kind.into();
        self.children.iter().rev().find(|child| child.kind == kind)
    }

    /// Direct children of the given kind, in order
    pub fn children_of(&self, kind: impl Into<NodeKind>) -> impl Iterator<Item = &AstNode> {
        let kind = kind.into();
        self.children.iter().filter(move |child| child.kind == kind)
    }

    pub fn has_direct_child(&self, kind: impl Into<NodeKind>) -> bool {
        self.first_child_of(kind).is_some()
    }

    /// First token covered by this node
    pub fn first_token(&self) -> Option<&Token> {
        let mut node = self;
        loop {
            if let Some(token) = &node.token {
                return Some(token);
            }
            node = node.children.first()?;
        }
    }

    /// Literal of the first token covered by this node
    pub fn token_value(&self) -> Option<&str> {
        self.first_token().map(|token| token.literal.as_str())
    }

    /// This node and all nodes below it, in pre-order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Leaf tokens covered by this node, in source order
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.descendants().filter_map(|node| node.token.as_ref())
    }
}

/// Pre-order iterator over a subtree, driven by an explicit stack
pub struct Descendants<'a> {
    stack: Vec<&'a AstNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a AstNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Deep structural equality of two subtrees.
///
/// Nodes are equal when they have the same kind and the same number of
/// children and every pair of children is equal; leaves additionally need the
/// same text. Source positions are ignored.
pub fn equal_nodes(a: &AstNode, b: &AstNode) -> bool {
    let mut stack = vec![(a, b)];
    while let Some((left, right)) = stack.pop() {
        if left.kind != right.kind || left.children.len() != right.children.len() {
            return false;
        }
        match (&left.token, &right.token) {
            (Some(l), Some(r)) if !same_token_text(l, r) => return false,
            (Some(_), Some(_)) | (None, None) => {}
            _ => return false,
        }
        stack.extend(left.children.iter().zip(right.children.iter()));
    }
    true
}

/// Compare token text with the language's case rules: quoted identifiers and
/// string literals are case-sensitive, everything else is not.
pub fn same_token_text(a: &Token, b: &Token) -> bool {
    if a.token_type != b.token_type {
        return false;
    }
    if a.token_type.is_case_insensitive() {
        a.literal.eq_ignore_ascii_case(&b.literal)
    } else {
        a.literal == b.literal
    }
}
