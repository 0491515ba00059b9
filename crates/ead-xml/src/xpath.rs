//! XPath 1.0 subset used by finding-aid field configurations.
//!
//! Expressions are compiled once against a prefix map and then evaluated
//! against any node of an [`XmlDocument`]. Supported: location paths
//! (absolute, relative, `//`), the abbreviations `.`, `..`, `@`, name
//! tests with prefixes and wildcards, `text()`, `node()`, the `child`,
//! `descendant`, `self`, `parent`, `ancestor` and `attribute` axes, unions
//! and predicates (positions, `position()`, existence, `=`, `!=`, `and`,
//! `or`, `not()`).

use std::fmt;

use thiserror::Error;

use crate::dom::{ExpandedName, NodeKind, XmlDocument, XmlNodeId};
use crate::EAD_NAMESPACE;

/// Error produced while compiling an XPath expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { offset: usize, found: String },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unterminated string literal at offset {0}")]
    UnterminatedLiteral(usize),
    #[error("unknown namespace prefix '{0}'")]
    UnknownPrefix(String),
    #[error("unsupported function '{0}()'")]
    UnsupportedFunction(String),
    #[error("unsupported axis '{0}'")]
    UnsupportedAxis(String),
}

/// Prefix to namespace URI bindings used while compiling expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    bindings: Vec<(String, String)>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings with `ead` mapped to the EAD 2002 namespace.
    pub fn ead() -> Self {
        Self::new().with("ead", EAD_NAMESPACE)
    }

    /// Add or replace a prefix binding.
    pub fn with(mut self, prefix: &str, uri: &str) -> Self {
        self.bindings.retain(|(existing, _)| existing != prefix);
        self.bindings.push((prefix.to_string(), uri.to_string()));
        self
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(existing, _)| existing == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// Result item of an XPath evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XPathItem {
    Document,
    Element(XmlNodeId),
    Text(XmlNodeId),
    /// Attribute `index` of element `owner`.
    Attribute { owner: XmlNodeId, index: usize },
}

impl XPathItem {
    /// Wrap a document node handle in the matching item kind.
    pub fn from_node(doc: &XmlDocument, id: XmlNodeId) -> Self {
        match doc.kind(id) {
            NodeKind::Document => XPathItem::Document,
            NodeKind::Element(_) => XPathItem::Element(id),
            NodeKind::Text(_) => XPathItem::Text(id),
        }
    }

    /// XPath string value of the item.
    pub fn value(self, doc: &XmlDocument) -> String {
        match self {
            XPathItem::Document => doc.string_value(doc.document_node()),
            XPathItem::Element(id) | XPathItem::Text(id) => doc.string_value(id),
            XPathItem::Attribute { owner, index } => doc
                .element(owner)
                .and_then(|element| element.attributes.get(index))
                .map(|attr| attr.value.clone())
                .unwrap_or_default(),
        }
    }

    fn node(self, doc: &XmlDocument) -> Option<XmlNodeId> {
        match self {
            XPathItem::Document => Some(doc.document_node()),
            XPathItem::Element(id) | XPathItem::Text(id) => Some(id),
            XPathItem::Attribute { .. } => None,
        }
    }

    fn order_key(self) -> (usize, usize) {
        match self {
            XPathItem::Document => (0, 0),
            XPathItem::Element(id) | XPathItem::Text(id) => (id.index(), 0),
            XPathItem::Attribute { owner, index } => (owner.index(), index + 1),
        }
    }
}

/// Compiled XPath expression.
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    paths: Vec<LocationPath>,
}

impl XPath {
    /// Compile `expr`, resolving prefixes through `namespaces`.
    pub fn compile(expr: &str, namespaces: &Namespaces) -> Result<Self, XPathError> {
        let tokens = tokenize(expr)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            namespaces,
        };
        let paths = parser.parse_union()?;
        if !matches!(parser.peek(), Token::End) {
            return Err(parser.unexpected());
        }
        Ok(Self {
            source: expr.to_string(),
            paths,
        })
    }

    /// The expression text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate with `context` as the context node. Items are returned in
    /// document order without duplicates.
    pub fn evaluate(&self, doc: &XmlDocument, context: XmlNodeId) -> Vec<XPathItem> {
        let start = XPathItem::from_node(doc, context);
        let mut items = Vec::new();
        for path in &self.paths {
            items.extend(eval_path(path, doc, start));
        }
        sort_unique(&mut items);
        items
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfNode,
    Parent,
    Ancestor,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Result<Self, XPathError> {
        Ok(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfNode,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "attribute" => Axis::Attribute,
            other => return Err(XPathError::UnsupportedAxis(other.to_string())),
        })
    }
}

#[derive(Debug, Clone)]
enum NodeTest {
    AnyName,
    AnyInNamespace(String),
    Name {
        namespace: Option<String>,
        local: String,
    },
    Text,
    Node,
}

impl NodeTest {
    fn matches(&self, doc: &XmlDocument, item: XPathItem, axis: Axis) -> bool {
        match self {
            NodeTest::Node => true,
            NodeTest::Text => matches!(item, XPathItem::Text(_)),
            NodeTest::AnyName => principal_name(doc, item, axis).is_some(),
            NodeTest::AnyInNamespace(uri) => principal_name(doc, item, axis)
                .map(|name| name.namespace.as_deref() == Some(uri.as_str()))
                .unwrap_or(false),
            NodeTest::Name { namespace, local } => principal_name(doc, item, axis)
                .map(|name| name.matches(namespace.as_deref(), local))
                .unwrap_or(false),
        }
    }
}

/// Name of `item` if it is of the principal node type of `axis`.
fn principal_name(doc: &XmlDocument, item: XPathItem, axis: Axis) -> Option<&ExpandedName> {
    match item {
        XPathItem::Attribute { owner, index } if axis == Axis::Attribute => doc
            .element(owner)
            .and_then(|element| element.attributes.get(index))
            .map(|attr| &attr.name),
        XPathItem::Element(id) if axis != Axis::Attribute => {
            doc.element(id).map(|element| &element.name)
        }
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare {
        lhs: Operand,
        negate: bool,
        rhs: Operand,
    },
    Value(Operand),
}

#[derive(Debug, Clone)]
enum Operand {
    Paths(Vec<LocationPath>),
    Literal(String),
    Number(f64),
    Position,
}

enum Value {
    Nodes(Vec<String>),
    Str(String),
    Num(f64),
}

enum Atom {
    Str(String),
    Num(f64),
}

impl Atom {
    fn as_number(&self) -> f64 {
        match self {
            Atom::Str(value) => value.trim().parse().unwrap_or(f64::NAN),
            Atom::Num(value) => *value,
        }
    }
}

impl Value {
    fn into_atoms(self) -> Vec<Atom> {
        match self {
            Value::Nodes(values) => values.into_iter().map(Atom::Str).collect(),
            Value::Str(value) => vec![Atom::Str(value)],
            Value::Num(value) => vec![Atom::Num(value)],
        }
    }
}

struct PredicateContext<'d> {
    doc: &'d XmlDocument,
    item: XPathItem,
    position: usize,
}

impl Expr {
    fn holds(&self, ctx: &PredicateContext<'_>) -> bool {
        match self {
            Expr::Or(lhs, rhs) => lhs.holds(ctx) || rhs.holds(ctx),
            Expr::And(lhs, rhs) => lhs.holds(ctx) && rhs.holds(ctx),
            Expr::Not(inner) => !inner.holds(ctx),
            Expr::Compare { lhs, negate, rhs } => {
                let left = lhs.value(ctx).into_atoms();
                let right = rhs.value(ctx).into_atoms();
                left.iter()
                    .any(|l| right.iter().any(|r| atoms_equal(l, r) != *negate))
            }
            Expr::Value(operand) => match operand.value(ctx) {
                Value::Nodes(values) => !values.is_empty(),
                Value::Str(value) => !value.is_empty(),
                Value::Num(value) => value == ctx.position as f64,
            },
        }
    }
}

impl Operand {
    fn value(&self, ctx: &PredicateContext<'_>) -> Value {
        match self {
            Operand::Paths(paths) => Value::Nodes(
                paths
                    .iter()
                    .flat_map(|path| eval_path(path, ctx.doc, ctx.item))
                    .map(|item| item.value(ctx.doc))
                    .collect(),
            ),
            Operand::Literal(value) => Value::Str(value.clone()),
            Operand::Number(value) => Value::Num(*value),
            Operand::Position => Value::Num(ctx.position as f64),
        }
    }
}

fn atoms_equal(lhs: &Atom, rhs: &Atom) -> bool {
    match (lhs, rhs) {
        (Atom::Str(a), Atom::Str(b)) => a == b,
        (Atom::Num(n), other) | (other, Atom::Num(n)) => *n == other.as_number(),
    }
}

fn eval_path(path: &LocationPath, doc: &XmlDocument, context: XPathItem) -> Vec<XPathItem> {
    let mut current = vec![if path.absolute {
        XPathItem::Document
    } else {
        context
    }];
    for step in &path.steps {
        let mut next = Vec::new();
        for item in &current {
            let mut candidates: Vec<XPathItem> = axis_items(doc, *item, step.axis)
                .into_iter()
                .filter(|candidate| step.test.matches(doc, *candidate, step.axis))
                .collect();
            for predicate in &step.predicates {
                candidates = candidates
                    .into_iter()
                    .enumerate()
                    .filter(|(idx, candidate)| {
                        predicate.holds(&PredicateContext {
                            doc,
                            item: *candidate,
                            position: idx + 1,
                        })
                    })
                    .map(|(_, candidate)| candidate)
                    .collect();
            }
            next.extend(candidates);
        }
        sort_unique(&mut next);
        current = next;
    }
    current
}

/// Items reachable from `item` along `axis`, in axis order (reverse axes
/// yield the nearest node first).
fn axis_items(doc: &XmlDocument, item: XPathItem, axis: Axis) -> Vec<XPathItem> {
    let wrap = |id: XmlNodeId| XPathItem::from_node(doc, id);
    match axis {
        Axis::SelfNode => vec![item],
        Axis::Parent => parent_item(doc, item).into_iter().collect(),
        Axis::Ancestor => {
            let mut out = Vec::new();
            let mut cursor = parent_item(doc, item);
            while let Some(ancestor) = cursor {
                out.push(ancestor);
                cursor = parent_item(doc, ancestor);
            }
            out
        }
        Axis::Attribute => match item {
            XPathItem::Element(owner) => doc
                .element(owner)
                .map(|element| {
                    (0..element.attributes.len())
                        .map(|index| XPathItem::Attribute { owner, index })
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        },
        Axis::Child | Axis::Descendant | Axis::DescendantOrSelf => {
            let Some(node) = item.node(doc) else {
                return Vec::new();
            };
            match axis {
                Axis::Child => doc.children(node).iter().copied().map(wrap).collect(),
                Axis::Descendant => doc.descendants(node).into_iter().map(wrap).collect(),
                _ => std::iter::once(item)
                    .chain(doc.descendants(node).into_iter().map(wrap))
                    .collect(),
            }
        }
    }
}

fn parent_item(doc: &XmlDocument, item: XPathItem) -> Option<XPathItem> {
    match item {
        XPathItem::Document => None,
        XPathItem::Attribute { owner, .. } => Some(XPathItem::Element(owner)),
        XPathItem::Element(id) | XPathItem::Text(id) => {
            doc.parent(id).map(|parent| XPathItem::from_node(doc, parent))
        }
    }
}

fn sort_unique(items: &mut Vec<XPathItem>) {
    items.sort_by_key(|item| item.order_key());
    items.dedup();
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    Dot,
    DotDot,
    At,
    Star,
    Pipe,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Eq,
    NotEq,
    ColonColon,
    Name(String),
    Literal(String),
    Number(f64),
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Slash => f.write_str("'/'"),
            Token::DoubleSlash => f.write_str("'//'"),
            Token::Dot => f.write_str("'.'"),
            Token::DotDot => f.write_str("'..'"),
            Token::At => f.write_str("'@'"),
            Token::Star => f.write_str("'*'"),
            Token::Pipe => f.write_str("'|'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Eq => f.write_str("'='"),
            Token::NotEq => f.write_str("'!='"),
            Token::ColonColon => f.write_str("'::'"),
            Token::Name(name) => write!(f, "name '{name}'"),
            Token::Literal(value) => write!(f, "literal '{value}'"),
            Token::Number(value) => write!(f, "number {value}"),
            Token::End => f.write_str("end of expression"),
        }
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, XPathError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let at = |idx: usize| chars.get(idx).map(|(_, ch)| *ch);
    let mut tokens = Vec::new();
    let mut i = 0;
    while let Some(&(offset, ch)) = chars.get(i) {
        let single = match ch {
            '@' => Some(Token::At),
            '*' => Some(Token::Star),
            '|' => Some(Token::Pipe),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '=' => Some(Token::Eq),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push((token, offset));
            i += 1;
            continue;
        }
        match ch {
            c if c.is_whitespace() => i += 1,
            '/' => {
                if at(i + 1) == Some('/') {
                    tokens.push((Token::DoubleSlash, offset));
                    i += 2;
                } else {
                    tokens.push((Token::Slash, offset));
                    i += 1;
                }
            }
            '.' if at(i + 1) == Some('.') => {
                tokens.push((Token::DotDot, offset));
                i += 2;
            }
            '.' if !at(i + 1).map(|c| c.is_ascii_digit()).unwrap_or(false) => {
                tokens.push((Token::Dot, offset));
                i += 1;
            }
            '!' if at(i + 1) == Some('=') => {
                tokens.push((Token::NotEq, offset));
                i += 2;
            }
            ':' if at(i + 1) == Some(':') => {
                tokens.push((Token::ColonColon, offset));
                i += 2;
            }
            '\'' | '"' => {
                let mut j = i + 1;
                let mut value = String::new();
                loop {
                    match at(j) {
                        Some(c) if c == ch => break,
                        Some(c) => value.push(c),
                        None => return Err(XPathError::UnterminatedLiteral(offset)),
                    }
                    j += 1;
                }
                tokens.push((Token::Literal(value), offset));
                i = j + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut j = i;
                let mut text = String::new();
                while let Some(c) = at(j).filter(|c| c.is_ascii_digit() || *c == '.') {
                    text.push(c);
                    j += 1;
                }
                let value = text.parse().map_err(|_| XPathError::UnexpectedToken {
                    offset,
                    found: format!("number '{text}'"),
                })?;
                tokens.push((Token::Number(value), offset));
                i = j;
            }
            c if is_name_start(c) => {
                let mut j = i;
                let mut name = String::new();
                while let Some(c) = at(j).filter(|c| is_name_char(*c)) {
                    name.push(c);
                    j += 1;
                }
                if at(j) == Some(':') && at(j + 1) != Some(':') {
                    name.push(':');
                    j += 1;
                    if at(j) == Some('*') {
                        name.push('*');
                        j += 1;
                    } else {
                        while let Some(c) = at(j).filter(|c| is_name_char(*c)) {
                            name.push(c);
                            j += 1;
                        }
                    }
                }
                tokens.push((Token::Name(name), offset));
                i = j;
            }
            other => {
                return Err(XPathError::UnexpectedToken {
                    offset,
                    found: format!("'{other}'"),
                })
            }
        }
    }
    tokens.push((Token::End, input.len()));
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    namespaces: &'a Namespaces,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        self.tokens
            .get(self.pos + ahead)
            .map(|(token, _)| token)
            .unwrap_or(&Token::End)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> XPathError {
        match self.tokens.get(self.pos) {
            None | Some((Token::End, _)) => XPathError::UnexpectedEnd,
            Some((token, offset)) => XPathError::UnexpectedToken {
                offset: *offset,
                found: token.to_string(),
            },
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), XPathError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Token::Name(name) if name == keyword)
    }

    fn parse_union(&mut self) -> Result<Vec<LocationPath>, XPathError> {
        let mut paths = vec![self.parse_location_path()?];
        while matches!(self.peek(), Token::Pipe) {
            self.advance();
            paths.push(self.parse_location_path()?);
        }
        Ok(paths)
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Token::Dot | Token::DotDot | Token::At | Token::Star | Token::Name(_)
        )
    }

    fn parse_location_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Token::Slash => {
                self.advance();
                if !self.starts_step() {
                    return Ok(LocationPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Token::DoubleSlash => {
                self.advance();
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                true
            }
            _ => false,
        };
        loop {
            steps.push(self.parse_step()?);
            match self.peek() {
                Token::Slash => {
                    self.advance();
                }
                Token::DoubleSlash => {
                    self.advance();
                    steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                }
                _ => break,
            }
        }
        Ok(LocationPath { absolute, steps })
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        let axis = match self.peek().clone() {
            Token::Dot => {
                self.advance();
                return Ok(Step::new(Axis::SelfNode, NodeTest::Node));
            }
            Token::DotDot => {
                self.advance();
                return Ok(Step::new(Axis::Parent, NodeTest::Node));
            }
            Token::At => {
                self.advance();
                Axis::Attribute
            }
            Token::Name(name) if matches!(self.peek_at(1), Token::ColonColon) => {
                self.advance();
                self.advance();
                Axis::from_name(&name)?
            }
            _ => Axis::Child,
        };
        let test = self.parse_node_test()?;
        let mut step = Step::new(axis, test);
        while matches!(self.peek(), Token::LBracket) {
            self.advance();
            step.predicates.push(self.parse_or()?);
            self.expect(Token::RBracket)?;
        }
        Ok(step)
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.peek().clone() {
            Token::Star => {
                self.advance();
                Ok(NodeTest::AnyName)
            }
            Token::Name(name) => {
                self.advance();
                if matches!(self.peek(), Token::LParen) {
                    let test = match name.as_str() {
                        "text" => NodeTest::Text,
                        "node" => NodeTest::Node,
                        _ => return Err(XPathError::UnsupportedFunction(name)),
                    };
                    self.advance();
                    self.expect(Token::RParen)?;
                    return Ok(test);
                }
                if let Some(prefix) = name.strip_suffix(":*") {
                    return Ok(NodeTest::AnyInNamespace(self.resolve(prefix)?));
                }
                match name.split_once(':') {
                    Some((prefix, local)) => Ok(NodeTest::Name {
                        namespace: Some(self.resolve(prefix)?),
                        local: local.to_string(),
                    }),
                    None => Ok(NodeTest::Name {
                        namespace: None,
                        local: name,
                    }),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn resolve(&self, prefix: &str) -> Result<String, XPathError> {
        self.namespaces
            .resolve(prefix)
            .map(str::to_string)
            .ok_or_else(|| XPathError::UnknownPrefix(prefix.to_string()))
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        let mut expr = self.parse_and()?;
        while self.is_keyword("or") {
            self.advance();
            let rhs = self.parse_and()?;
            expr = Expr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        let mut expr = self.parse_comparison()?;
        while self.is_keyword("and") {
            self.advance();
            let rhs = self.parse_comparison()?;
            expr = Expr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, XPathError> {
        if self.is_keyword("not") && matches!(self.peek_at(1), Token::LParen) {
            self.advance();
            self.advance();
            let inner = self.parse_or()?;
            self.expect(Token::RParen)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            let inner = self.parse_or()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }
        let lhs = self.parse_operand()?;
        let negate = match self.peek() {
            Token::Eq => false,
            Token::NotEq => true,
            _ => return Ok(Expr::Value(lhs)),
        };
        self.advance();
        let rhs = self.parse_operand()?;
        Ok(Expr::Compare { lhs, negate, rhs })
    }

    fn parse_operand(&mut self) -> Result<Operand, XPathError> {
        match self.peek().clone() {
            Token::Literal(value) => {
                self.advance();
                Ok(Operand::Literal(value))
            }
            Token::Number(value) => {
                self.advance();
                Ok(Operand::Number(value))
            }
            Token::Name(name) if matches!(self.peek_at(1), Token::LParen) => {
                let operand = match name.as_str() {
                    "position" => Operand::Position,
                    "text" | "node" => return Ok(Operand::Paths(self.parse_union()?)),
                    _ => return Err(XPathError::UnsupportedFunction(name)),
                };
                self.advance();
                self.advance();
                self.expect(Token::RParen)?;
                Ok(operand)
            }
            _ => Ok(Operand::Paths(self.parse_union()?)),
        }
    }
}
