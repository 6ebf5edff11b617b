//! Compiles the command line's expression into an immutable tree. Leaves
//! are the input letters `A` through `Z` (in command-line order); `|`, `&`,
//! `-`, and `^` combine them, binding `^` tightest, then `&`, then `|`,
//! then `-`, all left-associative. A bracketed suffix like `[0,2:4]` on a
//! letter or a parenthesized subexpression selects that node's key columns;
//! without one, every column belongs to the key.

use std::fmt;

use anyhow::{bail, ensure, Context, Result};

use crate::mask::{FieldMask, MAX_FIELDS};

/// One of the four binary set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `|`: keys present in either operand.
    Union,
    /// `&`: keys present in both operands.
    Intersect,
    /// `-`: keys of the left operand that the right lacks.
    Diff,
    /// `^`: keys present in exactly one operand.
    SymDiff,
}

impl Op {
    fn symbol(self) -> char {
        match self {
            Op::Union => '|',
            Op::Intersect => '&',
            Op::Diff => '-',
            Op::SymDiff => '^',
        }
    }
}

/// A node of the parsed expression: what to compute, and the columns that
/// key its result.
#[derive(Debug, PartialEq, Eq)]
pub struct Expr {
    pub(crate) kind: ExprKind,
    /// The columns this node's result is keyed (and deduplicated) by. For
    /// the root, also the columns that get printed.
    pub mask: FieldMask,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ExprKind {
    Input(usize),
    Op(Op, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn operation(op: Op, left: Expr, right: Expr) -> Expr {
        Expr { kind: ExprKind::Op(op, Box::new(left), Box::new(right)), mask: FieldMask::ALL }
    }

    /// The input index of this subtree's leftmost leaf: the identity used
    /// to settle key ties between sibling subtrees (the earlier input
    /// wins).
    #[must_use]
    pub fn source_id(&self) -> usize {
        match &self.kind {
            ExprKind::Input(index) => *index,
            ExprKind::Op(_, left, _) => left.source_id(),
        }
    }
}

/// Prints the tree the way `-v` reports it: `&(A[0x1],B[0x1])[0xffffffff]`,
/// each node followed by its mask in hex.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Input(index) => write!(f, "{}[{}]", input_letter(*index), self.mask),
            ExprKind::Op(op, left, right) => {
                write!(f, "{}({left},{right})[{}]", op.symbol(), self.mask)
            }
        }
    }
}

/// The one-letter name of input `index`: `A` for the first file.
pub(crate) fn input_letter(index: usize) -> char {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i),
        _ => '?',
    }
}

/// Parses `text` into an expression tree over `input_count` inputs.
pub fn parse(text: &str, input_count: usize) -> Result<Expr> {
    parse_inner(text, input_count).with_context(|| format!("can't parse expression {text:?}"))
}

fn parse_inner(text: &str, input_count: usize) -> Result<Expr> {
    let tokens = scan(text)?;
    let mut parser = Parser { tokens, at: 0, input_count };
    let tree = parser.expression()?;
    if let Some(extra) = parser.advance() {
        bail!("unexpected '{}' at byte {}", extra.kind, extra.at);
    }
    Ok(tree)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Letter(usize),
    Number(usize),
    Union,
    Intersect,
    Diff,
    SymDiff,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Letter(index) => write!(f, "{}", input_letter(*index)),
            TokenKind::Number(value) => write!(f, "{value}"),
            TokenKind::Union => f.write_str("|"),
            TokenKind::Intersect => f.write_str("&"),
            TokenKind::Diff => f.write_str("-"),
            TokenKind::SymDiff => f.write_str("^"),
            TokenKind::LeftParen => f.write_str("("),
            TokenKind::RightParen => f.write_str(")"),
            TokenKind::LeftBracket => f.write_str("["),
            TokenKind::RightBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    at: usize,
}

fn scan(text: &str) -> Result<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut at = 0;
    while at < bytes.len() {
        let start = at;
        let kind = match bytes[at] {
            blank if blank.is_ascii_whitespace() => {
                at += 1;
                continue;
            }
            b'|' => TokenKind::Union,
            b'&' => TokenKind::Intersect,
            b'-' => TokenKind::Diff,
            b'^' => TokenKind::SymDiff,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            letter @ b'A'..=b'Z' => TokenKind::Letter(usize::from(letter - b'A')),
            b'0'..=b'9' => {
                while at < bytes.len() && bytes[at].is_ascii_digit() {
                    at += 1;
                }
                let digits = &text[start..at];
                let value = digits
                    .parse()
                    .with_context(|| format!("can't read {digits} as a column number"))?;
                tokens.push(Token { kind: TokenKind::Number(value), at: start });
                continue;
            }
            other => {
                let shown = text[at..].chars().next().unwrap_or(char::from(other));
                bail!("unexpected character '{shown}' at byte {at}");
            }
        };
        at += 1;
        tokens.push(Token { kind, at: start });
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    at: usize,
    input_count: usize,
}

impl Parser {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.at).map(|token| token.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.at).copied();
        if token.is_some() {
            self.at += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.at += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => bail!("expected {what} at byte {}, found '{}'", token.at, token.kind),
            None => bail!("expected {what}, but the expression ended"),
        }
    }

    // One method per precedence level, loosest first; each folds its
    // operator left-associatively over the next-tighter level.
    fn expression(&mut self) -> Result<Expr> {
        let mut node = self.union()?;
        while self.eat(TokenKind::Diff) {
            let right = self.union()?;
            node = Expr::operation(Op::Diff, node, right);
        }
        Ok(node)
    }

    fn union(&mut self) -> Result<Expr> {
        let mut node = self.intersection()?;
        while self.eat(TokenKind::Union) {
            let right = self.intersection()?;
            node = Expr::operation(Op::Union, node, right);
        }
        Ok(node)
    }

    fn intersection(&mut self) -> Result<Expr> {
        let mut node = self.symmetric_difference()?;
        while self.eat(TokenKind::Intersect) {
            let right = self.symmetric_difference()?;
            node = Expr::operation(Op::Intersect, node, right);
        }
        Ok(node)
    }

    fn symmetric_difference(&mut self) -> Result<Expr> {
        let mut node = self.primary()?;
        while self.eat(TokenKind::SymDiff) {
            let right = self.primary()?;
            node = Expr::operation(Op::SymDiff, node, right);
        }
        Ok(node)
    }

    fn primary(&mut self) -> Result<Expr> {
        let node = match self.advance() {
            Some(Token { kind: TokenKind::Letter(index), at }) => {
                ensure!(
                    index < self.input_count,
                    "input {} at byte {at} needs more files than the {} given",
                    input_letter(index),
                    self.input_count,
                );
                Expr { kind: ExprKind::Input(index), mask: FieldMask::ALL }
            }
            Some(Token { kind: TokenKind::LeftParen, .. }) => {
                let node = self.expression()?;
                self.expect(TokenKind::RightParen, "')'")?;
                node
            }
            Some(Token { kind, at }) => {
                bail!("expected an input letter or '(' at byte {at}, found '{kind}'")
            }
            None => bail!("the expression ended where an input letter or '(' was expected"),
        };
        if self.eat(TokenKind::LeftBracket) {
            let mask = self.field_list()?;
            self.expect(TokenKind::RightBracket, "']'")?;
            return Ok(Expr { mask, ..node });
        }
        Ok(node)
    }

    fn field_list(&mut self) -> Result<FieldMask> {
        let mut mask = FieldMask::EMPTY;
        loop {
            let lo = self.column()?;
            let hi = if self.eat(TokenKind::Colon) { self.column()? } else { lo };
            ensure!(lo <= hi, "the column range {lo}:{hi} runs backward");
            mask |= FieldMask::span(lo, hi);
            if !self.eat(TokenKind::Comma) {
                return Ok(mask);
            }
        }
    }

    fn column(&mut self) -> Result<usize> {
        match self.advance() {
            Some(Token { kind: TokenKind::Number(value), at }) => {
                ensure!(
                    value < MAX_FIELDS,
                    "column {value} at byte {at} is out of range (columns run from 0 to {})",
                    MAX_FIELDS - 1,
                );
                Ok(value)
            }
            Some(token) => bail!("expected a column number at byte {}", token.at),
            None => bail!("the expression ended where a column number was expected"),
        }
    }
}
