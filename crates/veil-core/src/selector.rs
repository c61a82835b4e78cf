#![forbid(unsafe_code)]

//! A small CSS selector engine.
//!
//! Supported grammar:
//!
//! - type (`div`), universal (`*`), id (`#name`) and class (`.name`) selectors
//! - attribute selectors: `[attr]`, `[attr=v]`, `[attr^=v]`, `[attr~=v]`
//!   with bare, single-quoted or double-quoted values
//! - `:not(<compound>)`
//! - descendant (whitespace) and child (`>`) combinators
//! - selector lists separated by `,`
//!
//! # Invariants
//!
//! 1. Parsing never panics; malformed input yields a [`SelectorError`] that
//!    carries the byte offset of the problem.
//! 2. Matching is side-effect free and only walks ancestors of the candidate.
//!
//! # Example
//!
//! ```
//! use veil_core::selector::Selector;
//!
//! let sel = Selector::parse(".modal.show, [data-bs-toggle=\"modal\"]").unwrap();
//! assert_eq!(sel.len(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::dom::{Document, ElementId};

/// Why a selector failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorErrorKind {
    /// The selector (or one list entry) was empty.
    Empty,
    /// A character that cannot appear at this position.
    UnexpectedChar(char),
    /// Input ended in the middle of a construct.
    UnexpectedEnd,
    /// A quoted attribute value was never closed.
    UnterminatedString,
    /// A pseudo-class other than `:not(...)`.
    UnsupportedPseudo(String),
}

/// Error produced by [`Selector::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    /// Byte offset into the source text.
    pub position: usize,
    /// What went wrong.
    pub kind: SelectorErrorKind,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SelectorErrorKind::Empty => write!(f, "empty selector at offset {}", self.position),
            SelectorErrorKind::UnexpectedChar(c) => {
                write!(f, "unexpected '{c}' at offset {}", self.position)
            }
            SelectorErrorKind::UnexpectedEnd => {
                write!(f, "unexpected end of selector at offset {}", self.position)
            }
            SelectorErrorKind::UnterminatedString => {
                write!(f, "unterminated string at offset {}", self.position)
            }
            SelectorErrorKind::UnsupportedPseudo(name) => {
                write!(f, "unsupported pseudo-class ':{name}' at offset {}", self.position)
            }
        }
    }
}

impl std::error::Error for SelectorError {}

/// Attribute comparison operator.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Includes(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    op: AttrOp,
}

impl AttrMatch {
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(expected) => value == expected,
            AttrOp::Prefix(prefix) => !prefix.is_empty() && value.starts_with(prefix.as_str()),
            AttrOp::Includes(word) => value.split_ascii_whitespace().any(|w| w == word),
        }
    }
}

/// A sequence of simple selectors that all apply to one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
    negations: Vec<Compound>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.negations.is_empty()
    }

    fn matches(&self, doc: &Document, id: ElementId) -> bool {
        let Some(el) = doc.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && tag != "*"
            && !el.tag().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(expected) = &self.id
            && el.attribute("id") != Some(expected.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        if !self.attrs.iter().all(|a| a.matches(el.attribute(&a.name))) {
            return false;
        }
        !self.negations.iter().any(|n| n.matches(doc, id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Compounds joined by combinators, stored left to right. The combinator
/// attached to entry `i` links it to entry `i - 1`; entry 0's is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches(&self, doc: &Document, id: ElementId) -> bool {
        match self.parts.len() {
            0 => false,
            n => Self::match_at(&self.parts, n - 1, doc, id),
        }
    }

    fn match_at(
        parts: &[(Combinator, Compound)],
        idx: usize,
        doc: &Document,
        id: ElementId,
    ) -> bool {
        let (combinator, compound) = &parts[idx];
        if !compound.matches(doc, id) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => doc
                .parent(id)
                .is_some_and(|p| Self::match_at(parts, idx - 1, doc, p)),
            Combinator::Descendant => doc
                .ancestors(id)
                .any(|a| Self::match_at(parts, idx - 1, doc, a)),
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        Parser::new(source).parse_list()
    }

    /// Number of comma-separated alternatives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Always false for a successfully parsed selector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Whether `id` matches any alternative of this selector.
    #[must_use]
    pub fn matches(&self, doc: &Document, id: ElementId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, id))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: SelectorErrorKind) -> SelectorError {
        SelectorError {
            position: self.pos,
            kind,
        }
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(c) => self.error(SelectorErrorKind::UnexpectedChar(c)),
            None => self.error(SelectorErrorKind::UnexpectedEnd),
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn expect(&mut self, want: char) -> Result<(), SelectorError> {
        if self.peek() == Some(want) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_list(&mut self) -> Result<Selector, SelectorError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            if matches!(self.peek(), None | Some(',')) {
                return Err(self.error(SelectorErrorKind::Empty));
            }
            alternatives.push(self.parse_complex()?);
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                None => break,
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(Selector { alternatives })
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut parts = vec![(Combinator::Descendant, self.parse_compound()?)];
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            parts.push((combinator, self.parse_compound()?));
        }
        Ok(Complex { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        if self.peek() == Some('*') {
            self.bump();
            compound.tag = Some("*".to_owned());
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.parse_ident()?);
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.bump();
                    let start = self.pos;
                    let name = self.parse_ident()?;
                    if name != "not" {
                        return Err(SelectorError {
                            position: start,
                            kind: SelectorErrorKind::UnsupportedPseudo(name),
                        });
                    }
                    self.expect('(')?;
                    self.skip_ws();
                    let inner = self.parse_compound()?;
                    self.skip_ws();
                    self.expect(')')?;
                    compound.negations.push(inner);
                }
                _ => break,
            }
        }
        if compound.is_empty() {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    fn parse_attr(&mut self) -> Result<AttrMatch, SelectorError> {
        self.skip_ws();
        let name = self.parse_ident()?;
        self.skip_ws();
        let op: fn(String) -> AttrOp = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttrMatch {
                    name,
                    op: AttrOp::Exists,
                });
            }
            Some('=') => {
                self.bump();
                AttrOp::Equals
            }
            Some('^') => {
                self.bump();
                self.expect('=')?;
                AttrOp::Prefix
            }
            Some('~') => {
                self.bump();
                self.expect('=')?;
                AttrOp::Includes
            }
            _ => return Err(self.unexpected()),
        };
        self.skip_ws();
        let value = self.parse_value()?;
        self.skip_ws();
        self.expect(']')?;
        Ok(AttrMatch {
            name,
            op: op(value),
        })
    }

    fn parse_value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let open = self.pos;
                self.bump();
                let start = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(_) => {}
                        None => {
                            return Err(SelectorError {
                                position: open,
                                kind: SelectorErrorKind::UnterminatedString,
                            });
                        }
                    }
                }
                Ok(self.src[start..self.pos - quote.len_utf8()].to_owned())
            }
            _ => self.parse_ident(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> (Document, ElementId, ElementId, ElementId) {
        let mut doc = Document::new();
        let body = doc.body();
        let modal = doc
            .build("div")
            .id("m")
            .class("modal fade")
            .attr("tabindex", "-1")
            .append_to(body);
        let dialog = doc.build("div").class("modal-dialog").append_to(modal);
        let button = doc
            .build("button")
            .attr("data-bs-dismiss", "modal")
            .append_to(dialog);
        (doc, modal, dialog, button)
    }

    #[test]
    fn parses_compound_and_list() {
        let sel = Selector::parse("div.modal.fade#m, [data-bs-toggle=\"modal\"]").unwrap();
        assert_eq!(sel.len(), 2);
    }

    #[test]
    fn matches_classes_and_id() {
        let (doc, modal, dialog, _) = sample();
        let sel = Selector::parse("#m.modal").unwrap();
        assert!(sel.matches(&doc, modal));
        assert!(!sel.matches(&doc, dialog));
    }

    #[test]
    fn descendant_and_child_combinators() {
        let (doc, _, dialog, button) = sample();
        assert!(Selector::parse(".modal button").unwrap().matches(&doc, button));
        assert!(!Selector::parse(".modal > button").unwrap().matches(&doc, button));
        assert!(Selector::parse(".modal > .modal-dialog > button")
            .unwrap()
            .matches(&doc, button));
        assert!(Selector::parse(".modal.fade .modal-dialog")
            .unwrap()
            .matches(&doc, dialog));
    }

    #[test]
    fn attribute_operators() {
        let (doc, modal, _, button) = sample();
        assert!(Selector::parse("[tabindex^='-']").unwrap().matches(&doc, modal));
        assert!(Selector::parse("[class~=fade]").unwrap().matches(&doc, modal));
        assert!(Selector::parse("[data-bs-dismiss=modal]").unwrap().matches(&doc, button));
        assert!(!Selector::parse("[data-bs-toggle]").unwrap().matches(&doc, button));
    }

    #[test]
    fn negation() {
        let (doc, modal, _, button) = sample();
        let sel = Selector::parse("[tabindex]:not([tabindex^=\"-\"]), button").unwrap();
        assert!(!sel.matches(&doc, modal));
        assert!(sel.matches(&doc, button));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            Selector::parse("").unwrap_err().kind,
            SelectorErrorKind::Empty
        );
        assert_eq!(
            Selector::parse("a,,b").unwrap_err().kind,
            SelectorErrorKind::Empty
        );
        assert_eq!(
            Selector::parse("[x=\"open").unwrap_err().kind,
            SelectorErrorKind::UnterminatedString
        );
        assert_eq!(
            Selector::parse("a:hover").unwrap_err().kind,
            SelectorErrorKind::UnsupportedPseudo("hover".into())
        );
        assert!(matches!(
            Selector::parse(".").unwrap_err().kind,
            SelectorErrorKind::UnexpectedEnd
        ));
        assert!(matches!(
            Selector::parse("div >").unwrap_err().kind,
            SelectorErrorKind::UnexpectedEnd
        ));
    }

    proptest! {
        #[test]
        fn parse_never_panics(s in "\\PC{0,24}") {
            let _ = Selector::parse(&s);
        }

        #[test]
        fn class_selector_roundtrips_through_matching(name in "[a-z][a-z0-9-]{0,8}") {
            let mut doc = Document::new();
            let body = doc.body();
            let el = doc.build("div").class(&name).append_to(body);
            let sel = Selector::parse(&format!(".{name}")).unwrap();
            prop_assert!(sel.matches(&doc, el));
            prop_assert!(!sel.matches(&doc, body));
        }
    }
}
