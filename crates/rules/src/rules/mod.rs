//! Rule language: lexer, parser and AST
//!
//! A rule is written as
//!
//! ```text
//! rule     := '@' name modifier*
//! modifier := params | range | values | pattern | optional
//! params   := '<' (rule | literal)? (',' (rule | literal)?)* '>'
//! range    := ('[' | '(') literal? ',' literal? (']' | ')') | '[' literal ']'
//! values   := '{' literal? (',' literal?)* '}'
//! pattern  := '/' regex '/'
//! optional := '?' | '=' (quoted | literal)
//! ```
//!
//! Modifiers may appear in any order in the source; [`Rule`]'s `Display`
//! always renders them as `@name<params>[range]{values}/pattern/` followed by
//! `?` or ` = 'default'`. Parsing the rendered text yields an equal rule.
//!
//! # Examples
//!
//! ```
//! use nebula_rules::rules::Rule;
//!
//! let rule = Rule::parse("@slice<@int[0,]>?[1,10]").unwrap();
//! assert_eq!(rule.name, "slice");
//! assert!(rule.optional);
//! assert_eq!(rule.to_string(), "@slice<@int[0,]>[1,10]?");
//! ```

mod error;
pub mod lexer;
pub mod parser;
pub mod token;

use std::fmt;

pub use error::SyntaxError;
pub use parser::Parser;

// ============================================================================
// LITERAL
// ============================================================================

/// A raw text fragment of a rule (a bound, a param, an enum value).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Literal(String);

impl Literal {
    /// Creates a literal from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Appends another literal in place.
    pub fn append(&mut self, other: &Literal) {
        self.0.push_str(&other.0);
    }

    /// Returns the literal text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the literal has no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Literal {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

// ============================================================================
// RULE NODE
// ============================================================================

/// A `<...>` parameter: either a nested rule or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    /// A nested rule such as the `@string[1,2]` in `@slice<@string[1,2]>`.
    Rule(Box<Rule>),
    /// A literal such as the `7` in `@float<7,2>`.
    Literal(Literal),
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => rule.fmt(f),
            Self::Literal(lit) => lit.fmt(f),
        }
    }
}

// ============================================================================
// RANGE
// ============================================================================

/// A `[min,max]` style range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleRange {
    /// `[n]`: min and max are both `n`.
    Exact(Literal),
    /// `[min,max]`, `(min,max)`, either side may be open.
    Span {
        /// Lower bound, absent when unbounded.
        min: Option<Literal>,
        /// Upper bound, absent when unbounded.
        max: Option<Literal>,
        /// `(` instead of `[`.
        exclusive_min: bool,
        /// `)` instead of `]`.
        exclusive_max: bool,
    },
}

impl RuleRange {
    /// Creates an inclusive `[min,max]` range.
    #[must_use]
    pub fn inclusive(min: Option<Literal>, max: Option<Literal>) -> Self {
        Self::Span {
            min,
            max,
            exclusive_min: false,
            exclusive_max: false,
        }
    }

    /// Lower bound and whether it is exclusive.
    #[must_use]
    pub fn min(&self) -> (Option<&Literal>, bool) {
        match self {
            Self::Exact(lit) => (Some(lit), false),
            Self::Span {
                min, exclusive_min, ..
            } => (min.as_ref(), *exclusive_min),
        }
    }

    /// Upper bound and whether it is exclusive.
    #[must_use]
    pub fn max(&self) -> (Option<&Literal>, bool) {
        match self {
            Self::Exact(lit) => (Some(lit), false),
            Self::Span {
                max, exclusive_max, ..
            } => (max.as_ref(), *exclusive_max),
        }
    }
}

impl fmt::Display for RuleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(lit) => write!(f, "[{lit}]"),
            Self::Span {
                min,
                max,
                exclusive_min,
                exclusive_max,
            } => {
                f.write_str(if *exclusive_min { "(" } else { "[" })?;
                if let Some(min) = min {
                    min.fmt(f)?;
                }
                f.write_str(",")?;
                if let Some(max) = max {
                    max.fmt(f)?;
                }
                f.write_str(if *exclusive_max { ")" } else { "]" })
            }
        }
    }
}

// ============================================================================
// PATTERN
// ============================================================================

/// A compiled `/pattern/`.
///
/// Compares by source text, since `regex::Regex` has no equality.
#[derive(Debug, Clone)]
pub struct Pattern(regex::Regex);

impl Pattern {
    /// Compiles a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(source).map(Self)
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the compiled regex.
    #[must_use]
    pub fn regex(&self) -> &regex::Regex {
        &self.0
    }

    /// Returns true when the pattern matches.
    #[must_use]
    pub fn is_match(&self, input: &str) -> bool {
        self.0.is_match(input)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        f.write_str(&self.as_str().replace('/', "\\/"))?;
        f.write_str("/")
    }
}

// ============================================================================
// RULE
// ============================================================================

/// A parsed rule.
///
/// Immutable once parsed; compiled validators keep what they need from it.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    /// Source text this rule was parsed from (empty for synthesized rules).
    pub raw: String,
    /// Rule name, e.g. `int`, `map`, `email`.
    pub name: String,
    /// `<...>` params. `None` entries are blank slots (`@map<,@int>`).
    pub params: Vec<Option<RuleNode>>,
    /// `[...]` / `(...)` range.
    pub range: Option<RuleRange>,
    /// `{...}` groups, combined by Cartesian product.
    pub value_matrix: Vec<Vec<Literal>>,
    /// `/.../` pattern.
    pub pattern: Option<Pattern>,
    /// `?` or a default value was given.
    pub optional: bool,
    /// `= 'value'`. Always implies `optional`.
    pub default_value: Option<String>,
}

impl Rule {
    /// Creates a bare rule with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses rule text.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        Parser::new(source)?.parse()
    }

    /// Sets the default value, which also makes the rule optional.
    pub fn set_default(&mut self, value: impl Into<String>) {
        self.default_value = Some(value.into());
        self.optional = true;
    }

    /// Returns the param at `index`, if present and not blank.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&RuleNode> {
        self.params.get(index).and_then(Option::as_ref)
    }

    /// Expands the value matrix into the final value set.
    ///
    /// Groups combine by Cartesian product: `{A,B}{a,b}` yields
    /// `Aa, Ab, Ba, Bb`.
    #[must_use]
    pub fn computed_values(&self) -> Vec<Literal> {
        let mut groups = self.value_matrix.iter();
        let Some(first) = groups.next() else {
            return Vec::new();
        };

        groups.fold(first.clone(), |acc, group| {
            acc.iter()
                .flat_map(|prefix| {
                    group.iter().map(move |suffix| {
                        let mut value = prefix.clone();
                        value.append(suffix);
                        value
                    })
                })
                .collect()
        })
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.range == other.range
            && self.value_matrix == other.value_matrix
            && self.pattern == other.pattern
            && self.optional == other.optional
            && self.default_value == other.default_value
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;

        if !self.params.is_empty() {
            f.write_str("<")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                if let Some(param) = param {
                    param.fmt(f)?;
                }
            }
            f.write_str(">")?;
        }

        if let Some(range) = &self.range {
            range.fmt(f)?;
        }

        for group in &self.value_matrix {
            f.write_str("{")?;
            for (i, value) in group.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                value.fmt(f)?;
            }
            f.write_str("}")?;
        }

        if let Some(pattern) = &self.pattern {
            pattern.fmt(f)?;
        }

        if let Some(default) = &self.default_value {
            write_default(f, default)?;
        } else if self.optional {
            f.write_str("?")?;
        }

        Ok(())
    }
}

/// Writes ` = 'text'`, escaping backslashes and single quotes.
pub(crate) fn write_default(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str(" = '")?;
    for ch in text.chars() {
        if ch == '\\' || ch == '\'' {
            f.write_str("\\")?;
        }
        write!(f, "{ch}")?;
    }
    f.write_str("'")
}

// ============================================================================
// TESTS
// ============================================================================
