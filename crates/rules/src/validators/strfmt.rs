//! Named string formats: `@email`, `@uuid`, `@hostname`, ...
//!
//! A format is a [`Creator`] of its own. Built-ins are registered by
//! [`Factory::builtin`](crate::factory::Factory::builtin); applications
//! register more with [`StrFmt::regex`] or [`StrFmt::func`].

use std::borrow::Cow;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use super::{Section, Validator, reject_sections};
use crate::factory::{CompileError, CreateContext, Creator};
use crate::foundation::ValidationError;
use crate::types::Kind;
use crate::value::Value;

const BYTE: &str = r"(?:0|[1-9]\d?|1\d\d|2[0-4]\d|25[0-5])";
const PERCENT: &str = r"(?:0|[1-9]\d?|100)%";
const ALPHA: &str = r"(?:0|1|0?\.\d+)";

static BUILTIN: LazyLock<Vec<StrFmt>> = LazyLock::new(|| {
    let rgb = format!(
        r"\(\s*(?:{BYTE}\s*,\s*{BYTE}\s*,\s*{BYTE}|{PERCENT}\s*,\s*{PERCENT}\s*,\s*{PERCENT})"
    );
    let regexes: [(&'static [&'static str], String); 13] = [
        (
            &["email"],
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$".to_owned(),
        ),
        (&["url"], r"^https?://[^\s/$.?#].[^\s]*$".to_owned()),
        (
            &["uuid"],
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$".to_owned(),
        ),
        (
            &["hex-color", "hexColor"],
            r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$".to_owned(),
        ),
        (&["rgb-color", "rgbColor"], format!(r"^rgb{rgb}\s*\)$")),
        (
            &["rgba-color", "rgbaColor"],
            format!(r"^rgba{rgb}\s*,\s*{ALPHA}\s*\)$"),
        ),
        (
            &["base64"],
            r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=|[A-Za-z0-9+/]{4})$".to_owned(),
        ),
        (
            &["base64-url", "base64URL"],
            r"^(?:[A-Za-z0-9_-]{4})*(?:[A-Za-z0-9_-]{2}==|[A-Za-z0-9_-]{3}=|[A-Za-z0-9_-]{4})$".to_owned(),
        ),
        (&["ascii"], r"^[\x00-\x7F]*$".to_owned()),
        (
            &["printable-ascii", "printableASCII"],
            r"^[\x20-\x7E]*$".to_owned(),
        ),
        (&["alpha"], r"^[a-zA-Z]+$".to_owned()),
        (&["alpha-numeric", "alphaNumeric"], r"^[a-zA-Z0-9]+$".to_owned()),
        (
            &["number", "numeric"],
            r"^[-+]?[0-9]+(?:\.[0-9]+)?$".to_owned(),
        ),
    ];

    let mut formats: Vec<StrFmt> = regexes
        .into_iter()
        .map(|(names, pattern)| {
            StrFmt::regex(names.iter().copied(), &pattern).expect("built-in format pattern")
        })
        .collect();
    formats.push(StrFmt::func(["hostname"], "an RFC 1123 hostname", is_hostname));
    formats.push(StrFmt::func(["ipv4"], "an IPv4 address", |s| {
        s.parse::<Ipv4Addr>().is_ok()
    }));
    formats.push(StrFmt::func(["ipv6"], "an IPv6 address", |s| {
        s.parse::<Ipv6Addr>().is_ok()
    }));
    formats
});

/// Every built-in format.
pub(crate) fn builtin_formats() -> Vec<StrFmt> {
    BUILTIN.clone()
}

/// Hostname per RFC 1123: dot-separated labels of 1 to 63 ASCII letters,
/// digits and hyphens, no label starting or ending with a hyphen, at most
/// 253 characters. One trailing dot is allowed.
fn is_hostname(input: &str) -> bool {
    let hostname = input.strip_suffix('.').unwrap_or(input);
    if hostname.is_empty() || hostname.len() > 253 {
        return false;
    }

    hostname.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[derive(Clone)]
enum Matcher {
    Regex(regex::Regex),
    Func {
        description: Cow<'static, str>,
        check: fn(&str) -> bool,
    },
}

/// A named string format.
#[derive(Clone)]
pub struct StrFmt {
    names: Vec<Cow<'static, str>>,
    matcher: Matcher,
}

impl StrFmt {
    /// A format matched by a regular expression.
    ///
    /// ```
    /// use nebula_rules::prelude::*;
    /// use nebula_rules::validators::StrFmt;
    ///
    /// let factory = Factory::builtin();
    /// factory.register(StrFmt::regex(["semver"], r"^\d+\.\d+\.\d+$").unwrap());
    ///
    /// let v = factory.compile("@semver", &Type::string(), &[]).unwrap();
    /// assert!(v.validate(&Value::from("1.2.3")).is_ok());
    /// assert!(v.validate(&Value::from("1.2")).is_err());
    /// ```
    pub fn regex<I, N>(names: I, pattern: &str) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<Cow<'static, str>>,
    {
        Ok(Self {
            names: names.into_iter().map(Into::into).collect(),
            matcher: Matcher::Regex(regex::Regex::new(pattern)?),
        })
    }

    /// A format checked by a function. `description` stands in for the
    /// pattern in error messages.
    pub fn func<I, N>(
        names: I,
        description: impl Into<Cow<'static, str>>,
        check: fn(&str) -> bool,
    ) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Cow<'static, str>>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            matcher: Matcher::Func {
                description: description.into(),
                check,
            },
        }
    }

    /// Primary name, used when rendering and in messages.
    #[must_use]
    pub fn name(&self) -> &str {
        self.names.first().map_or("", |n| n.as_ref())
    }

    /// Returns true when `input` is in this format.
    #[must_use]
    pub fn is_match(&self, input: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(regex) => regex.is_match(input),
            Matcher::Func { check, .. } => check(input),
        }
    }

    fn pattern(&self) -> &str {
        match &self.matcher {
            Matcher::Regex(regex) => regex.as_str(),
            Matcher::Func { description, .. } => description,
        }
    }

    /// Checks one value.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        let Value::String(s) = value else {
            return Err(ValidationError::unsupported(
                self.to_string(),
                value.kind_name(),
            ));
        };
        if self.is_match(s) {
            return Ok(());
        }
        Err(ValidationError::NotMatch {
            target: self.name().to_owned().into(),
            pattern: self.pattern().to_owned(),
            current: s.clone(),
        })
    }
}

impl Creator for StrFmt {
    fn names(&self) -> Vec<Cow<'static, str>> {
        self.names.clone()
    }

    fn create(&self, ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
        ctx.expect_kind(&[Kind::String])?;
        reject_sections(
            ctx,
            &[Section::Params, Section::Range, Section::Values, Section::Pattern],
        )?;
        Ok(Validator::StrFmt(self.clone()))
    }
}

impl fmt::Debug for StrFmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrFmt")
            .field("names", &self.names)
            .field("pattern", &self.pattern())
            .finish()
    }
}

impl fmt::Display for StrFmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}
