//! Struct tags: `key:"value"` annotations carried by fields.
//!
//! ```text
//! validate:"@string[1,10]" default:"abc" errMsg:"bad name"
//! ```

use std::str::FromStr;

/// Malformed tag text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed struct tag `{tag}` at offset {offset}")]
pub struct TagError {
    /// The full tag text.
    pub tag: String,
    /// Byte offset of the problem.
    pub offset: usize,
}

/// An ordered set of `key:"value"` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTag {
    entries: Vec<(String, String)>,
}

impl StructTag {
    /// An empty tag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Looks up `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true when no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses tag text.
    ///
    /// Values are double-quoted; `\"` and `\\` are the only escapes.
    pub fn parse(text: &str) -> Result<Self, TagError> {
        let err = |offset| TagError {
            tag: text.to_owned(),
            offset,
        };

        let bytes = text.as_bytes();
        let mut tag = Self::new();
        let mut i = 0;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return Ok(tag);
            }

            let key_start = i;
            while i < bytes.len() && !matches!(bytes[i], b':' | b'"') && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i == key_start || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
                return Err(err(key_start));
            }
            let key = &text[key_start..i];
            i += 2;

            let mut value = String::new();
            let mut closed = false;
            let mut chars = text[i..].char_indices();
            while let Some((offset, ch)) = chars.next() {
                match ch {
                    '\\' => match chars.next() {
                        Some((_, escaped @ ('"' | '\\'))) => value.push(escaped),
                        Some((_, other)) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => return Err(err(i + offset)),
                    },
                    '"' => {
                        i += offset + 1;
                        closed = true;
                        break;
                    }
                    _ => value.push(ch),
                }
            }
            if !closed {
                return Err(err(key_start));
            }

            tag = tag.with(key, value);
        }
    }
}

impl FromStr for StructTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_multiple_keys() {
        let tag = StructTag::parse(r#"validate:"@string[1,10]" default:"abc" errMsg:"bad name""#)
            .unwrap();
        assert_eq!(tag.get("validate"), Some("@string[1,10]"));
        assert_eq!(tag.get("default"), Some("abc"));
        assert_eq!(tag.get("errMsg"), Some("bad name"));
        assert_eq!(tag.get("name"), None);
    }

    #[test]
    fn test_parse_escapes() {
        let tag = StructTag::parse(r#"validate:"@string = \"a\\b\"""#).unwrap();
        assert_eq!(tag.get("validate"), Some(r#"@string = "a\b""#));
    }

    #[test]
    fn test_parse_keeps_other_backslashes() {
        let tag = StructTag::parse(r#"validate:"@string/^\d+$/""#).unwrap();
        assert_eq!(tag.get("validate"), Some(r"@string/^\d+$/"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(StructTag::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(StructTag::parse("validate").unwrap_err().offset, 0);
        assert_eq!(StructTag::parse(r#"a:"1" b:"2"#).unwrap_err().offset, 6);
        assert!(r#":"x""#.parse::<StructTag>().is_err());
    }

    #[test]
    fn test_with_replaces() {
        let tag = StructTag::new().with("name", "a").with("name", "b");
        assert_eq!(tag.get("name"), Some("b"));
    }
}
