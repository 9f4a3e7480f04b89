//! Key paths locating a failure inside a validated value.

use std::fmt;

use smallvec::SmallVec;

/// One step of a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A struct field.
    Field(String),
    /// A slice or array index.
    Index(usize),
    /// A map key, rendered as text.
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Where in a value an error occurred, e.g. `data.structSlice[2].name`.
///
/// Most paths are a handful of segments deep, so they live inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath(SmallVec<[PathSegment; 4]>);

impl KeyPath {
    /// The empty path (the value itself).
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Inserts a segment in front, used when a nested error set is lifted
    /// into its parent.
    pub fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }

    /// Returns a copy with `segment` appended.
    #[must_use]
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// The path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Field(name) | PathSegment::Key(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
            }
        }
        Ok(())
    }
}

impl serde::Serialize for KeyPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mixed_path() {
        let path: KeyPath = [
            PathSegment::from("data"),
            PathSegment::from("structSlice"),
            PathSegment::Index(2),
            PathSegment::from("name"),
        ]
        .into_iter()
        .collect();
        assert_eq!(path.to_string(), "data.structSlice[2].name");
    }

    #[test]
    fn test_render_leading_index_and_key() {
        let mut path = KeyPath::root();
        path.push(3usize);
        path.push(PathSegment::Key("k".into()));
        assert_eq!(path.to_string(), "[3].k");
    }

    #[test]
    fn test_prepend() {
        let mut path = KeyPath::root().join("name");
        path.prepend(PathSegment::Index(0));
        path.prepend(PathSegment::from("items"));
        assert_eq!(path.to_string(), "items[0].name");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_root_is_empty() {
        assert!(KeyPath::root().is_empty());
        assert_eq!(KeyPath::root().to_string(), "");
    }
}
