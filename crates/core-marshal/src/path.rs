//! Parameter paths and index vectors
//!
//! Both the write pass and the read pass derive every document address from
//! these two types, so a field always lands on the same remote location in
//! both directions.

use crate::error::{Error, Result};
use std::fmt;

/// Maximum number of enclosing arrays a value may sit in
pub const MAX_ARRAY_DEPTH: usize = 2;

/// Dotted remote parameter path, rooted at the program name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamPath(String);

impl ParamPath {
    pub fn root(program: &str) -> Self {
        ParamPath(program.to_string())
    }

    /// Path of a child parameter named `name`
    pub fn extend(&self, name: &str) -> Self {
        ParamPath(format!("{}.{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Array positions addressing a value, outermost array first
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IndexVector(Vec<usize>);

impl IndexVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Fail if another array dimension cannot be opened below `path`
    pub fn ensure_nestable(&self, path: &ParamPath) -> Result<()> {
        if self.0.len() >= MAX_ARRAY_DEPTH {
            return Err(Error::PathDepth {
                path: path.to_string(),
                max: MAX_ARRAY_DEPTH,
            });
        }
        Ok(())
    }

    /// Index vector of element `position` of the array at `path`
    pub fn next_index(&self, position: usize, path: &ParamPath) -> Result<IndexVector> {
        self.ensure_nestable(path)?;
        let mut indices = self.0.clone();
        indices.push(position);
        Ok(IndexVector(indices))
    }
}

impl fmt::Display for IndexVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_builds_dotted_path() {
        let path = ParamPath::root("ORDPGM").extend("HEADER").extend("CNT");
        assert_eq!(path.as_str(), "ORDPGM.HEADER.CNT");
        assert_eq!(path.to_string(), "ORDPGM.HEADER.CNT");
    }

    #[test]
    fn test_next_index_appends_outermost_first() {
        let path = ParamPath::root("P").extend("A");
        let outer = IndexVector::new().next_index(4, &path).unwrap();
        let inner = outer.next_index(1, &path.extend("B")).unwrap();
        assert_eq!(outer.as_slice(), &[4]);
        assert_eq!(inner.as_slice(), &[4, 1]);
        assert_eq!(inner.depth(), 2);
    }

    #[test]
    fn test_third_dimension_is_rejected() {
        let path = ParamPath::root("P").extend("A");
        let two = IndexVector::new()
            .next_index(0, &path)
            .unwrap()
            .next_index(0, &path)
            .unwrap();
        let err = two.next_index(0, &path).unwrap_err();
        assert!(matches!(err, Error::PathDepth { max: MAX_ARRAY_DEPTH, .. }));
        assert!(two.ensure_nestable(&path).is_err());
    }
}
