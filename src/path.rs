//! Construction paths
//!
//! A `ConstructionPath` addresses one node in the nested-argument tree as the
//! sequence of argument indices from the root. Paths are small-integer value
//! types with structural equality, so they can key the state tree directly
//! with no string round-tripping.

use smallvec::SmallVec;
use std::fmt;

/// Position in the nested-argument tree. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstructionPath(SmallVec<[u32; 4]>);

impl ConstructionPath {
    /// The root of the argument tree.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_indices(indices: &[u32]) -> Self {
        Self(SmallVec::from_slice(indices))
    }

    /// Path of the argument at `index` below this node.
    pub fn child(&self, index: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(SmallVec::from_slice(&self.0[..self.0.len() - 1])))
        }
    }

    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &ConstructionPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// True when this path lies strictly below `ancestor`.
    pub fn is_strict_descendant_of(&self, ancestor: &ConstructionPath) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }
}

impl From<&[u32]> for ConstructionPath {
    fn from(indices: &[u32]) -> Self {
        Self::from_indices(indices)
    }
}

impl fmt::Display for ConstructionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}
