use derive_more::Display;
use thiserror::Error;

/// The path of a node in a hierarchy.
///
/// A node path is `/`-rooted: the root node is `/`, and every other path is
/// `/` followed by `/`-separated non-empty segments with no trailing `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// The root node path.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Create a new node path from `path`.
    ///
    /// # Errors
    /// Returns a [`NodePathError`] if `path` is not a valid node path.
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// Extracts a string slice of the underlying path [`String`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a path: `/`, or `/`-prefixed segments with no empty segment
    /// and no trailing `/`.
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path == "/"
            || (path.starts_with('/')
                && !path.ends_with('/')
                && path[1..].split('/').all(|segment| !segment.is_empty()))
    }

    /// Create the path of a child node named `name`.
    ///
    /// # Errors
    /// Returns a [`NodePathError`] if `name` contains a `/` or is empty.
    pub fn child(&self, name: &str) -> Result<Self, NodePathError> {
        if name.is_empty() || name.contains('/') {
            return Err(NodePathError(name.to_string()));
        }
        if self.0 == "/" {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }

    /// Create the path of a descendant at a `/`-separated relative `path`.
    ///
    /// # Errors
    /// Returns a [`NodePathError`] if any segment of `path` is empty.
    pub fn descendant(&self, path: &str) -> Result<Self, NodePathError> {
        let mut node = self.clone();
        for segment in path.trim_matches('/').split('/') {
            node = node.child(segment)?;
        }
        Ok(node)
    }

    /// Returns the name of the node (the final path segment).
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path() {
        assert!(NodePath::new("/").is_ok());
        assert!(NodePath::new("/a/b").is_ok());
        assert!(NodePath::new("a/b").is_err());
        assert!(NodePath::new("/a/").is_err());
        assert!(NodePath::new("/a//b").is_err());
        assert_eq!(NodePath::root().child("a").unwrap().as_str(), "/a");
        assert_eq!(
            NodePath::new("/a").unwrap().child("b").unwrap().as_str(),
            "/a/b"
        );
        assert!(NodePath::root().child("a/b").is_err());
        assert_eq!(
            NodePath::root().descendant("a/0").unwrap().as_str(),
            "/a/0"
        );
        assert_eq!(NodePath::new("/a/b").unwrap().name(), "b");
    }
}
