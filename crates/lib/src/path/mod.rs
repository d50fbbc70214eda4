//! Path algebra for addressing values inside a hierarchical tree.
//!
//! A path is an ordered sequence of [`Key`]s. String keys are joined with `/`
//! and array indices are wrapped in brackets, so `users/ewout/posts[2]/title`
//! addresses the `title` of the third post of user `ewout`. The empty path is
//! the root.
//!
//! Segments equal to `*` or starting with `$` are variables. They match any
//! concrete key at the same position, from either side of a comparison, which
//! makes the same [`PathInfo`] usable both for addressing and for matching
//! subscription patterns.
//!
//! # Usage
//!
//! ```rust
//! use tessera::path::{Key, PathInfo};
//!
//! let path = PathInfo::get("users/ewout/posts[2]/title");
//! assert_eq!(path.keys().len(), 5);
//! assert_eq!(path.keys()[3], Key::Index(2));
//!
//! let pattern = PathInfo::get("users/$uid/posts[*]/title");
//! assert!(pattern.equals(&path));
//! assert!(PathInfo::get("users").is_ancestor_of(&path));
//! ```

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::constants::MAX_KEY_LENGTH;

mod errors;
mod variables;

pub use errors::PathError;
pub use variables::PathVariables;

/// A single step in a path: a named property or an array index.
///
/// Indices order before names so that sorted key lists keep array entries in
/// numeric order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Array element index
    Index(usize),
    /// Object property name
    Name(String),
}

impl Key {
    /// Returns true for `*` and `$name` segments.
    pub fn is_wildcard(&self) -> bool {
        match self {
            Key::Name(name) => name == "*" || name.starts_with('$'),
            Key::Index(_) => false,
        }
    }

    /// Returns true if this key is an array index
    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }

    /// Returns the property name, if this is a named key
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }

    /// Returns the index, if this is an index key
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(_) => None,
        }
    }

    /// The property name this key occupies in an object.
    ///
    /// Arrays are stored as integer-keyed objects, so index `3` becomes `"3"`.
    pub fn to_property(&self) -> String {
        match self {
            Key::Name(name) => name.clone(),
            Key::Index(index) => index.to_string(),
        }
    }

    /// Interprets an object property name as a key, treating all-digit names
    /// as indices when `as_index` is set.
    pub fn from_property(property: &str, as_index: bool) -> Key {
        if as_index && let Some(index) = parse_index(property) {
            return Key::Index(index);
        }
        Key::Name(property.to_string())
    }

    /// Checks whether two keys match under the wildcard rule.
    pub fn matches(&self, other: &Key) -> bool {
        self == other || self.is_wildcard() || other.is_wildcard()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{name}"),
            Key::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

fn parse_index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_segment(segment: &str) -> Key {
    if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if let Some(index) = parse_index(inner) {
            return Key::Index(index);
        }
        if inner == "*" || inner.starts_with('$') {
            return Key::Name(inner.to_string());
        }
    }
    Key::Name(segment.to_string())
}

/// Splits a path string into raw segments: `[` starts a new segment, and
/// leading and trailing slashes are ignored.
fn split_segments(path: &str) -> Vec<String> {
    let normalized = path.replace('[', "/[");
    let trimmed = normalized.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(str::to_string).collect()
}

/// Parses a path string into its keys, skipping empty segments.
pub fn parse_keys(path: &str) -> Vec<Key> {
    split_segments(path)
        .iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| parse_segment(segment))
        .collect()
}

fn render(keys: &[Key]) -> String {
    let mut out = String::new();
    for key in keys {
        match key {
            Key::Index(index) => out.push_str(&format!("[{index}]")),
            Key::Name(name) => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(name);
            }
        }
    }
    out
}

fn is_forbidden_char(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}')
        || matches!(c, '/' | '[' | ']' | '\\')
}

/// A parsed path together with its canonical string form.
///
/// `PathInfo` is immutable; [`child`](Self::child) and
/// [`parent`](Self::parent) return new values. The canonical string joins
/// names with `/` and renders indices as `[n]`, so `"/a/b[0]/"` and
/// `"a/b/[0]"` both become `a/b[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PathInfo {
    keys: Vec<Key>,
    path: String,
}

impl PathInfo {
    /// Parses a path string.
    pub fn get(path: impl AsRef<str>) -> Self {
        Self::from_keys(parse_keys(path.as_ref()))
    }

    /// The root path.
    pub fn root() -> Self {
        Self {
            keys: Vec::new(),
            path: String::new(),
        }
    }

    /// Builds a path from keys. Empty names are dropped.
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        let keys: Vec<Key> = keys
            .into_iter()
            .filter(|key| !matches!(key, Key::Name(name) if name.is_empty()))
            .collect();
        let path = render(&keys);
        Self { keys, path }
    }

    /// Canonical string form.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The ordered keys of this path.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The last key, or `None` for the root.
    pub fn key(&self) -> Option<&Key> {
        self.keys.last()
    }

    /// Number of keys in the path.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.keys.is_empty()
    }

    /// Alias of [`is_root`](Self::is_root).
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Returns true if any key is a `*` or `$name` variable.
    pub fn has_wildcards(&self) -> bool {
        self.keys.iter().any(Key::is_wildcard)
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<PathInfo> {
        if self.keys.is_empty() {
            return None;
        }
        Some(Self::from_keys(self.keys[..self.keys.len() - 1].to_vec()))
    }

    /// Canonical string of the parent path, or `None` for the root.
    pub fn parent_path(&self) -> Option<String> {
        self.parent().map(|parent| parent.path)
    }

    /// Appends a child key.
    ///
    /// A string key may itself be a relative path (`"user/name"` appends two
    /// keys). Every named segment is validated: it may not be empty, longer
    /// than 128 characters, or contain control characters or any of
    /// `\ / [ ]`.
    ///
    /// ```rust
    /// use tessera::path::PathInfo;
    ///
    /// let posts = PathInfo::get("users/ewout").child("posts").unwrap();
    /// assert_eq!(posts.path(), "users/ewout/posts");
    /// assert_eq!(posts.child(0usize).unwrap().path(), "users/ewout/posts[0]");
    /// assert!(posts.child("").is_err());
    /// ```
    pub fn child(&self, key: impl Into<Key>) -> Result<PathInfo, PathError> {
        self.child_keys([key.into()])
    }

    /// Appends several child keys, validating each like [`child`](Self::child).
    pub fn child_keys(&self, keys: impl IntoIterator<Item = Key>) -> Result<PathInfo, PathError> {
        let mut all = self.keys.clone();
        for key in keys {
            match key {
                Key::Index(index) => all.push(Key::Index(index)),
                Key::Name(name) => all.extend(self.expand_child_name(&name)?),
            }
        }
        Ok(Self::from_keys(all))
    }

    /// Canonical string of [`child`](Self::child).
    pub fn child_path(&self, key: impl Into<Key>) -> Result<String, PathError> {
        self.child(key).map(|child| child.path)
    }

    /// Appends exactly one key. Unlike [`child`](Self::child), a name is
    /// never split into several segments, so `"a/b"` is rejected.
    pub fn property(&self, key: &Key) -> Result<PathInfo, PathError> {
        if let Key::Name(name) = key {
            self.validate_name(name)?;
        }
        let mut keys = self.keys.clone();
        keys.push(key.clone());
        Ok(Self::from_keys(keys))
    }

    fn expand_child_name(&self, name: &str) -> Result<Vec<Key>, PathError> {
        if name.is_empty() {
            return Err(self.invalid_key(name, "keys cannot be empty"));
        }
        let mut keys = Vec::new();
        for segment in split_segments(name) {
            if segment.is_empty() {
                return Err(self.invalid_key(name, "keys cannot be empty"));
            }
            let key = parse_segment(&segment);
            if let Key::Name(segment_name) = &key {
                self.validate_name(segment_name)?;
            }
            keys.push(key);
        }
        Ok(keys)
    }

    fn validate_name(&self, name: &str) -> Result<(), PathError> {
        if name.is_empty() {
            return Err(self.invalid_key(name, "keys cannot be empty"));
        }
        if name.chars().any(is_forbidden_char) {
            return Err(self.invalid_key(
                name,
                "keys cannot contain control characters or any of the following characters: \\ / [ ]",
            ));
        }
        if name.chars().count() > MAX_KEY_LENGTH {
            return Err(self.invalid_key(name, "key is too long, max key length is 128"));
        }
        Ok(())
    }

    fn invalid_key(&self, key: &str, reason: &str) -> PathError {
        PathError::InvalidKey {
            key: key.to_string(),
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Checks if `other` addresses the same node, honoring variables on both
    /// sides: `posts/*/title` equals `posts/12344/title`.
    pub fn equals(&self, other: &PathInfo) -> bool {
        if self.path == other.path {
            return true;
        }
        self.keys.len() == other.keys.len() && keys_match(&self.keys, &other.keys)
    }

    /// Checks if this path is a strict ancestor of `descendant`.
    pub fn is_ancestor_of(&self, descendant: &PathInfo) -> bool {
        if descendant.is_root() || self.path == descendant.path {
            return false;
        }
        if self.is_root() {
            return true;
        }
        self.keys.len() < descendant.keys.len() && keys_match(&self.keys, &descendant.keys)
    }

    /// Checks if this path is a strict descendant of `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &PathInfo) -> bool {
        ancestor.is_ancestor_of(self)
    }

    /// Checks if both paths lie on the same trail, i.e. one is a prefix of
    /// the other. The root is on every trail.
    pub fn is_on_trail_of(&self, other: &PathInfo) -> bool {
        if self.is_root() || other.is_root() || self.path == other.path {
            return true;
        }
        keys_match(&self.keys, &other.keys)
    }

    /// Checks if this path is a direct child of `parent`.
    pub fn is_child_of(&self, parent: &PathInfo) -> bool {
        match self.parent() {
            Some(own_parent) => own_parent.equals(parent),
            None => false,
        }
    }

    /// Checks if this path is the direct parent of `child`.
    pub fn is_parent_of(&self, child: &PathInfo) -> bool {
        match child.parent() {
            Some(parent) => self.equals(&parent),
            None => false,
        }
    }

    /// Keys of this path below `ancestor`'s depth.
    ///
    /// Only meaningful when `ancestor` is on this path's trail.
    pub fn keys_below(&self, ancestor: &PathInfo) -> &[Key] {
        let depth = ancestor.keys.len().min(self.keys.len());
        &self.keys[depth..]
    }
}

/// Positional comparison over the shorter of both key lists.
fn keys_match(a: &[Key], b: &[Key]) -> bool {
    a.iter().zip(b.iter()).all(|(a, b)| a.matches(b))
}

impl Default for PathInfo {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for PathInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl AsRef<str> for PathInfo {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl FromStr for PathInfo {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::get(s))
    }
}

impl From<&str> for PathInfo {
    fn from(path: &str) -> Self {
        Self::get(path)
    }
}

impl From<String> for PathInfo {
    fn from(path: String) -> Self {
        Self::get(path)
    }
}

impl From<&PathInfo> for PathInfo {
    fn from(path: &PathInfo) -> Self {
        path.clone()
    }
}

impl From<PathInfo> for String {
    fn from(path: PathInfo) -> Self {
        path.path
    }
}

/// A stored pointer to another location in the same database.
///
/// The path is normalized on construction, so references compare equal
/// whenever they address the same canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PathReference {
    path: String,
}

impl PathReference {
    /// Creates a reference to `path`.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: PathInfo::get(path).path,
        }
    }

    /// Canonical path of the referenced node.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl From<String> for PathReference {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<PathReference> for String {
    fn from(reference: PathReference) -> Self {
        reference.path
    }
}

impl fmt::Display for PathReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}
