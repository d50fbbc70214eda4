//! Variable extraction and substitution for wildcard paths.
//!
//! Subscription and type-mapping rules are registered on paths such as
//! `users/$uid/posts/*`. When an event fires on a concrete path, the captured
//! keys are extracted here and can later be substituted back into another
//! variable path.

use std::collections::BTreeMap;

use super::{Key, PathError, PathInfo, parse_keys};

/// Values captured from a concrete path by a variable path.
///
/// Captures are available by position (every `*` and `$name` segment, in
/// order) and, for `$name` segments, by both `$name` and `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariables {
    positional: Vec<Key>,
    named: BTreeMap<String, Key>,
}

impl PathVariables {
    /// Creates an empty set of captures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured key at `index`.
    pub fn get(&self, index: usize) -> Option<&Key> {
        self.positional.get(index)
    }

    /// Captured key by variable name, with or without the leading `$`.
    pub fn get_named(&self, name: &str) -> Option<&Key> {
        self.named.get(name)
    }

    /// Number of positional captures.
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    /// Positional captures in order.
    pub fn positional(&self) -> &[Key] {
        &self.positional
    }

    /// Named captures, including both `$name` and `name` entries.
    pub fn named(&self) -> &BTreeMap<String, Key> {
        &self.named
    }

    /// Appends a positional capture.
    pub fn push(&mut self, value: Key) {
        self.positional.push(value);
    }

    fn capture(&mut self, segment: &Key, value: &Key) {
        self.positional.push(value.clone());
        if let Key::Name(name) = segment
            && let Some(bare) = name.strip_prefix('$')
        {
            self.named.insert(name.clone(), value.clone());
            self.named
                .entry(bare.to_string())
                .or_insert_with(|| value.clone());
        }
    }
}

impl PathInfo {
    /// Extracts the keys that the variables of `var_path` capture in
    /// `full_path`.
    ///
    /// Returns an empty result if `var_path` has no variables, or if its keys
    /// do not match the leading keys of `full_path`.
    ///
    /// ```rust
    /// use tessera::path::{Key, PathInfo};
    ///
    /// let vars = PathInfo::extract_variables("users/$uid/posts/$postid", "users/ewout/posts/post1");
    /// assert_eq!(vars.get(0), Some(&Key::from("ewout")));
    /// assert_eq!(vars.get_named("postid"), Some(&Key::from("post1")));
    /// assert_eq!(vars.get_named("$uid"), Some(&Key::from("ewout")));
    /// ```
    pub fn extract_variables(var_path: &str, full_path: &str) -> PathVariables {
        let mut variables = PathVariables::new();
        if !var_path.contains('*') && !var_path.contains('$') {
            return variables;
        }
        let keys = parse_keys(var_path);
        let path_keys = parse_keys(full_path);
        if keys.len() > path_keys.len() {
            return variables;
        }
        let Ok(filled) = Self::fill_variables(var_path, full_path) else {
            return variables;
        };
        if filled.keys() != &path_keys[..keys.len()] {
            return variables;
        }
        for (key, path_key) in keys.iter().zip(path_keys.iter()) {
            if key.is_wildcard() {
                variables.capture(key, path_key);
            }
        }
        variables
    }

    /// Replaces the variables of `var_path` with the keys found at the same
    /// positions in `full_path`.
    ///
    /// Keys beyond the end of `full_path` are kept as they are; `full_path`
    /// keys beyond the end of `var_path` are ignored.
    ///
    /// ```rust
    /// use tessera::path::PathInfo;
    ///
    /// let filled = PathInfo::fill_variables("users/$uid/posts/$postid", "users/ewout/posts/post1/title").unwrap();
    /// assert_eq!(filled.path(), "users/ewout/posts/post1");
    /// ```
    pub fn fill_variables(var_path: &str, full_path: &str) -> Result<PathInfo, PathError> {
        let keys = parse_keys(var_path);
        if !keys.iter().any(Key::is_wildcard) {
            return Ok(PathInfo::from_keys(keys));
        }
        let path_keys = parse_keys(full_path);
        let mut merged = Vec::with_capacity(keys.len());
        for (index, key) in keys.into_iter().enumerate() {
            match path_keys.get(index) {
                None => merged.push(key),
                Some(path_key) if *path_key == key => merged.push(key),
                Some(path_key) if key.is_wildcard() => merged.push(path_key.clone()),
                Some(_) => {
                    return Err(PathError::VariableMismatch {
                        var_path: var_path.to_string(),
                        full_path: full_path.to_string(),
                    });
                }
            }
        }
        Ok(PathInfo::from_keys(merged))
    }

    /// Replaces every variable of `var_path`, in order, with the positional
    /// captures in `vars`.
    ///
    /// With no captures the path is returned unchanged.
    pub fn fill_variables_with(var_path: &str, vars: &PathVariables) -> Result<PathInfo, PathError> {
        if vars.is_empty() {
            return Ok(PathInfo::get(var_path));
        }
        let mut next = 0;
        let mut path = PathInfo::root();
        for key in parse_keys(var_path) {
            let key = if key.is_wildcard() {
                let value = vars.get(next).ok_or_else(|| PathError::MissingVariable {
                    var_path: var_path.to_string(),
                    index: next,
                })?;
                next += 1;
                value.clone()
            } else {
                key
            };
            path = path.child(key)?;
        }
        Ok(path)
    }
}
