//! Flat names and path lookup.
//!
//! Every element contributes one segment to the flat names of itself and
//! its descendants:
//!
//! | element                 | segment                              |
//! |-------------------------|--------------------------------------|
//! | root, Dict child        | its own name                         |
//! | Array/MultiValue child  | the member name, at every position   |
//! | List child              | its index, then the member name      |
//!
//! Empty segments are skipped along with their separator, so anonymous
//! forms and anonymous members add nothing to the key.

use crate::element::{Element, ElementKind, ElementMut, ElementRef};
use crate::error::{FlatlandError, Result};

/// Separator used when none is given.
pub const DEFAULT_SEPARATOR: char = '_';

/// Joins two name parts, skipping empty ones.
pub(crate) fn join(prefix: &str, segment: &str, sep: char) -> String {
    match (prefix.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}{sep}{segment}"),
    }
}

impl<'a> ElementRef<'a> {
    /// This element's own contribution to flat names.
    pub fn segment(&self, sep: char) -> String {
        let in_list = self.parent().is_some_and(|p| p.kind() == ElementKind::List);
        self.segment_at(if in_list { self.position() } else { None }, sep)
    }

    /// [`segment`](Self::segment) for a child whose position in its parent
    /// is already known.
    pub(crate) fn segment_at(&self, index: Option<usize>, sep: char) -> String {
        let parent_kind = self.parent().map(|p| p.kind());
        match (parent_kind, index) {
            (Some(ElementKind::List), Some(index)) => join(&index.to_string(), self.name(), sep),
            _ => self.name().to_string(),
        }
    }

    /// Flat key of this element, joining segments from the root down.
    ///
    /// # Examples
    ///
    /// ```
    /// use flatland_core::{Schema, Value};
    ///
    /// let schema = Schema::dict([
    ///     Schema::list(Schema::dict([Schema::string().named("name")])).named("snacks"),
    /// ])
    /// .named("ns");
    /// let el = schema
    ///     .create_with(Value::map([(
    ///         "snacks",
    ///         Value::list([Value::map([("name", "cheese")])]),
    ///     )]))
    ///     .unwrap();
    ///
    /// let name = el.el("snacks.0.name").unwrap();
    /// assert_eq!(name.flattened_name('_'), "ns_snacks_0_name");
    /// ```
    pub fn flattened_name(&self, sep: char) -> String {
        let mut segments: Vec<String> = std::iter::once(*self)
            .chain(self.parents())
            .map(|el| el.segment(sep))
            .filter(|s| !s.is_empty())
            .collect();
        segments.reverse();
        segments.join(&sep.to_string())
    }

    /// Flat key using [`DEFAULT_SEPARATOR`].
    pub fn flat_name(&self) -> String {
        self.flattened_name(DEFAULT_SEPARATOR)
    }

    /// Resolves a dotted path of dict keys and sequence indices.
    ///
    /// An empty path resolves to `self`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::PathNotFound`] if any segment does not
    /// resolve.
    pub fn el(&self, path: &str) -> Result<ElementRef<'a>> {
        let not_found = || FlatlandError::PathNotFound(path.to_string());
        if path.is_empty() {
            return Ok(*self);
        }
        path.split('.').try_fold(*self, |current, segment| {
            match current.kind() {
                kind if kind.is_dict() => current.get(segment).map_err(|_| not_found()),
                kind if kind.is_sequence() => {
                    let index: usize = segment.parse().map_err(|_| not_found())?;
                    current.at(index).map_err(|_| not_found())
                }
                _ => Err(not_found()),
            }
        })
    }
}

impl ElementMut<'_> {
    /// Resolves a dotted path, mutably. See [`ElementRef::el`].
    ///
    /// # Errors
    ///
    /// As [`ElementRef::el`].
    pub fn el_mut(&mut self, path: &str) -> Result<ElementMut<'_>> {
        let id = self.view().el(path)?.id();
        Ok(self.reborrow(id))
    }

    /// Flat key of this element.
    pub fn flattened_name(&self, sep: char) -> String {
        self.view().flattened_name(sep)
    }
}

impl Element {
    /// Resolves a dotted path from the root. See [`ElementRef::el`].
    ///
    /// # Errors
    ///
    /// As [`ElementRef::el`].
    pub fn el(&self, path: &str) -> Result<ElementRef<'_>> {
        self.root().el(path)
    }

    /// Resolves a dotted path from the root, mutably.
    ///
    /// # Errors
    ///
    /// As [`ElementRef::el`].
    pub fn el_mut(&mut self, path: &str) -> Result<ElementMut<'_>> {
        let id = self.root().el(path)?.id();
        Ok(ElementMut { tree: self, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Schema, Value};

    #[test]
    fn test_join_skips_empty() {
        assert_eq!(join("", "x", '_'), "x");
        assert_eq!(join("a", "", '_'), "a");
        assert_eq!(join("a", "x", '.'), "a.x");
        assert_eq!(join("", "", '_'), "");
    }

    #[test]
    fn test_anonymous_root_adds_nothing() {
        let el = Schema::dict([Schema::string().named("x")]).create();
        assert_eq!(el.get("x").unwrap().flat_name(), "x");
        assert_eq!(el.root().flat_name(), "");
    }

    #[test]
    fn test_array_children_share_member_name() {
        let schema = Schema::array(Schema::string().named("s")).named("a");
        let el = schema.create_with(Value::list(["x", "y"])).unwrap();
        let names: Vec<String> = el.root().children().iter().map(|c| c.flat_name()).collect();
        assert_eq!(names, vec!["a_s", "a_s"]);

        let anon = Schema::array(Schema::string()).named("a");
        let el = anon.create_with(Value::list(["x"])).unwrap();
        assert_eq!(el.root().children()[0].flat_name(), "a");
    }

    #[test]
    fn test_list_children_are_indexed() {
        let schema = Schema::list(Schema::string()).named("l");
        let el = schema.create_with(Value::list(["x", "y"])).unwrap();
        assert_eq!(el.at(1).unwrap().flattened_name('.'), "l.1");

        let named = Schema::list(Schema::string().named("s")).named("l");
        let el = named.create_with(Value::list(["x"])).unwrap();
        assert_eq!(el.at(0).unwrap().flat_name(), "l_0_s");
    }

    #[test]
    fn test_el_paths() {
        let schema = Schema::dict([Schema::integer().named("x"), Schema::integer().named("y")])
            .named("s");
        let el = schema.create();
        assert_eq!(el.el("x").unwrap().name(), "x");
        assert_eq!(el.el("").unwrap().id(), el.root().id());
        assert!(matches!(el.el("not_x"), Err(FlatlandError::PathNotFound(_))));
        assert!(el.el("x.y").is_err());
        assert!(el.el("not_x").unwrap_err().is_key_error());
    }
}
