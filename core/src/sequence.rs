//! Array, List and MultiValue operations.
//!
//! The three sequence kinds share one child vector and one set of
//! list-style operations. Every value stored through them is adapted by a
//! fresh child built from the member schema, so assigning to a slot never
//! reuses the previous child.
//!
//! # Examples
//!
//! ```
//! use flatland_core::{Schema, Value};
//!
//! let mut el = Schema::array(Schema::integer()).create();
//! let mut root = el.root_mut();
//! root.extend([1, 2, 3]).unwrap();
//! root.insert(0, 0).unwrap();
//! assert_eq!(root.pop().unwrap(), Value::Int(3));
//! assert_eq!(root.value(), Value::list([0, 1, 2]));
//! ```

use std::ops::{Bound, Range, RangeBounds};

use tracing::debug;

use crate::element::{Element, ElementId, ElementMut, ElementRef};
use crate::error::{FlatlandError, Result};
use crate::Value;

/// Converts a range to concrete bounds within `0..=len`.
fn resolve_range(range: impl RangeBounds<usize>, len: usize) -> Result<Range<usize>> {
    let past = |bound: usize| {
        bound
            .checked_add(1)
            .ok_or(FlatlandError::IndexOutOfRange { index: bound, len })
    };
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => past(s)?,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => past(e)?,
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    if end > len {
        return Err(FlatlandError::IndexOutOfRange { index: end, len });
    }
    if start > end {
        return Err(FlatlandError::IndexOutOfRange { index: start, len });
    }
    Ok(start..end)
}

impl Element {
    pub(crate) fn set_sequence(&mut self, id: ElementId, value: &Value) -> Result<bool> {
        self.clear_sequence(id);
        let converted = match value {
            Value::None => true,
            Value::List(items) => {
                let mut converted = true;
                for item in items {
                    let (child, ok) = self.new_member(id, item)?;
                    converted &= ok;
                    self.seq_children_mut(id).push(child);
                }
                converted
            }
            other => {
                debug!(element = %self.node(id).schema.name(), input = %other.repr(), "sequence set from a non-list value");
                false
            }
        };
        self.node_mut(id).raw = Some(value.clone());
        Ok(converted)
    }

    /// Releases every child of a sequence.
    pub(crate) fn clear_sequence(&mut self, id: ElementId) {
        let children = std::mem::take(self.seq_children_mut(id));
        for child in children {
            self.release(child);
        }
    }

    /// Builds an unlinked member child set from `value`.
    pub(crate) fn new_member(&mut self, id: ElementId, value: &Value) -> Result<(ElementId, bool)> {
        let member = self
            .node(id)
            .schema
            .member()
            .cloned()
            .ok_or_else(|| FlatlandError::Unsupported("member of a non-sequence".to_string()))?;
        let child = self.alloc(member, Some(id));
        match self.set_node(child, value, None) {
            Ok(converted) => Ok((child, converted)),
            Err(err) => {
                self.release(child);
                Err(err)
            }
        }
    }

    /// Root child at `index`. See [`ElementRef::at`].
    ///
    /// # Errors
    ///
    /// As [`ElementRef::at`].
    pub fn at(&self, index: usize) -> Result<ElementRef<'_>> {
        self.root().at(index)
    }

    /// Root child at `index`, mutably.
    ///
    /// # Errors
    ///
    /// As [`ElementRef::at`].
    pub fn at_mut(&mut self, index: usize) -> Result<ElementMut<'_>> {
        let id = self.root().at(index)?.id();
        Ok(ElementMut { tree: self, id })
    }
}

impl<'a> ElementRef<'a> {
    fn require_sequence(&self, operation: &str) -> Result<&'a [ElementId]> {
        if self.kind().is_sequence() {
            Ok(self.tree.seq_children(self.id))
        } else {
            Err(FlatlandError::Unsupported(format!(
                "{operation} on a {:?} element",
                self.kind()
            )))
        }
    }

    /// Child at `index`.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::IndexOutOfRange`] past the end.
    /// - [`FlatlandError::Unsupported`] on non-sequence elements.
    pub fn at(&self, index: usize) -> Result<ElementRef<'a>> {
        let children = self.require_sequence("index")?;
        children
            .get(index)
            .map(|&id| self.at_id(id))
            .ok_or(FlatlandError::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    /// Children within `range`.
    ///
    /// # Errors
    ///
    /// As [`at`](Self::at).
    pub fn range(&self, range: impl RangeBounds<usize>) -> Result<Vec<ElementRef<'a>>> {
        let children = self.require_sequence("range")?;
        let range = resolve_range(range, children.len())?;
        Ok(children[range].iter().map(|&id| self.at_id(id)).collect())
    }

    /// Position of the first child whose value equals `value`.
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.require_sequence("index_of")
            .ok()?
            .iter()
            .position(|&id| self.at_id(id).value() == *value)
    }
}

impl ElementMut<'_> {
    fn children_len(&self, operation: &str) -> Result<usize> {
        self.view().require_sequence(operation).map(<[ElementId]>::len)
    }

    /// Child at `index`, mutably.
    ///
    /// # Errors
    ///
    /// As [`ElementRef::at`].
    pub fn at_mut(&mut self, index: usize) -> Result<ElementMut<'_>> {
        let id = self.view().at(index)?.id();
        Ok(self.reborrow(id))
    }

    /// Appends a member set from `value`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::Unsupported`] on non-sequence elements, or
    /// any error raised setting the new member.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<bool> {
        let len = self.children_len("push")?;
        self.insert(len, value)
    }

    /// Appends one member per item.
    ///
    /// # Errors
    ///
    /// As [`push`](Self::push).
    pub fn extend<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> Result<bool> {
        let mut converted = true;
        for value in values {
            converted &= self.push(value)?;
        }
        Ok(converted)
    }

    /// Inserts a member before `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] if `index > len`.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<bool> {
        let len = self.children_len("insert")?;
        if index > len {
            return Err(FlatlandError::IndexOutOfRange { index, len });
        }
        let (child, converted) = self.tree.new_member(self.id, &value.into())?;
        self.tree.seq_children_mut(self.id).insert(index, child);
        Ok(converted)
    }

    /// Replaces the child at `index` with a fresh member set from `value`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] past the end.
    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) -> Result<bool> {
        let len = self.children_len("set_at")?;
        if index >= len {
            return Err(FlatlandError::IndexOutOfRange { index, len });
        }
        let (child, converted) = self.tree.new_member(self.id, &value.into())?;
        let old = std::mem::replace(&mut self.tree.seq_children_mut(self.id)[index], child);
        self.tree.release(old);
        Ok(converted)
    }

    /// Removes the child at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] past the end.
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        self.pop_at(index).map(drop)
    }

    /// Removes the children within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] if the range exceeds the
    /// sequence.
    pub fn remove_range(&mut self, range: impl RangeBounds<usize>) -> Result<()> {
        self.splice(range, std::iter::empty::<Value>()).map(drop)
    }

    /// Replaces the children within `range` with fresh members set from
    /// `values`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] if the range exceeds the
    /// sequence.
    pub fn splice<V: Into<Value>>(
        &mut self,
        range: impl RangeBounds<usize>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<bool> {
        let len = self.children_len("splice")?;
        let range = resolve_range(range, len)?;

        let mut converted = true;
        let mut fresh = Vec::new();
        for value in values {
            match self.tree.new_member(self.id, &value.into()) {
                Ok((child, ok)) => {
                    converted &= ok;
                    fresh.push(child);
                }
                Err(err) => {
                    for child in fresh {
                        self.tree.release(child);
                    }
                    return Err(err);
                }
            }
        }
        let removed: Vec<ElementId> = self
            .tree
            .seq_children_mut(self.id)
            .splice(range, fresh)
            .collect();
        for child in removed {
            self.tree.release(child);
        }
        Ok(converted)
    }

    /// Removes the first child whose value equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::ValueNotFound`] if no child matches.
    pub fn remove_value(&mut self, value: &Value) -> Result<()> {
        self.children_len("remove_value")?;
        let index = self
            .view()
            .index_of(value)
            .ok_or_else(|| FlatlandError::ValueNotFound(value.repr()))?;
        self.remove_at(index)
    }

    /// Removes the last child and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] on an empty sequence.
    pub fn pop(&mut self) -> Result<Value> {
        let len = self.children_len("pop")?;
        if len == 0 {
            return Err(FlatlandError::IndexOutOfRange { index: 0, len });
        }
        self.pop_at(len - 1)
    }

    /// Removes the child at `index` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] past the end.
    pub fn pop_at(&mut self, index: usize) -> Result<Value> {
        let len = self.children_len("pop")?;
        if index >= len {
            return Err(FlatlandError::IndexOutOfRange { index, len });
        }
        let child = self.tree.seq_children_mut(self.id).remove(index);
        let value = ElementRef {
            tree: &*self.tree,
            id: child,
        }
        .value();
        self.tree.release(child);
        Ok(value)
    }

    /// Detaches the child at `index` into a standalone element.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::IndexOutOfRange`] past the end.
    pub fn take(&mut self, index: usize) -> Result<Element> {
        let id = self.view().at(index)?.id();
        let detached = self.tree.extract(id);
        self.remove_at(index)?;
        Ok(detached)
    }
}
