//! Flat pairs to tree.
//!
//! Rehydration walks the schema, not the input. At each element only the
//! pairs under that element's flat name are considered; everything else is
//! ignored, so foreign or malformed keys never cause an error. Scalars take
//! the first pair whose key matches exactly.
//!
//! # Examples
//!
//! ```
//! use flatland_core::{Schema, Value};
//!
//! let schema = Schema::dict([
//!     Schema::integer().named("x"),
//!     Schema::integer().named("y"),
//! ])
//! .named("s");
//!
//! let el = schema
//!     .from_flat([("s_x", "123"), ("s_z", "nope"), ("s_x", "456")])
//!     .unwrap();
//! assert_eq!(el.value(), Value::map([("x", Value::Int(123)), ("y", Value::None)]));
//! assert_eq!(el.raw(), None);
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::element::{present_by_default, Element, ElementId, ElementKind, ElementMut, ElementRef};
use crate::error::{FlatlandError, Result};
use crate::flatten::FlatPair;
use crate::grouping::group_runs;
use crate::naming::{join, DEFAULT_SEPARATOR};
use crate::schema::Schema;
use crate::Value;

/// Returns `true` if `key` is `prefix` itself or lies under it.
fn under_prefix(key: &str, prefix: &str, sep: char) -> bool {
    prefix.is_empty()
        || key
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(sep))
}

fn collect_pairs<I, K, V>(pairs: I) -> Vec<FlatPair>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl Element {
    pub(crate) fn set_flat_node(
        &mut self,
        id: ElementId,
        pairs: &[&FlatPair],
        sep: char,
    ) -> Result<()> {
        let name = ElementRef { tree: self, id }.flattened_name(sep);
        let scoped: Vec<&FlatPair> = pairs
            .iter()
            .copied()
            .filter(|(key, _)| under_prefix(key, &name, sep))
            .collect();
        let schema = self.schema_of(id);

        match ElementKind::of(&schema) {
            ElementKind::Scalar => {
                match scoped.iter().find(|(key, _)| *key == name) {
                    Some((_, text)) => {
                        self.set_node(id, &Value::Text(text.clone()), None)?;
                    }
                    None => self.reset_node(id),
                }
                return Ok(());
            }
            ElementKind::Dict => {
                for child in self.child_ids(id) {
                    self.set_flat_node(child, &scoped, sep)?;
                }
            }
            ElementKind::SparseDict => self.set_flat_sparse(id, &schema, &name, &scoped, sep)?,
            ElementKind::Array | ElementKind::MultiValue => {
                self.set_flat_grouped(id, &schema, &name, &scoped, sep)?
            }
            ElementKind::List => self.set_flat_indexed(id, &schema, &name, &scoped, sep)?,
        }
        self.node_mut(id).raw = None;
        Ok(())
    }

    fn set_flat_sparse(
        &mut self,
        id: ElementId,
        schema: &Schema,
        name: &str,
        scoped: &[&FlatPair],
        sep: char,
    ) -> Result<()> {
        let required = present_by_default(schema);
        for (slot, field) in schema.fields().iter().enumerate() {
            let field_name = join(name, field.name(), sep);
            let received = scoped
                .iter()
                .any(|(key, _)| under_prefix(key, &field_name, sep));
            if received || required[slot] {
                let child = self.materialize(id, slot);
                self.set_flat_node(child, scoped, sep)?;
            } else if let Some(child) = self.unlink_slot(id, slot) {
                self.release(child);
            }
        }
        Ok(())
    }

    fn set_flat_grouped(
        &mut self,
        id: ElementId,
        schema: &Schema,
        name: &str,
        scoped: &[&FlatPair],
        sep: char,
    ) -> Result<()> {
        let member = schema
            .member()
            .ok_or_else(|| FlatlandError::Structure("sequence without a member".to_string()))?;
        if !member.is_scalar() {
            return Err(FlatlandError::Structure(format!(
                "{} '{}' can not rehydrate a {} member from flat pairs",
                schema.kind_name(),
                schema.name(),
                member.kind_name()
            )));
        }

        self.clear_sequence(id);
        let child_key = join(name, member.name(), sep);
        let groups = group_runs(scoped.iter().copied(), |key| key == child_key);
        let prune = schema.options().prune_empty;
        for group in groups {
            let text = Value::Text(group[0].1.clone());
            let (child, _) = self.new_member(id, &text)?;
            if prune && (ElementRef { tree: self, id: child }).is_empty() {
                debug!(element = %name, "pruned empty member");
                self.release(child);
                continue;
            }
            self.seq_children_mut(id).push(child);
        }
        Ok(())
    }

    fn set_flat_indexed(
        &mut self,
        id: ElementId,
        schema: &Schema,
        name: &str,
        scoped: &[&FlatPair],
        sep: char,
    ) -> Result<()> {
        let member = schema
            .member()
            .cloned()
            .ok_or_else(|| FlatlandError::Structure("sequence without a member".to_string()))?;

        let mut groups: BTreeMap<usize, Vec<(Option<&str>, &str)>> = BTreeMap::new();
        for (key, text) in scoped.iter().copied() {
            let remainder = if name.is_empty() {
                Some(key.as_str())
            } else {
                key.strip_prefix(name).and_then(|r| r.strip_prefix(sep))
            };
            let Some(remainder) = remainder else {
                continue;
            };
            let (index, rest) = match remainder.split_once(sep) {
                Some((index, rest)) => (index, Some(rest)),
                None => (remainder, None),
            };
            let parsed = if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                index.parse::<usize>().ok()
            } else {
                None
            };
            match parsed {
                Some(index) => groups.entry(index).or_default().push((rest, text)),
                None => debug!(element = %name, key = %key, "discarded pair without a list index"),
            }
        }

        self.clear_sequence(id);
        let limit = schema
            .options()
            .maximum_set_flat_members
            .unwrap_or(usize::MAX);
        let prune = schema.options().prune_empty;
        for (index, members) in groups.into_iter().take(limit) {
            let position = self.seq_children(id).len();
            let child = self.alloc(member.clone(), Some(id));
            self.seq_children_mut(id).push(child);

            let base = join(name, &position.to_string(), sep);
            let rewritten: Vec<FlatPair> = members
                .into_iter()
                .map(|(rest, text)| {
                    let key = match rest {
                        Some(rest) => format!("{base}{sep}{rest}"),
                        None => base.clone(),
                    };
                    (key, text.to_string())
                })
                .collect();
            let refs: Vec<&FlatPair> = rewritten.iter().collect();
            self.set_flat_node(child, &refs, sep)?;

            if prune && (ElementRef { tree: self, id: child }).is_empty() {
                debug!(element = %name, index, "pruned empty member");
                self.seq_children_mut(id).pop();
                self.release(child);
            }
        }
        Ok(())
    }
}

impl ElementMut<'_> {
    /// Rehydrates this element from flat pairs using [`DEFAULT_SEPARATOR`].
    ///
    /// # Errors
    ///
    /// As [`set_flat_with`](Self::set_flat_with).
    pub fn set_flat<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set_flat_with(pairs, DEFAULT_SEPARATOR)
    }

    /// Rehydrates this element from flat pairs.
    ///
    /// Keys are matched against full flat names, including this element's
    /// ancestors. Pairs the schema does not name are ignored. Containers
    /// end with `raw` unset; scalars record the text they were set from.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::Structure`] when an Array or MultiValue has a
    ///   container member.
    /// - [`FlatlandError::Unsupported`] when an abstract scalar matches a pair.
    pub fn set_flat_with<I, K, V>(&mut self, pairs: I, sep: char) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = collect_pairs(pairs);
        let refs: Vec<&FlatPair> = pairs.iter().collect();
        let prefix = self.view().flattened_name(sep);
        let foreign = refs
            .iter()
            .filter(|(key, _)| !under_prefix(key, &prefix, sep))
            .count();
        if foreign > 0 {
            debug!(element = %prefix, foreign, "ignored pairs outside element");
        }
        self.tree.set_flat_node(self.id, &refs, sep)
    }
}

impl Element {
    /// Rehydrates the whole tree. See [`ElementMut::set_flat_with`].
    ///
    /// # Errors
    ///
    /// As [`ElementMut::set_flat_with`].
    pub fn set_flat<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.root_mut().set_flat(pairs)
    }

    /// Rehydrates the whole tree with a custom separator.
    ///
    /// # Errors
    ///
    /// As [`ElementMut::set_flat_with`].
    pub fn set_flat_with<I, K, V>(&mut self, pairs: I, sep: char) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.root_mut().set_flat_with(pairs, sep)
    }
}

impl Schema {
    /// Instantiates this schema from flat pairs.
    ///
    /// # Errors
    ///
    /// As [`ElementMut::set_flat_with`].
    pub fn from_flat<I, K, V>(&self, pairs: I) -> Result<Element>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.from_flat_with(pairs, DEFAULT_SEPARATOR)
    }

    /// Instantiates this schema from flat pairs with a custom separator.
    ///
    /// # Errors
    ///
    /// As [`ElementMut::set_flat_with`].
    pub fn from_flat_with<I, K, V>(&self, pairs: I, sep: char) -> Result<Element>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut el = self.create();
        el.set_flat_with(pairs, sep)?;
        Ok(el)
    }
}
