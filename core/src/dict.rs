//! Dict and SparseDict operations.
//!
//! A Dict always holds one child per declared field; its key set is fixed,
//! so every operation that would add or remove a key is refused. A
//! SparseDict holds only the keys that were set, plus the required keys
//! when `minimum_fields` is `required`.
//!
//! Refusals are reported with three distinct key errors:
//! [`ImmutableKey`](FlatlandError::ImmutableKey) for a key the container
//! will not add or remove, [`UnknownKey`](FlatlandError::UnknownKey) for a
//! key outside the schema, and [`MissingKey`](FlatlandError::MissingKey)
//! for a declared key with no instance.
//!
//! # Examples
//!
//! ```
//! use flatland_core::{FlatlandError, Schema, Value};
//!
//! let schema = Schema::sparse_dict([Schema::integer().named("x"), Schema::integer().named("y")]);
//! let mut el = schema.create();
//! assert!(el.is_empty());
//!
//! el.root_mut().set_item("x", 123).unwrap();
//! assert_eq!(el.value(), Value::map([("x", 123)]));
//!
//! el.root_mut().remove_key("x").unwrap();
//! assert!(matches!(el.root_mut().remove_key("x"), Err(FlatlandError::MissingKey(_))));
//! assert!(matches!(el.root_mut().remove_key("z"), Err(FlatlandError::ImmutableKey(_))));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::element::{present_by_default, Element, ElementId, ElementKind, ElementMut, ElementRef};
use crate::error::{FlatlandError, Result};
use crate::options::Policy;
use crate::schema::Schema;
use crate::Value;

/// Splits a Dict `set` input into key/value pairs.
fn mapping_pairs(value: &Value) -> Result<Vec<(String, Value)>> {
    match value {
        Value::None => Ok(Vec::new()),
        Value::Map(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::List(items) => items
            .iter()
            .map(|item| match item.as_list() {
                Some([Value::Text(key), v]) => Ok((key.clone(), v.clone())),
                _ => Err(FlatlandError::InvalidValue(format!(
                    "expected a [key, value] pair, got {}",
                    item.repr()
                ))),
            })
            .collect(),
        other => Err(FlatlandError::InvalidValue(format!(
            "expected a mapping or pair sequence, got {}",
            other.repr()
        ))),
    }
}

impl Element {
    /// Root child at `key`. See [`ElementRef::get`].
    ///
    /// # Errors
    ///
    /// As [`ElementRef::get`].
    pub fn get(&self, key: &str) -> Result<ElementRef<'_>> {
        self.root().get(key)
    }

    /// Root child at `key`, mutably.
    ///
    /// # Errors
    ///
    /// As [`ElementRef::get`].
    pub fn get_mut(&mut self, key: &str) -> Result<ElementMut<'_>> {
        let id = self.root().get(key)?.id();
        Ok(ElementMut { tree: self, id })
    }

    pub(crate) fn set_dict(
        &mut self,
        id: ElementId,
        value: &Value,
        policy: Option<&str>,
    ) -> Result<bool> {
        let schema = self.schema_of(id);
        let policy = match policy {
            Some(literal) => literal.parse::<Policy>(),
            None => schema.options().policy(),
        }
        .inspect_err(|err| warn!(element = %schema.name(), error = %err, "can not set dict"))?;

        let pairs = mapping_pairs(value)?;
        if let Some((key, _)) = pairs.iter().find(|(k, _)| schema.field_index(k).is_none()) {
            return Err(FlatlandError::UnknownKey(key.clone()));
        }
        if policy == Policy::Strict {
            let missing: Vec<String> = schema
                .fields()
                .iter()
                .map(Schema::name)
                .filter(|name| !pairs.iter().any(|(k, _)| k == name))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                return Err(FlatlandError::MissingFields(missing));
            }
        }

        if schema.is_sparse() {
            self.trim_sparse(id);
        } else {
            for child in self.child_ids(id) {
                self.reset_node(child);
            }
        }

        let mut converted = true;
        for (key, item) in &pairs {
            if let Some(slot) = schema.field_index(key) {
                let child = self.materialize(id, slot);
                converted &= self.set_node(child, item, None)?;
            }
        }
        self.node_mut(id).raw = Some(value.clone());
        Ok(converted)
    }

    /// Drops every non-required SparseDict key and resets the required ones.
    pub(crate) fn trim_sparse(&mut self, id: ElementId) {
        let keep = present_by_default(&self.schema_of(id));
        for (slot, required) in keep.into_iter().enumerate() {
            match (self.dict_slots(id)[slot], required) {
                (Some(child), true) => self.reset_node(child),
                (Some(child), false) => {
                    self.release(child);
                    self.dict_slots_mut(id)[slot] = None;
                }
                (None, true) => {
                    self.materialize(id, slot);
                }
                (None, false) => {}
            }
        }
    }

    /// Returns the child in `slot`, creating it if absent.
    pub(crate) fn materialize(&mut self, id: ElementId, slot: usize) -> ElementId {
        if let Some(child) = self.dict_slots(id)[slot] {
            return child;
        }
        let field = self.schema_of(id).fields()[slot].clone();
        let child = self.alloc(field, Some(id));
        self.dict_slots_mut(id)[slot] = Some(child);
        child
    }

    pub(crate) fn unlink_slot(&mut self, id: ElementId, slot: usize) -> Option<ElementId> {
        let child = self.dict_slots_mut(id)[slot].take()?;
        self.node_mut(child).parent = None;
        Some(child)
    }
}

/// Projection options for [`ElementRef::slice`].
///
/// Keys are filtered by `include` or `omit`, then renamed, then passed
/// through the key transform.
#[derive(Default)]
pub struct Slice {
    include: Option<Vec<String>>,
    omit: Vec<String>,
    rename: Vec<(String, String)>,
    key: Option<Box<dyn Fn(&str) -> String>>,
}

impl Slice {
    /// Projection of every key, unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only these keys.
    pub fn include<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.include = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Drops these keys.
    pub fn omit<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.omit = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Renames keys, `(from, to)`.
    pub fn rename<A: Into<String>, B: Into<String>>(
        mut self,
        pairs: impl IntoIterator<Item = (A, B)>,
    ) -> Self {
        self.rename = pairs
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .collect();
        self
    }

    /// Transforms every output key.
    pub fn key(mut self, transform: impl Fn(&str) -> String + 'static) -> Self {
        self.key = Some(Box::new(transform));
        self
    }

    fn project(&self, key: &str) -> Option<String> {
        if let Some(include) = &self.include {
            if !include.iter().any(|k| k == key) {
                return None;
            }
        }
        if self.omit.iter().any(|k| k == key) {
            return None;
        }
        let renamed = self
            .rename
            .iter()
            .find(|(from, _)| from == key)
            .map_or(key, |(_, to)| to.as_str());
        Some(match &self.key {
            Some(transform) => transform(renamed),
            None => renamed.to_string(),
        })
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("include", &self.include)
            .field("omit", &self.omit)
            .field("rename", &self.rename)
            .field("key", &self.key.is_some())
            .finish()
    }
}

impl<'a> ElementRef<'a> {
    fn require_dict(&self, operation: &str) -> Result<()> {
        if self.kind().is_dict() {
            Ok(())
        } else {
            Err(FlatlandError::Unsupported(format!(
                "{operation} on a {:?} element",
                self.kind()
            )))
        }
    }

    fn slot_of(&self, key: &str) -> Option<usize> {
        self.schema().field_index(key)
    }

    fn is_required_slot(&self, slot: usize) -> bool {
        present_by_default(self.schema())[slot]
    }

    /// Child at `key`.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::UnknownKey`] if `key` is not declared.
    /// - [`FlatlandError::MissingKey`] if a SparseDict does not hold `key`.
    /// - [`FlatlandError::Unsupported`] on non-dict elements.
    pub fn get(&self, key: &str) -> Result<ElementRef<'a>> {
        self.require_dict("get")?;
        let slot = self
            .slot_of(key)
            .ok_or_else(|| FlatlandError::UnknownKey(key.to_string()))?;
        self.tree.dict_slots(self.id)[slot]
            .map(|id| self.at_id(id))
            .ok_or_else(|| FlatlandError::MissingKey(key.to_string()))
    }

    /// Returns `true` if a child is present at `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Present keys in schema order.
    pub fn keys(&self) -> Vec<&'a str> {
        self.items().into_iter().map(|(k, _)| k).collect()
    }

    /// Present children in schema order.
    pub fn values(&self) -> Vec<ElementRef<'a>> {
        self.items().into_iter().map(|(_, v)| v).collect()
    }

    /// Present `(key, child)` pairs in schema order.
    pub fn items(&self) -> Vec<(&'a str, ElementRef<'a>)> {
        self.schema()
            .fields()
            .iter()
            .zip(self.tree.dict_slots(self.id))
            .filter_map(|(field, slot)| slot.map(|id| (field.name(), self.at_id(id))))
            .collect()
    }

    /// Projects present keys to a map of values without mutating.
    ///
    /// # Examples
    ///
    /// ```
    /// use flatland_core::{Schema, Slice, Value};
    ///
    /// let schema = Schema::dict([Schema::string().named("x"), Schema::string().named("y")]);
    /// let el = schema.create_with(Value::map([("x", "X"), ("y", "Y")])).unwrap();
    ///
    /// let sliced = el.root().slice(&Slice::new().omit(["x"]).rename([("y", "z")])).unwrap();
    /// assert_eq!(sliced.get("z"), Some(&Value::from("Y")));
    /// assert_eq!(sliced.len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::Configuration`] if both `include` and `omit` are set.
    /// - [`FlatlandError::Unsupported`] on non-dict elements.
    pub fn slice(&self, slice: &Slice) -> Result<BTreeMap<String, Value>> {
        self.require_dict("slice")?;
        if slice.include.is_some() && !slice.omit.is_empty() {
            return Err(FlatlandError::Configuration(
                "slice accepts include or omit, not both".to_string(),
            ));
        }
        Ok(self
            .items()
            .into_iter()
            .filter_map(|(key, child)| slice.project(key).map(|k| (k, child.value())))
            .collect())
    }
}

impl ElementMut<'_> {
    fn dict_kind(&self, operation: &str) -> Result<ElementKind> {
        let view = self.view();
        view.require_dict(operation)?;
        Ok(view.kind())
    }

    /// Child at `key`, mutably.
    ///
    /// # Errors
    ///
    /// As [`ElementRef::get`].
    pub fn get_mut(&mut self, key: &str) -> Result<ElementMut<'_>> {
        let id = self.view().get(key)?.id();
        Ok(self.reborrow(id))
    }

    /// Sets the child at `key` from a native value, creating it on a
    /// SparseDict.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::ImmutableKey`] if `key` is not declared.
    pub fn set_item(&mut self, key: &str, value: impl Into<Value>) -> Result<bool> {
        self.dict_kind("set_item")?;
        let slot = self
            .view()
            .slot_of(key)
            .ok_or_else(|| FlatlandError::ImmutableKey(key.to_string()))?;
        let child = self.tree.materialize(self.id, slot);
        self.tree.set_node(child, &value.into(), None)
    }

    /// Removes the child at `key` from a SparseDict.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::ImmutableKey`] for any Dict key, a required
    ///   SparseDict key, or an undeclared SparseDict key.
    /// - [`FlatlandError::UnknownKey`] for an undeclared Dict key.
    /// - [`FlatlandError::MissingKey`] if the SparseDict does not hold `key`.
    pub fn remove_key(&mut self, key: &str) -> Result<()> {
        let kind = self.dict_kind("remove")?;
        let slot = self.view().slot_of(key);
        match (kind, slot) {
            (ElementKind::Dict, Some(_)) => Err(FlatlandError::ImmutableKey(key.to_string())),
            (ElementKind::Dict, None) => Err(FlatlandError::UnknownKey(key.to_string())),
            (_, None) => Err(FlatlandError::ImmutableKey(key.to_string())),
            (_, Some(slot)) => {
                if self.view().is_required_slot(slot) {
                    return Err(FlatlandError::ImmutableKey(key.to_string()));
                }
                let child = self
                    .tree
                    .unlink_slot(self.id, slot)
                    .ok_or_else(|| FlatlandError::MissingKey(key.to_string()))?;
                self.tree.release(child);
                Ok(())
            }
        }
    }

    /// Removes the child at `key` from a SparseDict and returns its value.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::ImmutableKey`] for any declared Dict key or a
    ///   required SparseDict key.
    /// - [`FlatlandError::UnknownKey`] for an undeclared key.
    /// - [`FlatlandError::MissingKey`] if the SparseDict does not hold `key`.
    pub fn pop_key(&mut self, key: &str) -> Result<Value> {
        let kind = self.dict_kind("pop")?;
        let slot = self
            .view()
            .slot_of(key)
            .ok_or_else(|| FlatlandError::UnknownKey(key.to_string()))?;
        if kind == ElementKind::Dict || self.view().is_required_slot(slot) {
            return Err(FlatlandError::ImmutableKey(key.to_string()));
        }
        let child = self
            .tree
            .unlink_slot(self.id, slot)
            .ok_or_else(|| FlatlandError::MissingKey(key.to_string()))?;
        let value = ElementRef {
            tree: &*self.tree,
            id: child,
        }
        .value();
        self.tree.release(child);
        Ok(value)
    }

    /// Returns the value at `key`, first setting it from `value` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::ImmutableKey`] on a Dict, or for an
    /// undeclared SparseDict key.
    pub fn setdefault(&mut self, key: &str, value: impl Into<Value>) -> Result<Value> {
        let kind = self.dict_kind("setdefault")?;
        let slot = match (kind, self.view().slot_of(key)) {
            (ElementKind::SparseDict, Some(slot)) => slot,
            _ => return Err(FlatlandError::ImmutableKey(key.to_string())),
        };
        let current = self.tree.dict_slots(self.id)[slot];
        let child = match current {
            Some(child) if !self.tree.element(child).is_some_and(|c| c.is_empty()) => child,
            _ => {
                let child = self.tree.materialize(self.id, slot);
                self.tree.set_node(child, &value.into(), None)?;
                child
            }
        };
        Ok(self.reborrow(child).value())
    }

    /// Removes an arbitrary item.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::ImmutableKey`] on a Dict and
    /// [`FlatlandError::Unsupported`] on a SparseDict.
    pub fn popitem(&mut self) -> Result<(String, Value)> {
        match self.dict_kind("popitem")? {
            ElementKind::Dict => Err(FlatlandError::ImmutableKey(self.view().keys().join(", "))),
            _ => Err(FlatlandError::Unsupported(
                "popitem on a sparse dict".to_string(),
            )),
        }
    }

    /// Sets children from a mapping or pair sequence. See
    /// [`update_with`](Self::update_with).
    ///
    /// # Errors
    ///
    /// As [`update_with`](Self::update_with).
    pub fn update(&mut self, positional: impl Into<Value>) -> Result<bool> {
        self.update_with(positional, std::iter::empty::<(String, Value)>())
    }

    /// Sets children from positional pairs, then keyword pairs.
    ///
    /// Later positional pairs override earlier ones and keywords override
    /// positional pairs. Every key is checked before any child changes.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::ImmutableKey`] if any key is not declared.
    /// - [`FlatlandError::InvalidValue`] if `positional` is not a mapping or
    ///   pair sequence.
    pub fn update_with<K, V>(
        &mut self,
        positional: impl Into<Value>,
        keywords: impl IntoIterator<Item = (K, V)>,
    ) -> Result<bool>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.dict_kind("update")?;
        let mut pairs = mapping_pairs(&positional.into())?;
        pairs.extend(keywords.into_iter().map(|(k, v)| (k.into(), v.into())));

        let view = self.view();
        let mut slots = Vec::with_capacity(pairs.len());
        for (key, _) in &pairs {
            slots.push(
                view.slot_of(key)
                    .ok_or_else(|| FlatlandError::ImmutableKey(key.clone()))?,
            );
        }

        let mut converted = true;
        for (slot, (_, value)) in slots.into_iter().zip(&pairs) {
            let child = self.tree.materialize(self.id, slot);
            converted &= self.tree.set_node(child, value, None)?;
        }
        Ok(converted)
    }

    /// Detaches the child at `key` into a standalone element.
    ///
    /// # Errors
    ///
    /// As [`remove_key`](Self::remove_key).
    pub fn take_key(&mut self, key: &str) -> Result<Element> {
        let id = self.view().get(key)?.id();
        let detached = self.tree.extract(id);
        self.remove_key(key)?;
        Ok(detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy() -> Schema {
        Schema::dict([Schema::integer().named("x"), Schema::integer().named("y")])
    }

    fn sparse_xy() -> Schema {
        Schema::sparse_dict([Schema::integer().named("x"), Schema::integer().named("y")])
    }

    fn required_sparse() -> Schema {
        Schema::sparse_dict([
            Schema::integer().named("x").optional(true),
            Schema::integer().named("y"),
        ])
        .minimum_fields("required")
    }

    #[test]
    fn test_dict_immutable_keys() {
        let mut el = xy().create();
        let mut root = el.root_mut();

        assert!(matches!(root.set_item("z", 123), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.remove_key("x"), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.remove_key("z"), Err(FlatlandError::UnknownKey(_))));
        assert!(matches!(root.setdefault("x", 123), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.setdefault("z", 123), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.pop_key("x"), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.pop_key("z"), Err(FlatlandError::UnknownKey(_))));
        assert!(matches!(root.popitem(), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.clear(), Err(FlatlandError::ImmutableKey(_))));
    }

    #[test]
    fn test_dict_reads() {
        let mut el = xy().create();
        el.get_mut("x").unwrap().set("10").unwrap();
        el.get_mut("y").unwrap().set("20").unwrap();

        assert_eq!(el.get("x").unwrap().value(), Value::Int(10));
        assert_eq!(el.root().keys(), vec!["x", "y"]);
        let values: Vec<Value> = el.root().values().iter().map(|v| v.value()).collect();
        assert_eq!(values, vec![Value::Int(10), Value::Int(20)]);

        el.root_mut().set_item("x", Value::None).unwrap();
        assert_eq!(el.get("x").unwrap().value(), Value::None);
        assert!(matches!(el.get("z"), Err(FlatlandError::UnknownKey(_))));
    }

    #[test]
    fn test_dict_update() {
        let mut el = xy().create();
        let mut root = el.root_mut();

        root.update_with(Value::None, [("x", 20), ("y", 30)]).unwrap();
        assert_eq!(root.value(), Value::map([("x", 20), ("y", 30)]));

        root.update(Value::map([("y", 40)])).unwrap();
        assert_eq!(root.value(), Value::map([("x", 20), ("y", 40)]));

        root.update(Value::None).unwrap();
        assert_eq!(root.value(), Value::map([("x", 20), ("y", 40)]));

        root.update_with(Value::pairs([("x", 10), ("y", 10)]), [("x", 1), ("y", 2)])
            .unwrap();
        assert_eq!(root.value(), Value::map([("x", 1), ("y", 2)]));

        root.update(Value::pairs([("x", 5), ("x", 6)])).unwrap();
        assert_eq!(root.value(), Value::map([("x", 6), ("y", 2)]));

        assert!(matches!(
            root.update(Value::map([("x", 1), ("z", 1)])),
            Err(FlatlandError::ImmutableKey(_))
        ));
        assert_eq!(root.value(), Value::map([("x", 6), ("y", 2)]));
        assert!(matches!(
            root.update_with(Value::None, [("z", 1)]),
            Err(FlatlandError::ImmutableKey(_))
        ));
    }

    #[test]
    fn test_set_variants() {
        let mut el = xy().named("s").create();
        assert!(el.set(Value::map([("x", 123)])).unwrap());
        assert_eq!(el.value(), Value::map([("x", Value::Int(123)), ("y", Value::None)]));

        assert!(el.set(Value::pairs([("x", 101), ("y", 102)])).unwrap());
        assert_eq!(el.value(), Value::map([("x", 101), ("y", 102)]));

        assert!(el.set(Value::map::<&str, Value>([])).unwrap());
        assert_eq!(el.value(), Value::map([("x", Value::None), ("y", Value::None)]));

        assert!(matches!(
            el.set(Value::map([("x", 1), ("y", 2), ("z", 3)])),
            Err(FlatlandError::UnknownKey(_))
        ));
        assert!(matches!(el.set(5), Err(FlatlandError::InvalidValue(_))));
        assert!(!el.set(Value::map([("x", "i am the new"), ("y", "number two")])).unwrap());
    }

    #[test]
    fn test_dict_strict() {
        let schema = xy().policy("strict");
        assert!(schema.create_with(Value::map([("x", 123), ("y", 456)])).is_ok());

        let mut el = schema.create();
        assert_eq!(
            el.set(Value::map([("x", 123)])),
            Err(FlatlandError::MissingFields(vec!["y".to_string()]))
        );
        assert!(matches!(
            el.set(Value::map([("x", 123), ("y", 456), ("z", 7)])),
            Err(FlatlandError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_dict_bogus_policy() {
        let mut el = Schema::dict([Schema::integer().named("x")]).create();
        assert!(matches!(
            el.root_mut().set_with_policy(Value::None, "bogus"),
            Err(FlatlandError::Configuration(_))
        ));
    }

    #[test]
    fn test_dict_raw_and_text() {
        let schema = xy();
        let el = schema.create();
        assert_eq!(el.raw(), None);

        let input = Value::map([("x", 1), ("y", 2)]);
        let el = schema.create_with(input.clone()).unwrap();
        assert_eq!(el.raw(), Some(&input));
        assert_eq!(el.u(), "{'x': '1', 'y': '2'}");
    }

    #[test]
    fn test_nested_dict_text() {
        let schema = Schema::dict([Schema::dict([Schema::integer().named("x").with_default(10)])
            .named("d")]);
        let el = schema.from_defaults().unwrap();
        assert_eq!(el.value(), Value::map([("d", Value::map([("x", 10)]))]));
        assert_eq!(el.u(), "{'d': {'x': '10'}}");
    }

    #[test]
    fn test_slice() {
        let schema = Schema::dict([Schema::string().named("x"), Schema::string().named("y")]);
        let el = schema.create_with(Value::map([("x", "X"), ("y", "Y")])).unwrap();
        let root = el.root();

        assert_eq!(root.slice(&Slice::new()).unwrap().len(), 2);
        let upper = root.slice(&Slice::new().key(|k| k.to_uppercase())).unwrap();
        assert_eq!(upper.get("X"), Some(&Value::from("X")));
        let only_x = root.slice(&Slice::new().include(["x"])).unwrap();
        assert_eq!(only_x.keys().collect::<Vec<_>>(), vec!["x"]);
        let no_x = root.slice(&Slice::new().omit(["x"])).unwrap();
        assert_eq!(no_x.keys().collect::<Vec<_>>(), vec!["y"]);
        assert!(matches!(
            root.slice(&Slice::new().include(["x"]).omit(["y"])),
            Err(FlatlandError::Configuration(_))
        ));
    }

    #[test]
    fn test_sparsedict_key_mutability() {
        let mut el = sparse_xy().create();
        let mut root = el.root_mut();

        root.set_item("x", 123).unwrap();
        assert_eq!(root.view().get("x").unwrap().value(), Value::Int(123));
        assert!(matches!(root.set_item("z", 123), Err(FlatlandError::ImmutableKey(_))));

        root.remove_key("x").unwrap();
        assert!(!root.view().contains_key("x"));
        assert!(matches!(root.remove_key("z"), Err(FlatlandError::ImmutableKey(_))));

        assert_eq!(root.setdefault("x", 456).unwrap(), Value::Int(456));
        assert!(matches!(root.setdefault("z", 456), Err(FlatlandError::ImmutableKey(_))));

        root.set_item("x", 123).unwrap();
        assert_eq!(root.pop_key("x").unwrap(), Value::Int(123));
        assert!(matches!(root.pop_key("z"), Err(FlatlandError::UnknownKey(_))));
        assert!(matches!(root.pop_key("x"), Err(FlatlandError::MissingKey(_))));

        assert!(matches!(root.popitem(), Err(FlatlandError::Unsupported(_))));
        root.set_item("y", 1).unwrap();
        root.clear().unwrap();
        assert!(root.is_empty());
    }

    #[test]
    fn test_sparsedict_setdefault_keeps_existing() {
        let mut el = sparse_xy().create();
        let mut root = el.root_mut();
        assert_eq!(root.setdefault("x", 123).unwrap(), Value::Int(123));
        assert_eq!(root.setdefault("x", 456).unwrap(), Value::Int(123));
        assert_eq!(root.setdefault("y", 123).unwrap(), Value::Int(123));
        assert_eq!(root.setdefault("y", 456).unwrap(), Value::Int(123));
    }

    #[test]
    fn test_sparsedict_required_key_mutability() {
        let mut el = required_sparse().create();
        assert!(!el.root().contains_key("x"));
        assert!(el.root().contains_key("y"));
        assert!(!el.root().contains_key("z"));
        assert!(!el.is_empty());

        let mut root = el.root_mut();
        root.set_item("x", 123).unwrap();
        root.set_item("y", 456).unwrap();
        root.remove_key("x").unwrap();
        assert!(matches!(root.remove_key("y"), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.remove_key("z"), Err(FlatlandError::ImmutableKey(_))));

        root.set_item("x", 123).unwrap();
        assert_eq!(root.pop_key("x").unwrap(), Value::Int(123));
        assert!(matches!(root.pop_key("y"), Err(FlatlandError::ImmutableKey(_))));
        assert!(matches!(root.pop_key("z"), Err(FlatlandError::UnknownKey(_))));

        root.set_item("x", 1).unwrap();
        root.clear().unwrap();
        assert_eq!(root.view().keys(), vec!["y"]);
        assert_eq!(root.view().get("y").unwrap().value(), Value::None);
    }

    #[test]
    fn test_sparsedict_set_keeps_required() {
        let schema = Schema::sparse_dict([Schema::integer().named("x"), Schema::integer().named("y")])
            .minimum_fields("required");
        let mut el = schema.create();
        assert_eq!(el.value(), Value::map([("x", Value::None), ("y", Value::None)]));

        el.set(Value::map([("x", 123)])).unwrap();
        assert_eq!(el.value(), Value::map([("x", Value::Int(123)), ("y", Value::None)]));
    }

    #[test]
    fn test_sparsedict_set_default() {
        let schema = Schema::sparse_dict([
            Schema::integer().named("x").with_default(123),
            Schema::integer().named("y"),
        ]);
        let el = schema.from_defaults().unwrap();
        assert_eq!(el.value(), Value::map::<&str, Value>([]));

        let schema = Schema::sparse_dict([
            Schema::integer().named("x").with_default(123),
            Schema::integer().named("y").with_default(456).optional(true),
            Schema::integer().named("z").optional(true),
        ])
        .minimum_fields("required");
        let el = schema.from_defaults().unwrap();
        assert_eq!(el.value(), Value::map([("x", 123)]));
    }

    #[test]
    fn test_sparsedict_bogus_set_default() {
        let schema = Schema::sparse_dict([Schema::integer().named("x")]).minimum_fields("bogus");
        let mut el = schema.create();
        assert!(matches!(el.set_default(), Err(FlatlandError::Configuration(_))));
    }

    #[test]
    fn test_take_key_detaches_subtree() {
        let schema = Schema::sparse_dict([
            Schema::dict([Schema::integer().named("a")]).named("inner"),
        ]);
        let mut el = schema.create();
        el.root_mut()
            .set_item("inner", Value::map([("a", 7)]))
            .unwrap();

        let inner = el.root_mut().take_key("inner").unwrap();
        assert!(el.is_empty());
        assert_eq!(inner.value(), Value::map([("a", 7)]));
        assert!(inner.root().parent().is_none());
        assert_eq!(inner.root().children()[0].parent().map(|p| p.id()), Some(inner.root().id()));
    }
}
