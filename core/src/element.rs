//! Element trees.
//!
//! An [`Element`] owns every node of one instantiated schema in an arena.
//! Nodes are addressed by [`ElementId`] and reached through two borrowed
//! views: [`ElementRef`] for reads and [`ElementMut`] for mutation. Parent
//! links are plain ids, so upward navigation never fights the borrow
//! checker and detached subtrees can be moved into their own arena.
//!
//! # Examples
//!
//! ```
//! use flatland_core::{Schema, Value};
//!
//! let schema = Schema::dict([
//!     Schema::integer().named("x"),
//!     Schema::string().named("y"),
//! ]);
//! let mut el = schema.create();
//!
//! assert!(el.set(Value::map([("x", Value::from("10")), ("y", Value::from(" a "))])).unwrap());
//! assert_eq!(el.get("x").unwrap().value(), Value::Int(10));
//! assert_eq!(el.u(), "{'x': '10', 'y': 'a'}");
//! ```

use std::fmt;

use tracing::{trace, warn};

use crate::coerce::ScalarKind;
use crate::error::{FlatlandError, Result};
use crate::options::MinimumFields;
use crate::schema::{Schema, SchemaKind};
use crate::value::quote;
use crate::Value;

/// Arena address of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Runtime kind of an element, derived from its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Leaf.
    Scalar,
    /// Fixed-key mapping.
    Dict,
    /// Mapping holding only the keys that were set.
    SparseDict,
    /// Sequence with member-named children.
    Array,
    /// Sequence with index-named children.
    List,
    /// Array projecting its first child's value.
    MultiValue,
}

impl ElementKind {
    pub(crate) fn of(schema: &Schema) -> Self {
        match schema.kind() {
            SchemaKind::Scalar(_) => Self::Scalar,
            SchemaKind::Dict { sparse: false, .. } => Self::Dict,
            SchemaKind::Dict { sparse: true, .. } => Self::SparseDict,
            SchemaKind::Array(_) => Self::Array,
            SchemaKind::List(_) => Self::List,
            SchemaKind::MultiValue(_) => Self::MultiValue,
        }
    }

    /// Returns `true` for the three sequence kinds.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Array | Self::List | Self::MultiValue)
    }

    /// Returns `true` for Dict and SparseDict.
    pub fn is_dict(&self) -> bool {
        matches!(self, Self::Dict | Self::SparseDict)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Scalar { value: Value, u: String },
    /// One slot per declared field; `None` marks an absent SparseDict key.
    Dict(Vec<Option<ElementId>>),
    Sequence(Vec<ElementId>),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) schema: Schema,
    pub(crate) parent: Option<ElementId>,
    /// Last native input given to `set`; `None` means unset.
    pub(crate) raw: Option<Value>,
    pub(crate) data: NodeData,
    pub(crate) valid: Option<bool>,
    pub(crate) errors: Vec<String>,
}

/// An instantiated schema: the root element and every descendant.
#[derive(Debug, Clone)]
pub struct Element {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: ElementId,
}

impl Element {
    /// Instantiates `schema` with every value unset.
    pub fn new(schema: Schema) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: ElementId(0),
        };
        tree.root = tree.alloc(schema, None);
        tree
    }

    pub(crate) fn insert(&mut self, node: Node) -> ElementId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                ElementId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                ElementId(self.nodes.len() - 1)
            }
        }
    }

    /// Allocates a fresh subtree for `schema`. Dicts get every field,
    /// SparseDicts only their required fields.
    pub(crate) fn alloc(&mut self, schema: Schema, parent: Option<ElementId>) -> ElementId {
        let data = match schema.kind() {
            SchemaKind::Scalar(_) => NodeData::Scalar {
                value: Value::None,
                u: String::new(),
            },
            SchemaKind::Dict { fields, .. } => NodeData::Dict(vec![None; fields.len()]),
            _ => NodeData::Sequence(Vec::new()),
        };
        let id = self.insert(Node {
            schema: schema.clone(),
            parent,
            raw: None,
            data,
            valid: None,
            errors: Vec::new(),
        });
        if let SchemaKind::Dict { fields, .. } = schema.kind() {
            let keep = present_by_default(&schema);
            for (slot, field) in fields.iter().enumerate() {
                if keep[slot] {
                    let child = self.alloc(field.clone(), Some(id));
                    self.dict_slots_mut(id)[slot] = Some(child);
                }
            }
        }
        id
    }

    /// Frees `id` and its descendants. The caller unlinks `id` from its parent.
    pub(crate) fn release(&mut self, id: ElementId) {
        for child in self.child_ids(id) {
            self.release(child);
        }
        self.nodes[id.0] = None;
        self.free.push(id.0);
    }

    /// Copies the subtree at `id` into a new tree rooted at the copy.
    pub(crate) fn extract(&self, id: ElementId) -> Element {
        let mut detached = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: ElementId(0),
        };
        detached.root = self.copy_into(id, &mut detached, None);
        detached
    }

    fn copy_into(&self, id: ElementId, dest: &mut Element, parent: Option<ElementId>) -> ElementId {
        let node = self.node(id);
        let copied = dest.insert(Node {
            parent,
            data: NodeData::Sequence(Vec::new()),
            ..node.clone()
        });
        let data = match &node.data {
            NodeData::Scalar { .. } => node.data.clone(),
            NodeData::Dict(slots) => NodeData::Dict(
                slots
                    .iter()
                    .map(|slot| slot.map(|child| self.copy_into(child, dest, Some(copied))))
                    .collect(),
            ),
            NodeData::Sequence(children) => NodeData::Sequence(
                children
                    .iter()
                    .map(|&child| self.copy_into(child, dest, Some(copied)))
                    .collect(),
            ),
        };
        dest.node_mut(copied).data = data;
        copied
    }

    pub(crate) fn node(&self, id: ElementId) -> &Node {
        self.nodes[id.0]
            .as_ref()
            .expect("element id must refer to a live node")
    }

    pub(crate) fn node_mut(&mut self, id: ElementId) -> &mut Node {
        self.nodes[id.0]
            .as_mut()
            .expect("element id must refer to a live node")
    }

    pub(crate) fn schema_of(&self, id: ElementId) -> Schema {
        self.node(id).schema.clone()
    }

    pub(crate) fn child_ids(&self, id: ElementId) -> Vec<ElementId> {
        match &self.node(id).data {
            NodeData::Scalar { .. } => Vec::new(),
            NodeData::Dict(slots) => slots.iter().flatten().copied().collect(),
            NodeData::Sequence(children) => children.clone(),
        }
    }

    pub(crate) fn dict_slots(&self, id: ElementId) -> &[Option<ElementId>] {
        match &self.node(id).data {
            NodeData::Dict(slots) => slots,
            _ => &[],
        }
    }

    pub(crate) fn dict_slots_mut(&mut self, id: ElementId) -> &mut Vec<Option<ElementId>> {
        match &mut self.node_mut(id).data {
            NodeData::Dict(slots) => slots,
            _ => unreachable!("dict slots requested on a non-dict element"),
        }
    }

    pub(crate) fn seq_children(&self, id: ElementId) -> &[ElementId] {
        match &self.node(id).data {
            NodeData::Sequence(children) => children,
            _ => &[],
        }
    }

    pub(crate) fn seq_children_mut(&mut self, id: ElementId) -> &mut Vec<ElementId> {
        match &mut self.node_mut(id).data {
            NodeData::Sequence(children) => children,
            _ => unreachable!("sequence children requested on a non-sequence element"),
        }
    }

    /// Root element.
    pub fn root(&self) -> ElementRef<'_> {
        ElementRef {
            tree: self,
            id: self.root,
        }
    }

    /// Root element, mutably.
    pub fn root_mut(&mut self) -> ElementMut<'_> {
        let id = self.root;
        ElementMut { tree: self, id }
    }

    /// Element at `id`, if it is still part of this tree.
    pub fn element(&self, id: ElementId) -> Option<ElementRef<'_>> {
        self.contains(id).then_some(ElementRef { tree: self, id })
    }

    /// Element at `id`, mutably, if it is still part of this tree.
    pub fn element_mut(&mut self, id: ElementId) -> Option<ElementMut<'_>> {
        if self.contains(id) {
            Some(ElementMut { tree: self, id })
        } else {
            None
        }
    }

    /// Returns `true` if `id` addresses a live element.
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.get(id.0).is_some_and(Option::is_some)
    }

    /// Root schema.
    pub fn schema(&self) -> &Schema {
        self.root().schema()
    }

    /// Root name.
    pub fn name(&self) -> &str {
        self.root().name()
    }

    /// Root value.
    pub fn value(&self) -> Value {
        self.root().value()
    }

    /// Root text projection.
    pub fn u(&self) -> String {
        self.root().u()
    }

    /// Last native input given to the root's `set`.
    pub fn raw(&self) -> Option<&Value> {
        self.root().raw()
    }

    /// Whether the root is empty.
    pub fn is_empty(&self) -> bool {
        self.root().is_empty()
    }

    /// Number of present children of the root.
    pub fn len(&self) -> usize {
        self.root().len()
    }

    /// Sets the root from a native value. See [`ElementMut::set`].
    pub fn set(&mut self, value: impl Into<Value>) -> Result<bool> {
        self.root_mut().set(value)
    }

    /// Sets the root to its default. See [`ElementMut::set_default`].
    pub fn set_default(&mut self) -> Result<()> {
        self.root_mut().set_default()
    }

    /// Overwrites the root scalar's typed value.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        self.root_mut().set_value(value)
    }

    /// Overwrites the root scalar's text.
    pub fn set_u(&mut self, u: impl Into<String>) -> Result<()> {
        self.root_mut().set_u(u)
    }

    /// Empties the root container. See [`ElementMut::clear`].
    pub fn clear(&mut self) -> Result<()> {
        self.root_mut().clear()
    }

    pub(crate) fn default_for(&self, id: ElementId) -> Option<Value> {
        let options = self.node(id).schema.options();
        match &options.default_factory {
            Some(factory) => Some(factory(&ElementRef { tree: self, id })),
            None => options.default.clone(),
        }
    }

    /// Dispatches `set` by kind. `policy` overrides a Dict's own policy.
    pub(crate) fn set_node(
        &mut self,
        id: ElementId,
        value: &Value,
        policy: Option<&str>,
    ) -> Result<bool> {
        let schema = self.schema_of(id);
        match schema.kind() {
            SchemaKind::Scalar(kind) => self.set_scalar(id, *kind, value),
            SchemaKind::Dict { .. } => self.set_dict(id, value, policy),
            _ => self.set_sequence(id, value),
        }
    }

    fn set_scalar(&mut self, id: ElementId, kind: ScalarKind, value: &Value) -> Result<bool> {
        if kind == ScalarKind::Abstract {
            return Err(FlatlandError::Unsupported(
                "an abstract scalar can not adapt values".to_string(),
            ));
        }
        let schema = self.schema_of(id);
        let options = schema.options();
        let (data, converted) = match kind.adapt(value, options) {
            Ok(adapted) => {
                let u = kind.serialize(&adapted, options);
                (NodeData::Scalar { value: adapted, u }, true)
            }
            Err(err) => {
                trace!(element = %schema.name(), error = %err, "coercion failed");
                (
                    NodeData::Scalar {
                        value: Value::None,
                        u: value.to_text(),
                    },
                    false,
                )
            }
        };
        let node = self.node_mut(id);
        node.data = data;
        node.raw = Some(value.clone());
        Ok(converted)
    }

    /// Returns `id` to its freshly created state.
    pub(crate) fn reset_node(&mut self, id: ElementId) {
        match ElementKind::of(&self.node(id).schema) {
            ElementKind::Scalar => {
                self.node_mut(id).data = NodeData::Scalar {
                    value: Value::None,
                    u: String::new(),
                };
            }
            ElementKind::Dict => {
                for child in self.child_ids(id) {
                    self.reset_node(child);
                }
            }
            ElementKind::SparseDict => self.trim_sparse(id),
            _ => self.clear_sequence(id),
        }
        let node = self.node_mut(id);
        node.raw = None;
        node.valid = None;
        node.errors.clear();
    }

    pub(crate) fn set_default_node(&mut self, id: ElementId) -> Result<()> {
        if let Some(default) = self.default_for(id) {
            self.set_node(id, &default, None)?;
            return Ok(());
        }
        let schema = self.schema_of(id);
        match ElementKind::of(&schema) {
            ElementKind::Scalar => {
                self.set_node(id, &Value::None, None)?;
            }
            ElementKind::Dict => {
                for child in self.child_ids(id) {
                    self.set_default_node(child)?;
                }
            }
            ElementKind::SparseDict => {
                let minimum = schema.options().minimum_fields().inspect_err(|err| {
                    warn!(element = %schema.name(), error = %err, "can not apply sparse dict default");
                })?;
                self.trim_sparse(id);
                if minimum == MinimumFields::Required {
                    for child in self.child_ids(id) {
                        self.set_default_node(child)?;
                    }
                }
            }
            _ => self.clear_sequence(id),
        }
        Ok(())
    }
}

/// Which fields of a dict exist right after creation.
pub(crate) fn present_by_default(schema: &Schema) -> Vec<bool> {
    let fields = schema.fields();
    if !schema.is_sparse() {
        return vec![true; fields.len()];
    }
    let required = schema.options().minimum_fields().unwrap_or_default() == MinimumFields::Required;
    fields
        .iter()
        .map(|field| required && !field.options().optional)
        .collect()
}

impl Schema {
    /// Instantiates this schema with every value unset.
    pub fn create(&self) -> Element {
        Element::new(self.clone())
    }

    /// Instantiates this schema and sets it from a native value.
    ///
    /// Coercion failures are not errors; inspect the element to see them.
    ///
    /// # Errors
    ///
    /// Returns any structural error raised by `set`.
    pub fn create_with(&self, value: impl Into<Value>) -> Result<Element> {
        let mut el = self.create();
        el.set(value)?;
        Ok(el)
    }

    /// Instantiates this schema and applies defaults throughout.
    ///
    /// # Examples
    ///
    /// ```
    /// use flatland_core::{Schema, Value};
    ///
    /// let form = Schema::dict([
    ///     Schema::string().named("fname").with_default("FN"),
    ///     Schema::string().named("surname"),
    /// ]);
    /// let el = form.from_defaults().unwrap();
    /// assert_eq!(el.get("fname").unwrap().value(), Value::from("FN"));
    /// assert_eq!(el.get("surname").unwrap().value(), Value::None);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::Configuration`] for invalid option literals
    /// reached while defaulting.
    pub fn from_defaults(&self) -> Result<Element> {
        let mut el = self.create();
        el.set_default()?;
        Ok(el)
    }
}

/// Read-only view of one element.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub(crate) tree: &'a Element,
    pub(crate) id: ElementId,
}

impl<'a> ElementRef<'a> {
    pub(crate) fn at_id(&self, id: ElementId) -> ElementRef<'a> {
        ElementRef {
            tree: self.tree,
            id,
        }
    }

    fn node(&self) -> &'a Node {
        self.tree.node(self.id)
    }

    /// Arena address.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Owning tree.
    pub fn tree(&self) -> &'a Element {
        self.tree
    }

    /// Schema.
    pub fn schema(&self) -> &'a Schema {
        &self.node().schema
    }

    /// Name; empty for anonymous elements.
    pub fn name(&self) -> &'a str {
        self.schema().name()
    }

    /// Runtime kind.
    pub fn kind(&self) -> ElementKind {
        ElementKind::of(self.schema())
    }

    /// Returns `true` for scalars.
    pub fn is_scalar(&self) -> bool {
        self.kind() == ElementKind::Scalar
    }

    /// Last native input given to `set`; `None` when unset.
    pub fn raw(&self) -> Option<&'a Value> {
        self.node().raw.as_ref()
    }

    /// Parent element.
    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.node().parent.map(|id| self.at_id(id))
    }

    /// Topmost ancestor.
    pub fn root(&self) -> ElementRef<'a> {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Ancestors, nearest first.
    pub fn parents(&self) -> Vec<ElementRef<'a>> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(el) = current {
            out.push(el);
            current = el.parent();
        }
        out
    }

    /// Present children in order: schema order for dicts, position order
    /// for sequences.
    pub fn children(&self) -> Vec<ElementRef<'a>> {
        self.tree
            .child_ids(self.id)
            .into_iter()
            .map(|id| self.at_id(id))
            .collect()
    }

    /// Position within a parent sequence.
    pub fn position(&self) -> Option<usize> {
        let parent = self.node().parent?;
        self.tree
            .seq_children(parent)
            .iter()
            .position(|&c| c == self.id)
    }

    /// Number of present children; `0` for scalars.
    pub fn len(&self) -> usize {
        match &self.node().data {
            NodeData::Scalar { .. } => 0,
            NodeData::Dict(slots) => slots.iter().flatten().count(),
            NodeData::Sequence(children) => children.len(),
        }
    }

    /// Typed value.
    ///
    /// Dicts project to a map of their present keys, sequences to a list,
    /// and a MultiValue to its first child's value.
    pub fn value(&self) -> Value {
        match &self.node().data {
            NodeData::Scalar { value, .. } => value.clone(),
            NodeData::Dict(slots) => Value::Map(
                self.schema()
                    .fields()
                    .iter()
                    .zip(slots)
                    .filter_map(|(field, slot)| {
                        slot.map(|id| (field.name().to_string(), self.at_id(id).value()))
                    })
                    .collect(),
            ),
            NodeData::Sequence(children) => {
                if self.kind() == ElementKind::MultiValue {
                    children
                        .first()
                        .map_or(Value::None, |&id| self.at_id(id).value())
                } else {
                    Value::List(children.iter().map(|&id| self.at_id(id).value()).collect())
                }
            }
        }
    }

    /// Text projection.
    ///
    /// Scalars return their canonical (or rejected) text; containers render
    /// their children's texts as a quoted literal.
    pub fn u(&self) -> String {
        match &self.node().data {
            NodeData::Scalar { u, .. } => u.clone(),
            NodeData::Dict(slots) => {
                let parts: Vec<String> = self
                    .schema()
                    .fields()
                    .iter()
                    .zip(slots)
                    .filter_map(|(field, slot)| {
                        slot.map(|id| format!("{}: {}", quote(field.name()), self.at_id(id).u_repr()))
                    })
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            NodeData::Sequence(children) => {
                if self.kind() == ElementKind::MultiValue {
                    children
                        .first()
                        .map_or_else(String::new, |&id| self.at_id(id).u())
                } else {
                    let parts: Vec<String> =
                        children.iter().map(|&id| self.at_id(id).u_repr()).collect();
                    format!("[{}]", parts.join(", "))
                }
            }
        }
    }

    fn u_repr(&self) -> String {
        match self.kind() {
            ElementKind::Scalar | ElementKind::MultiValue => quote(&self.u()),
            _ => self.u(),
        }
    }

    /// Whether the element holds nothing.
    ///
    /// A scalar is empty when its text is empty and its value is blank; a
    /// Dict when every child is empty; a SparseDict when no key is present;
    /// a sequence when it has no children.
    pub fn is_empty(&self) -> bool {
        match &self.node().data {
            NodeData::Scalar { value, u } => u.is_empty() && value.is_blank(),
            NodeData::Dict(slots) => {
                if self.kind() == ElementKind::SparseDict {
                    slots.iter().all(Option::is_none)
                } else {
                    slots
                        .iter()
                        .flatten()
                        .all(|&id| self.at_id(id).is_empty())
                }
            }
            NodeData::Sequence(children) => children.is_empty(),
        }
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("u", &self.u())
            .finish()
    }
}

/// Mutable view of one element.
pub struct ElementMut<'a> {
    pub(crate) tree: &'a mut Element,
    pub(crate) id: ElementId,
}

impl<'a> ElementMut<'a> {
    /// Arena address.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Read-only view of the same element.
    pub fn view(&self) -> ElementRef<'_> {
        ElementRef {
            tree: self.tree,
            id: self.id,
        }
    }

    /// Converts into a read-only view for the full borrow.
    pub fn into_view(self) -> ElementRef<'a> {
        ElementRef {
            tree: self.tree,
            id: self.id,
        }
    }

    /// Mutable view of the parent.
    pub fn into_parent(self) -> Option<ElementMut<'a>> {
        let parent = self.tree.node(self.id).parent?;
        Some(ElementMut {
            tree: self.tree,
            id: parent,
        })
    }

    pub(crate) fn reborrow(&mut self, id: ElementId) -> ElementMut<'_> {
        ElementMut {
            tree: &mut *self.tree,
            id,
        }
    }

    /// Typed value. See [`ElementRef::value`].
    pub fn value(&self) -> Value {
        self.view().value()
    }

    /// Text projection. See [`ElementRef::u`].
    pub fn u(&self) -> String {
        self.view().u()
    }

    /// Number of present children.
    pub fn len(&self) -> usize {
        self.view().len()
    }

    /// Whether the element holds nothing.
    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    /// Sets the element from a native value.
    ///
    /// Returns `Ok(false)` when any scalar in the subtree failed to coerce;
    /// that scalar keeps the input text as `u` and an unset value.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::Unsupported`] on an abstract scalar.
    /// - [`FlatlandError::UnknownKey`] when a Dict input names an undeclared key.
    /// - [`FlatlandError::MissingFields`] when a strict Dict input omits keys.
    /// - [`FlatlandError::InvalidValue`] when a Dict input is not a mapping.
    /// - [`FlatlandError::Configuration`] for an invalid policy literal.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<bool> {
        self.tree.set_node(self.id, &value.into(), None)
    }

    /// Sets a Dict with a one-off policy literal.
    ///
    /// # Errors
    ///
    /// As [`set`](Self::set).
    pub fn set_with_policy(&mut self, value: impl Into<Value>, policy: &str) -> Result<bool> {
        self.tree.set_node(self.id, &value.into(), Some(policy))
    }

    /// Applies the schema default.
    ///
    /// An element with its own default (or default factory) is `set` to it;
    /// otherwise scalars become unset, Dicts default every child, sequences
    /// are emptied, and SparseDicts keep only what `minimum_fields` asks for.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::Configuration`] for an invalid
    /// `minimum_fields` literal on a SparseDict without its own default.
    pub fn set_default(&mut self) -> Result<()> {
        self.tree.set_default_node(self.id)
    }

    /// Overwrites a scalar's typed value, leaving its text untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::ImmutableAttribute`] on containers.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        match &mut self.tree.node_mut(self.id).data {
            NodeData::Scalar { value: slot, .. } => {
                *slot = value.into();
                Ok(())
            }
            _ => Err(FlatlandError::ImmutableAttribute("value")),
        }
    }

    /// Overwrites a scalar's text, leaving its typed value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::ImmutableAttribute`] on containers.
    pub fn set_u(&mut self, u: impl Into<String>) -> Result<()> {
        match &mut self.tree.node_mut(self.id).data {
            NodeData::Scalar { u: slot, .. } => {
                *slot = u.into();
                Ok(())
            }
            _ => Err(FlatlandError::ImmutableAttribute("u")),
        }
    }

    /// Empties a container.
    ///
    /// Sequences drop every child; SparseDicts drop every key except the
    /// required ones, which are reset.
    ///
    /// # Errors
    ///
    /// - [`FlatlandError::ImmutableKey`] on a Dict, whose keys are fixed.
    /// - [`FlatlandError::Unsupported`] on scalars.
    pub fn clear(&mut self) -> Result<()> {
        match self.view().kind() {
            ElementKind::Scalar => Err(FlatlandError::Unsupported(
                "clear on a scalar element".to_string(),
            )),
            ElementKind::Dict => {
                let keys: Vec<&str> = self.view().schema().fields().iter().map(Schema::name).collect();
                Err(FlatlandError::ImmutableKey(keys.join(", ")))
            }
            ElementKind::SparseDict => {
                self.tree.trim_sparse(self.id);
                Ok(())
            }
            _ => {
                self.tree.clear_sequence(self.id);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ElementMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}
