//! Tree to flat pairs.

use crate::element::{Element, ElementKind, ElementRef};
use crate::naming::{join, DEFAULT_SEPARATOR};

/// One flat `(key, text)` pair.
pub type FlatPair = (String, String);

impl ElementRef<'_> {
    /// Flattens this subtree into `(flat key, u)` pairs, depth-first.
    ///
    /// Dict children follow schema order and sequence children their
    /// current order. Empty sequence children are skipped when the sequence
    /// has `prune_empty` set.
    ///
    /// # Examples
    ///
    /// ```
    /// use flatland_core::{Schema, Value};
    ///
    /// let schema = Schema::dict([
    ///     Schema::string().named("name"),
    ///     Schema::array(Schema::string().named("tag")).named("tags"),
    /// ])
    /// .named("f");
    /// let el = schema
    ///     .create_with(Value::map([
    ///         ("name", Value::from("n")),
    ///         ("tags", Value::list(["a", "", "b"])),
    ///     ]))
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     el.flatten(),
    ///     vec![
    ///         ("f_name".to_string(), "n".to_string()),
    ///         ("f_tags_tag".to_string(), "a".to_string()),
    ///         ("f_tags_tag".to_string(), "b".to_string()),
    ///     ]
    /// );
    /// ```
    pub fn flatten_with(&self, sep: char) -> Vec<FlatPair> {
        let mut out = Vec::new();
        self.flatten_into(&self.flattened_name(sep), sep, &mut out);
        out
    }

    /// Flattens with [`DEFAULT_SEPARATOR`].
    pub fn flatten(&self) -> Vec<FlatPair> {
        self.flatten_with(DEFAULT_SEPARATOR)
    }

    fn flatten_into(&self, name: &str, sep: char, out: &mut Vec<FlatPair>) {
        let kind = self.kind();
        if kind == ElementKind::Scalar {
            out.push((name.to_string(), self.u()));
            return;
        }
        let sequence = kind.is_sequence();
        let prune = sequence && self.schema().options().prune_empty;
        for (index, child) in self.children().into_iter().enumerate() {
            if prune && child.is_empty() {
                continue;
            }
            let segment = child.segment_at(sequence.then_some(index), sep);
            child.flatten_into(&join(name, &segment, sep), sep, out);
        }
    }
}

impl Element {
    /// Flattens the whole tree. See [`ElementRef::flatten_with`].
    pub fn flatten_with(&self, sep: char) -> Vec<FlatPair> {
        self.root().flatten_with(sep)
    }

    /// Flattens the whole tree with [`DEFAULT_SEPARATOR`].
    pub fn flatten(&self) -> Vec<FlatPair> {
        self.root().flatten()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Schema, Value};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scalar_flattens_to_one_pair() {
        let el = Schema::integer().named("i").create_with(12).unwrap();
        assert_eq!(el.flatten(), pairs(&[("i", "12")]));
    }

    #[test]
    fn test_dict_declared_order() {
        let schema = Schema::dict([Schema::integer().named("y"), Schema::integer().named("x")])
            .named("s");
        let el = schema.create_with(Value::map([("x", 1), ("y", 2)])).unwrap();
        assert_eq!(el.flatten(), pairs(&[("s_y", "2"), ("s_x", "1")]));
    }

    #[test]
    fn test_prune_empty_toggle() {
        let member = Schema::string().named("s");
        let pruned = Schema::array(member.clone()).named("a");
        let kept = Schema::array(member).named("a").prune_empty(false);

        let value = Value::list(["x", "", "y"]);
        let el = pruned.create_with(value.clone()).unwrap();
        assert_eq!(el.flatten().len(), 2);
        let el = kept.create_with(value).unwrap();
        assert_eq!(el.flatten(), pairs(&[("a_s", "x"), ("a_s", ""), ("a_s", "y")]));
    }

    #[test]
    fn test_list_of_dicts_indexed_names() {
        let schema = Schema::dict([Schema::list(Schema::dict([Schema::string().named("name")]))
            .named("snacks")])
        .named("ns");
        let el = schema
            .create_with(Value::map([(
                "snacks",
                Value::list([
                    Value::map([("name", "cheese")]),
                    Value::map([("name", "crackers")]),
                ]),
            )]))
            .unwrap();
        assert_eq!(
            el.flatten(),
            pairs(&[("ns_snacks_0_name", "cheese"), ("ns_snacks_1_name", "crackers")])
        );
    }

    #[test]
    fn test_pruned_list_keeps_positions() {
        let schema = Schema::list(Schema::string().named("s")).named("l");
        let items: Vec<Value> = (0..500)
            .map(|i| Value::from(if i % 250 == 1 { "" } else { "x" }))
            .collect();
        let el = schema.create_with(Value::List(items)).unwrap();
        let flat = el.flatten();
        assert_eq!(flat.len(), 498);
        assert_eq!(flat[1].0, "l_2_s");
        assert_eq!(flat[497].0, "l_499_s");
        for (pair, child) in flat.iter().zip(el.root().children().into_iter().filter(|c| !c.is_empty())) {
            assert_eq!(pair.0, child.flat_name());
        }
    }

    #[test]
    fn test_subtree_flatten_keeps_full_names() {
        let schema = Schema::dict([Schema::dict([Schema::string().named("x")]).named("d")])
            .named("f");
        let el = schema
            .create_with(Value::map([("d", Value::map([("x", "1")]))]))
            .unwrap();
        assert_eq!(el.get("d").unwrap().flatten_with('.'), pairs(&[("f.d.x", "1")]));
    }
}
