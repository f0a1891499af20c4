//! Grouping of repeated flat keys into sequence members.
//!
//! Array and MultiValue children all share one flat key, so rehydration
//! cannot address a child by name. Instead the matching pairs are read in
//! order by a small state machine: each group collects pairs until a key it
//! has already consumed shows up again, which closes the group and opens
//! the next one. A scalar member consumes exactly one pair per group.

use crate::flatten::FlatPair;

#[derive(Debug)]
enum State<'p> {
    /// No group open.
    Idle,
    /// Collecting a group; `consumed` holds the keys seen so far.
    Open {
        consumed: Vec<&'p str>,
        pairs: Vec<&'p FlatPair>,
    },
}

/// Single-pass grouper over matching pairs.
#[derive(Debug)]
pub(crate) struct Grouper<'p> {
    state: State<'p>,
    groups: Vec<Vec<&'p FlatPair>>,
}

impl<'p> Grouper<'p> {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Idle,
            groups: Vec::new(),
        }
    }

    /// Feeds one matching pair.
    pub(crate) fn feed(&mut self, pair: &'p FlatPair) {
        let key = pair.0.as_str();
        self.state = match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => State::Open {
                consumed: vec![key],
                pairs: vec![pair],
            },
            State::Open { consumed, pairs } if consumed.contains(&key) => {
                self.groups.push(pairs);
                State::Open {
                    consumed: vec![key],
                    pairs: vec![pair],
                }
            }
            State::Open {
                mut consumed,
                mut pairs,
            } => {
                consumed.push(key);
                pairs.push(pair);
                State::Open { consumed, pairs }
            }
        };
    }

    /// Closes any open group and returns all groups in input order.
    pub(crate) fn finish(mut self) -> Vec<Vec<&'p FlatPair>> {
        if let State::Open { pairs, .. } = self.state {
            self.groups.push(pairs);
        }
        self.groups
    }
}

/// Groups the pairs accepted by `matches`, dropping the rest.
pub(crate) fn group_runs<'p>(
    pairs: impl IntoIterator<Item = &'p FlatPair>,
    matches: impl Fn(&str) -> bool,
) -> Vec<Vec<&'p FlatPair>> {
    let mut grouper = Grouper::new();
    for pair in pairs {
        if matches(&pair.0) {
            grouper.feed(pair);
        }
    }
    grouper.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(items: &[(&str, &str)]) -> Vec<FlatPair> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn values(groups: &[Vec<&FlatPair>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|p| p.1.clone()).collect())
            .collect()
    }

    #[test]
    fn test_single_key_one_pair_per_group() {
        let pairs = flat(&[("a", "1"), ("a", "2"), ("a", "3")]);
        let groups = group_runs(&pairs, |k| k == "a");
        assert_eq!(values(&groups), vec![vec!["1"], vec!["2"], vec!["3"]]);
    }

    #[test]
    fn test_repeat_closes_group() {
        let pairs = flat(&[("x", "1"), ("y", "2"), ("x", "3"), ("x", "4"), ("y", "5")]);
        let groups = group_runs(&pairs, |_| true);
        assert_eq!(
            values(&groups),
            vec![vec!["1", "2"], vec!["3"], vec!["4", "5"]]
        );
    }

    #[test]
    fn test_foreign_pairs_dropped() {
        let pairs = flat(&[("a", "1"), ("b", "x"), ("a", "2")]);
        let groups = group_runs(&pairs, |k| k == "a");
        assert_eq!(values(&groups), vec![vec!["1"], vec!["2"]]);
    }

    #[test]
    fn test_no_matches_no_groups() {
        let pairs = flat(&[("b", "x")]);
        assert!(group_runs(&pairs, |k| k == "a").is_empty());
    }
}
