//! Tag diff engine
//!
//! Computes which tags must be written and which must be deleted to move a
//! resource from one tag set to another.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::tagset::TagSet;

/// Result of comparing two tag sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagDiff {
    /// Tags that are new or whose value changed, with their new value
    pub to_create: TagSet,
    /// Tags that vanished or whose value changed, with their old value
    pub to_remove: TagSet,
}

impl TagDiff {
    /// True when no remote call is needed
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_remove.is_empty()
    }

    /// Keys to pass to an untag call
    pub fn removed_keys(&self) -> BTreeSet<String> {
        self.to_remove.keys().map(str::to_string).collect()
    }

    /// Keys present on both sides of the diff, i.e. tags whose value changed
    pub fn changed_keys(&self) -> BTreeSet<String> {
        self.to_remove
            .keys()
            .filter(|k| self.to_create.contains_key(k))
            .map(str::to_string)
            .collect()
    }
}

/// Compare `old` against `new`.
///
/// Every tag of `new` starts out as a create. Each tag of `old` is then
/// either dropped from the creates (same value on both sides) or scheduled
/// for removal (absent from `new`, or present with another value). A tag
/// whose value changed therefore shows up in both halves.
pub fn diff(old: &TagSet, new: &TagSet) -> TagDiff {
    let mut to_create = new.clone();
    let mut to_remove = TagSet::new();

    for (key, old_value) in old.iter() {
        if to_create.get(key) == Some(old_value) {
            to_create.remove(key);
        } else {
            to_remove.insert(key, old_value);
        }
    }

    TagDiff {
        to_create,
        to_remove,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> TagSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_identical_sets() {
        let a = set(&[("Team", "infra"), ("Env", "prod")]);
        let d = diff(&a, &a);
        assert!(d.to_create.is_empty());
        assert!(d.to_remove.is_empty());
        assert!(d.is_empty());
    }

    #[test]
    fn test_empty_old() {
        let new = set(&[("Team", "infra")]);
        let d = diff(&TagSet::new(), &new);
        assert_eq!(d.to_create, new);
        assert!(d.to_remove.is_empty());
    }

    #[test]
    fn test_empty_new() {
        let old = set(&[("Team", "infra"), ("Env", "prod")]);
        let d = diff(&old, &TagSet::new());
        assert!(d.to_create.is_empty());
        assert_eq!(d.to_remove, old);
    }

    #[test]
    fn test_both_empty() {
        assert!(diff(&TagSet::new(), &TagSet::new()).is_empty());
    }

    #[test]
    fn test_changed_and_added() {
        let old = set(&[("Team", "infra"), ("Env", "prod")]);
        let new = set(&[("Team", "infra"), ("Env", "staging"), ("Owner", "alice")]);

        let d = diff(&old, &new);

        assert_eq!(d.to_create, set(&[("Env", "staging"), ("Owner", "alice")]));
        assert_eq!(d.to_remove, set(&[("Env", "prod")]));
        assert_eq!(d.changed_keys(), BTreeSet::from(["Env".to_string()]));
        assert_eq!(d.removed_keys(), BTreeSet::from(["Env".to_string()]));
    }

    #[test]
    fn test_comparison_is_exact() {
        let old = set(&[("Team", "Infra")]);
        let new = set(&[("Team", "infra ")]);

        let d = diff(&old, &new);

        assert_eq!(d.to_create, new);
        assert_eq!(d.to_remove, old);
    }

    #[test]
    fn test_diff_properties_hold_for_mixed_sets() {
        let cases = [
            (set(&[]), set(&[("a", "1")])),
            (set(&[("a", "1"), ("b", "2")]), set(&[("b", "3"), ("c", "4")])),
            (set(&[("a", "1"), ("b", "2"), ("c", "3")]), set(&[("a", "1")])),
            (set(&[("x", "")]), set(&[("x", "")])),
            (set(&[("x", "")]), set(&[("x", " ")])),
        ];

        for (a, b) in &cases {
            let d = diff(a, b);

            for (k, v) in d.to_create.iter() {
                assert_eq!(b.get(k), Some(v), "create {k} must carry the new value");
            }
            for (k, v) in d.to_remove.iter() {
                assert_eq!(a.get(k), Some(v), "remove {k} must carry the old value");
                assert_ne!(b.get(k), Some(v), "remove {k} must be gone or changed");
            }
            for k in d.changed_keys() {
                assert!(a.contains_key(&k) && b.contains_key(&k));
                assert_ne!(a.get(&k), b.get(&k));
            }

            assert!(diff(a, a).is_empty());
            assert!(diff(b, b).is_empty());
        }
    }

    #[test]
    fn test_unchanged_keys_never_appear() {
        let old = set(&[("keep", "1"), ("drop", "2")]);
        let new = set(&[("keep", "1"), ("add", "3")]);

        let d = diff(&old, &new);

        assert!(!d.to_create.contains_key("keep"));
        assert!(!d.to_remove.contains_key("keep"));
        assert!(d.changed_keys().is_empty());
    }

    #[test]
    fn test_serialize_plan() {
        let d = diff(&set(&[("a", "1")]), &set(&[("b", "2")]));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["to_create"]["b"], "2");
        assert_eq!(json["to_remove"]["a"], "1");
    }
}
