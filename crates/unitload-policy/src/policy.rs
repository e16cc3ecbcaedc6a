//! Exclusion policy: two append-only prefix buckets
use crate::rule::{Bucket, Classification, ExclusionRule};
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct ExclusionPolicy {
    delegate: RwLock<Vec<String>>,
    isolate: RwLock<Vec<String>>,
}

impl ExclusionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a ExclusionRule>) -> Self {
        let policy = Self::new();
        for rule in rules {
            policy.add_rule(rule);
        }
        policy
    }

    fn bucket(&self, bucket: Bucket) -> &RwLock<Vec<String>> {
        match bucket {
            Bucket::Delegate => &self.delegate,
            Bucket::Isolate => &self.isolate,
        }
    }

    /// Adds `prefix` to `bucket`. Returns false if it was already there.
    pub fn add(&self, bucket: Bucket, prefix: impl Into<String>) -> bool {
        let prefix = prefix.into();
        let mut prefixes = self.bucket(bucket).write();
        if prefixes.contains(&prefix) {
            return false;
        }
        tracing::debug!(%bucket, prefix = %prefix, "exclusion added");
        prefixes.push(prefix);
        true
    }

    pub fn add_rule(&self, rule: &ExclusionRule) -> bool {
        self.add(rule.bucket, rule.prefix.clone())
    }

    /// Delegate wins over isolate; within a bucket any matching prefix decides.
    pub fn classify(&self, name: &str) -> Classification {
        if self.matches(Bucket::Delegate, name) {
            Classification::Delegate
        } else if self.matches(Bucket::Isolate, name) {
            Classification::Isolate
        } else {
            Classification::Transform
        }
    }

    pub fn matches(&self, bucket: Bucket, name: &str) -> bool {
        self.bucket(bucket)
            .read()
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Prefixes of `bucket` in insertion order.
    pub fn prefixes(&self, bucket: Bucket) -> Vec<String> {
        self.bucket(bucket).read().clone()
    }

    pub fn rules(&self) -> Vec<ExclusionRule> {
        [Bucket::Delegate, Bucket::Isolate]
            .into_iter()
            .flat_map(|bucket| {
                self.prefixes(bucket)
                    .into_iter()
                    .map(move |prefix| ExclusionRule::new(prefix, bucket))
            })
            .collect()
    }
}
