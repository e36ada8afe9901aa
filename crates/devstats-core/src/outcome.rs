//! Per-item results for the steps that must not abort a run.
//!
//! Repository commit lookups, pull request searches and catalog upserts each
//! produce one [`ItemOutcome`] per item. Callers collect them into an
//! [`Outcomes`] list, log the failures with their key and continue with the
//! successes.

use std::fmt::Display;
use tracing::warn;

#[derive(Debug)]
pub struct ItemOutcome<T, E> {
    /// Identifies the item in logs (repository, login or catalog identifier)
    pub key: String,
    pub result: Result<T, E>,
}

impl<T, E> ItemOutcome<T, E> {
    pub fn new(key: impl Into<String>, result: Result<T, E>) -> Self {
        Self {
            key: key.into(),
            result,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub struct Outcomes<T, E> {
    items: Vec<ItemOutcome<T, E>>,
}

impl<T, E> Default for Outcomes<T, E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T, E> Outcomes<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, result: Result<T, E>) {
        self.items.push(ItemOutcome::new(key, result));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().filter_map(|item| match &item.result {
            Ok(value) => Some((item.key.as_str(), value)),
            Err(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &E)> {
        self.items.iter().filter_map(|item| match &item.result {
            Ok(_) => None,
            Err(err) => Some((item.key.as_str(), err)),
        })
    }

    pub fn failure_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_ok()).count()
    }

    pub fn into_successes(self) -> impl Iterator<Item = T> {
        self.items.into_iter().filter_map(|item| item.result.ok())
    }
}

impl<T, E: Display> Outcomes<T, E> {
    /// Log every failure at warn level, tagged with `what` and the item key.
    pub fn log_failures(&self, what: &str) {
        for (key, err) in self.failures() {
            warn!("{} failed for {}: {}", what, key, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_successes_and_failures() {
        let mut outcomes: Outcomes<u32, String> = Outcomes::new();
        outcomes.push("r1", Ok(1));
        outcomes.push("r2", Err("boom".to_string()));
        outcomes.push("r3", Ok(3));

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.failure_count(), 1);
        assert_eq!(
            outcomes.failures().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["r2"]
        );
        assert_eq!(outcomes.into_successes().collect::<Vec<_>>(), vec![1, 3]);
    }
}
