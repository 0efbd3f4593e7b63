//! Tolerance-based frequency deduplication.

/// A deduplicated frequency bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalFrequency {
    /// First raw value that landed in this bucket.
    pub value: f64,
    /// Creation-order slot, used as the row key until the final sort.
    pub slot: usize,
}

/// Ordered set of canonical frequencies.
///
/// Matching is a linear first-match scan in creation order, so the bucket a
/// value joins (and the value that represents it) depends on arrival order,
/// never on which bucket is nearest.
#[derive(Debug, Clone)]
pub struct FrequencyIndex {
    epsilon: f64,
    entries: Vec<CanonicalFrequency>,
}

impl FrequencyIndex {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            entries: Vec::new(),
        }
    }

    /// Return the slot for `frequency`, creating a bucket if none is within
    /// tolerance.
    pub fn resolve(&mut self, frequency: f64) -> usize {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|c| (c.value - frequency).abs() < self.epsilon)
        {
            return existing.slot;
        }

        let slot = self.entries.len();
        self.entries.push(CanonicalFrequency {
            value: frequency,
            slot,
        });
        slot
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Buckets in creation order.
    pub fn entries(&self) -> &[CanonicalFrequency] {
        &self.entries
    }

    /// Buckets sorted ascending by value. Stable, so creation order breaks
    /// ties.
    pub fn sorted(&self) -> Vec<CanonicalFrequency> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
        sorted
    }
}
