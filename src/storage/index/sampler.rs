use rustc_hash::FxHashMap;
use tracing::trace;

/// Selectivity statistics for a property index.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexSample {
    /// Estimated number of distinct values, averaged over sampling steps.
    pub unique_values: u64,
    /// Entries observed per sampling step, averaged over steps.
    pub sample_size: u64,
    /// Net entries observed across all steps (inclusions minus exclusions).
    pub updates: u64,
}

/// Running value-distribution estimator for non-unique indexes.
///
/// Values are counted exactly in a multiset until the distinct encoded bytes
/// it holds reach `buffer_size`; the step is then folded into running totals
/// and the multiset starts over. The reported sample averages over steps.
#[derive(Debug)]
pub struct NonUniqueSampler {
    buffer_size: usize,
    values: FxHashMap<Vec<u8>, u64>,
    step_entries: u64,
    step_bytes: usize,
    sampled_steps: u64,
    accumulated_unique: u64,
    accumulated_entries: u64,
    net_entries: u64,
}

impl NonUniqueSampler {
    /// Creates a sampler that folds a step once `buffer_size` bytes of distinct
    /// encoded values are tracked.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            values: FxHashMap::default(),
            step_entries: 0,
            step_bytes: 0,
            sampled_steps: 0,
            accumulated_unique: 0,
            accumulated_entries: 0,
            net_entries: 0,
        }
    }

    /// Counts one occurrence of `value`.
    pub fn include(&mut self, value: &[u8]) {
        if self.step_bytes >= self.buffer_size {
            self.next_step();
        }
        let count = self.values.entry(value.to_vec()).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.step_bytes += value.len();
        }
        self.step_entries += 1;
        self.net_entries += 1;
    }

    /// Removes one occurrence of `value`.
    ///
    /// The net entry count always drops. The distinct-value estimate only
    /// changes when `value` is tracked in the current step; folded steps are
    /// not revisited.
    pub fn exclude(&mut self, value: &[u8]) {
        self.net_entries = self.net_entries.saturating_sub(1);
        let Some(count) = self.values.get_mut(value) else {
            trace!(len = value.len(), "index.sampler.exclude_untracked");
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.values.remove(value);
            self.step_bytes = self.step_bytes.saturating_sub(value.len());
        }
        self.step_entries = self.step_entries.saturating_sub(1);
    }

    /// Returns the current sample without disturbing the running state.
    pub fn result(&self) -> IndexSample {
        let mut steps = self.sampled_steps;
        let mut unique = self.accumulated_unique;
        let mut entries = self.accumulated_entries;
        if !self.values.is_empty() {
            steps += 1;
            unique += self.values.len() as u64;
            entries += self.step_entries;
        }
        if steps == 0 {
            return IndexSample::default();
        }
        IndexSample {
            unique_values: unique / steps,
            sample_size: entries / steps,
            updates: self.net_entries,
        }
    }

    fn next_step(&mut self) {
        self.accumulated_unique += self.values.len() as u64;
        self.accumulated_entries += self.step_entries;
        self.sampled_steps += 1;
        self.values.clear();
        self.step_entries = 0;
        self.step_bytes = 0;
        trace!(steps = self.sampled_steps, "index.sampler.next_step");
    }
}
