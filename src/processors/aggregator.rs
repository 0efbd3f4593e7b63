//! Per-file loop accounting.

/// One (primary, secondary) reading in kilohms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopReading {
    pub primary: f64,
    pub secondary: f64,
}

/// Readings of one file, indexed by frequency slot then loop index.
#[derive(Debug, Clone, Default)]
struct FileLoops {
    by_slot: Vec<Vec<LoopReading>>,
    max_loops: usize,
}

/// Accumulates loop readings for every (file, frequency slot) pair.
///
/// The loop index of a reading is its arrival position among the readings
/// of the same file at the same slot, so indices are always contiguous
/// from 0.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    files: Vec<FileLoops>,
}

impl Aggregator {
    /// Create an aggregator with room for `num_files` files.
    pub fn new(num_files: usize) -> Self {
        Self {
            files: vec![FileLoops::default(); num_files],
        }
    }

    /// Append a reading for `file` at `slot` and return its loop index.
    pub fn record(&mut self, file: usize, slot: usize, primary: f64, secondary: f64) -> usize {
        if file >= self.files.len() {
            self.files.resize_with(file + 1, FileLoops::default);
        }
        let loops = &mut self.files[file];
        if slot >= loops.by_slot.len() {
            loops.by_slot.resize_with(slot + 1, Vec::new);
        }

        let readings = &mut loops.by_slot[slot];
        let loop_index = readings.len();
        readings.push(LoopReading { primary, secondary });
        loops.max_loops = loops.max_loops.max(readings.len());
        loop_index
    }

    /// Number of readings recorded for `file` at `slot`.
    pub fn loop_count(&self, file: usize, slot: usize) -> usize {
        self.readings(file, slot).len()
    }

    /// Readings for `file` at `slot`, in loop order.
    pub fn readings(&self, file: usize, slot: usize) -> &[LoopReading] {
        self.files
            .get(file)
            .and_then(|f| f.by_slot.get(slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Largest loop count of `file` over all slots.
    pub fn max_loops(&self, file: usize) -> usize {
        self.files.get(file).map_or(0, |f| f.max_loops)
    }

    /// Total readings stored for `file`.
    pub fn total_readings(&self, file: usize) -> usize {
        self.files
            .get(file)
            .map_or(0, |f| f.by_slot.iter().map(Vec::len).sum())
    }

    pub fn num_files(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_indices_follow_arrival_order() {
        let mut agg = Aggregator::new(1);
        assert_eq!(agg.record(0, 0, 1.0, -1.0), 0);
        assert_eq!(agg.record(0, 0, 2.0, -2.0), 1);
        assert_eq!(agg.record(0, 0, 3.0, -3.0), 2);

        let readings = agg.readings(0, 0);
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[1], LoopReading { primary: 2.0, secondary: -2.0 });
    }

    #[test]
    fn test_loop_index_is_local_to_slot() {
        let mut agg = Aggregator::new(1);
        agg.record(0, 0, 1.0, 1.0);
        agg.record(0, 0, 1.0, 1.0);
        assert_eq!(agg.record(0, 1, 1.0, 1.0), 0);
        assert_eq!(agg.loop_count(0, 0), 2);
        assert_eq!(agg.loop_count(0, 1), 1);
    }

    #[test]
    fn test_max_loops_is_per_file() {
        let mut agg = Aggregator::new(2);
        agg.record(0, 0, 1.0, 1.0);
        agg.record(0, 0, 1.0, 1.0);
        agg.record(0, 3, 1.0, 1.0);
        agg.record(1, 3, 1.0, 1.0);

        assert_eq!(agg.max_loops(0), 2);
        assert_eq!(agg.max_loops(1), 1);
        assert_eq!(agg.total_readings(0), 3);
    }

    #[test]
    fn test_absent_data_reads_as_empty() {
        let mut agg = Aggregator::new(2);
        agg.record(0, 5, 1.0, 1.0);

        assert_eq!(agg.loop_count(1, 5), 0);
        assert_eq!(agg.loop_count(0, 2), 0);
        assert_eq!(agg.loop_count(7, 0), 0);
        assert_eq!(agg.max_loops(1), 0);
        assert_eq!(agg.max_loops(7), 0);
    }

    #[test]
    fn test_grows_past_initial_file_count() {
        let mut agg = Aggregator::new(0);
        agg.record(2, 0, 1.0, 1.0);
        assert_eq!(agg.num_files(), 3);
        assert_eq!(agg.max_loops(2), 1);
    }
}
