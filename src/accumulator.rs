use crate::record::{ProductRecord, ResultSet};

/// Collects records page by page and freezes them into a [`ResultSet`].
#[derive(Debug)]
pub struct ResultAccumulator {
    ceiling: usize,
    records: Vec<ProductRecord>,
}

impl ResultAccumulator {
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling,
            records: Vec::new(),
        }
    }

    pub fn append(&mut self, records: impl IntoIterator<Item = ProductRecord>) {
        self.records.extend(records);
    }

    /// Records appended so far, before truncation.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps the first `ceiling` records in arrival order, then sorts them
    /// ascending by price. The sort is stable, so equal prices keep their
    /// arrival order and unparsable prices trail in arrival order.
    pub fn finalize(&self) -> ResultSet {
        let mut kept: Vec<ProductRecord> = self.records.iter().take(self.ceiling).cloned().collect();
        kept.sort_by(|a, b| a.price_numeric.ascending(&b.price_numeric));
        ResultSet::from_sorted(kept)
    }
}
