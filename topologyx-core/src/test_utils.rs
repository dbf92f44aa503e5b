//! Shared test utilities for `topologyx-core`.

use proptest::test_runner::Config as ProptestConfig;
use topologyx_test_support::proptest_profile::ProptestProfile;

use crate::{error::DataSourceError, neighbors::NeighborIndex};

/// Builds a proptest configuration sized by the shared run profile.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    ProptestConfig {
        cases: ProptestProfile::load(default_cases).cases(),
        ..ProptestConfig::default()
    }
}

/// [`NeighborIndex`] answering from a fixed adjacency table.
///
/// Row `p` lists the neighbours of point `p`, nearest first; queries return
/// the first `k` entries.
#[derive(Clone, Debug)]
pub(crate) struct FixedNeighbors {
    rows: Vec<Vec<usize>>,
}

impl FixedNeighbors {
    pub(crate) fn new(rows: Vec<Vec<usize>>) -> Self {
        Self { rows }
    }
}

impl NeighborIndex for FixedNeighbors {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn query(&self, point: usize, k: usize) -> Result<Vec<usize>, DataSourceError> {
        let row = self
            .rows
            .get(point)
            .ok_or(DataSourceError::OutOfBounds { index: point })?;
        Ok(row.iter().copied().take(k).collect())
    }
}
