use crate::timeseries::store::TimeSeriesStore;
use itertools::Itertools;

/// The fluid channels currently in use, sorted by name.
///
/// The set is never cached across mutations: it is derived fresh from the
/// store every time the views are rebuilt, so a channel disappears as soon as
/// its last rate is removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelRegistry {
    names: Vec<String>,
}

impl ChannelRegistry {
    pub fn derive(store: &TimeSeriesStore) -> Self {
        // Each record's map is already sorted, so a k-way merge keeps the order.
        let names = store
            .iter()
            .map(|record| record.fluids().keys())
            .kmerge()
            .dedup()
            .cloned()
            .collect();
        ChannelRegistry { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.position(channel).is_some()
    }

    /// Position of `channel` in the sorted set. Used for column order and colours.
    pub fn position(&self, channel: &str) -> Option<usize> {
        self.names
            .binary_search_by(|name| name.as_str().cmp(channel))
            .ok()
    }

    /// Every channel with its aligned values.
    pub fn project_all<'a>(
        &'a self,
        store: &'a TimeSeriesStore,
    ) -> impl Iterator<Item = (&'a str, Vec<Option<f64>>)> + 'a {
        self.names
            .iter()
            .map(move |name| (name.as_str(), project_channel(store, name)))
    }
}

/// One value per record: the channel's rate where it was logged, `None` (a
/// gap, not zero) everywhere else.
pub fn project_channel(store: &TimeSeriesStore, channel: &str) -> Vec<Option<f64>> {
    store.iter().map(|record| record.fluid(channel)).collect()
}
