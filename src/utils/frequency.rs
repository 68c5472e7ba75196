use std::{collections::HashMap, fmt::Debug, hash::Hash};

use ahash::RandomState;
use rand::{seq::SliceRandom, Rng};

/// Default cap on the number of entries kept by a distribution
pub const DEFAULT_TOP_N: usize = 100;

/// Frequency distribution
/// Distinct items with their summed counts, sorted by
/// - count descending
/// - item ascending for equal counts
///
/// and truncated to a cap.
#[derive(Clone, PartialEq, Eq)]
pub struct Frequencies<K> {
    pub list: Vec<(K, u64)>,
}

impl<K> Frequencies<K>
where
    K: Ord + Hash + Clone,
{
    /// Build from (item, count) pairs; counts of the same item are summed.
    /// Zero counts are dropped.
    ///
    /// # Arguments
    /// * `pairs` - weighted items, an item may repeat
    /// * `cap` - maximum number of entries kept
    pub fn from_counts<I>(pairs: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
    {
        let mut merged: HashMap<K, u64, RandomState> = HashMap::with_hasher(RandomState::new());
        for (item, count) in pairs {
            *merged.entry(item).or_insert(0) += count;
        }
        let mut list: Vec<(K, u64)> = merged.into_iter().filter(|(_, c)| *c > 0).collect();
        list.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        list.truncate(cap);
        Frequencies { list }
    }

    /// Build from a bag of items, each occurrence counting once
    pub fn from_items<I>(items: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        Self::from_counts(items.into_iter().map(|k| (k, 1)), cap)
    }
}

impl<K> Frequencies<K> {
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Highest-count item
    #[inline]
    pub fn top(&self) -> Option<&K> {
        self.list.first().map(|(k, _)| k)
    }

    /// Item at a rank (0 = top)
    #[inline]
    pub fn nth(&self, rank: usize) -> Option<&K> {
        self.list.get(rank).map(|(k, _)| k)
    }

    pub fn items(&self) -> impl Iterator<Item = &K> {
        self.list.iter().map(|(k, _)| k)
    }

    /// First `window` entries
    pub fn window(&self, window: usize) -> &[(K, u64)] {
        &self.list[..window.min(self.list.len())]
    }

    /// Uniform random item among the first `window` entries.
    /// Falls back to the top entry when the window is empty but the
    /// distribution is not (window == 0).
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R, window: usize) -> Option<&K> {
        self.window(window)
            .choose(rng)
            .map(|(k, _)| k)
            .or_else(|| self.top())
    }
}

impl<K> Debug for Frequencies<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Frequencies [")?;
            for (item, count) in &self.list {
                writeln!(f, "    {:?}: {}", item, count)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}
