use std::cmp::Ordering;

/// Entry of a min-priority queue with lazy invalidation.
///
/// `stamp` is compared by the caller against the current stamp of `item` to
/// drop entries made stale by later updates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<T> {
    pub cost: f64,
    pub item: T,
    pub stamp: u32,
}

impl<T> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal
    }
}

impl<T> Eq for Candidate<T> {}

impl<T> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Candidate<T> {
    // Reversed so that `BinaryHeap` pops the cheapest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_pops_cheapest_first() {
        let mut heap = BinaryHeap::new();
        for (cost, item) in [(3.0, 'c'), (1.0, 'a'), (2.0, 'b')] {
            heap.push(Candidate { cost, item, stamp: 0 });
        }
        let order: Vec<char> = std::iter::from_fn(|| heap.pop().map(|c| c.item)).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
    }
}
