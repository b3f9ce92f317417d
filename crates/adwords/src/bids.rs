use crate::ConsumerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bids of one arrival: consumer id to bid amount.
///
/// A consumer absent from the map did not bid. Zero, negative and non-finite amounts are treated
/// the same as an absent bid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bids(BTreeMap<ConsumerId, f64>);

impl Bids {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bid(mut self, id: ConsumerId, amount: f64) -> Self {
        self.insert(id, amount);
        self
    }

    pub fn insert(&mut self, id: ConsumerId, amount: f64) {
        self.0.insert(id, amount);
    }

    /// The bid of a consumer if it is a usable positive amount
    pub fn positive(&self, id: ConsumerId) -> Option<f64> {
        self.0
            .get(&id)
            .copied()
            .filter(|amount| amount.is_finite() && *amount > 0.)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates raw bids in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (ConsumerId, f64)> + '_ {
        self.0.iter().map(|(&id, &amount)| (id, amount))
    }
}

impl FromIterator<(ConsumerId, f64)> for Bids {
    fn from_iter<T: IntoIterator<Item = (ConsumerId, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<(u32, f64)> for Bids {
    fn from_iter<T: IntoIterator<Item = (u32, f64)>>(iter: T) -> Self {
        iter.into_iter().map(|(id, b)| (ConsumerId(id), b)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_positive_filters_unusable_bids() {
        let bids = Bids::new()
            .with_bid(ConsumerId(1), 12.5)
            .with_bid(ConsumerId(2), 0.)
            .with_bid(ConsumerId(3), -4.)
            .with_bid(ConsumerId(4), f64::NAN)
            .with_bid(ConsumerId(5), f64::INFINITY);

        assert_eq!(bids.positive(ConsumerId(1)), Some(12.5));
        assert_eq!(bids.positive(ConsumerId(2)), None);
        assert_eq!(bids.positive(ConsumerId(3)), None);
        assert_eq!(bids.positive(ConsumerId(4)), None);
        assert_eq!(bids.positive(ConsumerId(5)), None);
        assert_eq!(bids.positive(ConsumerId(6)), None);
        assert_eq!(bids.len(), 5);
    }

    #[test]
    fn test_insert_and_with_bid_agree() {
        let mut inserted = Bids::new();
        inserted.insert(ConsumerId(3), 20.);
        inserted.insert(ConsumerId(1), 10.);

        let chained = Bids::new()
            .with_bid(ConsumerId(1), 10.)
            .with_bid(ConsumerId(3), 20.);

        assert_eq!(inserted, chained);
    }

    #[test]
    fn test_iter_is_ordered_by_id() {
        let bids: Bids = [(7u32, 1.), (2, 2.), (5, 3.)].into_iter().collect();
        let ids = bids.iter().map(|(id, _)| id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 5, 7]);
    }
}
