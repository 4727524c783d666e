//! Contribution Ledger
//!
//! Per-contributor cumulative carbon amounts kept in first-contribution
//! order, plus the running total. Entries are only ever created or increased.

use alloy_primitives::{Address, U256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Contribution of {contributor} would overflow")]
    ContributionOverflow { contributor: Address },

    #[error("Ledger total would overflow")]
    TotalOverflow,
}

/// Address-keyed contributions in insertion order.
///
/// `total` equals the sum of all `contributions`. Updating an existing key
/// keeps its position.
#[derive(Debug, Clone, Default)]
pub struct ContributionLedger {
    contributions: IndexMap<Address, U256>,
    total: U256,
}

/// Serializable view of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub contributors: Vec<(Address, U256)>,
    pub total: U256,
}

impl ContributionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `record(contributor, amount)` would succeed, without
    /// touching the ledger.
    pub fn can_record(&self, contributor: Address, amount: U256) -> Result<(), LedgerError> {
        self.next_values(contributor, amount).map(|_| ())
    }

    /// Credit `amount` to `contributor`, appending the address on first use.
    pub fn record(&mut self, contributor: Address, amount: U256) -> Result<(), LedgerError> {
        let (balance, total) = self.next_values(contributor, amount)?;

        self.contributions.insert(contributor, balance);
        self.total = total;

        tracing::debug!(
            %contributor,
            %amount,
            balance = %balance,
            total = %total,
            "Recorded contribution"
        );
        Ok(())
    }

    fn next_values(
        &self,
        contributor: Address,
        amount: U256,
    ) -> Result<(U256, U256), LedgerError> {
        let balance = self
            .contribution_of(contributor)
            .checked_add(amount)
            .ok_or(LedgerError::ContributionOverflow { contributor })?;
        let total = self
            .total
            .checked_add(amount)
            .ok_or(LedgerError::TotalOverflow)?;
        Ok((balance, total))
    }

    /// Cumulative amount of a contributor (zero if unknown)
    pub fn contribution_of(&self, contributor: Address) -> U256 {
        self.contributions
            .get(&contributor)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Contributor at position `index` in first-contribution order
    pub fn contributor_at(&self, index: usize) -> Option<Address> {
        self.contributions.get_index(index).map(|(address, _)| *address)
    }

    pub fn contributors(&self) -> Vec<Address> {
        self.contributions.keys().copied().collect()
    }

    pub fn total(&self) -> U256 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            contributors: self
                .contributions
                .iter()
                .map(|(address, amount)| (*address, *amount))
                .collect(),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ALICE: Address = address!("a11ce00000000000000000000000000000000001");
    const BOB: Address = address!("b0b0000000000000000000000000000000000002");
    const CAROL: Address = address!("ca10100000000000000000000000000000000003");

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn sum_of_balances(ledger: &ContributionLedger) -> U256 {
        ledger
            .contributors()
            .iter()
            .fold(U256::ZERO, |acc, a| acc + ledger.contribution_of(*a))
    }

    #[test]
    fn test_first_contribution_appends() {
        let mut ledger = ContributionLedger::new();
        assert!(ledger.is_empty());

        ledger.record(ALICE, u(1_000)).unwrap();
        assert_eq!(ledger.contributor_at(0), Some(ALICE));
        assert_eq!(ledger.contribution_of(ALICE), u(1_000));
        assert_eq!(ledger.total(), u(1_000));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_repeat_contribution_does_not_duplicate() {
        let mut ledger = ContributionLedger::new();
        ledger.record(ALICE, u(1_000)).unwrap();
        ledger.record(BOB, u(2_000)).unwrap();
        ledger.record(ALICE, u(500)).unwrap();

        assert_eq!(ledger.contributors(), &[ALICE, BOB]);
        assert_eq!(ledger.contribution_of(ALICE), u(1_500));
        assert_eq!(ledger.total(), u(3_500));
    }

    #[test]
    fn test_total_matches_sum_for_sequences() {
        let sequence = [
            (ALICE, 5u64),
            (BOB, 7),
            (CAROL, 0),
            (BOB, 11),
            (ALICE, 13),
            (CAROL, 17),
        ];
        let mut ledger = ContributionLedger::new();
        for (who, amount) in sequence {
            ledger.record(who, u(amount)).unwrap();
            assert_eq!(ledger.total(), sum_of_balances(&ledger));
        }
        assert_eq!(ledger.contributors(), &[ALICE, BOB, CAROL]);
        assert_eq!(ledger.total(), u(53));
    }

    #[test]
    fn test_index_equals_distinct_prior_contributors() {
        let mut ledger = ContributionLedger::new();
        for who in [BOB, BOB, CAROL, BOB, ALICE, CAROL] {
            ledger.record(who, u(1)).unwrap();
        }
        assert_eq!(ledger.contributor_at(0), Some(BOB));
        assert_eq!(ledger.contributor_at(1), Some(CAROL));
        assert_eq!(ledger.contributor_at(2), Some(ALICE));
        assert_eq!(ledger.contributor_at(3), None);
    }

    #[test]
    fn test_unknown_contributor_is_zero() {
        let ledger = ContributionLedger::new();
        assert_eq!(ledger.contribution_of(ALICE), U256::ZERO);
    }

    #[test]
    fn test_overflow_fails_closed() {
        let mut ledger = ContributionLedger::new();
        ledger.record(ALICE, U256::MAX).unwrap();

        assert_eq!(
            ledger.record(ALICE, u(1)),
            Err(LedgerError::ContributionOverflow { contributor: ALICE })
        );
        assert_eq!(ledger.record(BOB, u(1)), Err(LedgerError::TotalOverflow));
        assert!(ledger.can_record(BOB, u(1)).is_err());

        // Nothing changed
        assert_eq!(ledger.contributors(), &[ALICE]);
        assert_eq!(ledger.contribution_of(ALICE), U256::MAX);
        assert_eq!(ledger.contribution_of(BOB), U256::ZERO);
        assert_eq!(ledger.total(), U256::MAX);
    }

    #[test]
    fn test_increase_keeps_position() {
        let mut ledger = ContributionLedger::new();
        ledger.record(ALICE, u(1)).unwrap();
        ledger.record(BOB, u(1)).unwrap();
        ledger.record(CAROL, u(1)).unwrap();
        ledger.record(ALICE, u(9)).unwrap();

        assert_eq!(ledger.contributor_at(0), Some(ALICE));
        assert_eq!(ledger.contributor_at(2), Some(CAROL));
        assert_eq!(ledger.len(), 3);
        assert_eq!(
            ledger.snapshot().contributors,
            vec![(ALICE, u(10)), (BOB, u(1)), (CAROL, u(1))]
        );
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut ledger = ContributionLedger::new();
        ledger.record(CAROL, u(3)).unwrap();
        ledger.record(ALICE, u(1)).unwrap();

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.contributors, vec![(CAROL, u(3)), (ALICE, u(1))]);
        assert_eq!(snapshot.total, u(4));
    }
}
