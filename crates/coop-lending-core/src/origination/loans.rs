use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::members::MemberId;
use crate::amortization::simulation::LoanSimulationResult;
use crate::{types::*, LendingError, LendingResult};

pub type LoanId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Disbursed,
    Paid,
}

impl LoanStatus {
    /// Allowed lifecycle moves. Rejected and paid loans are closed.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Disbursed) | (Disbursed, Paid)
        )
    }
}

/// Chosen loan parameters plus the simulation that was shown when they were
/// chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoanRecord {
    pub member_id: MemberId,
    pub product_id: String,
    pub principal: Money,
    pub term_months: Months,
    pub annual_rate_percent: Percent,
    pub purpose: String,
    pub simulation: LoanSimulationResult,
    pub status: LoanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: LoanId,
    #[serde(flatten)]
    pub record: NewLoanRecord,
}

impl LoanRecord {
    pub fn status(&self) -> LoanStatus {
        self.record.status
    }
}

pub trait LoanRecordStore {
    fn insert(&mut self, record: NewLoanRecord) -> LendingResult<LoanRecord>;
    fn get(&self, id: LoanId) -> LendingResult<&LoanRecord>;
    fn list(&self) -> Vec<&LoanRecord>;
    fn list_for_member(&self, member_id: MemberId) -> Vec<&LoanRecord>;
    fn update_status(&mut self, id: LoanId, status: LoanStatus) -> LendingResult<LoanRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryLoanRecordStore {
    loans: BTreeMap<LoanId, LoanRecord>,
    next_id: LoanId,
}

impl InMemoryLoanRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: LoanId) -> LendingError {
    LendingError::RecordNotFound {
        kind: "loan".into(),
        id: id.to_string(),
    }
}

impl LoanRecordStore for InMemoryLoanRecordStore {
    fn insert(&mut self, record: NewLoanRecord) -> LendingResult<LoanRecord> {
        self.next_id += 1;
        let loan = LoanRecord {
            id: self.next_id,
            record,
        };
        tracing::debug!(id = loan.id, member = loan.record.member_id, "loan recorded");
        self.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    fn get(&self, id: LoanId) -> LendingResult<&LoanRecord> {
        self.loans.get(&id).ok_or_else(|| not_found(id))
    }

    fn list(&self) -> Vec<&LoanRecord> {
        self.loans.values().collect()
    }

    fn list_for_member(&self, member_id: MemberId) -> Vec<&LoanRecord> {
        self.loans
            .values()
            .filter(|l| l.record.member_id == member_id)
            .collect()
    }

    fn update_status(&mut self, id: LoanId, status: LoanStatus) -> LendingResult<LoanRecord> {
        let loan = self.loans.get_mut(&id).ok_or_else(|| not_found(id))?;
        if !loan.record.status.can_transition_to(status) {
            return Err(LendingError::invalid(
                "status",
                format!("cannot move loan from {:?} to {:?}", loan.record.status, status),
            ));
        }
        loan.record.status = status;
        Ok(loan.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(member_id: MemberId) -> NewLoanRecord {
        NewLoanRecord {
            member_id,
            product_id: "personal".into(),
            principal: dec!(10_000_000),
            term_months: 24,
            annual_rate_percent: dec!(12.5),
            purpose: "Home improvements".into(),
            simulation: LoanSimulationResult {
                monthly_payment: dec!(473_073.08),
                total_interest: dec!(1_353_753.92),
                total_repayment: dec!(11_353_753.92),
            },
            status: LoanStatus::Pending,
            disbursement_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_insert_and_list_for_member() {
        let mut store = InMemoryLoanRecordStore::new();
        store.insert(record(1)).unwrap();
        store.insert(record(2)).unwrap();
        store.insert(record(1)).unwrap();
        assert_eq!(store.list().len(), 3);
        assert_eq!(store.list_for_member(1).len(), 2);
        assert_eq!(store.get(2).unwrap().record.member_id, 2);
    }

    #[test]
    fn test_status_lifecycle() {
        let mut store = InMemoryLoanRecordStore::new();
        let loan = store.insert(record(1)).unwrap();
        store.update_status(loan.id, LoanStatus::Approved).unwrap();
        store.update_status(loan.id, LoanStatus::Disbursed).unwrap();
        assert!(store.update_status(loan.id, LoanStatus::Pending).is_err());
        let paid = store.update_status(loan.id, LoanStatus::Paid).unwrap();
        assert_eq!(paid.status(), LoanStatus::Paid);
    }

    #[test]
    fn test_rejected_is_closed() {
        assert!(LoanStatus::Pending.can_transition_to(LoanStatus::Rejected));
        assert!(!LoanStatus::Rejected.can_transition_to(LoanStatus::Approved));
    }

    #[test]
    fn test_missing_loan() {
        let store = InMemoryLoanRecordStore::new();
        assert!(matches!(
            store.get(7).unwrap_err(),
            LendingError::RecordNotFound { .. }
        ));
    }
}
