use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::loans::{LoanRecord, LoanRecordStore, LoanStatus, NewLoanRecord};
use super::members::{MemberDirectory, MemberId, MemberStatus};
use crate::amortization::simulation::LoanSimulationResult;
use crate::catalog::ProductCatalog;
use crate::error::ValidationErrors;
use crate::{types::*, LendingError, LendingResult};

const MIN_PURPOSE_CHARS: usize = 10;

/// A loan entered directly by an administrator on a member's behalf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminLoanOrder {
    pub member_id: Option<MemberId>,
    pub product_id: Option<String>,
    pub amount: Option<Money>,
    pub term_months: Option<Months>,
    #[serde(default)]
    pub purpose: String,
    pub disbursement_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AdminLoanOrder {
    /// Check every field and report all problems at once.
    pub fn validate(
        &self,
        catalog: &ProductCatalog,
        members: &impl MemberDirectory,
    ) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        match self.member_id {
            None => errors.add("member_id", "Select a member."),
            Some(id) => match members.get(id) {
                Ok(member) if member.status != MemberStatus::Active => {
                    errors.add("member_id", "Member is not active.")
                }
                Ok(_) => {}
                Err(e) => errors.add("member_id", e.to_string()),
            },
        }

        let product = match self.product_id.as_deref() {
            None => {
                errors.add("product_id", "Select a loan product.");
                None
            }
            Some(id) => match catalog.get(id) {
                Ok(p) => Some(p),
                Err(e) => {
                    errors.add("product_id", e.to_string());
                    None
                }
            },
        };

        match self.amount {
            Some(amount) if amount > Decimal::ZERO => {
                if let Some(p) = product {
                    if amount < p.min_amount || amount > p.max_amount {
                        errors.add(
                            "amount",
                            format!("Amount must be between {} and {}.", p.min_amount, p.max_amount),
                        );
                    }
                }
            }
            _ => errors.add("amount", "Amount is required."),
        }

        match self.term_months {
            Some(term) if term > 0 => {
                if let Some(p) = product {
                    if term < p.min_term_months || term > p.max_term_months {
                        errors.add(
                            "term_months",
                            format!(
                                "Term must be between {} and {} months.",
                                p.min_term_months, p.max_term_months
                            ),
                        );
                    }
                }
            }
            _ => errors.add("term_months", "Term is required."),
        }

        if self.purpose.trim().chars().count() < MIN_PURPOSE_CHARS {
            errors.add(
                "purpose",
                format!("Describe the purpose in at least {MIN_PURPOSE_CHARS} characters."),
            );
        }

        if self.disbursement_date.is_none() {
            errors.add("disbursement_date", "Select the disbursement date.");
        }

        errors
    }

    /// Simulation at the selected product's rate.
    pub fn simulation(&self, catalog: &ProductCatalog) -> LendingResult<LoanSimulationResult> {
        let product_id = self
            .product_id
            .as_deref()
            .ok_or_else(|| LendingError::invalid("product_id", "Select a loan product."))?;
        let amount = self
            .amount
            .ok_or_else(|| LendingError::invalid("amount", "Amount is required."))?;
        let term = self
            .term_months
            .ok_or_else(|| LendingError::invalid("term_months", "Term is required."))?;
        catalog.get(product_id)?.simulate(amount, term)
    }

    /// Validate and store the loan as approved.
    pub fn originate(
        &self,
        catalog: &ProductCatalog,
        members: &impl MemberDirectory,
        store: &mut impl LoanRecordStore,
    ) -> LendingResult<LoanRecord> {
        self.validate(catalog, members).into_result()?;
        let simulation = self.simulation(catalog)?;

        // validate() guarantees these are present
        let (Some(member_id), Some(product_id), Some(amount), Some(term)) = (
            self.member_id,
            self.product_id.as_deref(),
            self.amount,
            self.term_months,
        ) else {
            return Err(LendingError::invalid("order", "Incomplete loan order."));
        };
        let rate = catalog.get(product_id)?.annual_rate_percent;

        store.insert(NewLoanRecord {
            member_id,
            product_id: product_id.to_string(),
            principal: amount,
            term_months: term,
            annual_rate_percent: rate,
            purpose: self.purpose.trim().to_string(),
            simulation,
            status: LoanStatus::Approved,
            disbursement_date: self.disbursement_date,
            notes: self.notes.clone().filter(|n| !n.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origination::loans::InMemoryLoanRecordStore;
    use crate::origination::members::{InMemoryMemberDirectory, NewMember};
    use rust_decimal_macros::dec;

    fn directory() -> (InMemoryMemberDirectory, MemberId) {
        let mut dir = InMemoryMemberDirectory::new();
        let member = dir
            .create(NewMember {
                national_id: "1020304050".into(),
                first_name: "Ana".into(),
                last_name: "Gómez".into(),
                email: "ana@coop.test".into(),
                phone: "3104445566".into(),
                address: "Carrera 7 # 12-30".into(),
                birth_date: NaiveDate::from_ymd_opt(1985, 6, 15).unwrap(),
                occupation: None,
            })
            .unwrap();
        (dir, member.id)
    }

    fn order(member_id: MemberId) -> AdminLoanOrder {
        AdminLoanOrder {
            member_id: Some(member_id),
            product_id: Some("vehicle".into()),
            amount: Some(dec!(20_000_000)),
            term_months: Some(48),
            purpose: "Purchase of a delivery van".into(),
            disbursement_date: NaiveDate::from_ymd_opt(2026, 11, 1),
            notes: Some("  ".into()),
        }
    }

    #[test]
    fn test_empty_order_reports_every_field() {
        let (dir, _) = directory();
        let errors = AdminLoanOrder::default().validate(&ProductCatalog::default(), &dir);
        for field in [
            "member_id",
            "product_id",
            "amount",
            "term_months",
            "purpose",
            "disbursement_date",
        ] {
            assert!(errors.contains(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_unknown_member_and_bounds() {
        let (dir, _) = directory();
        let mut o = order(99);
        o.amount = Some(dec!(1_000));
        o.term_months = Some(100);
        let errors = o.validate(&ProductCatalog::default(), &dir);
        assert!(errors.contains("member_id"));
        assert!(errors.contains("amount"));
        assert!(errors.contains("term_months"));
        assert!(!errors.contains("purpose"));
    }

    #[test]
    fn test_inactive_member_rejected() {
        let (mut dir, id) = directory();
        dir.set_status(id, MemberStatus::Suspended).unwrap();
        let errors = order(id).validate(&ProductCatalog::default(), &dir);
        assert_eq!(errors.get("member_id"), Some("Member is not active."));
    }

    #[test]
    fn test_originate_stores_approved_loan() {
        let (dir, id) = directory();
        let catalog = ProductCatalog::default();
        let mut store = InMemoryLoanRecordStore::new();
        let loan = order(id).originate(&catalog, &dir, &mut store).unwrap();

        assert_eq!(loan.status(), LoanStatus::Approved);
        assert_eq!(loan.record.annual_rate_percent, dec!(11.2));
        assert_eq!(loan.record.notes, None);
        let expected = catalog
            .get("vehicle")
            .unwrap()
            .simulate(dec!(20_000_000), 48)
            .unwrap();
        assert_eq!(loan.record.simulation, expected);
    }

    #[test]
    fn test_originate_rejects_invalid_order() {
        let (dir, id) = directory();
        let mut store = InMemoryLoanRecordStore::new();
        let mut o = order(id);
        o.disbursement_date = None;
        let err = o
            .originate(&ProductCatalog::default(), &dir, &mut store)
            .unwrap_err();
        assert!(matches!(err, LendingError::Validation(_)));
        assert!(store.list().is_empty());
    }
}
