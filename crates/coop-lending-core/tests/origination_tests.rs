use chrono::NaiveDate;
use coop_lending_core::catalog::ProductCatalog;
use coop_lending_core::origination::admin::AdminLoanOrder;
use coop_lending_core::origination::application::{ApplicationStep, LoanApplication};
use coop_lending_core::origination::loans::{InMemoryLoanRecordStore, LoanRecordStore, LoanStatus};
use coop_lending_core::origination::members::{
    InMemoryMemberDirectory, MemberDirectory, MemberStatus, NewMember,
};
use coop_lending_core::LendingError;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const CATALOG_YAML: &str = r#"
products:
  - id: micro
    name: Microcredit
    annual_rate_percent: 18
    min_term_months: 3
    max_term_months: 18
    min_amount: 200000
    max_amount: 3000000
    required_documents:
      - id: official-id
        name: Official identification
      - id: business-plan
        name: Business plan
        mandatory: false
"#;

fn register(dir: &mut InMemoryMemberDirectory, national_id: &str, email: &str) -> u64 {
    dir.create(NewMember {
        national_id: national_id.into(),
        first_name: "Carlos".into(),
        last_name: "Ramírez".into(),
        email: email.into(),
        phone: "3015550000".into(),
        address: "Avenida 68 # 10-20".into(),
        birth_date: NaiveDate::from_ymd_opt(1978, 3, 9).unwrap(),
        occupation: Some("Baker".into()),
    })
    .unwrap()
    .id
}

#[test]
fn test_member_request_and_admin_order_price_identically() {
    let catalog = ProductCatalog::default();
    let mut dir = InMemoryMemberDirectory::new();
    let mut store = InMemoryLoanRecordStore::new();
    let member_id = register(&mut dir, "79000111", "carlos@coop.test");

    let mut app = LoanApplication::new(member_id);
    app.select_product("personal");
    app.amount = Some(dec!(12_000_000));
    app.term_months = Some(36);
    app.purpose = "Working capital for the bakery".into();
    app.monthly_income = Some(dec!(4_000_000));
    app.monthly_expenses = Some(dec!(1_500_000));
    for doc in ["official-id", "proof-of-address", "proof-of-income"] {
        app.attach_document(doc);
    }
    app.accepts_terms = true;
    let requested = app.submit(&catalog, &mut store).unwrap();

    let order = AdminLoanOrder {
        member_id: Some(member_id),
        product_id: Some("personal".into()),
        amount: Some(dec!(12_000_000)),
        term_months: Some(36),
        purpose: "Working capital for the bakery".into(),
        disbursement_date: NaiveDate::from_ymd_opt(2026, 12, 1),
        notes: None,
    };
    let originated = order.originate(&catalog, &dir, &mut store).unwrap();

    assert_eq!(requested.record.simulation, originated.record.simulation);
    assert_eq!(requested.status(), LoanStatus::Pending);
    assert_eq!(originated.status(), LoanStatus::Approved);
    assert_eq!(store.list_for_member(member_id).len(), 2);
}

#[test]
fn test_wizard_against_configured_catalog() {
    let catalog = ProductCatalog::from_yaml_str(CATALOG_YAML).unwrap();
    let mut app = LoanApplication::new(1);
    app.select_product("micro");
    app.advance(&catalog).unwrap();

    app.amount = Some(dec!(2_000_000));
    app.term_months = Some(12);
    app.purpose = "Sewing machine for home workshop".into();
    assert_eq!(app.advance(&catalog).unwrap(), ApplicationStep::Capacity);

    app.monthly_income = Some(dec!(1_500_000));
    app.monthly_expenses = Some(dec!(900_000));
    app.advance(&catalog).unwrap();

    // only the mandatory document is needed
    assert!(app.advance(&catalog).is_err());
    app.attach_document("official-id");
    assert_eq!(app.advance(&catalog).unwrap(), ApplicationStep::Confirmation);

    let assessment = app.affordability(&catalog).unwrap();
    assert_eq!(assessment.disposable_income, dec!(600_000));
    assert!(assessment.within_guideline);
}

#[test]
fn test_unknown_product_in_application() {
    let catalog = ProductCatalog::default();
    let mut app = LoanApplication::new(1);
    app.select_product("yacht");
    let errors = app.validate_step(ApplicationStep::ProductSelection, &catalog);
    assert!(errors.contains("product_id"));
    assert!(matches!(
        app.simulation(&catalog).unwrap_err(),
        LendingError::ProductNotFound(_)
    ));
}

#[test]
fn test_member_lifecycle_blocks_origination() {
    let catalog = ProductCatalog::default();
    let mut dir = InMemoryMemberDirectory::new();
    let mut store = InMemoryLoanRecordStore::new();
    let member_id = register(&mut dir, "52000999", "luisa@coop.test");
    dir.set_status(member_id, MemberStatus::Inactive).unwrap();

    let order = AdminLoanOrder {
        member_id: Some(member_id),
        product_id: Some("vehicle".into()),
        amount: Some(dec!(30_000_000)),
        term_months: Some(60),
        purpose: "Family car replacement".into(),
        disbursement_date: NaiveDate::from_ymd_opt(2026, 11, 15),
        notes: None,
    };
    match order.originate(&catalog, &dir, &mut store).unwrap_err() {
        LendingError::Validation(errors) => {
            assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["member_id"]);
        }
        e => panic!("Expected Validation, got {e:?}"),
    }
}

#[test]
fn test_directory_uniqueness_across_updates() {
    let mut dir = InMemoryMemberDirectory::new();
    register(&mut dir, "10000001", "uno@coop.test");
    let second = register(&mut dir, "10000002", "dos@coop.test");

    let err = dir
        .create(NewMember {
            national_id: "10000001".into(),
            first_name: "Otro".into(),
            last_name: "Socio".into(),
            email: "otro@coop.test".into(),
            phone: "3000000000".into(),
            address: "Calle 1".into(),
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            occupation: None,
        })
        .unwrap_err();
    assert!(matches!(err, LendingError::Duplicate { ref field, .. } if field == "national_id"));

    assert_eq!(dir.search("coop.test").len(), 2);
    assert_eq!(dir.get(second).unwrap().email, "dos@coop.test");
}
