//! Member (cooperative partner) records.
//!
//! The directory is an external collaborator. [`MemberDirectory`] is the
//! seam, and [`InMemoryMemberDirectory`] backs tests and the CLI.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationErrors;
use crate::{LendingError, LendingResult};

pub type MemberId = u64;

const MIN_NATIONAL_ID_LEN: usize = 6;
const MIN_PHONE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub birth_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub birth_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    pub status: MemberStatus,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn matches(&self, needle: &str) -> bool {
        [
            &self.national_id,
            &self.first_name,
            &self.last_name,
            &self.email,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub status: Option<MemberStatus>,
}

pub trait MemberDirectory {
    fn create(&mut self, member: NewMember) -> LendingResult<Member>;
    fn get(&self, id: MemberId) -> LendingResult<&Member>;
    fn update(&mut self, id: MemberId, update: MemberUpdate) -> LendingResult<Member>;
    fn set_status(&mut self, id: MemberId, status: MemberStatus) -> LendingResult<Member> {
        self.update(
            id,
            MemberUpdate {
                status: Some(status),
                ..MemberUpdate::default()
            },
        )
    }
    fn remove(&mut self, id: MemberId) -> LendingResult<Member>;
    /// Case-insensitive substring search over national id, names and email.
    fn search(&self, query: &str) -> Vec<&Member>;
    fn list(&self) -> Vec<&Member>;
}

/// Field checks applied before a member is registered.
pub fn validate_new_member(member: &NewMember) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let national_id = member.national_id.trim();
    if national_id.is_empty() {
        errors.add("national_id", "National ID is required.");
    } else if national_id.len() < MIN_NATIONAL_ID_LEN {
        errors.add("national_id", "National ID is too short.");
    }
    check_required(&mut errors, "first_name", &member.first_name, "First name");
    check_required(&mut errors, "last_name", &member.last_name, "Last name");
    check_email(&mut errors, &member.email);
    check_phone(&mut errors, &member.phone);
    check_required(&mut errors, "address", &member.address, "Address");
    errors
}

/// Same field rules as registration, applied only to the fields being
/// changed.
pub fn validate_member_update(update: &MemberUpdate) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if let Some(ref v) = update.first_name {
        check_required(&mut errors, "first_name", v, "First name");
    }
    if let Some(ref v) = update.last_name {
        check_required(&mut errors, "last_name", v, "Last name");
    }
    if let Some(ref v) = update.email {
        check_email(&mut errors, v);
    }
    if let Some(ref v) = update.phone {
        check_phone(&mut errors, v);
    }
    if let Some(ref v) = update.address {
        check_required(&mut errors, "address", v, "Address");
    }
    errors
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required."));
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email is required.");
    } else if !is_plausible_email(email) {
        errors.add("email", "Email is not valid.");
    }
}

fn check_phone(errors: &mut ValidationErrors, phone: &str) {
    let phone = phone.trim();
    if phone.is_empty() {
        errors.add("phone", "Phone is required.");
    } else if phone.len() < MIN_PHONE_LEN {
        errors.add("phone", "Phone is too short.");
    }
}

/// `local@domain.tld` with no whitespace.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMemberDirectory {
    members: BTreeMap<MemberId, Member>,
    next_id: MemberId,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_unique(
        &self,
        field: &str,
        value: &str,
        exclude: Option<MemberId>,
        project: impl Fn(&Member) -> &str,
    ) -> LendingResult<()> {
        let taken = self
            .members
            .values()
            .filter(|m| Some(m.id) != exclude)
            .any(|m| project(m).eq_ignore_ascii_case(value.trim()));
        if taken {
            return Err(LendingError::Duplicate {
                field: field.into(),
                value: value.trim().to_string(),
            });
        }
        Ok(())
    }

    fn get_mut(&mut self, id: MemberId) -> LendingResult<&mut Member> {
        self.members.get_mut(&id).ok_or_else(|| not_found(id))
    }
}

fn not_found(id: MemberId) -> LendingError {
    LendingError::RecordNotFound {
        kind: "member".into(),
        id: id.to_string(),
    }
}

impl MemberDirectory for InMemoryMemberDirectory {
    fn create(&mut self, member: NewMember) -> LendingResult<Member> {
        validate_new_member(&member).into_result()?;
        self.ensure_unique("national_id", &member.national_id, None, |m| m.national_id.as_str())?;
        self.ensure_unique("email", &member.email, None, |m| m.email.as_str())?;

        self.next_id += 1;
        let created = Member {
            id: self.next_id,
            national_id: member.national_id.trim().to_string(),
            first_name: member.first_name.trim().to_string(),
            last_name: member.last_name.trim().to_string(),
            email: member.email.trim().to_string(),
            phone: member.phone.trim().to_string(),
            address: member.address.trim().to_string(),
            birth_date: member.birth_date,
            occupation: member.occupation.filter(|o| !o.trim().is_empty()),
            status: MemberStatus::Active,
        };
        tracing::debug!(id = created.id, "member registered");
        self.members.insert(created.id, created.clone());
        Ok(created)
    }

    fn get(&self, id: MemberId) -> LendingResult<&Member> {
        self.members.get(&id).ok_or_else(|| not_found(id))
    }

    fn update(&mut self, id: MemberId, update: MemberUpdate) -> LendingResult<Member> {
        validate_member_update(&update).into_result()?;
        if let Some(ref email) = update.email {
            self.ensure_unique("email", email, Some(id), |m| m.email.as_str())?;
        }

        let trimmed = |v: String| v.trim().to_string();
        let member = self.get_mut(id)?;
        if let Some(v) = update.first_name {
            member.first_name = trimmed(v);
        }
        if let Some(v) = update.last_name {
            member.last_name = trimmed(v);
        }
        if let Some(v) = update.email {
            member.email = trimmed(v);
        }
        if let Some(v) = update.phone {
            member.phone = trimmed(v);
        }
        if let Some(v) = update.address {
            member.address = trimmed(v);
        }
        if let Some(v) = update.occupation {
            member.occupation = Some(trimmed(v)).filter(|o| !o.is_empty());
        }
        if let Some(v) = update.status {
            member.status = v;
        }
        Ok(member.clone())
    }

    fn remove(&mut self, id: MemberId) -> LendingResult<Member> {
        self.members.remove(&id).ok_or_else(|| not_found(id))
    }

    fn search(&self, query: &str) -> Vec<&Member> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.list();
        }
        self.members.values().filter(|m| m.matches(&needle)).collect()
    }

    fn list(&self) -> Vec<&Member> {
        self.members.values().collect()
    }
}
