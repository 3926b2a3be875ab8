//! Doctor and patient account administration.
//!
//! Flow Overview:
//! 1) Registration validates `user_data` and `profile_data` independently and
//!    reports both error maps together; on success the user, its group link
//!    and its profile are written in one transaction.
//! 2) Listing splits accounts by the `status` approval flag (approved vs
//!    pending). Detail routes are scoped to the kind's group only.
//! 3) Updates are partial: top-level user fields plus a nested `profile`.
//!
//! Doctors and patients share everything except the profile columns, so the
//! handlers are generic over [`AccountKind`].

pub mod doctors;
pub mod patients;
pub(crate) mod storage;
pub mod types;
pub(crate) mod validate;

mod handlers;

pub(crate) const USERNAME_MAX: usize = 150;
pub(crate) const NAME_MAX: usize = 150;
pub(crate) const EMAIL_MAX: usize = 254;
pub(crate) const MOBILE_MAX: usize = 20;

/// Which profile table and group an account endpoint works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Doctor,
    Patient,
}

impl AccountKind {
    /// Group every account of this kind belongs to.
    #[must_use]
    pub const fn group(self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
        }
    }

    /// Request/response envelope key.
    #[must_use]
    pub const fn envelope(self) -> &'static str {
        match self {
            Self::Doctor => "doctors",
            Self::Patient => "patients",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Doctor => "Doctor",
            Self::Patient => "Patient",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_groups_and_envelopes() {
        assert_eq!(AccountKind::Doctor.group(), "doctor");
        assert_eq!(AccountKind::Doctor.envelope(), "doctors");
        assert_eq!(AccountKind::Patient.group(), "patient");
        assert_eq!(AccountKind::Patient.envelope(), "patients");
    }
}
