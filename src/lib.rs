//! # Hospital Admin (Back-office API)
//!
//! `hospital-admin` is the administrative surface of a hospital-management
//! application. It lets members of the `admin` group register doctors and
//! patients, approve or reject pending accounts, and manage admission histories,
//! their costs, and appointments.
//!
//! ## Data Model
//!
//! - **Users** carry identity, group membership (`admin`, `doctor`, `patient`) and an
//!   approval flag (`status`). Doctors and patients hang a 1-1 profile off their user.
//! - **Histories** are admissions owned by one patient and treated by one doctor.
//! - **Appointments** belong to a history; their doctor reference is cleared, not
//!   cascaded, when the doctor is removed.
//! - **Costs** are a 1-1 extension of a history and cannot exist without one.
//!
//! ## Authorization
//!
//! Every `/api/admin` route except login requires a token issued by
//! `POST /api/admin/login` to a member of the `admin` group. Only the SHA-256 hash
//! of a token is stored. Nested history routes additionally check that the history
//! belongs to the patient named in the URL and answer `404` otherwise.

pub mod api;
pub mod cli;
pub mod db;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
