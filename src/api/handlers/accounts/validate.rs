//! Field validation for account registration and updates.

use super::{
    types::{AccountUpdate, ProfileInput, UserInput},
    AccountKind, EMAIL_MAX, MOBILE_MAX, NAME_MAX, USERNAME_MAX,
};
use crate::api::handlers::{
    auth::utils::PASSWORD_MIN_LEN,
    fields::{Age, Department},
    validation::{
        blankable_text, optional_text, required_text, valid_email, valid_username, FieldErrors,
        MSG_BLANK, MSG_NULL, MSG_REQUIRED,
    },
};

const MSG_INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";
const MSG_DOCTOR_ONLY: &str = "Only doctor profiles have this field.";
const MSG_PATIENT_ONLY: &str = "Only patient profiles have this field.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NewProfile {
    Doctor {
        department: Department,
        address: String,
        mobile: String,
    },
    Patient {
        age: Age,
        address: String,
        mobile: String,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ProfileChanges {
    pub(crate) department: Option<Department>,
    pub(crate) age: Option<Age>,
    pub(crate) address: Option<String>,
    pub(crate) mobile: Option<String>,
}

impl ProfileChanges {
    pub(crate) fn is_empty(&self) -> bool {
        self.department.is_none()
            && self.age.is_none()
            && self.address.is_none()
            && self.mobile.is_none()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct AccountChanges {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) status: Option<bool>,
    pub(crate) profile: ProfileChanges,
}

pub(crate) fn validate_user(input: UserInput) -> Result<NewUser, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = required_text(&mut errors, "username", input.username, Some(USERNAME_MAX))
        .and_then(|username| checked_username(&mut errors, username));
    let email = required_text(&mut errors, "email", input.email, Some(EMAIL_MAX))
        .and_then(|email| checked_email(&mut errors, email));
    let password = match input.password {
        None => {
            errors.add("password", MSG_REQUIRED);
            None
        }
        Some(password) => checked_password(&mut errors, password),
    };
    let first_name = blankable_text(&mut errors, "first_name", input.first_name, NAME_MAX);
    let last_name = blankable_text(&mut errors, "last_name", input.last_name, NAME_MAX);

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) => errors.finish(NewUser {
            username,
            email,
            password,
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
        }),
        _ => Err(errors),
    }
}

pub(crate) fn validate_profile(
    kind: AccountKind,
    input: ProfileInput,
) -> Result<NewProfile, FieldErrors> {
    let mut errors = FieldErrors::new();
    reject_foreign_fields(kind, &input, &mut errors);

    let address = required_text(&mut errors, "address", input.address, None);
    let mobile = required_text(&mut errors, "mobile", input.mobile, Some(MOBILE_MAX));

    match kind {
        AccountKind::Doctor => {
            let department = match input.department {
                None => Some(Department::default()),
                Some(raw) => checked_department(&mut errors, &raw),
            };
            match (department, address, mobile) {
                (Some(department), Some(address), Some(mobile)) => {
                    errors.finish(NewProfile::Doctor {
                        department,
                        address,
                        mobile,
                    })
                }
                _ => Err(errors),
            }
        }
        AccountKind::Patient => {
            let age = match input.age {
                None => {
                    errors.add("age", MSG_REQUIRED);
                    None
                }
                Some(raw) => checked_age(&mut errors, &raw),
            };
            match (age, address, mobile) {
                (Some(age), Some(address), Some(mobile)) => errors.finish(NewProfile::Patient {
                    age,
                    address,
                    mobile,
                }),
                _ => Err(errors),
            }
        }
    }
}

pub(crate) fn validate_update(
    kind: AccountKind,
    update: AccountUpdate,
) -> Result<AccountChanges, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = optional_text(&mut errors, "username", update.username, Some(USERNAME_MAX))
        .and_then(|username| checked_username(&mut errors, username));
    let email = optional_text(&mut errors, "email", update.email, Some(EMAIL_MAX))
        .and_then(|email| checked_email(&mut errors, email));
    let first_name = blankable_text(&mut errors, "first_name", update.first_name, NAME_MAX);
    let last_name = blankable_text(&mut errors, "last_name", update.last_name, NAME_MAX);
    let status = match update.status {
        Some(None) => {
            errors.add("status", MSG_NULL);
            None
        }
        Some(Some(status)) => Some(status),
        None => None,
    };

    let profile = match update.profile {
        Some(input) => {
            let mut nested = FieldErrors::new();
            let changes = profile_changes(kind, input, &mut nested);
            errors.nest("profile", nested);
            changes
        }
        None => ProfileChanges::default(),
    };

    errors.finish(AccountChanges {
        username,
        email,
        first_name,
        last_name,
        status,
        profile,
    })
}

fn profile_changes(
    kind: AccountKind,
    input: ProfileInput,
    errors: &mut FieldErrors,
) -> ProfileChanges {
    reject_foreign_fields(kind, &input, errors);
    let address = optional_text(errors, "address", input.address, None);
    let mobile = optional_text(errors, "mobile", input.mobile, Some(MOBILE_MAX));
    let (department, age) = match kind {
        AccountKind::Doctor => (
            input
                .department
                .and_then(|raw| checked_department(errors, &raw)),
            None,
        ),
        AccountKind::Patient => (None, input.age.and_then(|raw| checked_age(errors, &raw))),
    };
    ProfileChanges {
        department,
        age,
        address,
        mobile,
    }
}

fn reject_foreign_fields(kind: AccountKind, input: &ProfileInput, errors: &mut FieldErrors) {
    match kind {
        AccountKind::Doctor if input.age.is_some() => errors.add("age", MSG_PATIENT_ONLY),
        AccountKind::Patient if input.department.is_some() => {
            errors.add("department", MSG_DOCTOR_ONLY);
        }
        _ => {}
    }
}

fn checked_username(errors: &mut FieldErrors, username: String) -> Option<String> {
    if valid_username(&username) {
        Some(username)
    } else {
        errors.add("username", MSG_INVALID_USERNAME);
        None
    }
}

fn checked_email(errors: &mut FieldErrors, email: String) -> Option<String> {
    if valid_email(&email) {
        Some(email)
    } else {
        errors.add("email", MSG_INVALID_EMAIL);
        None
    }
}

fn checked_password(errors: &mut FieldErrors, password: String) -> Option<String> {
    if password.trim().is_empty() {
        errors.add("password", MSG_BLANK);
        return None;
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!(
                "This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."
            ),
        );
        return None;
    }
    Some(password)
}

fn checked_department(errors: &mut FieldErrors, raw: &str) -> Option<Department> {
    match Department::parse(raw) {
        Ok(department) => Some(department),
        Err(message) => {
            errors.add("department", message);
            None
        }
    }
}

fn checked_age(errors: &mut FieldErrors, raw: &serde_json::Value) -> Option<Age> {
    if raw.is_null() {
        errors.add("age", MSG_NULL);
        return None;
    }
    match Age::from_json(raw) {
        Ok(age) => Some(age),
        Err(message) => {
            errors.add("age", message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_input() -> UserInput {
        UserInput {
            username: Some("dr.strange".to_string()),
            email: Some("strange@example.com".to_string()),
            password: Some("sanctum-sanctorum".to_string()),
            first_name: Some("Stephen".to_string()),
            last_name: None,
        }
    }

    #[test]
    fn valid_user_defaults_missing_names() {
        let user = validate_user(user_input()).ok();
        assert_eq!(user.as_ref().map(|u| u.last_name.as_str()), Some(""));
        assert_eq!(user.map(|u| u.first_name), Some("Stephen".to_string()));
    }

    #[test]
    fn user_errors_are_collected() {
        let input = UserInput {
            username: Some("dr strange".to_string()),
            email: Some("nope".to_string()),
            password: Some("short".to_string()),
            ..UserInput::default()
        };
        let errors = validate_user(input).err().unwrap_or_default();
        assert_eq!(errors.messages("username"), [MSG_INVALID_USERNAME.to_string()]);
        assert_eq!(errors.messages("email"), [MSG_INVALID_EMAIL.to_string()]);
        assert!(errors.contains("password"));
    }

    #[test]
    fn missing_user_fields_are_required() {
        let errors = validate_user(UserInput::default()).err().unwrap_or_default();
        for field in ["username", "email", "password"] {
            assert_eq!(errors.messages(field), [MSG_REQUIRED.to_string()]);
        }
        assert!(!errors.contains("first_name"));
    }

    #[test]
    fn doctor_profile_defaults_department() {
        let input = ProfileInput {
            address: Some("221B Baker Street".to_string()),
            mobile: Some("+8801700000000".to_string()),
            ..ProfileInput::default()
        };
        let profile = validate_profile(AccountKind::Doctor, input).ok();
        assert!(matches!(
            profile,
            Some(NewProfile::Doctor {
                department: Department::Cardiologist,
                ..
            })
        ));
    }

    #[test]
    fn patient_profile_requires_age() {
        let input = ProfileInput {
            address: Some("Dhaka".to_string()),
            mobile: Some("1".repeat(21)),
            ..ProfileInput::default()
        };
        let errors = validate_profile(AccountKind::Patient, input)
            .err()
            .unwrap_or_default();
        assert_eq!(errors.messages("age"), [MSG_REQUIRED.to_string()]);
        assert!(errors.contains("mobile"));
    }

    #[test]
    fn patient_profile_parses_age() {
        let input = ProfileInput {
            age: Some(json!("34.5")),
            address: Some("Dhaka".to_string()),
            mobile: Some("01700000000".to_string()),
            ..ProfileInput::default()
        };
        let profile = validate_profile(AccountKind::Patient, input).ok();
        assert!(matches!(profile, Some(NewProfile::Patient { age, .. }) if age.tenths() == 345));
    }

    #[test]
    fn update_nests_profile_errors() {
        let update = AccountUpdate {
            status: Some(Some(true)),
            profile: Some(ProfileInput {
                department: Some("XX".to_string()),
                mobile: Some("  ".to_string()),
                ..ProfileInput::default()
            }),
            ..AccountUpdate::default()
        };
        let errors = validate_update(AccountKind::Doctor, update)
            .err()
            .unwrap_or_default();
        assert!(errors.contains("profile.department"));
        assert_eq!(errors.messages("profile.mobile"), [MSG_BLANK.to_string()]);
    }

    #[test]
    fn profile_fields_of_the_other_kind_are_rejected() {
        let doctor = AccountUpdate {
            profile: Some(ProfileInput {
                age: Some(json!("12")),
                ..ProfileInput::default()
            }),
            ..AccountUpdate::default()
        };
        let errors = validate_update(AccountKind::Doctor, doctor)
            .err()
            .unwrap_or_default();
        assert_eq!(errors.messages("profile.age"), [MSG_PATIENT_ONLY.to_string()]);

        let patient = ProfileInput {
            department: Some("DL".to_string()),
            age: Some(json!(40)),
            address: Some("Dhaka".to_string()),
            mobile: Some("01700000000".to_string()),
        };
        let errors = validate_profile(AccountKind::Patient, patient)
            .err()
            .unwrap_or_default();
        assert_eq!(errors.messages("department"), [MSG_DOCTOR_ONLY.to_string()]);
    }

    #[test]
    fn update_rejects_null_status() {
        let update = AccountUpdate {
            status: Some(None),
            ..AccountUpdate::default()
        };
        let errors = validate_update(AccountKind::Patient, update)
            .err()
            .unwrap_or_default();
        assert_eq!(errors.messages("status"), [MSG_NULL.to_string()]);
    }

    #[test]
    fn approval_update_only_touches_status() {
        let update = AccountUpdate {
            status: Some(Some(true)),
            ..AccountUpdate::default()
        };
        let changes = validate_update(AccountKind::Doctor, update).ok();
        assert_eq!(changes.as_ref().map(|c| c.status), Some(Some(true)));
        assert!(changes.is_some_and(|c| c.profile.is_empty() && c.username.is_none()));
    }
}
