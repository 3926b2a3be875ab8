//! Request/response types for doctor and patient accounts.
//!
//! Inputs are deliberately loose (`Option` everywhere) so validation can
//! report every missing or malformed field at once.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::handlers::{fields::Department, validation::nullable};

/// `user_data` part of a registration request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Profile fields. Doctors use `department`, patients use `age`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProfileInput {
    pub department: Option<String>,
    #[schema(value_type = Option<String>, example = "34.5")]
    pub age: Option<Value>,
    pub address: Option<String>,
    pub mobile: Option<String>,
}

/// Body of `POST .../doctor-registration` and `POST .../patient-registration`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegistrationRequest {
    pub user_data: Option<UserInput>,
    pub profile_data: Option<ProfileInput>,
}

/// Partial update sent inside the `doctors`/`patients` envelope.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<bool>)]
    pub status: Option<Option<bool>>,
    pub profile: Option<ProfileInput>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DoctorProfileResponse {
    pub id: i64,
    pub user: i64,
    pub department: Department,
    pub address: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientProfileResponse {
    pub id: i64,
    pub user: i64,
    #[schema(example = "34.5")]
    pub age: String,
    pub address: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ProfileResponse {
    Doctor(DoctorProfileResponse),
    Patient(PatientProfileResponse),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: bool,
}

/// Account as listed by the admin endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: bool,
    pub date_joined: String,
    /// `null` when the user has no profile row yet.
    pub profile: Option<ProfileResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub user_data: UserResponse,
    pub profile_data: ProfileResponse,
}
