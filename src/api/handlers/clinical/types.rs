//! Request/response types for histories, costs and appointments.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::handlers::{
    fields::{Department, DATE_FORMAT, TIME_FORMAT},
    validation::nullable,
};

/// Body of `patient_history` create/update requests.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct HistoryInput {
    pub symptoms: Option<String>,
    pub department: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, example = "2024-05-20")]
    pub release_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub assigned_doctor: Option<Option<Value>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub id: i64,
    #[schema(example = "2024-05-17")]
    pub admit_date: String,
    pub symptoms: String,
    pub department: Department,
    pub release_date: Option<String>,
    /// Patient profile id.
    pub patient: i64,
    /// Doctor profile id.
    pub assigned_doctor: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct HistoryRow {
    pub(crate) id: i64,
    pub(crate) admit_date: NaiveDate,
    pub(crate) symptoms: String,
    pub(crate) department: Department,
    pub(crate) release_date: Option<NaiveDate>,
    pub(crate) patient_id: i64,
    pub(crate) assigned_doctor_id: i64,
}

impl HistoryRow {
    pub(crate) fn into_response(self) -> HistoryResponse {
        HistoryResponse {
            id: self.id,
            admit_date: self.admit_date.format(DATE_FORMAT).to_string(),
            symptoms: self.symptoms,
            department: self.department,
            release_date: self
                .release_date
                .map(|date| date.format(DATE_FORMAT).to_string()),
            patient: self.patient_id,
            assigned_doctor: self.assigned_doctor_id,
        }
    }
}

/// Body of `patient_cost` requests. Charges are whole, non-negative amounts.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CostInput {
    #[schema(value_type = Option<i64>)]
    pub room_charge: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub medicine_cost: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub doctor_fee: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub other_charge: Option<Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CostResponse {
    pub id: i64,
    pub room_charge: i32,
    pub medicine_cost: i32,
    pub doctor_fee: i32,
    pub other_charge: i32,
    pub patient_history: i64,
    #[schema(example = "1500 tk")]
    pub total_cost: String,
}

/// Formats the sum of all charges, e.g. `"1500 tk"`.
#[must_use]
pub fn total_cost(charges: [i32; 4]) -> String {
    let total: i64 = charges.iter().copied().map(i64::from).sum();
    format!("{total} tk")
}

/// Body of `appointments` create/update requests.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AppointmentInput {
    #[schema(example = "2024-05-20")]
    pub appointment_date: Option<String>,
    #[schema(example = "10:30")]
    pub appointment_time: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<bool>)]
    pub status: Option<Option<bool>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub patient_history: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub doctor: Option<Option<Value>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: i64,
    #[schema(example = "2024-05-20")]
    pub appointment_date: String,
    #[schema(example = "10:30:00")]
    pub appointment_time: String,
    pub status: bool,
    pub patient_history: i64,
    /// Cleared when the doctor is deleted.
    pub doctor: Option<i64>,
    /// First and last name of the patient owning the history.
    pub patient_name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AppointmentRow {
    pub(crate) id: i64,
    pub(crate) appointment_date: NaiveDate,
    pub(crate) appointment_time: NaiveTime,
    pub(crate) status: bool,
    pub(crate) patient_history_id: i64,
    pub(crate) doctor_id: Option<i64>,
    pub(crate) patient_name: String,
}

impl AppointmentRow {
    pub(crate) fn into_response(self) -> AppointmentResponse {
        AppointmentResponse {
            id: self.id,
            appointment_date: self.appointment_date.format(DATE_FORMAT).to_string(),
            appointment_time: self.appointment_time.format(TIME_FORMAT).to_string(),
            status: self.status,
            patient_history: self.patient_history_id,
            doctor: self.doctor_id,
            patient_name: self.patient_name,
        }
    }
}
