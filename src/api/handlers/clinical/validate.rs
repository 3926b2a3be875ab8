//! Field validation for histories, costs and appointments.
//!
//! Reference checks (does doctor `N` exist?) need the database and live in the
//! handlers; everything here is pure.

use chrono::NaiveDate;
use serde_json::Value;

use super::{
    storage::{AppointmentChanges, ChargeChanges, HistoryChanges, NewAppointment, NewHistory},
    types::{AppointmentInput, CostInput, HistoryInput},
};
use crate::api::handlers::{
    fields::{charge_from_json, parse_date, parse_time, pk_from_json, Department},
    validation::{optional_text, required_text, FieldErrors, MSG_NULL, MSG_REQUIRED},
};

pub(crate) const MSG_RELEASE_BEFORE_ADMIT: &str =
    "Release date cannot be earlier than the admit date.";

pub(crate) const CHARGE_FIELDS: [&str; 4] =
    ["room_charge", "medicine_cost", "doctor_fee", "other_charge"];

/// Validate a new history admitted on `admit_date`.
pub(crate) fn new_history(
    input: HistoryInput,
    admit_date: NaiveDate,
) -> Result<NewHistory, FieldErrors> {
    let mut errors = FieldErrors::new();

    let symptoms = required_text(&mut errors, "symptoms", input.symptoms, None);
    let department = match input.department {
        None => Some(Department::default()),
        Some(raw) => department_field(&mut errors, &raw),
    };
    let release_date = input
        .release_date
        .map(|raw| nullable_date(&mut errors, "release_date", raw))
        .unwrap_or(Some(None));
    let release_date = release_date.and_then(|date| check_release(&mut errors, date, admit_date));
    let assigned_doctor_id = match input.assigned_doctor {
        None => {
            errors.add("assigned_doctor", MSG_REQUIRED);
            None
        }
        Some(raw) => required_pk(&mut errors, "assigned_doctor", raw),
    };

    match (symptoms, department, release_date, assigned_doctor_id) {
        (Some(symptoms), Some(department), Some(release_date), Some(assigned_doctor_id)) => errors
            .finish(NewHistory {
                admit_date,
                symptoms,
                department,
                release_date,
                assigned_doctor_id,
            }),
        _ => Err(errors),
    }
}

/// Validate a partial history update against the stored `admit_date`.
pub(crate) fn history_changes(
    input: HistoryInput,
    admit_date: NaiveDate,
) -> Result<HistoryChanges, FieldErrors> {
    let mut errors = FieldErrors::new();

    let symptoms = optional_text(&mut errors, "symptoms", input.symptoms, None);
    let department = input.department.and_then(|raw| department_field(&mut errors, &raw));
    let release_date = input.release_date.and_then(|raw| {
        nullable_date(&mut errors, "release_date", raw)
            .and_then(|date| check_release(&mut errors, date, admit_date))
    });
    let assigned_doctor_id = input
        .assigned_doctor
        .and_then(|raw| required_pk(&mut errors, "assigned_doctor", raw));

    errors.finish(HistoryChanges {
        symptoms,
        department,
        release_date,
        assigned_doctor_id,
    })
}

/// Validate charges. All four are required when `creating`.
pub(crate) fn charge_changes(input: CostInput, creating: bool) -> Result<ChargeChanges, FieldErrors> {
    let mut errors = FieldErrors::new();
    let values = [
        input.room_charge,
        input.medicine_cost,
        input.doctor_fee,
        input.other_charge,
    ];
    let mut parsed = [None; 4];

    for ((field, value), slot) in CHARGE_FIELDS.iter().zip(values).zip(parsed.iter_mut()) {
        match value {
            None if creating => errors.add(field, MSG_REQUIRED),
            None => {}
            Some(Value::Null) => errors.add(field, MSG_NULL),
            Some(value) => match charge_from_json(&value) {
                Ok(charge) => *slot = Some(charge),
                Err(message) => errors.add(field, message),
            },
        }
    }

    let [room_charge, medicine_cost, doctor_fee, other_charge] = parsed;
    errors.finish(ChargeChanges {
        room_charge,
        medicine_cost,
        doctor_fee,
        other_charge,
    })
}

pub(crate) fn new_appointment(input: AppointmentInput) -> Result<NewAppointment, FieldErrors> {
    let mut errors = FieldErrors::new();

    let appointment_date = match input.appointment_date {
        None => {
            errors.add("appointment_date", MSG_REQUIRED);
            None
        }
        Some(raw) => date(&mut errors, "appointment_date", &raw),
    };
    let appointment_time = match input.appointment_time {
        None => {
            errors.add("appointment_time", MSG_REQUIRED);
            None
        }
        Some(raw) => time(&mut errors, "appointment_time", &raw),
    };
    let status = match input.status {
        None => Some(false),
        Some(raw) => status_field(&mut errors, raw),
    };
    let patient_history_id = match input.patient_history {
        None => {
            errors.add("patient_history", MSG_REQUIRED);
            None
        }
        Some(raw) => required_pk(&mut errors, "patient_history", raw),
    };
    let doctor_id = match input.doctor {
        None => Some(None),
        Some(raw) => nullable_pk(&mut errors, "doctor", raw),
    };

    match (
        appointment_date,
        appointment_time,
        status,
        patient_history_id,
        doctor_id,
    ) {
        (
            Some(appointment_date),
            Some(appointment_time),
            Some(status),
            Some(patient_history_id),
            Some(doctor_id),
        ) => errors.finish(NewAppointment {
            appointment_date,
            appointment_time,
            status,
            patient_history_id,
            doctor_id,
        }),
        _ => Err(errors),
    }
}

pub(crate) fn appointment_changes(
    input: AppointmentInput,
) -> Result<AppointmentChanges, FieldErrors> {
    let mut errors = FieldErrors::new();

    let appointment_date = input
        .appointment_date
        .and_then(|raw| date(&mut errors, "appointment_date", &raw));
    let appointment_time = input
        .appointment_time
        .and_then(|raw| time(&mut errors, "appointment_time", &raw));
    let status = input.status.and_then(|raw| status_field(&mut errors, raw));
    let patient_history_id = input
        .patient_history
        .and_then(|raw| required_pk(&mut errors, "patient_history", raw));
    let doctor_id = input
        .doctor
        .and_then(|raw| nullable_pk(&mut errors, "doctor", raw));

    errors.finish(AppointmentChanges {
        appointment_date,
        appointment_time,
        status,
        patient_history_id,
        doctor_id,
    })
}

fn department_field(errors: &mut FieldErrors, raw: &str) -> Option<Department> {
    Department::parse(raw)
        .map_err(|message| errors.add("department", message))
        .ok()
}

fn date(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    parse_date(raw).map_err(|message| errors.add(field, message)).ok()
}

fn time(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<chrono::NaiveTime> {
    parse_time(raw).map_err(|message| errors.add(field, message)).ok()
}

/// `Some(None)` for an explicit `null`, `None` when the value is invalid.
fn nullable_date(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<String>,
) -> Option<Option<NaiveDate>> {
    match raw {
        None => Some(None),
        Some(raw) => date(errors, field, &raw).map(Some),
    }
}

fn check_release(
    errors: &mut FieldErrors,
    release_date: Option<NaiveDate>,
    admit_date: NaiveDate,
) -> Option<Option<NaiveDate>> {
    match release_date {
        Some(release) if release < admit_date => {
            errors.add("release_date", MSG_RELEASE_BEFORE_ADMIT);
            None
        }
        other => Some(other),
    }
}

fn status_field(errors: &mut FieldErrors, raw: Option<bool>) -> Option<bool> {
    if raw.is_none() {
        errors.add("status", MSG_NULL);
    }
    raw
}

fn required_pk(errors: &mut FieldErrors, field: &str, raw: Option<Value>) -> Option<i64> {
    match raw {
        None => {
            errors.add(field, MSG_NULL);
            None
        }
        Some(value) => pk(errors, field, &value),
    }
}

fn nullable_pk(errors: &mut FieldErrors, field: &str, raw: Option<Value>) -> Option<Option<i64>> {
    match raw {
        None => Some(None),
        Some(value) => pk(errors, field, &value).map(Some),
    }
}

fn pk(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<i64> {
    pk_from_json(value)
        .map_err(|message| errors.add(field, message))
        .ok()
}
