//! SQL storage helpers for histories, costs and appointments.

use chrono::{NaiveDate, NaiveTime};
use sqlx::{postgres::PgRow, PgPool, Row};

use super::types::{total_cost, AppointmentRow, CostResponse, HistoryRow};
use crate::api::handlers::fields::Department;

const HISTORY_COLUMNS: &str = r"
    id, admit_date, symptoms, department, release_date, patient_id, assigned_doctor_id
";

const APPOINTMENT_SELECT: &str = r"
    SELECT
        a.id,
        a.appointment_date,
        a.appointment_time,
        a.status,
        a.patient_history_id,
        a.doctor_id,
        u.first_name || ' ' || u.last_name AS patient_name
    FROM appointments a
    JOIN patient_histories h ON h.id = a.patient_history_id
    JOIN patients p ON p.id = h.patient_id
    JOIN users u ON u.id = p.user_id
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewHistory {
    pub(crate) admit_date: NaiveDate,
    pub(crate) symptoms: String,
    pub(crate) department: Department,
    pub(crate) release_date: Option<NaiveDate>,
    pub(crate) assigned_doctor_id: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct HistoryChanges {
    pub(crate) symptoms: Option<String>,
    pub(crate) department: Option<Department>,
    /// `Some(None)` clears the release date.
    pub(crate) release_date: Option<Option<NaiveDate>>,
    pub(crate) assigned_doctor_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Charges {
    pub(crate) room_charge: i32,
    pub(crate) medicine_cost: i32,
    pub(crate) doctor_fee: i32,
    pub(crate) other_charge: i32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChargeChanges {
    pub(crate) room_charge: Option<i32>,
    pub(crate) medicine_cost: Option<i32>,
    pub(crate) doctor_fee: Option<i32>,
    pub(crate) other_charge: Option<i32>,
}

impl ChargeChanges {
    /// All four charges, when every one of them was supplied.
    pub(crate) fn complete(self) -> Option<Charges> {
        Some(Charges {
            room_charge: self.room_charge?,
            medicine_cost: self.medicine_cost?,
            doctor_fee: self.doctor_fee?,
            other_charge: self.other_charge?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewAppointment {
    pub(crate) appointment_date: NaiveDate,
    pub(crate) appointment_time: NaiveTime,
    pub(crate) status: bool,
    pub(crate) patient_history_id: i64,
    pub(crate) doctor_id: Option<i64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct AppointmentChanges {
    pub(crate) appointment_date: Option<NaiveDate>,
    pub(crate) appointment_time: Option<NaiveTime>,
    pub(crate) status: Option<bool>,
    pub(crate) patient_history_id: Option<i64>,
    /// `Some(None)` detaches the doctor.
    pub(crate) doctor_id: Option<Option<i64>>,
}

fn history_from_row(row: &PgRow) -> HistoryRow {
    let department: String = row.get("department");
    HistoryRow {
        id: row.get("id"),
        admit_date: row.get("admit_date"),
        symptoms: row.get("symptoms"),
        department: Department::from_code(&department).unwrap_or_default(),
        release_date: row.get("release_date"),
        patient_id: row.get("patient_id"),
        assigned_doctor_id: row.get("assigned_doctor_id"),
    }
}

fn cost_from_row(row: &PgRow) -> CostResponse {
    let room_charge: i32 = row.get("room_charge");
    let medicine_cost: i32 = row.get("medicine_cost");
    let doctor_fee: i32 = row.get("doctor_fee");
    let other_charge: i32 = row.get("other_charge");
    CostResponse {
        id: row.get("id"),
        room_charge,
        medicine_cost,
        doctor_fee,
        other_charge,
        patient_history: row.get("patient_history_id"),
        total_cost: total_cost([room_charge, medicine_cost, doctor_fee, other_charge]),
    }
}

fn appointment_from_row(row: &PgRow) -> AppointmentRow {
    AppointmentRow {
        id: row.get("id"),
        appointment_date: row.get("appointment_date"),
        appointment_time: row.get("appointment_time"),
        status: row.get("status"),
        patient_history_id: row.get("patient_history_id"),
        doctor_id: row.get("doctor_id"),
        patient_name: row.get("patient_name"),
    }
}

/// Patient profile id of user `user_id`, if the user has one.
pub(crate) async fn patient_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let row = sqlx::query("SELECT id FROM patients WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get("id")))
}

pub(crate) async fn doctor_exists(pool: &PgPool, doctor_id: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM doctors WHERE id = $1) AS found")
        .bind(doctor_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("found"))
}

pub(crate) async fn history_exists(pool: &PgPool, history_id: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM patient_histories WHERE id = $1) AS found")
        .bind(history_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("found"))
}

pub(crate) async fn fetch_histories(
    pool: &PgPool,
    patient_id: i64,
) -> Result<Vec<HistoryRow>, sqlx::Error> {
    let query = format!(
        "SELECT {HISTORY_COLUMNS} FROM patient_histories WHERE patient_id = $1 ORDER BY id"
    );
    let rows = sqlx::query(&query).bind(patient_id).fetch_all(pool).await?;
    Ok(rows.iter().map(history_from_row).collect())
}

pub(crate) async fn fetch_history(
    pool: &PgPool,
    history_id: i64,
) -> Result<Option<HistoryRow>, sqlx::Error> {
    let query = format!("SELECT {HISTORY_COLUMNS} FROM patient_histories WHERE id = $1");
    let row = sqlx::query(&query)
        .bind(history_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(history_from_row))
}

pub(crate) async fn insert_history(
    pool: &PgPool,
    patient_id: i64,
    history: &NewHistory,
) -> Result<HistoryRow, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO patient_histories
            (admit_date, symptoms, department, release_date, patient_id, assigned_doctor_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {HISTORY_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(history.admit_date)
        .bind(&history.symptoms)
        .bind(history.department.code())
        .bind(history.release_date)
        .bind(patient_id)
        .bind(history.assigned_doctor_id)
        .fetch_one(pool)
        .await?;
    Ok(history_from_row(&row))
}

pub(crate) async fn update_history(
    pool: &PgPool,
    history_id: i64,
    changes: &HistoryChanges,
) -> Result<Option<HistoryRow>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE patient_histories
        SET
            symptoms = COALESCE($2, symptoms),
            department = COALESCE($3, department),
            release_date = CASE WHEN $4 THEN $5 ELSE release_date END,
            assigned_doctor_id = COALESCE($6, assigned_doctor_id)
        WHERE id = $1
        RETURNING {HISTORY_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(history_id)
        .bind(changes.symptoms.as_deref())
        .bind(changes.department.map(Department::code))
        .bind(changes.release_date.is_some())
        .bind(changes.release_date.flatten())
        .bind(changes.assigned_doctor_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(history_from_row))
}

/// Deletes a history with its appointments and cost.
pub(crate) async fn delete_history(pool: &PgPool, history_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM patient_histories WHERE id = $1")
        .bind(history_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn fetch_cost(
    pool: &PgPool,
    history_id: i64,
) -> Result<Option<CostResponse>, sqlx::Error> {
    let row = sqlx::query(
        r"
        SELECT id, room_charge, medicine_cost, doctor_fee, other_charge, patient_history_id
        FROM patient_costs
        WHERE patient_history_id = $1
        ",
    )
    .bind(history_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(cost_from_row))
}

pub(crate) async fn insert_cost(
    pool: &PgPool,
    history_id: i64,
    charges: Charges,
) -> Result<CostResponse, sqlx::Error> {
    let row = sqlx::query(
        r"
        INSERT INTO patient_costs
            (room_charge, medicine_cost, doctor_fee, other_charge, patient_history_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (patient_history_id)
        DO UPDATE SET
            room_charge = EXCLUDED.room_charge,
            medicine_cost = EXCLUDED.medicine_cost,
            doctor_fee = EXCLUDED.doctor_fee,
            other_charge = EXCLUDED.other_charge
        RETURNING id, room_charge, medicine_cost, doctor_fee, other_charge, patient_history_id
        ",
    )
    .bind(charges.room_charge)
    .bind(charges.medicine_cost)
    .bind(charges.doctor_fee)
    .bind(charges.other_charge)
    .bind(history_id)
    .fetch_one(pool)
    .await?;
    Ok(cost_from_row(&row))
}

pub(crate) async fn update_cost(
    pool: &PgPool,
    history_id: i64,
    changes: ChargeChanges,
) -> Result<Option<CostResponse>, sqlx::Error> {
    let row = sqlx::query(
        r"
        UPDATE patient_costs
        SET
            room_charge = COALESCE($2, room_charge),
            medicine_cost = COALESCE($3, medicine_cost),
            doctor_fee = COALESCE($4, doctor_fee),
            other_charge = COALESCE($5, other_charge)
        WHERE patient_history_id = $1
        RETURNING id, room_charge, medicine_cost, doctor_fee, other_charge, patient_history_id
        ",
    )
    .bind(history_id)
    .bind(changes.room_charge)
    .bind(changes.medicine_cost)
    .bind(changes.doctor_fee)
    .bind(changes.other_charge)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(cost_from_row))
}

pub(crate) async fn delete_cost(pool: &PgPool, history_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM patient_costs WHERE patient_history_id = $1")
        .bind(history_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Appointments whose confirmation flag equals `confirmed`.
pub(crate) async fn fetch_appointments(
    pool: &PgPool,
    confirmed: bool,
) -> Result<Vec<AppointmentRow>, sqlx::Error> {
    let query = format!("{APPOINTMENT_SELECT} WHERE a.status = $1 ORDER BY a.id");
    let rows = sqlx::query(&query).bind(confirmed).fetch_all(pool).await?;
    Ok(rows.iter().map(appointment_from_row).collect())
}

pub(crate) async fn fetch_appointment(
    pool: &PgPool,
    appointment_id: i64,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    let query = format!("{APPOINTMENT_SELECT} WHERE a.id = $1");
    let row = sqlx::query(&query)
        .bind(appointment_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(appointment_from_row))
}

pub(crate) async fn insert_appointment(
    pool: &PgPool,
    appointment: &NewAppointment,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r"
        INSERT INTO appointments
            (appointment_date, appointment_time, status, patient_history_id, doctor_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(appointment.appointment_date)
    .bind(appointment.appointment_time)
    .bind(appointment.status)
    .bind(appointment.patient_history_id)
    .bind(appointment.doctor_id)
    .fetch_one(pool)
    .await?;
    Ok(row.get("id"))
}

pub(crate) async fn update_appointment(
    pool: &PgPool,
    appointment_id: i64,
    changes: &AppointmentChanges,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        UPDATE appointments
        SET
            appointment_date = COALESCE($2, appointment_date),
            appointment_time = COALESCE($3, appointment_time),
            status = COALESCE($4, status),
            patient_history_id = COALESCE($5, patient_history_id),
            doctor_id = CASE WHEN $6 THEN $7 ELSE doctor_id END
        WHERE id = $1
        ",
    )
    .bind(appointment_id)
    .bind(changes.appointment_date)
    .bind(changes.appointment_time)
    .bind(changes.status)
    .bind(changes.patient_history_id)
    .bind(changes.doctor_id.is_some())
    .bind(changes.doctor_id.flatten())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_appointment(
    pool: &PgPool,
    appointment_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
        .bind(appointment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_changes_complete_requires_all_four() {
        let partial = ChargeChanges {
            room_charge: Some(100),
            ..ChargeChanges::default()
        };
        assert_eq!(partial.complete(), None);

        let full = ChargeChanges {
            room_charge: Some(100),
            medicine_cost: Some(20),
            doctor_fee: Some(30),
            other_charge: Some(0),
        };
        assert_eq!(
            full.complete(),
            Some(Charges {
                room_charge: 100,
                medicine_cost: 20,
                doctor_fee: 30,
                other_charge: 0,
            })
        );
    }
}
