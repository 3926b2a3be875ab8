//! Domain field types shared by account and clinical handlers.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use utoipa::ToSchema;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Upper bound of a `PositiveIntegerField`-style charge.
pub const CHARGE_MAX: i64 = 2_147_483_647;

/// Hospital department. Serialized with its short code (`CL`, `DL`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Department {
    #[default]
    #[serde(rename = "CL")]
    Cardiologist,
    #[serde(rename = "DL")]
    Dermatologists,
    #[serde(rename = "EMC")]
    EmergencyMedicineSpecialists,
    #[serde(rename = "IL")]
    Immunologists,
    #[serde(rename = "AL")]
    Anesthesiologists,
    #[serde(rename = "CRS")]
    ColonAndRectalSurgeons,
}

impl Department {
    pub const ALL: [Self; 6] = [
        Self::Cardiologist,
        Self::Dermatologists,
        Self::EmergencyMedicineSpecialists,
        Self::Immunologists,
        Self::Anesthesiologists,
        Self::ColonAndRectalSurgeons,
    ];

    /// Code stored in the `department` columns.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Cardiologist => "CL",
            Self::Dermatologists => "DL",
            Self::EmergencyMedicineSpecialists => "EMC",
            Self::Immunologists => "IL",
            Self::Anesthesiologists => "AL",
            Self::ColonAndRectalSurgeons => "CRS",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|department| department.code() == code)
    }

    /// Parse user input, returning the choice error message on failure.
    ///
    /// # Errors
    /// Returns a client-facing message when `code` is not a known department.
    pub fn parse(code: &str) -> Result<Self, String> {
        Self::from_code(code.trim()).ok_or_else(|| format!("\"{code}\" is not a valid choice."))
    }
}

/// Patient age with one decimal place, held as tenths of a year.
///
/// Mirrors a `NUMERIC(4, 1)` column: at most four digits in total, at most one
/// of them after the decimal point, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Age(u16);

impl Age {
    const MAX_TENTHS: u16 = 9999;

    #[must_use]
    pub const fn tenths(self) -> u16 {
        self.0
    }

    /// Parse a decimal string such as `"34"`, `"34.5"` or `"0.5"`.
    ///
    /// # Errors
    /// Returns a client-facing message describing the violated constraint.
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let raw = raw.trim();
        if raw.starts_with('-') {
            return Err("Ensure this value is greater than or equal to 0.");
        }
        let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
        if (whole.is_empty() && fraction.is_empty())
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err("A valid number is required.");
        }
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > 1 {
            return Err("Ensure that there are no more than 1 decimal places.");
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() > 3 {
            return Err("Ensure that there are no more than 4 digits in total.");
        }
        let whole: u16 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| "A valid number is required.")?
        };
        let tenth: u16 = fraction.parse().unwrap_or(0);
        let tenths = whole * 10 + tenth;
        if tenths > Self::MAX_TENTHS {
            return Err("Ensure that there are no more than 4 digits in total.");
        }
        Ok(Self(tenths))
    }

    /// Accepts JSON numbers and strings.
    ///
    /// # Errors
    /// See [`Age::parse`].
    pub fn from_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::String(raw) => Self::parse(raw),
            Value::Number(number) => Self::parse(&number.to_string()),
            _ => Err("A valid number is required."),
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// # Errors
/// Returns the client-facing format message.
pub fn parse_date(raw: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.")
}

/// Accepts `HH:MM` and `HH:MM:SS`.
///
/// # Errors
/// Returns the client-facing format message.
pub fn parse_time(raw: &str) -> Result<NaiveTime, &'static str> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| "Time has wrong format. Use one of these formats instead: hh:mm[:ss].")
}

/// Validate a non-negative charge that fits an `INTEGER` column.
///
/// # Errors
/// Returns the client-facing range message.
pub fn check_charge(value: i64) -> Result<i32, String> {
    if value < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    i32::try_from(value)
        .map_err(|_| format!("Ensure this value is less than or equal to {CHARGE_MAX}."))
}

/// Read a related-object primary key from JSON (number or numeric string).
///
/// # Errors
/// Returns the client-facing type message.
pub fn pk_from_json(value: &Value) -> Result<i64, String> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        format!(
            "Incorrect type. Expected pk value, received {}.",
            json_type_name(value)
        )
    })
}

/// Read a charge from JSON (integer or integer string) and range-check it.
///
/// # Errors
/// Returns the client-facing type or range message.
pub fn charge_from_json(value: &Value) -> Result<i32, String> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(charge) => check_charge(charge),
        None => Err("A valid integer is required.".to_string()),
    }
}

/// Message for a primary key that does not resolve to a row.
#[must_use]
pub fn missing_pk_message(pk: i64) -> String {
    format!("Invalid pk \"{pk}\" - object does not exist.")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pk_from_json_accepts_numbers_and_numeric_strings() {
        assert_eq!(pk_from_json(&json!(5)), Ok(5));
        assert_eq!(pk_from_json(&json!("12")), Ok(12));
        assert_eq!(
            pk_from_json(&json!(true)),
            Err("Incorrect type. Expected pk value, received bool.".to_string())
        );
        assert!(pk_from_json(&json!(1.5)).is_err());
    }

    #[test]
    fn charge_from_json_checks_type_and_range() {
        assert_eq!(charge_from_json(&json!(1500)), Ok(1500));
        assert_eq!(charge_from_json(&json!("20")), Ok(20));
        assert!(charge_from_json(&json!(-1)).is_err());
        assert!(charge_from_json(&json!(12.5)).is_err());
        assert!(charge_from_json(&json!("abc")).is_err());
    }

    #[test]
    fn missing_pk_message_quotes_id() {
        assert_eq!(
            missing_pk_message(9),
            "Invalid pk \"9\" - object does not exist."
        );
    }

    #[test]
    fn department_codes_round_trip() {
        for department in Department::ALL {
            assert_eq!(Department::from_code(department.code()), Some(department));
        }
        assert_eq!(Department::default(), Department::Cardiologist);
    }

    #[test]
    fn department_parse_reports_invalid_choice() {
        assert_eq!(Department::parse(" EMC "), Ok(Department::EmergencyMedicineSpecialists));
        assert_eq!(
            Department::parse("XX"),
            Err("\"XX\" is not a valid choice.".to_string())
        );
    }

    #[test]
    fn department_serializes_as_code() {
        let value = serde_json::to_value(Department::ColonAndRectalSurgeons).ok();
        assert_eq!(value, Some(json!("CRS")));
    }

    #[test]
    fn age_accepts_one_decimal_place() {
        assert_eq!(Age::parse("34.5").map(|a| a.to_string()), Ok("34.5".to_string()));
        assert_eq!(Age::parse("7").map(|a| a.to_string()), Ok("7.0".to_string()));
        assert_eq!(Age::parse("0.5").map(Age::tenths), Ok(5));
        assert_eq!(Age::parse("12.50").map(Age::tenths), Ok(125));
        assert_eq!(Age::parse("999.9").map(Age::tenths), Ok(9999));
    }

    #[test]
    fn age_rejects_out_of_range() {
        assert!(Age::parse("34.55").is_err());
        assert!(Age::parse("1000").is_err());
        assert!(Age::parse("-1").is_err());
        assert!(Age::parse("abc").is_err());
        assert!(Age::parse(".").is_err());
        assert!(Age::parse("").is_err());
    }

    #[test]
    fn age_from_json_accepts_numbers_and_strings() {
        assert_eq!(Age::from_json(&json!(42.5)).map(Age::tenths), Ok(425));
        assert_eq!(Age::from_json(&json!("61")).map(Age::tenths), Ok(610));
        assert!(Age::from_json(&json!(true)).is_err());
    }

    #[test]
    fn time_accepts_minutes_precision() {
        assert!(parse_time("09:30").is_ok());
        assert!(parse_time("09:30:15").is_ok());
        assert!(parse_time("9.30").is_err());
    }

    #[test]
    fn date_requires_iso_format() {
        assert!(parse_date("2024-05-17").is_ok());
        assert!(parse_date("17/05/2024").is_err());
    }

    #[test]
    fn charges_fit_integer_column() {
        assert_eq!(check_charge(0), Ok(0));
        assert_eq!(check_charge(CHARGE_MAX), Ok(i32::MAX));
        assert!(check_charge(-1).is_err());
        assert!(check_charge(CHARGE_MAX + 1).is_err());
    }
}
