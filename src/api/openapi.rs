#![allow(clippy::needless_for_each)]

use crate::api::handlers::{
    accounts::{doctors, patients, types as account_types},
    auth::{login, types as auth_types},
    clinical::{appointments, costs, histories, types as clinical_types},
    fields::Department,
    health,
};
use utoipa::{
    openapi::{
        security::{ApiKey, ApiKeyValue, SecurityScheme},
        Contact, Info, InfoBuilder, License, Tag,
    },
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login::login,
        login::logout,
        doctors::register_doctor,
        doctors::list_doctors,
        doctors::get_doctor,
        doctors::update_doctor,
        doctors::delete_doctor,
        doctors::list_pending_doctors,
        doctors::get_pending_doctor,
        doctors::approve_doctor,
        doctors::reject_doctor,
        patients::register_patient,
        patients::list_patients,
        patients::get_patient,
        patients::update_patient,
        patients::delete_patient,
        patients::list_pending_patients,
        patients::get_pending_patient,
        patients::approve_patient,
        patients::reject_patient,
        histories::list_histories,
        histories::create_history,
        histories::get_history,
        histories::update_history,
        histories::delete_history,
        costs::get_cost,
        costs::put_cost,
        costs::delete_cost,
        appointments::list_appointments,
        appointments::create_appointment,
        appointments::get_appointment,
        appointments::update_appointment,
        appointments::delete_appointment,
        appointments::list_pending_appointments,
        appointments::get_pending_appointment,
        appointments::approve_appointment,
        appointments::reject_appointment,
    ),
    components(schemas(
        health::Health,
        Department,
        auth_types::LoginRequest,
        auth_types::TokenResponse,
        auth_types::MessageResponse,
        account_types::UserInput,
        account_types::ProfileInput,
        account_types::RegistrationRequest,
        account_types::RegistrationResponse,
        account_types::AccountUpdate,
        account_types::AccountResponse,
        account_types::UserResponse,
        account_types::ProfileResponse,
        account_types::DoctorProfileResponse,
        account_types::PatientProfileResponse,
        clinical_types::HistoryInput,
        clinical_types::HistoryResponse,
        clinical_types::CostInput,
        clinical_types::CostResponse,
        clinical_types::AppointmentInput,
        clinical_types::AppointmentResponse,
    )),
    modifiers(&TokenSecurity)
)]
struct ApiDoc;

/// Registers the `token` scheme referenced by `security(("token" = []))`.
struct TokenSecurity;

impl Modify for TokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Token <key>` as returned by `POST /api/admin/login`",
            ))),
        );
    }
}

/// The `OpenAPI` document served at `/api-docs/openapi.json`.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info = cargo_info();
    doc.tags = Some(
        [
            ("health", "Liveness and database reachability"),
            ("auth", "Admin login and logout"),
            ("doctors", "Doctor accounts and approvals"),
            ("patients", "Patient accounts and approvals"),
            ("histories", "Admission histories of a patient"),
            ("costs", "Charges attached to one history"),
            ("appointments", "Appointments and appointment requests"),
        ]
        .into_iter()
        .map(|(name, description)| {
            let mut tag = Tag::new(name);
            tag.description = Some(description.to_string());
            tag
        })
        .collect(),
    );
    doc
}

// Cargo.toml metadata wins over the derive defaults.
fn cargo_info() -> Info {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(non_empty(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact(env!("CARGO_PKG_AUTHORS"));
    info.license = non_empty(env!("CARGO_PKG_LICENSE")).map(|id| {
        let mut license = License::new(id);
        license.identifier = Some(id.to_string());
        license
    });
    info
}

/// First Cargo author (`Name <email>`, `;` separated) as a contact.
fn cargo_contact(authors: &str) -> Option<Contact> {
    let primary = non_empty(authors.split(';').next()?)?;

    let (name, email) = match primary.split_once('<') {
        Some((name, rest)) => (non_empty(name), non_empty(rest.trim_end_matches('>'))),
        None => (Some(primary), None),
    };
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_comes_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            doc.info.license.as_ref().map(|l| l.name.as_str()),
            Some("BSD-3-Clause")
        );
    }

    #[test]
    fn contact_splits_name_and_email() {
        let contact = cargo_contact("Jane Roe <jane@example.org>; Other <o@example.org>");
        let contact = contact.expect("contact");
        assert_eq!(contact.name.as_deref(), Some("Jane Roe"));
        assert_eq!(contact.email.as_deref(), Some("jane@example.org"));

        let contact = cargo_contact("Only A Name").expect("contact");
        assert_eq!(contact.name.as_deref(), Some("Only A Name"));
        assert!(contact.email.is_none());

        assert!(cargo_contact("  ").is_none());
    }

    #[test]
    fn documents_every_admin_route() {
        let doc = openapi();
        for path in [
            "/health",
            "/api/admin/login",
            "/api/admin/logout",
            "/api/admin/doctor-registration",
            "/api/admin/doctors/{pk}",
            "/api/admin/doctor-approvals/{pk}",
            "/api/admin/patient-registration",
            "/api/admin/patients/{pk}",
            "/api/admin/patient-approvals/{pk}",
            "/api/admin/patients/{pk}/history/{hid}",
            "/api/admin/patients/{pk}/history/{hid}/cost",
            "/api/admin/appointments/{pk}",
            "/api/admin/appointment-approvals/{pk}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn token_scheme_is_registered() {
        let doc = openapi();
        let schemes = doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("token"));
        assert_eq!(schemes, Some(true));
    }
}
