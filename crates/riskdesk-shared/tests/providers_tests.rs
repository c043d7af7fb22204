//! Tests for the provider rule set.
//!
//! Tests verify:
//! - Catalog construction rejects malformed descriptors
//! - Unknown providers resolve to a sentinel that is never submittable
//! - Rendering is deterministic and placeholders are recognisable

use riskdesk_shared::error::CatalogError;
use riskdesk_shared::fields::{FieldId, TicketFields};
use riskdesk_shared::providers::{ProviderCatalog, ProviderDescriptor, KNOWN_PROVIDERS};
use riskdesk_shared::scripts::{is_placeholder, ScriptTemplate, NOT_CONFIGURED_SCRIPT};

fn spadegaming_without_reasons() -> ProviderDescriptor {
    ProviderDescriptor::new("Spadegaming", ScriptTemplate::Spadegaming)
        .require(FieldId::MemberId)
        .require(FieldId::ProviderAccount)
        .require(FieldId::Currency)
        .require(FieldId::GameName)
        .require(FieldId::TimeRange)
        .require(FieldId::ReasonToCheck)
}

#[test]
fn test_every_builtin_descriptor_passes_shape_check() {
    let catalog = ProviderCatalog::builtin().unwrap();
    for name in catalog.names() {
        assert!(catalog.get(name).check_shape().is_ok(), "{}", name);
    }
}

#[test]
fn test_duplicate_provider_rejected() {
    let d = ProviderDescriptor::new("Evolution", ScriptTemplate::Evolution)
        .require(FieldId::TrackingId);
    let err = ProviderCatalog::from_descriptors(vec![d.clone(), d]).unwrap_err();
    assert_eq!(
        err,
        CatalogError::DuplicateProvider("Evolution".to_string())
    );
}

#[test]
fn test_empty_name_rejected() {
    let d = ProviderDescriptor::new("  ", ScriptTemplate::Evolution).require(FieldId::TrackingId);
    assert_eq!(d.check_shape(), Err(CatalogError::EmptyName));
}

#[test]
fn test_group_field_repeated_as_plain_field_rejected() {
    let d = ProviderDescriptor::new("JILI", ScriptTemplate::Jili)
        .require(FieldId::Currency)
        .require(FieldId::TimeRange)
        .require_either(
            FieldId::ProviderAccount,
            FieldId::BetTicket,
            FieldId::TimeRange,
        );
    assert_eq!(
        d.check_shape(),
        Err(CatalogError::RepeatedField {
            provider: "JILI".to_string(),
            field: FieldId::TimeRange,
        })
    );
}

#[test]
fn test_group_alternatives_must_differ() {
    let d = ProviderDescriptor::new("SA Gaming", ScriptTemplate::SaGaming)
        .require(FieldId::Currency)
        .require_either(FieldId::ProviderAccount, FieldId::RoundId, FieldId::RoundId);
    assert!(matches!(d.check_shape(), Err(CatalogError::RepeatedField { .. })));
}

#[test]
fn test_reason_requirement_needs_options() {
    let err = spadegaming_without_reasons().check_shape().unwrap_err();
    assert_eq!(
        err,
        CatalogError::MissingOptions {
            provider: "Spadegaming".to_string(),
            field: FieldId::ReasonToCheck,
        }
    );

    let fixed = spadegaming_without_reasons().with_reasons(&["Consecutive wins"]);
    assert!(fixed.check_shape().is_ok());
}

#[test]
fn test_script_input_must_be_required() {
    let d = ProviderDescriptor::new("PG Soft", ScriptTemplate::PgSoft)
        .require(FieldId::MemberId)
        .require(FieldId::ProviderAccount);
    assert_eq!(
        d.check_shape(),
        Err(CatalogError::UncoveredScriptInput {
            provider: "PG Soft".to_string(),
            field: FieldId::TimeRange,
        })
    );
}

#[test]
fn test_manual_provider_shape() {
    let with_fields = ProviderDescriptor::manual("PA Casino").require(FieldId::MemberId);
    assert_eq!(
        with_fields.check_shape(),
        Err(CatalogError::ManualWithRequirements("PA Casino".to_string()))
    );

    let mismatched = ProviderDescriptor {
        manual_only: true,
        ..ProviderDescriptor::new("PG Soft", ScriptTemplate::PgSoft)
    };
    assert_eq!(
        mismatched.check_shape(),
        Err(CatalogError::ScriptMismatch("PG Soft".to_string()))
    );
}

#[test]
fn test_unknown_provider_is_never_submittable() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let fields = TicketFields::new()
        .with(FieldId::MemberId, "user@017")
        .with(FieldId::ProviderAccount, "acc")
        .with(FieldId::TimeRange, "10:00 - 11:00");

    for name in ["Hacksaw", "No Such Provider", ""] {
        let d = catalog.get(name);
        assert!(!d.is_configured());
        assert!(!d.is_submittable(&fields, false));
        assert_eq!(d.render(&fields, "alice"), NOT_CONFIGURED_SCRIPT);
    }
}

#[test]
fn test_known_providers_without_descriptor_use_sentinel() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let unconfigured = KNOWN_PROVIDERS
        .iter()
        .filter(|name| catalog.lookup(name).is_none())
        .count();
    assert!(unconfigured > 0);
    assert!(!catalog.get("YGG").is_configured());
    assert!(catalog.get("PA Casino").is_configured());
}

#[test]
fn test_render_is_idempotent_for_every_provider() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let fields = TicketFields::new()
        .with(FieldId::MemberId, "user@017")
        .with(FieldId::ProviderAccount, "acc_1")
        .with(FieldId::TrackingId, "TRK-1")
        .with(FieldId::TimeRange, "10:00 - 11:00")
        .with(FieldId::Currency, "IDR")
        .with(FieldId::GameName, "Fishing God")
        .with(FieldId::ReasonToCheck, "Consecutive wins");

    for name in catalog.names() {
        let d = catalog.get(name);
        let first = d.render(&fields, "alice");
        let second = d.render(&fields, "alice");
        assert_eq!(first, second, "{}", name);
        assert_eq!(is_placeholder(&first), d.manual_only, "{}", name);
    }
}

#[test]
fn test_render_uses_actor_name() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let fields = TicketFields::new().with(FieldId::TrackingId, "TRK-9");
    let script = catalog.get("Evolution").render(&fields, "dana");
    assert!(script.starts_with("Hello sir this is dana,"));
    assert!(script.ends_with("Tracking ID: TRK-9"));
}

#[test]
fn test_sa_gaming_round_id_precedence() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let fields = TicketFields::new()
        .with(FieldId::ProviderAccount, "sa_1")
        .with(FieldId::Currency, "MYR")
        .with(FieldId::RoundId, "R-55")
        .with(FieldId::TimeRange, "10:00 - 11:00");
    let script = catalog.get("SA Gaming").render(&fields, "bob");
    assert!(script.contains("Lobby：QQ288-MYR-L01"));
    assert!(script.ends_with("Round ID：R-55"));
}
