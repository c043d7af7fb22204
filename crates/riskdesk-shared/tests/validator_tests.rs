//! Tests for the ticket validator against the built-in catalog.

use riskdesk_shared::fields::{FieldId, TicketFields};
use riskdesk_shared::providers::ProviderCatalog;
use riskdesk_shared::validator::{is_submittable, validate, ValidationIssue};

fn jili_base() -> TicketFields {
    TicketFields::new()
        .with(FieldId::MemberId, "user@017")
        .with(FieldId::ProviderAccount, "jl_77")
        .with(FieldId::Currency, "IDR")
}

#[test]
fn test_either_or_group_needs_one_alternative() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let jili = catalog.get("JILI");

    let neither = jili_base();
    let verdict = validate(jili, &neither, false);
    let missing = ValidationIssue::MissingOneOf(FieldId::BetTicket, FieldId::TimeRange);
    assert_eq!(verdict.issues, vec![missing]);
    assert_eq!(
        verdict.flagged_fields(),
        vec![FieldId::BetTicket, FieldId::TimeRange]
    );

    let ticket_only = jili_base().with(FieldId::BetTicket, "BT-1");
    assert!(is_submittable(jili, &ticket_only, false));

    let window_only = jili_base().with(FieldId::TimeRange, "10:00 - 11:00");
    assert!(is_submittable(jili, &window_only, false));

    let both = window_only.with(FieldId::BetTicket, "BT-1");
    assert!(is_submittable(jili, &both, false));
}

#[test]
fn test_either_or_group_needs_anchor() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let sa = catalog.get("SA Gaming");

    let fields = TicketFields::new()
        .with(FieldId::MemberId, "user@017")
        .with(FieldId::Currency, "THB")
        .with(FieldId::RoundId, "R-1")
        .with(FieldId::TimeRange, "10:00 - 11:00");
    let verdict = validate(sa, &fields, false);
    assert_eq!(
        verdict.issues,
        vec![ValidationIssue::Missing(FieldId::ProviderAccount)]
    );
}

#[test]
fn test_blank_alternative_does_not_count() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let fields = jili_base().with(FieldId::BetTicket, "   ");
    assert!(!is_submittable(catalog.get("JILI"), &fields, false));
}

#[test]
fn test_access_error_blocks_complete_form() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let fields = jili_base().with(FieldId::BetTicket, "BT-1");
    assert!(!is_submittable(catalog.get("JILI"), &fields, true));
}

#[test]
fn test_manual_and_unknown_providers_never_submittable() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let fields = jili_base()
        .with(FieldId::BetTicket, "BT-1")
        .with(FieldId::TimeRange, "10:00 - 11:00");

    assert!(!is_submittable(catalog.get("PA Casino"), &fields, false));
    assert!(!is_submittable(catalog.get("Joker"), &fields, false));
    assert_eq!(
        validate(catalog.get("Joker"), &fields, false).issues,
        vec![ValidationIssue::ManualOnly]
    );
}

#[test]
fn test_missing_member_id_always_blocks() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let evo = catalog.get("Evolution");
    let fields = TicketFields::new().with(FieldId::TrackingId, "TRK-1");
    assert_eq!(
        validate(evo, &fields, false).issues,
        vec![ValidationIssue::Missing(FieldId::MemberId)]
    );
    assert!(is_submittable(evo, &fields.with(FieldId::MemberId, "bob"), false));
}

#[test]
fn test_issues_listed_in_rule_order() {
    let catalog = ProviderCatalog::builtin().unwrap();
    let sg = catalog.get("Spadegaming");
    let fields = TicketFields::new().with(FieldId::ProviderAccount, "sg_1");
    let verdict = validate(sg, &fields, true);
    assert_eq!(
        verdict.issues,
        vec![
            ValidationIssue::Missing(FieldId::MemberId),
            ValidationIssue::AccessDenied,
            ValidationIssue::Missing(FieldId::Currency),
            ValidationIssue::Missing(FieldId::GameName),
            ValidationIssue::Missing(FieldId::TimeRange),
            ValidationIssue::Missing(FieldId::ReasonToCheck),
        ]
    );
}
