//! Reply scripts used after the provider has answered.

use crate::fields::FieldId;
use crate::providers::ProviderDescriptor;
use crate::ticket::{Completion, Ticket, TicketForm, TicketStatus, NO_TIME_WINDOW};
use std::fmt;

/// Result line of an `[AUDIT]` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditResult {
    /// Ticket logged, provider has not answered
    Pending,
    /// Provider reported the member in profit
    Profit,
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditResult::Pending => write!(f, "PENDING"),
            AuditResult::Profit => write!(f, "PROFIT"),
        }
    }
}

/// Reply to the merchant once the ticket is completed
pub fn completion_script(ticket: &Ticket, completion: &Completion, actor: &str) -> String {
    match completion {
        Completion::Normal => normal_script(actor),
        Completion::Abnormal(kind) => {
            abnormal_script(&ticket.provider, kind.trim(), &ticket.member_id, actor)
        }
    }
}

pub fn normal_script(actor: &str) -> String {
    format!(
        "Hi sir as we checked, the member bet is normal. Thank you - {}.",
        actor
    )
}

pub fn abnormal_script(
    provider: &str,
    abnormal_type: &str,
    member_id: &str,
    actor: &str,
) -> String {
    format!(
        "Hello team, this is {}. Please refer to the below information from provider, \
         Thank You.\n\nAnnouncement：【{}】 confirm this member is【{}】,you may decide \
         whether to let member withdrawal or not, the decision is rest in your hand, \
         thank you, sir.\n\nmember：{}",
        actor, provider, abnormal_type, member_id
    )
}

pub fn audit_script(provider: &str, member_id: &str, period: &str, result: AuditResult) -> String {
    format!(
        "[AUDIT]\nProvider: {}\nMember: {}\nPeriod: {}\nResult: {}",
        provider, member_id, period, result
    )
}

/// Audit block for a ticket row that has no result yet
pub fn pending_audit_script(ticket: &Ticket) -> String {
    let period = ticket
        .fields
        .get(FieldId::TimeRange)
        .unwrap_or(NO_TIME_WINDOW);
    audit_script(
        &ticket.provider,
        &ticket.member_id,
        period,
        AuditResult::Pending,
    )
}

/// Audit block for a form the provider reported profit on. `None` until
/// both the member id and the time range are filled in.
pub fn profit_audit_script(form: &TicketForm) -> Option<String> {
    let member_id = form.fields.get(FieldId::MemberId)?;
    let period = form.fields.get(FieldId::TimeRange)?;
    Some(audit_script(&form.provider, member_id, period, AuditResult::Profit))
}

/// Script for copying a ticket row: the completion reply for finished
/// tickets, the audit block otherwise
pub fn row_script(ticket: &Ticket, actor: &str) -> String {
    match ticket.status {
        TicketStatus::Normal => normal_script(actor),
        TicketStatus::Abnormal => abnormal_script(
            &ticket.provider,
            ticket.abnormal_type.as_deref().unwrap_or("-"),
            &ticket.member_id,
            actor,
        ),
        TicketStatus::Pending | TicketStatus::Handover => pending_audit_script(ticket),
    }
}

/// Loss-confirmation request, or a note when the provider takes none
pub fn loss_confirmation_script(descriptor: &ProviderDescriptor, actor: &str) -> String {
    if descriptor.loss_confirmation_exempt {
        format!(
            "[NOTE] {} does not require Loss Confirmation. You may proceed.",
            descriptor.name
        )
    } else {
        format!(
            "Hello team, this is {}. As we confirmed the member has no profit from the provider \
             during this period. Do you still need to check member bet normal or not?",
            actor
        )
    }
}

/// Reply to the merchant when the member made no profit with the provider
pub fn no_profit_script(provider: &str, actor: &str) -> String {
    format!(
        "Hi Team, as we check there is no profit from the provider {}, for the mentioned time \
         period. As for the query guidelines of the provider we cannot proceed further since \
         there is no Profit. Sorry for the inconvenience. Thank You - {}",
        provider, actor
    )
}
