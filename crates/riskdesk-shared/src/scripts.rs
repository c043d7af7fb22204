//! Provider script templates.
//!
//! One variant per provider script. Rendering is a pure, total function of
//! the field map and the actor name: no clock, no randomness, no mutation.
//! When the data a script needs is missing the result is a placeholder
//! starting with [`PLACEHOLDER_PREFIX`], so the live preview can render
//! before the form is complete.

use crate::fields::{FieldId, TicketFields};
use crate::HOUSE_MERCHANT;
use serde::{Deserialize, Serialize};

/// Every placeholder starts with this prefix; nothing starting with it is
/// ever copied to the clipboard.
pub const PLACEHOLDER_PREFIX: &str = "// ";

/// Placeholder for providers without a descriptor
pub const NOT_CONFIGURED_SCRIPT: &str = "// Script not configured";

/// Check whether a rendered script is a placeholder
pub fn is_placeholder(script: &str) -> bool {
    script.starts_with(PLACEHOLDER_PREFIX)
}

/// JILI agent prefix per currency
const JILI_AGENT_PREFIX: &[(&str, &str)] = &[
    ("IDR", "id_"),
    ("MYR", "my_"),
    ("THB", "th_"),
    ("VND", "vn_"),
    ("USD", "us_"),
];

/// SA Gaming lobby code per currency
const SA_LOBBY_CODE: &[(&str, &str)] = &[
    ("IDR", "QQ288-IDR-L01"),
    ("MYR", "QQ288-MYR-L01"),
    ("THB", "QQ288-THB-L02"),
    ("KRW", "QQ288-KRW-L01"),
];

/// Spadegaming account suffix per currency
const SPADE_ACCOUNT_SUFFIX: &[(&str, &str)] = &[
    ("IDR", "_idr"),
    ("MYR", "_myr"),
    ("THB", "_thb"),
    ("CNY", "_cny"),
];

/// CQ9 support channel per currency
const CQ9_CHANNEL: &[(&str, &str)] = &[
    ("IDR", "CQ9 x QQ288 Indonesia Support"),
    ("MYR", "CQ9 x QQ288 Malaysia Support"),
    ("THB", "CQ9 x QQ288 Thailand Support"),
    ("VND", "CQ9 x QQ288 Vietnam Support"),
];

/// Map a currency code through a static table.
/// Unmapped or missing currencies map to an empty string.
pub fn currency_lookup(
    table: &'static [(&'static str, &'static str)],
    currency: &str,
) -> &'static str {
    let code = currency.trim().to_ascii_uppercase();
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, v)| *v)
        .unwrap_or("")
}

pub fn jili_agent_prefix(currency: &str) -> &'static str {
    currency_lookup(JILI_AGENT_PREFIX, currency)
}

pub fn sa_lobby_code(currency: &str) -> &'static str {
    currency_lookup(SA_LOBBY_CODE, currency)
}

pub fn spade_account_suffix(currency: &str) -> &'static str {
    currency_lookup(SPADE_ACCOUNT_SUFFIX, currency)
}

pub fn cq9_channel(currency: &str) -> &'static str {
    currency_lookup(CQ9_CHANNEL, currency)
}

/// Script template, one per configured provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptTemplate {
    PgSoft,
    Evolution,
    PragmaticPlay,
    /// Bet ticket takes precedence over time range
    Jili,
    /// Round id takes precedence over time range
    SaGaming,
    Spadegaming,
    Cq9,
    /// No electronic path: the provider is checked by hand
    ManualCheck,
    /// Sentinel for unknown providers
    NotConfigured,
}

impl ScriptTemplate {
    /// Fields the template reads
    pub fn inputs(self) -> &'static [FieldId] {
        match self {
            Self::PgSoft => &[FieldId::ProviderAccount, FieldId::TimeRange],
            Self::Evolution => &[FieldId::TrackingId],
            Self::PragmaticPlay => &[FieldId::MemberId, FieldId::TimeRange],
            Self::Jili => &[
                FieldId::ProviderAccount,
                FieldId::Currency,
                FieldId::BetTicket,
                FieldId::TimeRange,
            ],
            Self::SaGaming => &[
                FieldId::ProviderAccount,
                FieldId::Currency,
                FieldId::RoundId,
                FieldId::TimeRange,
            ],
            Self::Spadegaming => &[
                FieldId::ProviderAccount,
                FieldId::Currency,
                FieldId::GameName,
                FieldId::TimeRange,
                FieldId::ReasonToCheck,
            ],
            Self::Cq9 => &[FieldId::ProviderAccount, FieldId::Currency, FieldId::TimeRange],
            Self::ManualCheck | Self::NotConfigured => &[],
        }
    }

    /// Render the outbound script for `provider`
    pub fn render(self, provider: &str, fields: &TicketFields, actor: &str) -> String {
        match self {
            Self::PgSoft => render_pg_soft(fields, actor),
            Self::Evolution => render_evolution(fields, actor),
            Self::PragmaticPlay => render_pragmatic(fields, actor),
            Self::Jili => render_jili(fields, actor),
            Self::SaGaming => render_sa_gaming(fields, actor),
            Self::Spadegaming => render_spadegaming(fields, actor),
            Self::Cq9 => render_cq9(fields, actor),
            Self::ManualCheck => format!(
                "// {} is checked manually in the provider back office. No script required.",
                provider
            ),
            Self::NotConfigured => NOT_CONFIGURED_SCRIPT.to_string(),
        }
    }
}

/// Shared opening used by most provider groups
fn greeting(actor: &str) -> String {
    format!(
        "Hello sir this is {},\nPlease help us check member betting normal or not. Thank you.\n\n",
        actor
    )
}

fn render_pg_soft(fields: &TicketFields, actor: &str) -> String {
    match (fields.get(FieldId::ProviderAccount), fields.get(FieldId::TimeRange)) {
        (Some(account), Some(range)) => format!(
            "{}Agent Name：{}\nMember ID：{}\nTime period：{}",
            greeting(actor),
            HOUSE_MERCHANT,
            account,
            range
        ),
        _ => "// Waiting for Provider Account and Time Range...".to_string(),
    }
}

fn render_evolution(fields: &TicketFields, actor: &str) -> String {
    match fields.get(FieldId::TrackingId) {
        Some(tracking) => format!(
            "Hello sir this is {},\nRequesting check for Evolution Round.\n\nTracking ID: {}",
            actor, tracking
        ),
        None => "// Waiting for Tracking ID...".to_string(),
    }
}

fn render_pragmatic(fields: &TicketFields, actor: &str) -> String {
    match (fields.get(FieldId::MemberId), fields.get(FieldId::TimeRange)) {
        (Some(member), Some(range)) => format!(
            "{}Member ID：{}\nTime period：{}\nProvider name：Pragmatic Play",
            greeting(actor),
            member,
            range
        ),
        _ => "// Waiting for Member ID and Time Period...".to_string(),
    }
}

/// Evidence line for providers that accept either a reference or a window.
/// The reference wins when both are filled.
fn evidence_line(
    fields: &TicketFields,
    reference: FieldId,
    reference_label: &str,
) -> Option<String> {
    if let Some(r) = fields.get(reference) {
        return Some(format!("{}：{}", reference_label, r));
    }
    fields
        .get(FieldId::TimeRange)
        .map(|range| format!("Time period：{}", range))
}

fn render_jili(fields: &TicketFields, actor: &str) -> String {
    let evidence = evidence_line(fields, FieldId::BetTicket, "Bet ticket");
    match (
        fields.get(FieldId::ProviderAccount),
        fields.get(FieldId::Currency),
        evidence,
    ) {
        (Some(account), Some(currency), Some(evidence)) => format!(
            "{}Agent Name：{}{}\nMember ID：{}\n{}",
            greeting(actor),
            jili_agent_prefix(currency),
            HOUSE_MERCHANT,
            account,
            evidence
        ),
        _ => "// Waiting for Provider Account, Currency and Bet Ticket or Time Range..."
            .to_string(),
    }
}

fn render_sa_gaming(fields: &TicketFields, actor: &str) -> String {
    let evidence = evidence_line(fields, FieldId::RoundId, "Round ID");
    match (
        fields.get(FieldId::ProviderAccount),
        fields.get(FieldId::Currency),
        evidence,
    ) {
        (Some(account), Some(currency), Some(evidence)) => {
            let mut script = format!(
                "Hello SA team, this is {}.\nPlease help us check whether this member's \
                 betting is normal. Thank you.\n\n",
                actor
            );
            let lobby = sa_lobby_code(currency);
            if !lobby.is_empty() {
                script.push_str(&format!("Lobby：{}\n", lobby));
            }
            script.push_str(&format!("Username：{}\n{}", account, evidence));
            script
        }
        _ => "// Waiting for Provider Account, Currency and Round ID or Time Range...".to_string(),
    }
}

fn render_spadegaming(fields: &TicketFields, actor: &str) -> String {
    match (
        fields.get(FieldId::ProviderAccount),
        fields.get(FieldId::Currency),
        fields.get(FieldId::GameName),
        fields.get(FieldId::TimeRange),
        fields.get(FieldId::ReasonToCheck),
    ) {
        (Some(account), Some(currency), Some(game), Some(range), Some(reason)) => format!(
            "Hi SG team, this is {}.\nKindly help to check the member below.\n\n\
             Account：{}{}\nGame：{}\nTime period：{}\nReason：{}",
            actor,
            account,
            spade_account_suffix(currency),
            game,
            range,
            reason
        ),
        _ => "// Waiting for Provider Account, Currency, Game Name, Time Range and Reason..."
            .to_string(),
    }
}

fn render_cq9(fields: &TicketFields, actor: &str) -> String {
    match (
        fields.get(FieldId::ProviderAccount),
        fields.get(FieldId::Currency),
        fields.get(FieldId::TimeRange),
    ) {
        (Some(account), Some(currency), Some(range)) => {
            let mut script = format!(
                "Hello CQ9 team, this is {}.\nPlease help us check member betting normal \
                 or not. Thank you.\n\n",
                actor
            );
            let channel = cq9_channel(currency);
            if !channel.is_empty() {
                script.push_str(&format!("Channel：{}\n", channel));
            }
            script.push_str(&format!("Player：{}\nTime period：{}", account, range));
            script
        }
        _ => "// Waiting for Provider Account, Currency and Time Range...".to_string(),
    }
}
