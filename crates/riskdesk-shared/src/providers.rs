//! Provider rule set.
//!
//! Each provider the desk can query is described by a static
//! `ProviderDescriptor`: which form fields a ticket needs (plain or
//! either-or groups), the option lists for select fields, whether the
//! provider has an electronic path at all, the SOP guide shown to the agent,
//! and the script template.
//!
//! The catalog is validated for shape once, when it is built. Call sites
//! never probe descriptors for optional behaviour.

use crate::error::CatalogError;
use crate::fields::{FieldId, TicketFields};
use crate::scripts::ScriptTemplate;
use crate::validator;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Currencies offered when a descriptor does not narrow the list
pub const DEFAULT_CURRENCIES: &[&str] = &[
    "IDR", "MYR", "CNY", "THB", "KRW", "USD", "VND", "PHP", "SGD",
];

/// Placeholder in SOP copy texts replaced by the actor name
pub const ACTOR_PLACEHOLDER: &str = "[Your Name]";

/// Every provider the desk offers in its picker.
/// Providers without a descriptor resolve to the not-configured sentinel.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "PokerQ",
    "BG Casino",
    "OG Plus",
    "PT Casino",
    "WM",
    "Sexy Casino",
    "DG Casino",
    "Opus Casino",
    "PA Casino",
    "ALLBET",
    "GP Casino",
    "SA Gaming",
    "Evolution Gaming",
    "PP Casino",
    "GClub Live",
    "Yeebet",
    "MG Live",
    "PT Slots",
    "MG+ Slot",
    "Pragmatic Play",
    "HBS",
    "PG Soft",
    "CQ9 Slots",
    "Spadegaming",
    "YGG",
    "Joker",
    "Playstar",
    "BNG",
    "DC",
    "AWC",
    "SKYWIND",
    "NETENT",
    "FastSpin",
    "JILI",
    "CG",
    "Next Spin",
    "RSG",
    "NoLimit City",
    "OG Slots",
    "Relax gaming",
    "Hacksaw",
    "YGR",
    "AdvantPlay",
    "Octoplay",
    "FatPanda",
    "2J",
    "GGSoft",
    "C-Sports",
    "SBO",
    "I-sports",
    "OPUS SPORT",
    "BTi",
    "IMSB",
    "Wbet",
    "QQKENO/QQThai/QQViet",
    "QQ4D",
];

/// One requirement of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Field must be present
    Field(FieldId),
    /// `anchor` must be present together with at least one of `either`
    EitherOf {
        anchor: FieldId,
        either: [FieldId; 2],
    },
}

impl Requirement {
    /// Every field this requirement mentions
    pub fn fields(&self) -> Vec<FieldId> {
        match self {
            Self::Field(f) => vec![*f],
            Self::EitherOf { anchor, either } => vec![*anchor, either[0], either[1]],
        }
    }
}

/// Option lists for select fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl ProviderOptions {
    /// Currencies for the picker, falling back to [`DEFAULT_CURRENCIES`]
    pub fn currency_choices(&self) -> Vec<String> {
        if self.currencies.is_empty() {
            DEFAULT_CURRENCIES.iter().map(|c| c.to_string()).collect()
        } else {
            self.currencies.clone()
        }
    }
}

/// One investigation step of the SOP guide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub text: String,
    /// Text the agent can copy; may contain [`ACTOR_PLACEHOLDER`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_text: Option<String>,
}

impl ProcessStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            copy_text: None,
        }
    }

    pub fn with_copy_text(mut self, copy_text: impl Into<String>) -> Self {
        self.copy_text = Some(copy_text.into());
        self
    }

    /// Copy text with the actor name filled in
    pub fn copy_text_for(&self, actor: &str) -> Option<String> {
        self.copy_text
            .as_ref()
            .map(|t| t.replace(ACTOR_PLACEHOLDER, actor))
    }
}

/// Standard operating procedure shown next to the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SopGuide {
    /// Where the request is submitted (group or portal)
    pub channel: String,
    pub sla: String,
    pub conditions: Vec<String>,
    pub process: Vec<ProcessStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
    /// Copyable query-condition message; may contain [`ACTOR_PLACEHOLDER`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_script: Option<String>,
}

impl SopGuide {
    pub fn new(channel: impl Into<String>, sla: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            sla: sla.into(),
            ..Default::default()
        }
    }

    pub fn condition(mut self, text: impl Into<String>) -> Self {
        self.conditions.push(text.into());
        self
    }

    pub fn step(mut self, step: ProcessStep) -> Self {
        self.process.push(step);
        self
    }

    pub fn reminder(mut self, text: impl Into<String>) -> Self {
        self.reminder = Some(text.into());
        self
    }

    pub fn with_condition_script(mut self, text: impl Into<String>) -> Self {
        self.condition_script = Some(text.into());
        self
    }

    /// Condition script with the actor name filled in
    pub fn condition_script_for(&self, actor: &str) -> Option<String> {
        self.condition_script
            .as_ref()
            .map(|t| t.replace(ACTOR_PLACEHOLDER, actor))
    }
}

/// Declarative description of one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub options: ProviderOptions,
    /// No electronic submission path
    pub manual_only: bool,
    /// Provider does not take loss-confirmation requests
    pub loss_confirmation_exempt: bool,
    pub sop: SopGuide,
    pub script: ScriptTemplate,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, script: ScriptTemplate) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            options: ProviderOptions::default(),
            manual_only: false,
            loss_confirmation_exempt: false,
            sop: SopGuide::default(),
            script,
        }
    }

    /// Sentinel returned for unknown providers
    pub fn not_configured(name: impl Into<String>) -> Self {
        Self {
            manual_only: true,
            ..Self::new(name, ScriptTemplate::NotConfigured)
        }
    }

    /// Manual-only descriptor: checked by hand, never submitted
    pub fn manual(name: impl Into<String>) -> Self {
        Self {
            manual_only: true,
            ..Self::new(name, ScriptTemplate::ManualCheck)
        }
    }

    pub fn require(mut self, field: FieldId) -> Self {
        self.requirements.push(Requirement::Field(field));
        self
    }

    pub fn require_either(mut self, anchor: FieldId, a: FieldId, b: FieldId) -> Self {
        self.requirements.push(Requirement::EitherOf {
            anchor,
            either: [a, b],
        });
        self
    }

    pub fn with_currencies(mut self, currencies: &[&str]) -> Self {
        self.options.currencies = currencies.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_reasons(mut self, reasons: &[&str]) -> Self {
        self.options.reasons = reasons.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn exempt_from_loss_confirmation(mut self) -> Self {
        self.loss_confirmation_exempt = true;
        self
    }

    pub fn with_sop(mut self, sop: SopGuide) -> Self {
        self.sop = sop;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.script != ScriptTemplate::NotConfigured
    }

    /// Every field mentioned by any requirement, in form order
    pub fn form_fields(&self) -> Vec<FieldId> {
        let mentioned: BTreeSet<FieldId> = self
            .requirements
            .iter()
            .flat_map(|r| r.fields())
            .collect();
        mentioned.into_iter().collect()
    }

    /// Whether the form should show `field`
    pub fn requires(&self, field: FieldId) -> bool {
        self.requirements
            .iter()
            .any(|r| r.fields().contains(&field))
    }

    /// Render the provider script; total and deterministic
    pub fn render(&self, fields: &TicketFields, actor: &str) -> String {
        self.script.render(&self.name, fields, actor)
    }

    pub fn is_submittable(&self, fields: &TicketFields, has_access_error: bool) -> bool {
        validator::is_submittable(self, fields, has_access_error)
    }

    /// Shape check run when the catalog is built
    pub fn check_shape(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let expected_manual = matches!(
            self.script,
            ScriptTemplate::ManualCheck | ScriptTemplate::NotConfigured
        );
        if self.manual_only != expected_manual {
            return Err(CatalogError::ScriptMismatch(self.name.clone()));
        }
        if self.manual_only {
            if !self.requirements.is_empty() {
                return Err(CatalogError::ManualWithRequirements(self.name.clone()));
            }
            return Ok(());
        }

        // A field may be named by exactly one requirement
        let mut seen = BTreeSet::new();
        for field in self.requirements.iter().flat_map(|r| r.fields()) {
            if !seen.insert(field) {
                return Err(CatalogError::RepeatedField {
                    provider: self.name.clone(),
                    field,
                });
            }
        }

        if seen.contains(&FieldId::ReasonToCheck) && self.options.reasons.is_empty() {
            return Err(CatalogError::MissingOptions {
                provider: self.name.clone(),
                field: FieldId::ReasonToCheck,
            });
        }

        for field in self.script.inputs() {
            if !seen.contains(field) {
                return Err(CatalogError::UncoveredScriptInput {
                    provider: self.name.clone(),
                    field: *field,
                });
            }
        }

        Ok(())
    }
}

/// Static descriptors shipped with the desk
pub fn builtin_descriptors() -> Vec<ProviderDescriptor> {
    vec![
        pg_soft(),
        evolution(),
        pragmatic_play(),
        jili(),
        sa_gaming(),
        spadegaming(),
        cq9_slots(),
        pa_casino(),
    ]
}

fn pg_soft() -> ProviderDescriptor {
    let sop = SopGuide::new(
        "QQ288- PG Soft Support交流群",
        "1 business day (excl. weekends/holidays)",
    )
    .condition("Member must have a minimum of 5 bets.")
    .condition("If member has betting records but PROFIT IS NEGATIVE (Loss) -> Do NOT submit.")
    .condition("If member has betting records and PROFIT IS POSITIVE -> Submit to group.")
    .step(ProcessStep::new("Check betting records & profit in BO."))
    .step(ProcessStep::new("If valid (Positive Profit), submit to provider group."))
    .step(ProcessStep::new("Wait for response."))
    .step(ProcessStep::new("Result Normal: Inform merchant member is normal."))
    .step(ProcessStep::new("Result Abnormal: Use 'Abnormal Betting' script."))
    .step(ProcessStep::new("Result Checked < 7 Days: Use 'Already Checked' script."))
    .reminder(
        "Do not copy the provider's tracking number or signature when replying to the merchant.",
    );

    ProviderDescriptor::new("PG Soft", ScriptTemplate::PgSoft)
        .require(FieldId::MemberId)
        .require(FieldId::ProviderAccount)
        .require(FieldId::TimeRange)
        .exempt_from_loss_confirmation()
        .with_sop(sop)
}

fn evolution() -> ProviderDescriptor {
    let sop = SopGuide::new("Evolution Back Office (Direct Check)", "Instant / 4 Hours")
        .condition("Check Transaction ID in EVO Portal.")
        .condition("Bet amount must exceed specified threshold.")
        .step(ProcessStep::new("Login to Evo Portal."))
        .step(ProcessStep::new("Search Round ID / Transaction ID."))
        .step(ProcessStep::new("Analyze video replay for anomalies."))
        .reminder("Download video proof if suspicious activity is found.");

    ProviderDescriptor::new("Evolution", ScriptTemplate::Evolution)
        .require(FieldId::TrackingId)
        .with_sop(sop)
}

fn pragmatic_play() -> ProviderDescriptor {
    let sop = SopGuide::new(
        "[T1] PP - FP [A-BT-LC-S] & QQ288 TECH SUPPORT SLOTS",
        "Refer to Group Pinned Message",
    )
    .condition("Ensure member has betting records in the specified time period.")
    .step(ProcessStep::new("Check member details in BO."))
    .step(ProcessStep::new("Submit query to the Telegram Group: [T1] PP - FP..."))
    .step(ProcessStep::new("Wait for provider feedback."))
    .reminder("Make sure to include the Provider Name 'Pragmatic Play' in the script.");

    ProviderDescriptor::new("Pragmatic Play", ScriptTemplate::PragmaticPlay)
        .require(FieldId::MemberId)
        .require(FieldId::TimeRange)
        .with_sop(sop)
}

fn jili() -> ProviderDescriptor {
    let sop = SopGuide::new("JILI x QQ288 Risk Group", "Same day (before 22:00 GMT+8)")
        .condition("Either a bet ticket number or a time period is accepted.")
        .condition("Provider account must be the JILI-side player name, not the member id.")
        .step(ProcessStep::new("Find the JILI player name in BO game records."))
        .step(ProcessStep::new(
            "Copy a bet ticket number when the member has a single suspicious round.",
        ))
        .step(ProcessStep::new("Otherwise use the time period of the suspicious session."))
        .step(ProcessStep::new("Submit the script to the risk group and wait for feedback."));

    ProviderDescriptor::new("JILI", ScriptTemplate::Jili)
        .require(FieldId::MemberId)
        .require(FieldId::Currency)
        .require_either(
            FieldId::ProviderAccount,
            FieldId::BetTicket,
            FieldId::TimeRange,
        )
        .with_currencies(&["IDR", "MYR", "THB", "VND", "USD"])
        .with_sop(sop)
}

fn sa_gaming() -> ProviderDescriptor {
    let lobby_reply = ProcessStep::new("If asked for the lobby, reply with the lobby line.")
        .with_copy_text(
            "Hello SA team, this is [Your Name]. The lobby is in the request above, thank you.",
        );
    let sop = SopGuide::new("SA Gaming Support (Skype)", "1 business day")
        .condition("Member must have live casino bets with the provider.")
        .step(ProcessStep::new("Check the lobby of the member's currency in BO."))
        .step(ProcessStep::new("Provide a round id for a single table, or a time period."))
        .step(lobby_reply);

    ProviderDescriptor::new("SA Gaming", ScriptTemplate::SaGaming)
        .require(FieldId::MemberId)
        .require(FieldId::Currency)
        .require_either(
            FieldId::ProviderAccount,
            FieldId::RoundId,
            FieldId::TimeRange,
        )
        .with_currencies(&["IDR", "MYR", "THB", "KRW", "USD"])
        .with_sop(sop)
}

fn spadegaming() -> ProviderDescriptor {
    let sop = SopGuide::new("SG Risk Control Group", "2 business days")
        .condition("A reason to check must be selected; requests without one are rejected.")
        .condition("Only slot and fishing games are checked.")
        .step(ProcessStep::new("Confirm the game name from BO records."))
        .step(ProcessStep::new("Select the reason that matches the betting pattern."))
        .step(ProcessStep::new("Submit to the group and wait for feedback."))
        .with_condition_script(
            "Hi SG team, this is [Your Name]. What is the minimum for a betting check? Thanks.",
        );

    ProviderDescriptor::new("Spadegaming", ScriptTemplate::Spadegaming)
        .require(FieldId::MemberId)
        .require(FieldId::ProviderAccount)
        .require(FieldId::Currency)
        .require(FieldId::GameName)
        .require(FieldId::TimeRange)
        .require(FieldId::ReasonToCheck)
        .with_currencies(&["IDR", "MYR", "THB", "CNY"])
        .with_reasons(&[
            "Member won consecutively with a high bet amount in a short period.",
            "Member bet pattern changed sharply right after a deposit.",
            "Member is suspected of using betting software or scripts.",
            "Member is suspected of sharing accounts or holding multiple accounts.",
        ])
        .with_sop(sop)
}

fn cq9_slots() -> ProviderDescriptor {
    let sop = SopGuide::new("Per-currency CQ9 support channel", "1 business day")
        .condition("Submit in the channel of the member's currency.")
        .step(ProcessStep::new("Check member profit in BO."))
        .step(ProcessStep::new("Submit the script in the matching channel."))
        .reminder("Unlisted currencies go to the general CQ9 channel without a channel line.");

    ProviderDescriptor::new("CQ9 Slots", ScriptTemplate::Cq9)
        .require(FieldId::MemberId)
        .require(FieldId::ProviderAccount)
        .require(FieldId::Currency)
        .require(FieldId::TimeRange)
        .with_currencies(&["IDR", "MYR", "THB", "VND"])
        .with_sop(sop)
}

fn pa_casino() -> ProviderDescriptor {
    let sop = SopGuide::new("PA Casino Back Office (Manual Check)", "Manual")
        .condition("No electronic submission path; check betting records by hand.")
        .step(ProcessStep::new("Login to the PA back office."))
        .step(ProcessStep::new("Review the member's bet history for the period."))
        .step(ProcessStep::new("Record the result on the ticket manually."));

    ProviderDescriptor::manual("PA Casino")
        .exempt_from_loss_confirmation()
        .with_sop(sop)
}

/// Validated provider catalog
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    descriptors: BTreeMap<String, ProviderDescriptor>,
    fallback: ProviderDescriptor,
}

impl ProviderCatalog {
    /// Catalog of the built-in descriptors
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_descriptors(builtin_descriptors())
    }

    /// Build a catalog, checking every descriptor's shape
    pub fn from_descriptors(descriptors: Vec<ProviderDescriptor>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for descriptor in descriptors {
            descriptor.check_shape()?;
            if map.contains_key(&descriptor.name) {
                return Err(CatalogError::DuplicateProvider(descriptor.name));
            }
            map.insert(descriptor.name.clone(), descriptor);
        }
        Ok(Self {
            descriptors: map,
            fallback: ProviderDescriptor::not_configured("Not configured"),
        })
    }

    /// Descriptor for `name`, or the not-configured sentinel
    pub fn get(&self, name: &str) -> &ProviderDescriptor {
        self.lookup(name).unwrap_or(&self.fallback)
    }

    pub fn lookup(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.descriptors.get(name)
    }

    /// Configured provider names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.keys().map(String::as_str).collect()
    }

    /// Names for the provider picker: known plus configured, sorted
    pub fn offered_providers(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = KNOWN_PROVIDERS.iter().map(|p| p.to_string()).collect();
        names.extend(self.descriptors.keys().cloned());
        names.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
