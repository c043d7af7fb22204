//! Ticket desk: the agent-facing workflow.
//!
//! Agent input flows through the resolver (owner + access check), the
//! validator (submit gate) and the provider script (preview). Submitted
//! tickets are shown optimistically and reconciled with the store's
//! answer and its change feed.

use crate::clipboard::{copy_script, ClipboardSink, NullClipboard};
use crate::config::Config;
use crate::directory::DutyDirectory;
use crate::reconciler::{Applied, Promotion, TicketReconciler};
use crate::resolver::{DutyResolver, Resolution};
use crate::store::{ChangeEvent, TicketStore};
use chrono::Utc;
use riskdesk_shared::completion::{
    completion_script, loss_confirmation_script, no_profit_script, profit_audit_script, row_script,
};
use riskdesk_shared::duty::DutyId;
use riskdesk_shared::error::{DeskError, StoreError};
use riskdesk_shared::fields::FieldId;
use riskdesk_shared::helpers::actor_name_from_email;
use riskdesk_shared::providers::{ProviderCatalog, ProviderDescriptor};
use riskdesk_shared::ticket::{
    self, Completion, PersistedId, Ticket, TicketForm, TicketId, TicketPatch, TicketStatus,
};
use riskdesk_shared::validator::{validate, Verdict};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// Live view of the form being filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub resolution: Resolution,
    pub verdict: Verdict,
    pub script: String,
}

impl Preview {
    pub fn can_submit(&self) -> bool {
        self.verdict.is_ready()
    }
}

pub struct TicketDesk {
    store: Arc<dyn TicketStore>,
    resolver: DutyResolver,
    catalog: ProviderCatalog,
    reconciler: TicketReconciler,
    clipboard: Box<dyn ClipboardSink>,
    acting_duty: DutyId,
    actor_name: String,
}

impl TicketDesk {
    pub fn new(
        store: Arc<dyn TicketStore>,
        resolver: DutyResolver,
        catalog: ProviderCatalog,
    ) -> Self {
        Self {
            store,
            resolver,
            catalog,
            reconciler: TicketReconciler::new(),
            clipboard: Box::new(NullClipboard),
            acting_duty: DutyId::Ic1,
            actor_name: riskdesk_shared::DEFAULT_ACTOR_NAME.to_string(),
        }
    }

    /// Desk with the file-backed directory and built-in catalog
    pub fn from_config(config: &Config, store: Arc<dyn TicketStore>) -> Result<Self, DeskError> {
        let directory = Arc::new(DutyDirectory::from_config(&config.directory));
        let resolver = DutyResolver::new(directory, config.resolver.clone());
        let catalog = ProviderCatalog::builtin()?;
        info!("Desk ready with {} configured providers", catalog.len());
        Ok(Self::new(store, resolver, catalog)
            .with_duty(config.desk.default_duty)
            .with_actor(&config.desk.actor_fallback))
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardSink>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_duty(mut self, duty: DutyId) -> Self {
        self.acting_duty = duty;
        self
    }

    pub fn with_actor(mut self, name: &str) -> Self {
        self.actor_name = name.to_string();
        self
    }

    /// Work name from the agent's email
    pub fn with_actor_email(self, email: Option<&str>) -> Self {
        let name = actor_name_from_email(email);
        self.with_actor(&name)
    }

    /// Seed the list from an initial fetch, newest first
    pub fn with_tickets(mut self, tickets: Vec<Ticket>) -> Self {
        self.reconciler = TicketReconciler::with_entries(tickets);
        self
    }

    pub fn set_duty(&mut self, duty: DutyId) {
        debug!("Acting duty {} -> {}", self.acting_duty, duty);
        self.acting_duty = duty;
    }

    pub fn acting_duty(&self) -> DutyId {
        self.acting_duty
    }

    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn descriptor(&self, provider: &str) -> &ProviderDescriptor {
        self.catalog.get(provider)
    }

    pub fn preview(&self, form: &TicketForm) -> Preview {
        let member_id = form.fields.raw(FieldId::MemberId).unwrap_or("");
        let resolution = self.resolver.resolve(member_id, self.acting_duty);
        let descriptor = self.catalog.get(&form.provider);
        Preview {
            verdict: validate(descriptor, &form.fields, resolution.has_access_error()),
            script: descriptor.render(&form.fields, &self.actor_name),
            resolution,
        }
    }

    /// Copy the preview script; placeholders are never copied
    pub fn copy_preview(&self, form: &TicketForm) -> bool {
        copy_script(self.clipboard.as_ref(), &self.preview(form).script)
    }

    /// Copy the provider's query-condition message, if it has one
    pub fn copy_condition_script(&self, provider: &str) -> bool {
        let sop = &self.catalog.get(provider).sop;
        match sop.condition_script_for(&self.actor_name) {
            Some(text) => copy_script(self.clipboard.as_ref(), &text),
            None => false,
        }
    }

    /// Validate, show optimistically, persist, then promote or roll back
    pub async fn submit(&mut self, form: &TicketForm) -> Result<PersistedId, DeskError> {
        let preview = self.preview(form);
        if let Some(error) = preview.resolution.access_error {
            return Err(DeskError::AccessViolation(error));
        }
        if !preview.verdict.is_ready() {
            return Err(DeskError::ValidationIncomplete(preview.verdict.issues));
        }

        let draft = Ticket::draft(form, self.acting_duty, &self.actor_name, Utc::now());
        let local = self.reconciler.create_local(draft.clone());

        let record = match self.store.insert(&draft).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Ticket insert failed, rolling back {}: {}", local, e);
                self.reconciler.rollback(local);
                return Err(DeskError::Persistence(e));
            }
        };
        let Some(id) = record.id.persisted() else {
            self.reconciler.rollback(local);
            return Err(StoreError::Rejected("store returned no id".to_string()).into());
        };

        match self.reconciler.promote(local, record) {
            Promotion::Orphaned(id) => {
                if let Err(e) = self.store.delete(id).await {
                    warn!("Failed to delete orphaned ticket {}: {}", id, e);
                }
            }
            Promotion::Discarded => debug!("Ticket {} deleted before it was shown", id),
            Promotion::Promoted { .. } | Promotion::Merged => {}
        }
        info!("Ticket {} logged for {}", id, form.member_id());
        Ok(id)
    }

    /// Optimistic edit, reverted when the store rejects it
    pub async fn edit(&mut self, id: TicketId, patch: TicketPatch) -> Result<(), DeskError> {
        let (persisted, current) = self.writable(id)?;
        if current.is_completed() {
            return Err(DeskError::AlreadyCompleted(id));
        }
        self.write_patch(persisted, current, patch).await
    }

    /// Optimistic delete, restored when the store rejects it
    pub async fn delete(&mut self, id: TicketId) -> Result<(), DeskError> {
        let (index, row) = self.reconciler.remove(id).ok_or(DeskError::NotFound(id))?;
        let Some(persisted) = id.persisted() else {
            // In-flight write; the promotion deletes the stored record
            return Ok(());
        };

        match self.store.delete(persisted).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {
                self.reconciler.forget(persisted);
                Ok(())
            }
            Err(e) => {
                warn!("Delete of {} failed, restoring: {}", persisted, e);
                self.reconciler.restore(index, row);
                Err(DeskError::Persistence(e))
            }
        }
    }

    /// Complete a ticket and copy the reply script
    pub async fn complete(
        &mut self,
        id: TicketId,
        completion: Completion,
    ) -> Result<String, DeskError> {
        let (persisted, current) = self.writable(id)?;
        let patch = current.completion_patch(&completion, Utc::now())?;
        let script = completion_script(&current, &completion, &self.actor_name);

        self.write_patch(persisted, current, patch).await?;
        copy_script(self.clipboard.as_ref(), &script);
        Ok(script)
    }

    /// Move every pending ticket to handover; returns how many moved
    pub async fn handover_all(&mut self) -> usize {
        let pending: Vec<Ticket> = self
            .reconciler
            .entries()
            .iter()
            .filter(|t| t.status == TicketStatus::Pending && !t.id.is_local())
            .cloned()
            .collect();

        let mut moved = 0;
        for ticket in pending {
            let Some(persisted) = ticket.id.persisted() else {
                continue;
            };
            let patch = TicketPatch::status(TicketStatus::Handover);
            match self.write_patch(persisted, ticket, patch).await {
                Ok(()) => moved += 1,
                Err(e) => warn!("Handover of {} failed: {}", persisted, e),
            }
        }
        info!("Handed over {} tickets", moved);
        moved
    }

    /// Copy the script for a ticket row
    pub fn copy_row(&self, id: TicketId) -> bool {
        match self.reconciler.get(id) {
            Some(ticket) => {
                let script = row_script(ticket, &self.actor_name);
                copy_script(self.clipboard.as_ref(), &script)
            }
            None => false,
        }
    }

    /// Loss-confirmation message for `provider`, copied to the clipboard
    pub fn copy_loss_confirmation(&self, provider: &str) -> String {
        let script = loss_confirmation_script(self.catalog.get(provider), &self.actor_name);
        copy_script(self.clipboard.as_ref(), &script);
        script
    }

    /// Copy the profit audit block for the form; `None` while the member id
    /// or the time range is blank
    pub fn copy_profit_audit(&self, form: &TicketForm) -> Option<String> {
        let script = profit_audit_script(form)?;
        copy_script(self.clipboard.as_ref(), &script);
        Some(script)
    }

    /// No-profit reply for `provider`, copied to the clipboard
    pub fn copy_no_profit(&self, provider: &str) -> String {
        let script = no_profit_script(provider, &self.actor_name);
        copy_script(self.clipboard.as_ref(), &script);
        script
    }

    pub fn apply_event(&mut self, event: ChangeEvent) -> Applied {
        self.reconciler.apply(event)
    }

    /// Fold every event already queued on `rx`; returns how many were read
    pub fn drain_events(&mut self, rx: &mut UnboundedReceiver<ChangeEvent>) -> usize {
        let mut count = 0;
        while let Ok(event) = rx.try_recv() {
            self.apply_event(event);
            count += 1;
        }
        count
    }

    /// Visible tickets, newest first
    pub fn tickets(&self) -> &[Ticket] {
        self.reconciler.entries()
    }

    pub fn get(&self, id: TicketId) -> Option<&Ticket> {
        self.reconciler.get(id)
    }

    pub fn search(&self, term: &str) -> Vec<&Ticket> {
        ticket::search(self.reconciler.entries(), term)
    }

    /// Visible persisted ticket, ready for a write
    fn writable(&self, id: TicketId) -> Result<(PersistedId, Ticket), DeskError> {
        let current = self
            .reconciler
            .get(id)
            .cloned()
            .ok_or(DeskError::NotFound(id))?;
        let persisted = id.persisted().ok_or(DeskError::WritePending(id))?;
        Ok((persisted, current))
    }

    async fn write_patch(
        &mut self,
        id: PersistedId,
        current: Ticket,
        patch: TicketPatch,
    ) -> Result<(), DeskError> {
        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        self.reconciler.replace(updated);

        if let Err(e) = self.store.update(id, &patch).await {
            warn!("Update of {} failed, reverting: {}", id, e);
            self.reconciler.replace(current);
            return Err(DeskError::Persistence(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::config::ResolverConfig;
    use crate::directory::{DirectoryLayout, StaticDirectorySource};
    use crate::store::MemoryTicketStore;
    use riskdesk_shared::validator::ValidationIssue;

    fn desk(store: Arc<MemoryTicketStore>, clipboard: Arc<MemoryClipboard>) -> TicketDesk {
        let directory = DutyDirectory::new(
            Box::new(StaticDirectorySource::new("h\nh\n017,Alpha,129,Bravo\n")),
            DirectoryLayout::default(),
        );
        directory.refresh();
        let resolver = DutyResolver::new(Arc::new(directory), ResolverConfig::default());
        TicketDesk::new(store, resolver, ProviderCatalog::builtin().unwrap())
            .with_clipboard(Box::new(clipboard))
            .with_actor_email(Some("alice@ops.example"))
    }

    fn fresh_desk() -> TicketDesk {
        desk(
            Arc::new(MemoryTicketStore::new()),
            Arc::new(MemoryClipboard::new()),
        )
    }

    fn pg_form(member: &str) -> TicketForm {
        TicketForm::new("PG Soft")
            .with(FieldId::MemberId, member)
            .with(FieldId::ProviderAccount, "gapi_1")
            .with(FieldId::TimeRange, "10:00-11:00")
    }

    #[test]
    fn test_preview() {
        let desk = fresh_desk();
        let preview = desk.preview(&pg_form("user@17"));
        assert_eq!(preview.resolution.owner_name, "Alpha");
        assert!(preview.can_submit());
        assert!(preview.script.starts_with("Hello sir this is alice,"));
    }

    #[test]
    fn test_copy_preview_skips_placeholder() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let desk = desk(Arc::new(MemoryTicketStore::new()), Arc::clone(&clipboard));
        assert!(!desk.copy_preview(&TicketForm::new("PG Soft")));
        assert!(desk.copy_preview(&pg_form("user@017")));
        assert_eq!(clipboard.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_access_violation() {
        let store = Arc::new(MemoryTicketStore::new());
        let mut desk = desk(Arc::clone(&store), Arc::new(MemoryClipboard::new()));
        let err = desk.submit(&pg_form("user@129")).await.unwrap_err();
        let denied = "Access Denied: Bravo is under IC2.";
        assert!(matches!(err, DeskError::AccessViolation(ref m) if m == denied));
        assert!(store.is_empty());
        assert!(desk.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_incomplete() {
        let mut desk = fresh_desk();
        let form = pg_form("user@017").with(FieldId::TimeRange, "");
        match desk.submit(&form).await {
            Err(DeskError::ValidationIncomplete(issues)) => {
                assert_eq!(issues, vec![ValidationIssue::Missing(FieldId::TimeRange)])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_then_echo_keeps_one_row() {
        let store = Arc::new(MemoryTicketStore::with_first_id(5001));
        let mut rx = store.subscribe();
        let mut desk = desk(Arc::clone(&store), Arc::new(MemoryClipboard::new()));

        let id = desk.submit(&pg_form("user@017")).await.unwrap();
        assert_eq!(id, PersistedId(5001));
        assert_eq!(desk.drain_events(&mut rx), 1);
        assert_eq!(desk.tickets().len(), 1);
        assert_eq!(desk.tickets()[0].id, TicketId::Persisted(PersistedId(5001)));
        assert_eq!(desk.tickets()[0].recorder, "alice");
    }

    #[tokio::test]
    async fn test_complete_copies_script() {
        let store = Arc::new(MemoryTicketStore::new());
        let clipboard = Arc::new(MemoryClipboard::new());
        let mut desk = desk(Arc::clone(&store), Arc::clone(&clipboard));
        let id = TicketId::Persisted(desk.submit(&pg_form("user@017")).await.unwrap());

        let script = desk.complete(id, Completion::Normal).await.unwrap();
        assert_eq!(clipboard.last(), Some(script));
        assert_eq!(desk.get(id).unwrap().status, TicketStatus::Normal);

        let again = desk.complete(id, Completion::Normal).await;
        assert!(matches!(again, Err(DeskError::AlreadyCompleted(_))));
    }
}
