use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::json;

use super::directory::{OrganizationDirectory, PartnerDirectory, TeamDirectory};
use super::types::{
    AccessLevel, Account, AppContext, AvailableContexts, ContextKind, ContextState,
    ContextSwitchEvent, CreationOutcome, NewOrganization, NewPartner, NewTeam,
    OrganizationSummary, PartnerSummary, RefreshOutcome, TeamSummary,
};
use crate::config::ContextConfig;
use crate::error::{AuthorizationError, Error, FieldError, Result};
use crate::events::{BusMessage, EventBus, EventScope};
use crate::membership::Role;
use crate::values::{AccountId, OrganizationId, PartnerId, TeamId, Timestamp};

const PRODUCER: &str = "tenantry::context";
const MAX_NAME_LEN: usize = 100;

/// Per-session owner of the acting-as context.
///
/// Holds the authenticated account, the contexts it may act as, the current
/// context and the switch history. Directory calls run without holding the
/// state lock. Refreshes and each kind of creation are switch-latest: when a
/// newer call of the same kind has started, an older call's result is
/// dropped and reported as superseded. A result that arrives after the
/// session's account changed or was cleared is dropped the same way.
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = ContextCoordinator::new(orgs, teams, partners, bus);
/// coordinator.set_account(Some(account)).await?;
///
/// let org = coordinator.snapshot()?.available.organizations[0].clone();
/// coordinator.switch_context(AppContext::from(&org)).await?;
/// ```
pub struct ContextCoordinator<O, T, P, B>
where
    O: OrganizationDirectory,
    T: TeamDirectory,
    P: PartnerDirectory,
    B: EventBus,
{
    organizations: O,
    teams: T,
    partners: P,
    bus: B,
    config: ContextConfig,
    state: RwLock<ContextState>,
    /// Bumped, under the state lock, whenever the account changes.
    session: AtomicU64,
    refresh_ticket: AtomicU64,
    organization_ticket: AtomicU64,
    team_ticket: AtomicU64,
    partner_ticket: AtomicU64,
}

impl<O, T, P, B> ContextCoordinator<O, T, P, B>
where
    O: OrganizationDirectory,
    T: TeamDirectory,
    P: PartnerDirectory,
    B: EventBus,
{
    pub fn new(organizations: O, teams: T, partners: P, bus: B) -> Self {
        Self::with_config(organizations, teams, partners, bus, ContextConfig::default())
    }

    pub fn with_config(
        organizations: O,
        teams: T,
        partners: P,
        bus: B,
        config: ContextConfig,
    ) -> Self {
        Self {
            organizations,
            teams,
            partners,
            bus,
            config,
            state: RwLock::new(ContextState::default()),
            session: AtomicU64::new(0),
            refresh_ticket: AtomicU64::new(0),
            organization_ticket: AtomicU64::new(0),
            team_ticket: AtomicU64::new(0),
            partner_ticket: AtomicU64::new(0),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ContextState>> {
        self.state
            .read()
            .map_err(|_| Error::repository("context state lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ContextState>> {
        self.state
            .write()
            .map_err(|_| Error::repository("context state lock poisoned"))
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Result<ContextState> {
        Ok(self.read()?.clone())
    }

    pub fn current(&self) -> Result<Option<AppContext>> {
        Ok(self.read()?.current.clone())
    }

    pub fn available(&self) -> Result<AvailableContexts> {
        Ok(self.read()?.available.clone())
    }

    pub fn account(&self) -> Result<Option<Account>> {
        Ok(self.read()?.account.clone())
    }

    fn require_account(&self) -> Result<Account> {
        self.require_session().map(|(account, _)| account)
    }

    /// The session account and its epoch, read together.
    fn require_session(&self) -> Result<(Account, u64)> {
        let state = self.read()?;
        let account = state
            .account
            .clone()
            .ok_or_else(Error::unauthenticated)?;
        Ok((account, self.session.load(Ordering::SeqCst)))
    }

    /// Drop the current session: later results from calls already in flight
    /// are discarded. Callers hold the write lock.
    fn end_session(&self, state: &mut ContextState) {
        self.session.fetch_add(1, Ordering::SeqCst);
        self.refresh_ticket.fetch_add(1, Ordering::SeqCst);
        *state = ContextState::default();
    }

    fn creation_is_current(&self, kind_ticket: &AtomicU64, ticket: u64, epoch: u64) -> bool {
        kind_ticket.load(Ordering::SeqCst) == ticket && self.session.load(Ordering::SeqCst) == epoch
    }

    /// Start, change or end the session's account.
    ///
    /// `None` clears everything. `Some` switches to the account's user
    /// context and loads what it may act as; a different account than before
    /// starts from an empty history.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "context_set_account", skip_all, err)
    )]
    pub async fn set_account(&self, account: Option<Account>) -> Result<RefreshOutcome> {
        let Some(account) = account else {
            self.end_session(&mut *self.write()?);
            log::info!(target: "tenantry", "msg=\"context cleared\"");
            return Ok(RefreshOutcome::Applied);
        };

        let switched = {
            let mut state = self.write()?;
            let same_account = state.account.as_ref().is_some_and(|a| a.id == account.id);
            if !same_account {
                self.end_session(&mut state);
            }
            state.account = Some(account.clone());

            let user = AppContext::user(&account);
            let already_user = state
                .current
                .as_ref()
                .is_some_and(|current| current.same_target(&user));
            if already_user {
                None
            } else {
                Some(self.record_switch(&mut state, user))
            }
        };

        if let Some((previous, event)) = switched {
            self.emit_switched(&account.id, previous.as_ref(), &event)
                .await;
        }

        log::info!(
            target: "tenantry",
            "msg=\"account set\", account_id={}",
            account.id
        );

        self.fetch(account).await
    }

    /// Reload the contexts the current account may act as.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "context_refresh", skip_all, err)
    )]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let account = self.require_account()?;
        self.fetch(account).await
    }

    async fn fetch(&self, account: Account) -> Result<RefreshOutcome> {
        let ticket = self.refresh_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let (organizations, teams, partners) = futures::join!(
            self.organizations.list_for_account(&account.id),
            self.teams.list_for_account(&account.id),
            self.partners.list_for_account(&account.id),
        );

        let applied = {
            let mut state = self.write()?;
            if self.refresh_ticket.load(Ordering::SeqCst) != ticket {
                None
            } else {
                match (organizations, teams, partners) {
                    (Ok(organizations), Ok(teams), Ok(partners)) => {
                        state.available = AvailableContexts {
                            organizations,
                            teams,
                            partners,
                        };
                        let lost_current = state.current.as_ref().is_some_and(|current| {
                            !matches!(current, AppContext::User { .. })
                                && !state.available.contains(current)
                        });
                        Some(Ok(lost_current.then(|| {
                            self.record_switch(&mut state, AppContext::user(&account))
                        })))
                    }
                    (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                        state.available = AvailableContexts::default();
                        Some(Err(e))
                    }
                }
            }
        };

        let fallback = match applied {
            None => {
                log::debug!(
                    target: "tenantry",
                    "msg=\"stale context refresh discarded\", account_id={}, ticket={ticket}",
                    account.id
                );
                return Ok(RefreshOutcome::Superseded);
            }
            Some(Err(e)) => {
                log::warn!(
                    target: "tenantry",
                    "msg=\"context refresh failed\", account_id={}, error=\"{e}\"",
                    account.id
                );
                return Err(e);
            }
            Some(Ok(fallback)) => fallback,
        };

        if let Some((previous, event)) = fallback {
            log::info!(
                target: "tenantry",
                "msg=\"current context no longer available, falling back to user\", account_id={}",
                account.id
            );
            self.emit_switched(&account.id, previous.as_ref(), &event)
                .await;
        }

        Ok(RefreshOutcome::Applied)
    }

    /// Act as `context` from now on.
    ///
    /// The user context must be the session's own; any other context must be
    /// among the available ones.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "context_switch", skip_all, err)
    )]
    pub async fn switch_context(&self, context: AppContext) -> Result<()> {
        let (account_id, previous, event) = {
            let mut state = self.write()?;
            let account_id = state
                .account
                .as_ref()
                .map(|a| a.id.clone())
                .ok_or_else(Error::unauthenticated)?;

            let allowed = match &context {
                AppContext::User {
                    account_id: target, ..
                } => target == &account_id,
                other => state.available.contains(other),
            };
            if !allowed {
                return Err(Error::from(AuthorizationError::NotResourceOwner {
                    actor: account_id.to_string(),
                    resource: format!("{}:{}", context.kind(), context.id()),
                }));
            }

            let (previous, event) = self.record_switch(&mut state, context);
            (account_id, previous, event)
        };

        self.emit_switched(&account_id, previous.as_ref(), &event)
            .await;
        Ok(())
    }

    /// Set `current` and append to the bounded history. Returns the previous
    /// context and the history entry.
    fn record_switch(
        &self,
        state: &mut ContextState,
        context: AppContext,
    ) -> (Option<AppContext>, ContextSwitchEvent) {
        let event = ContextSwitchEvent {
            kind: context.kind(),
            id: context.id().to_owned(),
            timestamp: Timestamp::now(),
        };

        state.history.push_back(event.clone());
        if let Some(limit) = self.config.history_limit {
            while state.history.len() > limit {
                state.history.pop_front();
            }
        }

        let previous = state.current.replace(context);
        (previous, event)
    }

    async fn emit_switched(
        &self,
        account_id: &AccountId,
        previous: Option<&AppContext>,
        event: &ContextSwitchEvent,
    ) {
        log::debug!(
            target: "tenantry",
            "msg=\"context switched\", account_id={account_id}, kind={}, id={}",
            event.kind,
            event.id
        );

        self.bus
            .emit(BusMessage {
                event_type: "context.switched".to_owned(),
                payload: json!({
                    "kind": event.kind,
                    "id": event.id,
                    "previous": previous.map(|p| json!({"kind": p.kind(), "id": p.id()})),
                }),
                scope: EventScope::Account(account_id.clone()),
                timestamp: event.timestamp,
                producer: PRODUCER,
            })
            .await;
    }

    async fn emit_failed(&self, account_id: &AccountId, kind: ContextKind, name: &str, reason: &str) {
        log::warn!(
            target: "tenantry",
            "msg=\"{kind} creation failed\", account_id={account_id}, name=\"{name}\", reason=\"{reason}\""
        );

        self.bus
            .emit(BusMessage::new(
                format!("{kind}.failed"),
                json!({ "name": name, "reason": reason }),
                EventScope::Account(account_id.clone()),
                PRODUCER,
            ))
            .await;
    }

    async fn emit_created(&self, account_id: &AccountId, context: &AppContext) {
        let kind = context.kind();
        log::info!(
            target: "tenantry",
            "msg=\"{kind} created\", account_id={account_id}, id={}",
            context.id()
        );

        self.bus
            .emit(BusMessage::new(
                format!("{kind}.created"),
                json!({ "id": context.id(), "name": context.name() }),
                EventScope::Account(account_id.clone()),
                PRODUCER,
            ))
            .await;
    }

    /// Turn the directory's answer into an id, or a failure reason.
    fn created_id(result: Result<Option<String>>) -> std::result::Result<String, String> {
        match result {
            Err(e) => Err(e.to_string()),
            Ok(Some(id)) if !id.trim().is_empty() => Ok(id),
            Ok(_) => Err("no id was returned".to_owned()),
        }
    }

    fn resolve_organization(&self, explicit: Option<OrganizationId>) -> Result<OrganizationId> {
        if let Some(id) = explicit {
            return Ok(id);
        }

        match &self.read()?.current {
            Some(AppContext::Organization {
                organization_id, ..
            }) => Ok(organization_id.clone()),
            _ => Err(Error::validation(FieldError::RequiredField {
                field: "organization_id",
            })),
        }
    }

    /// Create an organization owned by the session account and switch to it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "context_create_organization", skip_all, err)
    )]
    pub async fn create_organization(
        &self,
        name: &str,
    ) -> Result<CreationOutcome<OrganizationSummary>> {
        let (account, epoch) = self.require_session()?;
        let name = validate_name(name)?;
        let ticket = self.organization_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self
            .organizations
            .create(NewOrganization {
                name: name.clone(),
                owner_id: account.id.clone(),
            })
            .await;

        if !self.creation_is_current(&self.organization_ticket, ticket, epoch) {
            return Ok(CreationOutcome::Superseded);
        }

        let summary = match Self::created_id(result)
            .and_then(|id| OrganizationId::parse(&id).map_err(|e| e.to_string()))
        {
            Ok(id) => OrganizationSummary {
                id,
                name,
                role: Role::Owner,
            },
            Err(reason) => {
                self.emit_failed(&account.id, ContextKind::Organization, &name, &reason)
                    .await;
                return Ok(CreationOutcome::Failed { reason });
            }
        };

        let context = AppContext::from(&summary);
        let committed = {
            let mut state = self.write()?;
            if self.creation_is_current(&self.organization_ticket, ticket, epoch) {
                if !state.available.contains(&context) {
                    state.available.organizations.push(summary.clone());
                }
                Some(self.record_switch(&mut state, context.clone()))
            } else {
                None
            }
        };
        let Some((previous, event)) = committed else {
            return Ok(CreationOutcome::Superseded);
        };

        self.emit_created(&account.id, &context).await;
        self.emit_switched(&account.id, previous.as_ref(), &event)
            .await;
        Ok(CreationOutcome::Created(summary))
    }

    /// Create a team in `organization_id`, or in the current organization
    /// context when none is given, and switch to it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "context_create_team", skip_all, err)
    )]
    pub async fn create_team(
        &self,
        name: &str,
        organization_id: Option<OrganizationId>,
    ) -> Result<CreationOutcome<TeamSummary>> {
        let (account, epoch) = self.require_session()?;
        let name = validate_name(name)?;
        let organization_id = self.resolve_organization(organization_id)?;
        let ticket = self.team_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self
            .teams
            .create(NewTeam {
                name: name.clone(),
                organization_id: organization_id.clone(),
                created_by: account.id.clone(),
            })
            .await;

        if !self.creation_is_current(&self.team_ticket, ticket, epoch) {
            return Ok(CreationOutcome::Superseded);
        }

        let summary = match Self::created_id(result)
            .and_then(|id| TeamId::parse(&id).map_err(|e| e.to_string()))
        {
            Ok(id) => TeamSummary {
                id,
                organization_id,
                name,
                role: Role::Owner,
            },
            Err(reason) => {
                self.emit_failed(&account.id, ContextKind::Team, &name, &reason)
                    .await;
                return Ok(CreationOutcome::Failed { reason });
            }
        };

        let context = AppContext::from(&summary);
        let committed = {
            let mut state = self.write()?;
            if self.creation_is_current(&self.team_ticket, ticket, epoch) {
                if !state.available.contains(&context) {
                    state.available.teams.push(summary.clone());
                }
                Some(self.record_switch(&mut state, context.clone()))
            } else {
                None
            }
        };
        let Some((previous, event)) = committed else {
            return Ok(CreationOutcome::Superseded);
        };

        self.emit_created(&account.id, &context).await;
        self.emit_switched(&account.id, previous.as_ref(), &event)
            .await;
        Ok(CreationOutcome::Created(summary))
    }

    /// Create a partner relationship. Unlike organizations and teams, the
    /// session stays in its current context.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "context_create_partner", skip_all, err)
    )]
    pub async fn create_partner(
        &self,
        name: &str,
        organization_id: Option<OrganizationId>,
        access_level: AccessLevel,
    ) -> Result<CreationOutcome<PartnerSummary>> {
        let (account, epoch) = self.require_session()?;
        let name = validate_name(name)?;
        let organization_id = self.resolve_organization(organization_id)?;
        let ticket = self.partner_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self
            .partners
            .create(NewPartner {
                name: name.clone(),
                organization_id: organization_id.clone(),
                access_level,
                created_by: account.id.clone(),
            })
            .await;

        if !self.creation_is_current(&self.partner_ticket, ticket, epoch) {
            return Ok(CreationOutcome::Superseded);
        }

        let summary = match Self::created_id(result)
            .and_then(|id| PartnerId::parse(&id).map_err(|e| e.to_string()))
        {
            Ok(id) => PartnerSummary {
                id,
                organization_id,
                name,
                access_level,
            },
            Err(reason) => {
                self.emit_failed(&account.id, ContextKind::Partner, &name, &reason)
                    .await;
                return Ok(CreationOutcome::Failed { reason });
            }
        };

        let context = AppContext::from(&summary);
        {
            let mut state = self.write()?;
            if !self.creation_is_current(&self.partner_ticket, ticket, epoch) {
                return Ok(CreationOutcome::Superseded);
            }
            if !state.available.contains(&context) {
                state.available.partners.push(summary.clone());
            }
        }
        self.emit_created(&account.id, &context).await;
        Ok(CreationOutcome::Created(summary))
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation(FieldError::RequiredField { field: "name" }));
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(Error::validation(FieldError::InvalidLength {
            field: "name",
            min: 1,
            max: MAX_NAME_LEN,
            actual: len,
        }));
    }
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MockOrganizationDirectory, MockPartnerDirectory, MockTeamDirectory};
    use crate::events::RecordingEventBus;
    use crate::values::Email;

    type Coordinator = ContextCoordinator<
        MockOrganizationDirectory,
        MockTeamDirectory,
        MockPartnerDirectory,
        RecordingEventBus,
    >;

    struct Harness {
        coordinator: Coordinator,
        organizations: MockOrganizationDirectory,
        teams: MockTeamDirectory,
        partners: MockPartnerDirectory,
        bus: RecordingEventBus,
    }

    fn harness(config: ContextConfig) -> Harness {
        let organizations = MockOrganizationDirectory::new();
        let teams = MockTeamDirectory::new();
        let partners = MockPartnerDirectory::new();
        let bus = RecordingEventBus::new();
        let coordinator = ContextCoordinator::with_config(
            organizations.clone(),
            teams.clone(),
            partners.clone(),
            bus.clone(),
            config,
        );
        Harness {
            coordinator,
            organizations,
            teams,
            partners,
            bus,
        }
    }

    fn account(id: &str) -> Account {
        Account {
            id: AccountId::parse(id).unwrap(),
            email: Email::parse(format!("{id}@example.com")).unwrap(),
            display_name: id.to_uppercase(),
        }
    }

    fn org(id: &str) -> OrganizationSummary {
        OrganizationSummary {
            id: OrganizationId::parse(id).unwrap(),
            name: format!("Org {id}"),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn test_no_account_means_empty_state() {
        let h = harness(ContextConfig::default());
        h.coordinator.set_account(None).await.unwrap();

        let state = h.coordinator.snapshot().unwrap();
        assert!(state.current.is_none());
        assert!(state.available.is_empty());
        assert!(state.history.is_empty());
        assert_eq!(h.organizations.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_set_account_switches_to_user_and_loads() {
        let h = harness(ContextConfig::default());
        h.organizations.set_entries(vec![org("o1")]);

        let outcome = h.coordinator.set_account(Some(account("alice"))).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Applied);

        let state = h.coordinator.snapshot().unwrap();
        assert_eq!(state.current, Some(AppContext::user(&account("alice"))));
        assert_eq!(state.available.organizations, vec![org("o1")]);
        assert_eq!(state.history.len(), 1);
        assert_eq!(h.bus.event_types(), vec!["context.switched"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_available() {
        let h = harness(ContextConfig::default());
        h.organizations.set_entries(vec![org("o1")]);
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();

        h.teams.fail_list(true);
        assert!(h.coordinator.refresh().await.is_err());
        assert!(h.coordinator.available().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switch_requires_available_context() {
        let h = harness(ContextConfig::default());
        h.organizations.set_entries(vec![org("o1")]);
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();

        h.coordinator
            .switch_context(AppContext::from(&org("o1")))
            .await
            .unwrap();
        assert_eq!(
            h.coordinator.current().unwrap(),
            Some(AppContext::from(&org("o1")))
        );

        let err = h
            .coordinator
            .switch_context(AppContext::from(&org("o2")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "authorization.not_resource_owner");

        let err = h
            .coordinator
            .switch_context(AppContext::user(&account("mallory")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "authorization.not_resource_owner");
    }

    #[tokio::test]
    async fn test_switch_without_account() {
        let h = harness(ContextConfig::default());
        let err = h
            .coordinator
            .switch_context(AppContext::user(&account("alice")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "authorization.unauthenticated");
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let h = harness(ContextConfig {
            history_limit: Some(2),
        });
        h.organizations.set_entries(vec![org("o1"), org("o2")]);
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();

        for id in ["o1", "o2", "o1"] {
            h.coordinator
                .switch_context(AppContext::from(&org(id)))
                .await
                .unwrap();
        }

        let history = h.coordinator.snapshot().unwrap().history;
        let ids: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["o2", "o1"]);
    }

    #[tokio::test]
    async fn test_current_falls_back_when_removed() {
        let h = harness(ContextConfig::default());
        h.organizations.set_entries(vec![org("o1")]);
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();
        h.coordinator
            .switch_context(AppContext::from(&org("o1")))
            .await
            .unwrap();

        h.organizations.set_entries(Vec::new());
        h.coordinator.refresh().await.unwrap();

        assert_eq!(
            h.coordinator.current().unwrap(),
            Some(AppContext::user(&account("alice")))
        );
    }

    #[tokio::test]
    async fn test_new_account_resets_history() {
        let h = harness(ContextConfig::default());
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();
        h.coordinator.set_account(Some(account("bob"))).await.unwrap();

        let state = h.coordinator.snapshot().unwrap();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].id, "bob");
    }

    #[tokio::test]
    async fn test_create_organization_switches() {
        let h = harness(ContextConfig::default());
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();

        let created = h
            .coordinator
            .create_organization("Acme")
            .await
            .unwrap()
            .created()
            .unwrap();

        let state = h.coordinator.snapshot().unwrap();
        assert_eq!(state.current, Some(AppContext::from(&created)));
        assert!(state.available.organizations.contains(&created));
        assert_eq!(
            h.bus.event_types(),
            vec!["context.switched", "organization.created", "context.switched"]
        );
    }

    #[tokio::test]
    async fn test_created_entry_already_listed_is_not_duplicated() {
        let h = harness(ContextConfig::default());
        // the directory hands out org-1 next, and a refresh already listed it
        h.organizations.set_entries(vec![org("org-1")]);
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();

        let created = h
            .coordinator
            .create_organization("Acme")
            .await
            .unwrap()
            .created()
            .unwrap();

        let organizations = h.coordinator.available().unwrap().organizations;
        assert_eq!(organizations.len(), 1);
        assert_eq!(organizations[0].id, created.id);
        assert_eq!(
            h.coordinator.current().unwrap(),
            Some(AppContext::from(&created))
        );
    }

    #[tokio::test]
    async fn test_create_failure_goes_to_bus() {
        let h = harness(ContextConfig::default());
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();
        h.organizations.fail_create(true);

        let outcome = h.coordinator.create_organization("Acme").await.unwrap();
        assert!(matches!(outcome, CreationOutcome::Failed { .. }));

        let failed = h.bus.of_type("organization.failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].payload["name"], "Acme");
        assert!(h.coordinator.available().unwrap().organizations.is_empty());
    }

    #[tokio::test]
    async fn test_missing_id_is_a_failure() {
        let h = harness(ContextConfig::default());
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();
        h.teams.omit_id(true);

        let org_id = OrganizationId::parse("o1").unwrap();
        let outcome = h.coordinator.create_team("Core", Some(org_id)).await.unwrap();

        assert_eq!(
            outcome,
            CreationOutcome::Failed {
                reason: "no id was returned".to_owned()
            }
        );
        assert_eq!(h.bus.of_type("team.failed").len(), 1);
    }

    #[tokio::test]
    async fn test_team_uses_current_organization() {
        let h = harness(ContextConfig::default());
        h.organizations.set_entries(vec![org("o1")]);
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();
        h.coordinator
            .switch_context(AppContext::from(&org("o1")))
            .await
            .unwrap();

        let team = h
            .coordinator
            .create_team("Core", None)
            .await
            .unwrap()
            .created()
            .unwrap();

        assert_eq!(team.organization_id.as_str(), "o1");
        assert_eq!(h.teams.created()[0].organization_id.as_str(), "o1");
        assert_eq!(
            h.coordinator.current().unwrap(),
            Some(AppContext::from(&team))
        );
    }

    #[tokio::test]
    async fn test_preconditions_fail_before_any_call() {
        let h = harness(ContextConfig::default());

        let err = h.coordinator.create_organization("Acme").await.unwrap_err();
        assert_eq!(err.code(), "authorization.unauthenticated");

        h.coordinator.set_account(Some(account("alice"))).await.unwrap();
        assert!(h.coordinator.create_organization("  ").await.is_err());
        assert!(h.coordinator.create_team("X", None).await.is_err());

        assert_eq!(h.organizations.create_calls(), 0);
        assert_eq!(h.teams.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_partner_does_not_switch() {
        let h = harness(ContextConfig::default());
        h.coordinator.set_account(Some(account("alice"))).await.unwrap();

        let org_id = OrganizationId::parse("o1").unwrap();
        let partner = h
            .coordinator
            .create_partner("Vendor", Some(org_id), AccessLevel::Read)
            .await
            .unwrap()
            .created()
            .unwrap();

        let state = h.coordinator.snapshot().unwrap();
        assert_eq!(state.current, Some(AppContext::user(&account("alice"))));
        assert_eq!(state.available.partners, vec![partner]);
        assert_eq!(h.partners.create_calls(), 1);
        assert_eq!(h.bus.of_type("partner.created").len(), 1);
    }
}
