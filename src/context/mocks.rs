#![allow(clippy::significant_drop_tightening)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::directory::{OrganizationDirectory, PartnerDirectory, TeamDirectory};
use super::types::{
    NewOrganization, NewPartner, NewTeam, OrganizationSummary, PartnerSummary, TeamSummary,
};
use crate::error::{Error, Result};
use crate::membership::Role;
use crate::values::{AccountId, OrganizationId, PartnerId, TeamId};

/// Turns a create request plus generated id into the listed entry.
trait Materialize<N>: Sized {
    fn materialize(id: &str, new: &N) -> Result<Self>;
}

impl Materialize<NewOrganization> for OrganizationSummary {
    fn materialize(id: &str, new: &NewOrganization) -> Result<Self> {
        Ok(Self {
            id: OrganizationId::parse(id)?,
            name: new.name.clone(),
            role: Role::Owner,
        })
    }
}

impl Materialize<NewTeam> for TeamSummary {
    fn materialize(id: &str, new: &NewTeam) -> Result<Self> {
        Ok(Self {
            id: TeamId::parse(id)?,
            organization_id: new.organization_id.clone(),
            name: new.name.clone(),
            role: Role::Owner,
        })
    }
}

impl Materialize<NewPartner> for PartnerSummary {
    fn materialize(id: &str, new: &NewPartner) -> Result<Self> {
        Ok(Self {
            id: PartnerId::parse(id)?,
            organization_id: new.organization_id.clone(),
            name: new.name.clone(),
            access_level: new.access_level,
        })
    }
}

struct Behaviour {
    fail_list: bool,
    fail_create: bool,
    omit_id: bool,
}

/// In-memory directory shared by the three directory mocks.
///
/// Every account sees the same listing. Clones share state, so a test can
/// keep one clone for inspection after handing another to the coordinator.
pub struct MockDirectory<S, N> {
    entries: Arc<RwLock<Vec<S>>>,
    created: Arc<RwLock<Vec<N>>>,
    behaviour: Arc<RwLock<Behaviour>>,
    list_calls: Arc<AtomicUsize>,
    create_calls: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
    prefix: &'static str,
}

pub type MockOrganizationDirectory = MockDirectory<OrganizationSummary, NewOrganization>;
pub type MockTeamDirectory = MockDirectory<TeamSummary, NewTeam>;
pub type MockPartnerDirectory = MockDirectory<PartnerSummary, NewPartner>;

impl<S, N> Clone for MockDirectory<S, N> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            created: Arc::clone(&self.created),
            behaviour: Arc::clone(&self.behaviour),
            list_calls: Arc::clone(&self.list_calls),
            create_calls: Arc::clone(&self.create_calls),
            next_id: Arc::clone(&self.next_id),
            prefix: self.prefix,
        }
    }
}

impl<S: Clone, N: Clone> MockDirectory<S, N> {
    fn with_prefix(prefix: &'static str) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            created: Arc::new(RwLock::new(Vec::new())),
            behaviour: Arc::new(RwLock::new(Behaviour {
                fail_list: false,
                fail_create: false,
                omit_id: false,
            })),
            list_calls: Arc::new(AtomicUsize::new(0)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicUsize::new(1)),
            prefix,
        }
    }

    /// Replace what `list_for_account` returns.
    pub fn set_entries(&self, entries: Vec<S>) {
        if let Ok(mut guard) = self.entries.write() {
            *guard = entries;
        }
    }

    pub fn entries(&self) -> Vec<S> {
        self.entries
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Every create request received, successful or not.
    pub fn created(&self) -> Vec<N> {
        self.created
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn fail_list(&self, fail: bool) {
        if let Ok(mut behaviour) = self.behaviour.write() {
            behaviour.fail_list = fail;
        }
    }

    pub fn fail_create(&self, fail: bool) {
        if let Ok(mut behaviour) = self.behaviour.write() {
            behaviour.fail_create = fail;
        }
    }

    /// Make `create` succeed without returning an id.
    pub fn omit_id(&self, omit: bool) {
        if let Ok(mut behaviour) = self.behaviour.write() {
            behaviour.omit_id = omit;
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn list(&self) -> Result<Vec<S>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let behaviour = self
            .behaviour
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        if behaviour.fail_list {
            return Err(Error::repository(format!("{} listing unavailable", self.prefix)));
        }

        let entries = self
            .entries
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        Ok(entries.clone())
    }

    fn insert(&self, new: N) -> Result<Option<String>>
    where
        S: Materialize<N>,
    {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut created = self
                .created
                .write()
                .map_err(|_| Error::repository("lock poisoned"))?;
            created.push(new.clone());
        }

        let (fail_create, omit_id) = {
            let behaviour = self
                .behaviour
                .read()
                .map_err(|_| Error::repository("lock poisoned"))?;
            (behaviour.fail_create, behaviour.omit_id)
        };
        if fail_create {
            return Err(Error::repository(format!("{} store unavailable", self.prefix)));
        }
        if omit_id {
            return Ok(None);
        }

        let id = format!("{}-{}", self.prefix, self.next_id.fetch_add(1, Ordering::SeqCst));
        let entry = S::materialize(&id, &new)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::repository("lock poisoned"))?;
        entries.push(entry);
        Ok(Some(id))
    }
}

impl MockOrganizationDirectory {
    pub fn new() -> Self {
        Self::with_prefix("org")
    }
}

impl Default for MockOrganizationDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTeamDirectory {
    pub fn new() -> Self {
        Self::with_prefix("team")
    }
}

impl Default for MockTeamDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPartnerDirectory {
    pub fn new() -> Self {
        Self::with_prefix("partner")
    }
}

impl Default for MockPartnerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationDirectory for MockOrganizationDirectory {
    async fn list_for_account(&self, _account_id: &AccountId) -> Result<Vec<OrganizationSummary>> {
        self.list()
    }

    async fn create(&self, organization: NewOrganization) -> Result<Option<String>> {
        self.insert(organization)
    }
}

#[async_trait]
impl TeamDirectory for MockTeamDirectory {
    async fn list_for_account(&self, _account_id: &AccountId) -> Result<Vec<TeamSummary>> {
        self.list()
    }

    async fn create(&self, team: NewTeam) -> Result<Option<String>> {
        self.insert(team)
    }
}

#[async_trait]
impl PartnerDirectory for MockPartnerDirectory {
    async fn list_for_account(&self, _account_id: &AccountId) -> Result<Vec<PartnerSummary>> {
        self.list()
    }

    async fn create(&self, partner: NewPartner) -> Result<Option<String>> {
        self.insert(partner)
    }
}
