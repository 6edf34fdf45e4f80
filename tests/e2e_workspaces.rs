//! End-to-end tests for workspace and membership workflows.
//!
//! These tests drive the actions against the in-memory repositories.
//! Run with: `cargo test --features mocks --test e2e_workspaces`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tenantry::actions::{
    AcceptInvitationAction, AddMemberAction, AddMemberInput, ChangeMemberRoleAction,
    ChangeMemberRoleInput, CreateWorkspaceAction, CreateWorkspaceInput, ListWorkspacesAction,
    ListWorkspacesInput, RemoveMemberAction, RemoveMemberInput, TransferOwnershipAction,
    TransferOwnershipInput,
};
use tenantry::events::{BusMessage, EventScope, Listener, ListenerRegistry, RecordingEventBus};
use tenantry::guards::{Denial, WorkspaceGuard};
use tenantry::messages::{Command, Query, WorkspaceCommand};
use tenantry::workspace::{WorkspaceIdentity, WorkspaceType};
use tenantry::{
    AccountId, Membership, MembershipRepository, MockMembershipRepository,
    MockWorkspaceRepository, Permission, Quota, Role, Slug, Workspace, WorkspaceId,
    WorkspaceRepository,
};

fn account(id: &str) -> AccountId {
    AccountId::parse(id).unwrap()
}

struct App {
    workspaces: MockWorkspaceRepository,
    memberships: MockMembershipRepository,
    bus: RecordingEventBus,
}

impl App {
    fn new() -> Self {
        Self {
            workspaces: MockWorkspaceRepository::new(),
            memberships: MockMembershipRepository::new(),
            bus: RecordingEventBus::new(),
        }
    }

    async fn create_workspace(&self, owner: &str, name: &str, quota: Quota) -> Workspace {
        let mut input = CreateWorkspaceInput::new(name, WorkspaceType::Team);
        input.quota = quota;

        CreateWorkspaceAction::new(&self.workspaces, &self.memberships, &self.bus)
            .execute(Command::command(account(owner), input))
            .await
            .unwrap()
            .workspace
    }

    async fn invite(
        &self,
        workspace_id: &WorkspaceId,
        actor: &str,
        invitee: &str,
        role: Role,
    ) -> tenantry::Result<Membership> {
        AddMemberAction::new(&self.workspaces, &self.memberships, &self.bus)
            .execute(WorkspaceCommand::workspace_command(
                account(actor),
                workspace_id.clone(),
                AddMemberInput {
                    account_id: account(invitee),
                    role,
                },
            ))
            .await
            .map(|added| added.membership)
    }

    async fn accept(&self, workspace_id: &WorkspaceId, invitee: &str) -> Membership {
        AcceptInvitationAction::new(&self.workspaces, &self.memberships, &self.bus)
            .execute(WorkspaceCommand::workspace_command(
                account(invitee),
                workspace_id.clone(),
                (),
            ))
            .await
            .unwrap()
    }

    async fn member_count(&self, workspace_id: &WorkspaceId) -> u64 {
        self.workspaces.get_member_count(workspace_id).await.unwrap()
    }
}

#[tokio::test]
async fn test_full_workspace_lifecycle() {
    let app = App::new();
    let ws = app.create_workspace("alice", "Design Team", Quota::free()).await;
    let ws_id = ws.id().clone();
    assert_eq!(ws.slug().as_str(), "design-team");

    // invite and accept
    let invitation = app.invite(&ws_id, "alice", "bob", Role::Editor).await.unwrap();
    assert!(invitation.is_pending());
    assert!(!app.memberships.is_member(&ws_id, &account("bob")).await.unwrap());

    let bob = app.accept(&ws_id, "bob").await;
    assert!(bob.is_active());
    assert_eq!(
        app.memberships.get_member_role(&ws_id, &account("bob")).await.unwrap(),
        Some(Role::Editor)
    );
    assert_eq!(app.member_count(&ws_id).await, 2);

    // promote to admin
    let bob = ChangeMemberRoleAction::new(&app.workspaces, &app.memberships, &app.bus)
        .execute(WorkspaceCommand::workspace_command(
            account("alice"),
            ws_id.clone(),
            ChangeMemberRoleInput {
                account_id: account("bob"),
                role: Role::Admin,
            },
        ))
        .await
        .unwrap();
    assert!(bob.has_permission(Permission::MemberRemove));

    // hand the workspace to bob
    let transferred = TransferOwnershipAction::new(&app.workspaces, &app.memberships, &app.bus)
        .execute(WorkspaceCommand::workspace_command(
            account("alice"),
            ws_id.clone(),
            TransferOwnershipInput {
                new_owner_id: account("bob"),
            },
        ))
        .await
        .unwrap();
    assert!(transferred.workspace.is_owner(&account("bob")));
    assert_eq!(transferred.previous_owner.role(), Role::Admin);

    // bob, now owner, removes alice
    let removed = RemoveMemberAction::new(&app.workspaces, &app.memberships, &app.bus)
        .execute(WorkspaceCommand::workspace_command(
            account("bob"),
            ws_id.clone(),
            RemoveMemberInput {
                account_id: account("alice"),
            },
        ))
        .await
        .unwrap();
    assert!(removed.membership.is_removed());
    assert_eq!(app.member_count(&ws_id).await, 1);

    let owner = app.memberships.find_owner(&ws_id).await.unwrap().unwrap();
    assert_eq!(owner.account_id(), &account("bob"));

    let types = app.bus.event_types();
    for expected in [
        "workspace.created",
        "membership.invited",
        "membership.joined",
        "membership.role_changed",
        "workspace.ownership_transferred",
        "membership.removed",
        "workspace.member_left",
    ] {
        assert!(types.iter().any(|t| t == expected), "missing {expected}");
    }
    assert!(
        app.bus
            .messages()
            .iter()
            .all(|m| m.scope == EventScope::Workspace(ws_id.clone()))
    );
}

#[tokio::test]
async fn test_quota_of_one_rejects_second_member() {
    let app = App::new();
    let ws = app
        .create_workspace("alice", "Solo", Quota::new(1, 1024, 1).unwrap())
        .await;

    let err = app.invite(ws.id(), "alice", "bob", Role::Viewer).await.unwrap_err();

    assert_eq!(err.code(), "quota_exceeded");
    assert_eq!(app.member_count(ws.id()).await, 1);
    assert!(
        app.memberships
            .find_by_workspace_and_account(ws.id(), &account("bob"))
            .await
            .unwrap()
            .is_none()
    );

    let mut direct = app.workspaces.find_by_id(ws.id()).await.unwrap().unwrap();
    assert!(direct.add_member().is_err());
    assert_eq!(direct.member_count(), 1);
}

#[test]
fn test_pending_membership_cannot_change_role() {
    let mut invitation = Membership::invite(
        WorkspaceId::parse("ws-1").unwrap(),
        account("bob"),
        Role::Viewer,
        account("alice"),
    );

    let err = invitation.update_role(Role::Admin).unwrap_err();

    assert!(err.is_business_rule());
    assert_eq!(invitation.role(), Role::Viewer);
}

#[test]
fn test_slug_normalization() {
    assert_eq!(Slug::from_text("Hello  World!").unwrap().as_str(), "hello-world");
    assert!(Slug::new("ab").unwrap_err().is_validation());
}

#[tokio::test]
async fn test_guard_reports_denials() {
    let app = App::new();
    let ws = app.create_workspace("alice", "Design Team", Quota::free()).await;
    app.invite(ws.id(), "alice", "bob", Role::Viewer).await.unwrap();

    let guard = WorkspaceGuard::new(&app.workspaces, &app.memberships);

    // invited but not accepted
    let pending = guard.can_access(ws.id(), &account("bob")).await.unwrap();
    assert!(matches!(pending.reason, Some(Denial::MembershipInactive { .. })));

    app.accept(ws.id(), "bob").await;
    assert!(guard.can_access(ws.id(), &account("bob")).await.unwrap().is_allowed());
    assert!(guard.can_modify(ws.id(), &account("bob")).await.unwrap().is_denied());
    assert!(guard.can_delete(ws.id(), &account("alice")).await.unwrap().is_allowed());

    let err = guard
        .can_manage_members(ws.id(), &account("mallory"))
        .await
        .unwrap()
        .into_result()
        .unwrap_err();
    assert_eq!(err.code(), "authorization.insufficient_role");
}

#[tokio::test]
async fn test_list_skips_deleted_workspaces() {
    let app = App::new();
    app.create_workspace("alice", "Alpha", Quota::free()).await;
    let beta = app.create_workspace("alice", "Beta", Quota::free()).await;
    app.create_workspace("carol", "Gamma", Quota::free()).await;

    let mut beta = app.workspaces.find_by_id(beta.id()).await.unwrap().unwrap();
    beta.delete().unwrap();
    app.workspaces.save(&beta).await.unwrap();

    let page = ListWorkspacesAction::new(&app.workspaces)
        .execute(Query::query(
            account("alice"),
            ListWorkspacesInput {
                page: 1,
                page_size: None,
            },
        ))
        .await
        .unwrap();

    let names: Vec<&str> = page.items.iter().map(Workspace::name).collect();
    assert_eq!(names, vec!["Alpha"]);
    assert_eq!(page.total_count, 1);
}

#[derive(Clone, Default)]
struct Collector {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Listener for Collector {
    async fn handle(&self, message: &BusMessage) {
        self.seen.lock().unwrap().push(message.event_type.clone());
    }
}

#[tokio::test]
async fn test_listener_registry_receives_action_events() {
    let collector = Collector::default();
    let mut registry = ListenerRegistry::new();
    registry.listen(collector.clone());

    let workspaces = MockWorkspaceRepository::new();
    let memberships = MockMembershipRepository::new();

    CreateWorkspaceAction::new(&workspaces, &memberships, &registry)
        .execute(Command::command(
            account("alice"),
            CreateWorkspaceInput::new("Design Team", WorkspaceType::Team),
        ))
        .await
        .unwrap();

    assert_eq!(
        *collector.seen.lock().unwrap(),
        vec!["workspace.created".to_owned(), "membership.joined".to_owned()]
    );
}

#[test]
fn test_identity_rejects_blank_name() {
    let slug = Slug::new("design").unwrap();
    assert!(WorkspaceIdentity::new("   ", slug).is_err());
}
