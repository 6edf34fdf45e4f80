use crate::config::PaginationConfig;
use crate::error::Result;
use crate::messages::Query;
use crate::pagination::{Page, Pagination};
use crate::workspace::{Workspace, WorkspaceRepository};

/// Which page of the actor's workspaces to return.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListWorkspacesInput {
    /// 1-based. Zero is rejected.
    pub page: u32,
    /// The configured default when `None`.
    pub page_size: Option<u32>,
}

/// Lists the workspaces the acting account owns or is billed for, oldest
/// first. Deleted workspaces are left out and do not count towards the
/// totals.
pub struct ListWorkspacesAction<W: WorkspaceRepository> {
    workspaces: W,
    config: PaginationConfig,
}

impl<W: WorkspaceRepository> ListWorkspacesAction<W> {
    pub fn new(workspaces: W) -> Self {
        Self::with_config(workspaces, PaginationConfig::default())
    }

    pub fn with_config(workspaces: W, config: PaginationConfig) -> Self {
        Self { workspaces, config }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_workspaces", skip_all, err)
    )]
    pub async fn execute(&self, query: Query<ListWorkspacesInput>) -> Result<Page<Workspace>> {
        let input = query.payload();
        let requested = self.config.request(input.page, input.page_size)?;
        let account_id = query.actor_id();

        let mut live = Vec::new();
        let mut cursor = Pagination::new(1, Pagination::MAX_PAGE_SIZE)?;
        loop {
            let batch = self
                .workspaces
                .find_by_account_id(account_id, cursor)
                .await?;
            let has_next = batch.has_next;
            live.extend(batch.items.into_iter().filter(|w| !w.is_deleted()));
            if !has_next {
                break;
            }
            cursor = cursor.next();
        }

        log::debug!(
            target: "tenantry",
            "msg=\"workspaces listed\", account_id={account_id}, live={}, page={}",
            live.len(),
            requested.page()
        );

        Ok(Page::paginate(live, requested))
    }
}
