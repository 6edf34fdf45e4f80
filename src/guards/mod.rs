//! Read-only authorization facades over the repositories.
//!
//! Every check returns a [`GuardResult`] instead of failing, so callers can
//! show the denial reason. Use [`GuardResult::into_result`] to turn a denial
//! into the matching [`Error`](crate::Error).

mod permission_checker;
mod quota_enforcer;
mod result;
mod workspace_guard;

pub use permission_checker::PermissionChecker;
pub use quota_enforcer::QuotaEnforcer;
pub use result::{Denial, GuardResult};
pub use workspace_guard::WorkspaceGuard;
