//! Role editing for the admin users screen.
use super::draft::{same_members, toggle_member};
use crate::api::{AdminRole, AdminStatus, AdminUser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRolesDraft {
    user_id: String,
    original: Vec<AdminRole>,
    roles: Vec<AdminRole>,
}

impl UserRolesDraft {
    pub fn new(user: &AdminUser) -> Self {
        Self {
            user_id: user.user_id.clone(),
            original: user.roles.clone(),
            roles: user.roles.clone(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn toggle(&mut self, role: AdminRole) {
        toggle_member(&mut self.roles, role);
    }

    /// Selected roles in privilege order.
    pub fn roles(&self) -> Vec<AdminRole> {
        let mut roles = self.roles.clone();
        roles.sort();
        roles
    }

    pub fn is_dirty(&self) -> bool {
        !same_members(&self.roles, &self.original)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsersSummary {
    pub total: usize,
    pub admins: usize,
    pub moderators: usize,
    pub developers: usize,
    pub suspended: usize,
    pub banned: usize,
}

pub fn summarize_users(users: &[AdminUser]) -> UsersSummary {
    users.iter().fold(
        UsersSummary {
            total: users.len(),
            ..UsersSummary::default()
        },
        |mut summary, user| {
            if user.roles.contains(&AdminRole::Admin) {
                summary.admins += 1;
            }
            if user.roles.contains(&AdminRole::Moderator) {
                summary.moderators += 1;
            }
            if user.roles.contains(&AdminRole::Developer) {
                summary.developers += 1;
            }
            match user.status {
                AdminStatus::Suspended => summary.suspended += 1,
                AdminStatus::Banned => summary.banned += 1,
                AdminStatus::Active => {}
            }
            summary
        },
    )
}
