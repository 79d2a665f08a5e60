//! Permission snapshot contract and evaluator.
//!
//! Authorization in Gatehouse is decided against an immutable
//! [`PermissionSnapshot`] assembled once at login (and again on token
//! refresh) and carried inside the signed access token. Every authorization
//! decision for the lifetime of the session — route guards and UI affordance
//! checks alike — runs the same pure predicate over that snapshot; nothing
//! here touches storage.
//!
//! A snapshot combines four sources of authority, checked in this order:
//!
//! 1. the global admin override ([`ADMIN_ROLE_NAME`] membership),
//! 2. grants attached directly to the user,
//! 3. grants reaching the user through an organization membership's role,
//! 4. grants attached to the organization itself.
//!
//! Two sentinel slugs are part of the contract and never ordinary data: the
//! resource slug [`WILDCARD_RESOURCE`] matches every resource, and the action
//! slug [`MANAGE_ACTION`] subsumes every action on the matched resource.
//!
//! # Example
//!
//! ```
//! use gatehouse_core::authz::{GrantView, PermissionSnapshot};
//!
//! let snapshot = PermissionSnapshot {
//!     is_admin: false,
//!     direct_grants: vec![GrantView {
//!         resource_slug: "user".into(),
//!         action_slugs: vec!["view".into()],
//!     }],
//!     memberships: vec![],
//! };
//!
//! assert!(snapshot.allows("user", "view", None));
//! assert!(!snapshot.allows("user", "delete", None));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Resource slug that matches every resource.
pub const WILDCARD_RESOURCE: &str = "*";

/// Action slug that subsumes every action on the matched resource.
pub const MANAGE_ACTION: &str = "manage";

/// Name of the global role whose holders bypass all permission checks.
/// Matched exactly and case-sensitively against global role names.
pub const ADMIN_ROLE_NAME: &str = "ADMIN";

/// A single grant as the evaluator sees it: one resource slug and the action
/// slugs attached to it. Grants are flattened to this shape when the snapshot
/// is built; the evaluator never learns which table a grant came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GrantView {
    pub resource_slug: String,
    pub action_slugs: Vec<String>,
}

impl GrantView {
    /// Whether this grant covers the requested resource and action.
    ///
    /// The resource matches on equality or the `*` wildcard; the action
    /// matches on equality or the `manage` umbrella. A grant with an empty
    /// action list matches nothing — malformed rows fail closed.
    pub fn matches(&self, resource_slug: &str, action_slug: &str) -> bool {
        (self.resource_slug == resource_slug || self.resource_slug == WILDCARD_RESOURCE)
            && self
                .action_slugs
                .iter()
                .any(|a| a == action_slug || a == MANAGE_ACTION)
    }
}

/// The grants a principal holds through one root-organization membership:
/// the grants of the role assigned within the organization (empty when the
/// membership has no role) and the organization's own grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MembershipSnapshot {
    pub organization_id: Uuid,
    pub role_grants: Vec<GrantView>,
    pub organization_grants: Vec<GrantView>,
}

impl MembershipSnapshot {
    /// Role grants first, then organization grants; either suffices.
    fn grants(&self, resource_slug: &str, action_slug: &str) -> bool {
        self.role_grants
            .iter()
            .any(|g| g.matches(resource_slug, action_slug))
            || self
                .organization_grants
                .iter()
                .any(|g| g.matches(resource_slug, action_slug))
    }
}

/// Immutable projection of a principal's authority, built once per session.
///
/// The snapshot is embedded verbatim in the access token, so this type is the
/// wire contract between the snapshot builder and every evaluation site. It
/// must serialize losslessly; field renames are wire-breaking changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionSnapshot {
    pub is_admin: bool,
    pub direct_grants: Vec<GrantView>,
    pub memberships: Vec<MembershipSnapshot>,
}

impl PermissionSnapshot {
    /// A snapshot that denies everything. Valid — a principal with no grants
    /// authenticates fine and simply cannot do anything.
    pub fn empty() -> Self {
        Self {
            is_admin: false,
            direct_grants: Vec::new(),
            memberships: Vec::new(),
        }
    }

    /// Decides whether the principal may perform `action_slug` on
    /// `resource_slug`, optionally scoped to one organization.
    ///
    /// Pure and side-effect free: no logging, no storage access, no
    /// mutation. Safe to call concurrently from any number of tasks.
    ///
    /// Decision procedure, short-circuiting in order:
    ///
    /// 1. Global admins are allowed everything, including actions on
    ///    resources that do not exist.
    /// 2. A matching direct grant allows regardless of organization scope.
    /// 3. With `Some(organization_id)`: the principal must hold a membership
    ///    in that organization — otherwise deny, no matter what they hold
    ///    elsewhere. Within the membership, role grants are checked before
    ///    organization grants; either suffices.
    /// 4. With `None`: the check passes if it would pass inside at least one
    ///    of the principal's memberships.
    /// 5. Otherwise deny.
    pub fn allows(
        &self,
        resource_slug: &str,
        action_slug: &str,
        organization_id: Option<Uuid>,
    ) -> bool {
        if self.is_admin {
            return true;
        }

        if self
            .direct_grants
            .iter()
            .any(|g| g.matches(resource_slug, action_slug))
        {
            return true;
        }

        match organization_id {
            Some(org_id) => self
                .membership(org_id)
                .is_some_and(|m| m.grants(resource_slug, action_slug)),
            None => self
                .memberships
                .iter()
                .any(|m| m.grants(resource_slug, action_slug)),
        }
    }

    /// Guard wrapper around [`allows`](Self::allows): `Ok(())` on grant,
    /// [`AccessDenied`] on refusal. Callers must stop processing on `Err`
    /// before touching storage.
    pub fn require(
        &self,
        resource_slug: &str,
        action_slug: &str,
        organization_id: Option<Uuid>,
    ) -> Result<(), AccessDenied> {
        if self.allows(resource_slug, action_slug, organization_id) {
            Ok(())
        } else {
            Err(AccessDenied {
                resource_slug: resource_slug.to_string(),
                action_slug: action_slug.to_string(),
                organization_id,
            })
        }
    }

    /// The membership for `organization_id`, if the principal holds one.
    pub fn membership(&self, organization_id: Uuid) -> Option<&MembershipSnapshot> {
        self.memberships
            .iter()
            .find(|m| m.organization_id == organization_id)
    }
}

/// Refusal returned by [`PermissionSnapshot::require`].
///
/// Carries the denied query for server-side tracing. Its `Display` output is
/// deliberately opaque — responses must not reveal which rule refused access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub resource_slug: String,
    pub action_slug: String,
    pub organization_id: Option<Uuid>,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Access denied")
    }
}

impl std::error::Error for AccessDenied {}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(resource: &str, actions: &[&str]) -> GrantView {
        GrantView {
            resource_slug: resource.to_string(),
            action_slugs: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn membership(org_id: Uuid, role: Vec<GrantView>, org: Vec<GrantView>) -> MembershipSnapshot {
        MembershipSnapshot {
            organization_id: org_id,
            role_grants: role,
            organization_grants: org,
        }
    }

    #[test]
    fn admin_is_allowed_everything() {
        let snapshot = PermissionSnapshot {
            is_admin: true,
            direct_grants: vec![],
            memberships: vec![],
        };

        let org = Uuid::new_v4();
        assert!(snapshot.allows("user", "delete", None));
        assert!(snapshot.allows("organization", "edit", Some(org)));
        assert!(snapshot.allows("no-such-resource", "no-such-action", None));
        assert!(snapshot.allows("no-such-resource", "no-such-action", Some(org)));
    }

    #[test]
    fn admin_overrides_non_membership_denial() {
        // Org-scoped queries are membership-gated for everyone except admins.
        let snapshot = PermissionSnapshot {
            is_admin: true,
            direct_grants: vec![],
            memberships: vec![],
        };
        assert!(snapshot.allows("report", "view", Some(Uuid::new_v4())));
    }

    #[test]
    fn wildcard_resource_covers_any_resource_for_granted_actions_only() {
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("*", &["view"])],
            memberships: vec![],
        };

        assert!(snapshot.allows("anything", "view", None));
        assert!(snapshot.allows("user", "view", None));
        assert!(!snapshot.allows("anything", "delete", None));
    }

    #[test]
    fn manage_subsumes_every_action_on_matched_resource() {
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("user", &["manage"])],
            memberships: vec![],
        };

        for action in ["view", "create", "edit", "delete", "anything-else"] {
            assert!(snapshot.allows("user", action, None));
            assert!(!snapshot.allows("other", action, None));
        }
    }

    #[test]
    fn role_grant_is_scoped_to_its_organization() {
        let org_a = Uuid::new_v4();
        let org_b = Uuid::new_v4();
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![],
            memberships: vec![membership(org_a, vec![grant("report", &["view"])], vec![])],
        };

        assert!(snapshot.allows("report", "view", Some(org_a)));
        assert!(!snapshot.allows("report", "view", Some(org_b)));
        // Unscoped query falls through to the any-membership rule.
        assert!(snapshot.allows("report", "view", None));
    }

    #[test]
    fn non_membership_denies_regardless_of_membership_grants_elsewhere() {
        let org_a = Uuid::new_v4();
        let stranger_org = Uuid::new_v4();
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![],
            memberships: vec![membership(
                org_a,
                vec![grant("*", &["manage"])],
                vec![grant("*", &["manage"])],
            )],
        };

        assert!(!snapshot.allows("user", "view", Some(stranger_org)));
    }

    #[test]
    fn direct_grant_satisfies_org_scoped_query_before_membership_gating() {
        // Direct grants are checked at step 2, ahead of the membership
        // lookup, so they apply to scoped queries too.
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("user", &["view"])],
            memberships: vec![],
        };

        assert!(snapshot.allows("user", "view", Some(Uuid::new_v4())));
        assert!(!snapshot.allows("user", "edit", Some(Uuid::new_v4())));
    }

    #[test]
    fn organization_grants_are_checked_after_role_grants() {
        let org = Uuid::new_v4();
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![],
            memberships: vec![membership(
                org,
                vec![],
                vec![grant("invoice", &["create"])],
            )],
        };

        // No role grants at all; the organization grant alone suffices.
        assert!(snapshot.allows("invoice", "create", Some(org)));
        assert!(snapshot.allows("invoice", "create", None));
        assert!(!snapshot.allows("invoice", "delete", Some(org)));
    }

    #[test]
    fn evaluation_is_pure_and_repeatable() {
        let org = Uuid::new_v4();
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("organization", &["view", "create"])],
            memberships: vec![membership(org, vec![grant("user", &["manage"])], vec![])],
        };
        let before = snapshot.clone();

        for _ in 0..3 {
            assert!(snapshot.allows("organization", "create", None));
            assert!(!snapshot.allows("organization", "delete", None));
            assert!(snapshot.allows("user", "delete", Some(org)));
        }

        assert_eq!(snapshot, before);
    }

    #[test]
    fn scenario_direct_grants_only() {
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("organization", &["view", "create"])],
            memberships: vec![],
        };

        assert!(snapshot.allows("organization", "create", None));
        assert!(!snapshot.allows("organization", "delete", None));
        assert!(!snapshot.allows("user", "view", None));
    }

    #[test]
    fn scenario_single_membership_manage_role() {
        let org_1 = Uuid::new_v4();
        let org_2 = Uuid::new_v4();
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![],
            memberships: vec![membership(org_1, vec![grant("user", &["manage"])], vec![])],
        };

        assert!(snapshot.allows("user", "delete", Some(org_1)));
        assert!(!snapshot.allows("user", "delete", Some(org_2)));
        assert!(snapshot.allows("user", "delete", None));
    }

    #[test]
    fn scenario_empty_action_list_grants_nothing() {
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("user", &[])],
            memberships: vec![],
        };

        for action in ["view", "create", "edit", "delete", "manage"] {
            assert!(!snapshot.allows("user", action, None));
        }
    }

    #[test]
    fn empty_snapshot_denies_everything() {
        let snapshot = PermissionSnapshot::empty();
        assert!(!snapshot.allows("user", "view", None));
        assert!(!snapshot.allows("*", "manage", None));
        assert!(!snapshot.allows("user", "view", Some(Uuid::new_v4())));
    }

    #[test]
    fn wildcard_slugs_in_the_query_are_ordinary_data() {
        // Asking for resource "*" only matches a grant whose resource is "*";
        // asking for action "manage" only passes when "manage" is granted.
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("user", &["view"])],
            memberships: vec![],
        };

        assert!(!snapshot.allows("*", "view", None));
        assert!(!snapshot.allows("user", "manage", None));
    }

    #[test]
    fn require_grants_and_denies() {
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("role", &["view"])],
            memberships: vec![],
        };

        assert!(snapshot.require("role", "view", None).is_ok());

        let denied = snapshot.require("role", "delete", None).unwrap_err();
        assert_eq!(denied.resource_slug, "role");
        assert_eq!(denied.action_slug, "delete");
        assert_eq!(denied.organization_id, None);
        // The rendered message never explains which rule refused.
        assert_eq!(denied.to_string(), "Access denied");
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let org = Uuid::new_v4();
        let snapshot = PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("user", &["view", "edit"])],
            memberships: vec![membership(
                org,
                vec![grant("report", &["view"])],
                vec![grant("*", &["manage"])],
            )],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: PermissionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn admin_role_name_is_exact_and_case_sensitive() {
        assert_eq!(ADMIN_ROLE_NAME, "ADMIN");
        assert_ne!(ADMIN_ROLE_NAME, "admin");
        assert_ne!(ADMIN_ROLE_NAME, "Admin");
    }
}
