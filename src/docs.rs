use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use gatehouse_core::authz::{GrantView, MembershipSnapshot, PermissionSnapshot};
use gatehouse_core::pagination::{PaginationMeta, PaginationParams};

use crate::modules::actions::model::{Action, ActionWithUsage, CreateActionDto, UpdateActionDto};
use crate::modules::auth::model::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RegisterResponse,
};
use crate::modules::dashboard::model::DashboardStats;
use crate::modules::organizations::model::{
    AddUsersDto, AddUsersResponse, CreateOrganizationDto, Organization, OrganizationDetail,
    OrganizationMemberView, OrganizationSummary, OrganizationWithCounts, UpdateOrganizationDto,
};
use crate::modules::permissions::model::{
    CreatePermissionDto, PaginatedPermissionsResponse, PermissionResponse, RoleTargetSummary,
    UpdatePermissionDto,
};
use crate::modules::resources::model::{
    CreateResourceDto, Resource, ResourceWithUsage, UpdateResourceDto,
};
use crate::modules::roles::model::{
    CreateRoleDto, Role, RoleDetail, RoleSummary, RoleWithGrants, UpdateRoleDto,
};
use crate::modules::security_logs::model::{PaginatedSecurityLogsResponse, SecurityLog};
use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, UserResponse, UserSummary,
    UserWithRoles,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::dashboard::controller::get_stats,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_available_users,
        crate::modules::users::controller::get_user_by_id,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::organizations::controller::get_organizations,
        crate::modules::organizations::controller::get_available_parents,
        crate::modules::organizations::controller::get_organization_by_id,
        crate::modules::organizations::controller::create_organization,
        crate::modules::organizations::controller::update_organization,
        crate::modules::organizations::controller::delete_organization,
        crate::modules::organizations::controller::add_users,
        crate::modules::roles::controller::get_roles,
        crate::modules::roles::controller::get_role_by_id,
        crate::modules::roles::controller::create_role,
        crate::modules::roles::controller::update_role,
        crate::modules::roles::controller::delete_role,
        crate::modules::permissions::controller::get_permissions,
        crate::modules::permissions::controller::get_permission_by_id,
        crate::modules::permissions::controller::create_permission,
        crate::modules::permissions::controller::update_permission,
        crate::modules::permissions::controller::delete_permission,
        crate::modules::resources::controller::get_resources,
        crate::modules::resources::controller::get_resource_by_id,
        crate::modules::resources::controller::create_resource,
        crate::modules::resources::controller::update_resource,
        crate::modules::resources::controller::delete_resource,
        crate::modules::actions::controller::get_actions,
        crate::modules::actions::controller::get_action_by_id,
        crate::modules::actions::controller::create_action,
        crate::modules::actions::controller::update_action,
        crate::modules::actions::controller::delete_action,
        crate::modules::security_logs::controller::get_security_logs,
    ),
    components(
        schemas(
            GrantView,
            MembershipSnapshot,
            PermissionSnapshot,
            PaginationMeta,
            PaginationParams,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            DashboardStats,
            UserResponse,
            UserSummary,
            UserWithRoles,
            CreateUserDto,
            UpdateUserDto,
            PaginatedUsersResponse,
            Organization,
            OrganizationSummary,
            OrganizationWithCounts,
            OrganizationMemberView,
            OrganizationDetail,
            CreateOrganizationDto,
            UpdateOrganizationDto,
            AddUsersDto,
            AddUsersResponse,
            Role,
            RoleSummary,
            RoleWithGrants,
            RoleDetail,
            CreateRoleDto,
            UpdateRoleDto,
            PermissionResponse,
            RoleTargetSummary,
            CreatePermissionDto,
            UpdatePermissionDto,
            PaginatedPermissionsResponse,
            Resource,
            ResourceWithUsage,
            CreateResourceDto,
            UpdateResourceDto,
            Action,
            ActionWithUsage,
            CreateActionDto,
            UpdateActionDto,
            SecurityLog,
            PaginatedSecurityLogsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and session refresh"),
        (name = "Dashboard", description = "Aggregate statistics"),
        (name = "Users", description = "User management"),
        (name = "Organizations", description = "Organization tree and membership management"),
        (name = "Roles", description = "Role management"),
        (name = "Permissions", description = "Permission grant management"),
        (name = "Resources", description = "Resource catalog"),
        (name = "Actions", description = "Action catalog"),
        (name = "Security Logs", description = "Authentication audit trail"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
