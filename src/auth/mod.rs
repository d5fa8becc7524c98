pub mod identity;
pub mod jwt;
pub mod password;
pub mod permission;
pub mod rbac;
pub mod role;
pub mod service;

pub use identity::Identity;
pub use permission::{Permission, PermissionSet};
pub use role::{permissions_for, permissions_for_name, role_definition, Role, RoleDefinition};
pub use service::{AuthenticationService, Credential, StaticCredentialService};
