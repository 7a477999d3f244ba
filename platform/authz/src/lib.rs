//! Authorization for the directory resources.
//!
//! Access is decided by a static table keyed on `(resource, operation)`,
//! where the operation is derived from the HTTP method alone.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("{operation} on {resource} requires the {required} role")]
    Forbidden {
        resource: Resource,
        operation: Operation,
        required: Role,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Employee,
    Department,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Employee => "employee",
            Resource::Department => "department",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
}

impl Operation {
    /// GET and HEAD read; every other method writes.
    pub fn for_method(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") {
            Operation::Read
        } else {
            Operation::Write
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Read => "read",
            Operation::Write => "write",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "staff" => Some(Role::Staff),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum standing a caller needs for a rule to pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

/// The caller as far as authorization cares: anonymous, or a set of roles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subject {
    pub roles: Option<Vec<Role>>,
}

impl Subject {
    pub fn anonymous() -> Self {
        Self { roles: None }
    }

    pub fn authenticated(roles: Vec<Role>) -> Self {
        Self { roles: Some(roles) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.roles.is_some()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles
            .as_deref()
            .is_some_and(|roles| roles.iter().any(|held| *held >= role))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub resource: Resource,
    pub operation: Operation,
    pub access: Access,
}

/// Employees are readable by any signed-in user; departments by anyone.
/// Writes on both need an administrator.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule {
        resource: Resource::Employee,
        operation: Operation::Read,
        access: Access::Authenticated,
    },
    Rule {
        resource: Resource::Employee,
        operation: Operation::Write,
        access: Access::Role(Role::Admin),
    },
    Rule {
        resource: Resource::Department,
        operation: Operation::Read,
        access: Access::Public,
    },
    Rule {
        resource: Resource::Department,
        operation: Operation::Write,
        access: Access::Role(Role::Admin),
    },
];

#[derive(Clone, Debug)]
pub struct PolicyEngine {
    rules: &'static [Rule],
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RULES)
    }
}

impl PolicyEngine {
    pub fn new(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// Resources without a rule fall back to administrator only.
    pub fn access(&self, resource: Resource, operation: Operation) -> Access {
        self.rules
            .iter()
            .find(|rule| rule.resource == resource && rule.operation == operation)
            .map(|rule| rule.access)
            .unwrap_or(Access::Role(Role::Admin))
    }

    pub fn check(
        &self,
        subject: &Subject,
        resource: Resource,
        operation: Operation,
    ) -> Result<(), AuthzError> {
        match self.access(resource, operation) {
            Access::Public => Ok(()),
            _ if !subject.is_authenticated() => Err(AuthzError::Unauthenticated),
            Access::Authenticated => Ok(()),
            Access::Role(required) if subject.has_role(required) => Ok(()),
            Access::Role(required) => Err(AuthzError::Forbidden {
                resource,
                operation,
                required,
            }),
        }
    }
}
