// src/models/permission.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Capability tokens. Stored by name in the 'permissions' table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    SessionRead,
    /// Read and list sessions owned by anyone.
    SessionReadAny,
    SessionCreate,
    SessionUpdate,
    SessionDelete,
    TestRead,
    TestCreate,
    TestUpdate,
    TestDelete,
    QuestionRead,
    QuestionCreate,
    QuestionUpdate,
    QuestionDelete,
    UserRead,
    UserCreate,
    UserUpdate,
    UserDelete,
    RoleManage,
}

impl Permission {
    pub const ALL: [Permission; 18] = [
        Permission::SessionRead,
        Permission::SessionReadAny,
        Permission::SessionCreate,
        Permission::SessionUpdate,
        Permission::SessionDelete,
        Permission::TestRead,
        Permission::TestCreate,
        Permission::TestUpdate,
        Permission::TestDelete,
        Permission::QuestionRead,
        Permission::QuestionCreate,
        Permission::QuestionUpdate,
        Permission::QuestionDelete,
        Permission::UserRead,
        Permission::UserCreate,
        Permission::UserUpdate,
        Permission::UserDelete,
        Permission::RoleManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::SessionRead => "session_read",
            Permission::SessionReadAny => "session_read_any",
            Permission::SessionCreate => "session_create",
            Permission::SessionUpdate => "session_update",
            Permission::SessionDelete => "session_delete",
            Permission::TestRead => "test_read",
            Permission::TestCreate => "test_create",
            Permission::TestUpdate => "test_update",
            Permission::TestDelete => "test_delete",
            Permission::QuestionRead => "question_read",
            Permission::QuestionCreate => "question_create",
            Permission::QuestionUpdate => "question_update",
            Permission::QuestionDelete => "question_delete",
            Permission::UserRead => "user_read",
            Permission::UserCreate => "user_create",
            Permission::UserUpdate => "user_update",
            Permission::UserDelete => "user_delete",
            Permission::RoleManage => "role_manage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPermission(pub String);

impl fmt::Display for UnknownPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown permission '{}'", self.0)
    }
}

impl std::error::Error for UnknownPermission {}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// A named bundle of permissions assignable to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<Permission>,
}
