//! Who is calling the engine.
//!
//! Customers only read. Employees and the built-in administrator may mutate
//! stock. The administrator has no table row and always uses id `0`.

use serde::{Deserialize, Serialize};

use crate::EngineError;

pub const ADMIN_ID: i32 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Employee,
    Admin,
}

impl ActorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Employee => "employee",
            Self::Admin => "admin",
        }
    }

    pub fn can_mutate_stock(self) -> bool {
        matches!(self, Self::Employee | Self::Admin)
    }
}

impl TryFrom<&str> for ActorRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "employee" => Ok(Self::Employee),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::Validation(format!("invalid role: {other}"))),
        }
    }
}

/// A resolved caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    pub id: i32,
    pub name: String,
}

impl Actor {
    pub fn admin() -> Self {
        Self {
            role: ActorRole::Admin,
            id: ADMIN_ID,
            name: "Administrator".to_string(),
        }
    }
}
