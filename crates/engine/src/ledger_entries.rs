//! Stock movements.
//!
//! Every change to a stock row's quantity is recorded as one ledger entry.
//! An entry names exactly one counterparty: the supplier of an `IN`, the
//! customer of an `OUT`, or the peer warehouse of a transfer leg.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    In,
    Out,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }

    /// Signed effect of `quantity` units of this kind on a stock row.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            Self::In => quantity,
            Self::Out => -quantity,
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            other => Err(EngineError::Validation(format!(
                "invalid movement type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Counterparty {
    Supplier(i32),
    Customer(i32),
    Warehouse(i32),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i32,
    pub kind: MovementKind,
    pub item_id: i32,
    pub warehouse_id: i32,
    pub quantity: i64,
    pub employee_id: i32,
    pub counterparty: Counterparty,
    /// Shared by both legs of a transfer.
    pub transfer_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Signed effect of this entry on its stock row.
    pub fn delta(&self) -> i64 {
        self.kind.signed(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: String,
    pub item_id: i32,
    pub warehouse_id: i32,
    pub quantity: i64,
    pub employee_id: i32,
    pub customer_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub peer_warehouse_id: Option<i32>,
    pub transfer_id: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::EmployeeId",
        to = "super::employees::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Employees,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// New entry, id assigned by the store.
pub(crate) struct NewEntry {
    pub kind: MovementKind,
    pub item_id: i32,
    pub warehouse_id: i32,
    pub quantity: i64,
    pub employee_id: i32,
    pub counterparty: Counterparty,
    pub transfer_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

impl From<&NewEntry> for ActiveModel {
    fn from(entry: &NewEntry) -> Self {
        let (customer_id, supplier_id, peer_warehouse_id) = match entry.counterparty {
            Counterparty::Customer(id) => (Some(id), None, None),
            Counterparty::Supplier(id) => (None, Some(id), None),
            Counterparty::Warehouse(id) => (None, None, Some(id)),
        };
        Self {
            id: ActiveValue::NotSet,
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            item_id: ActiveValue::Set(entry.item_id),
            warehouse_id: ActiveValue::Set(entry.warehouse_id),
            quantity: ActiveValue::Set(entry.quantity),
            employee_id: ActiveValue::Set(entry.employee_id),
            customer_id: ActiveValue::Set(customer_id),
            supplier_id: ActiveValue::Set(supplier_id),
            peer_warehouse_id: ActiveValue::Set(peer_warehouse_id),
            transfer_id: ActiveValue::Set(entry.transfer_id.map(|id| id.to_string())),
            occurred_at: ActiveValue::Set(entry.occurred_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let counterparty = match (model.customer_id, model.supplier_id, model.peer_warehouse_id) {
            (Some(id), None, None) => Counterparty::Customer(id),
            (None, Some(id), None) => Counterparty::Supplier(id),
            (None, None, Some(id)) => Counterparty::Warehouse(id),
            _ => {
                return Err(EngineError::Validation(format!(
                    "ledger entry {} has no single counterparty",
                    model.id
                )));
            }
        };
        let transfer_id = model
            .transfer_id
            .map(|s| {
                Uuid::parse_str(&s).map_err(|_| {
                    EngineError::Validation(format!("invalid transfer id on entry {}", model.id))
                })
            })
            .transpose()?;

        Ok(Self {
            id: model.id,
            kind: MovementKind::try_from(model.kind.as_str())?,
            item_id: model.item_id,
            warehouse_id: model.warehouse_id,
            quantity: model.quantity,
            employee_id: model.employee_id,
            counterparty,
            transfer_id,
            occurred_at: model.occurred_at,
        })
    }
}
