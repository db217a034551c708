//! Reference data the ledger points at: warehouses, suppliers, employees and
//! customers, plus resolving who is calling.

use sea_orm::{ActiveValue, QueryOrder, prelude::*};

use crate::{
    ADMIN_ID, Actor, ActorRole, Customer, Employee, EngineError, ResultEngine, Supplier,
    Warehouse, customers, employees,
    error::is_unique_violation,
    suppliers,
    util::{normalize_optional_text, normalize_required_text, require_email},
    warehouses,
};

use super::{Engine, require_customer, require_employee, require_supplier, require_warehouse};

fn email_taken(err: DbErr, email: &str) -> EngineError {
    if is_unique_violation(&err) {
        EngineError::ExistingKey(email.to_string())
    } else {
        err.into()
    }
}

impl Engine {
    pub async fn new_warehouse(&self, location: &str, capacity: i32) -> ResultEngine<Warehouse> {
        let location = normalize_required_text(location, "location")?;
        if capacity <= 0 {
            return Err(EngineError::Validation(
                "capacity must be > 0".to_string(),
            ));
        }
        let model = warehouses::ActiveModel {
            id: ActiveValue::NotSet,
            location: ActiveValue::Set(location),
            capacity: ActiveValue::Set(capacity),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(warehouse_id = model.id, "warehouse created");
        Ok(model.into())
    }

    pub async fn warehouse(&self, warehouse_id: i32) -> ResultEngine<Warehouse> {
        Ok(require_warehouse(&self.database, warehouse_id).await?.into())
    }

    pub async fn warehouses(&self) -> ResultEngine<Vec<Warehouse>> {
        let models = warehouses::Entity::find()
            .order_by_asc(warehouses::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Warehouse::from).collect())
    }

    pub async fn new_supplier(
        &self,
        name: &str,
        contact_no: &str,
        email: &str,
        address: &str,
    ) -> ResultEngine<Supplier> {
        let model = suppliers::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(normalize_required_text(name, "supplier name")?),
            contact_no: ActiveValue::Set(normalize_required_text(contact_no, "contact number")?),
            email: ActiveValue::Set(require_email(email)?),
            address: ActiveValue::Set(normalize_required_text(address, "address")?),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(supplier_id = model.id, "supplier created");
        Ok(model.into())
    }

    pub async fn supplier(&self, supplier_id: i32) -> ResultEngine<Supplier> {
        Ok(require_supplier(&self.database, supplier_id).await?.into())
    }

    pub async fn suppliers(&self) -> ResultEngine<Vec<Supplier>> {
        let models = suppliers::Entity::find()
            .order_by_asc(suppliers::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Supplier::from).collect())
    }

    /// Registers an employee. `role` defaults to `staff`.
    pub async fn new_employee(
        &self,
        name: &str,
        email: &str,
        role: Option<&str>,
    ) -> ResultEngine<Employee> {
        let email = require_email(email)?;
        let model = employees::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(normalize_required_text(name, "employee name")?),
            email: ActiveValue::Set(email.clone()),
            role: ActiveValue::Set(
                normalize_optional_text(role).unwrap_or_else(|| "staff".to_string()),
            ),
        }
        .insert(&self.database)
        .await
        .map_err(|err| email_taken(err, &email))?;
        tracing::info!(employee_id = model.id, "employee created");
        Ok(model.into())
    }

    pub async fn employee(&self, employee_id: i32) -> ResultEngine<Employee> {
        Ok(require_employee(&self.database, employee_id).await?.into())
    }

    pub async fn new_customer(
        &self,
        name: &str,
        email: &str,
        contact_no: Option<&str>,
    ) -> ResultEngine<Customer> {
        let email = require_email(email)?;
        let model = customers::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(normalize_required_text(name, "customer name")?),
            email: ActiveValue::Set(email.clone()),
            contact_no: ActiveValue::Set(normalize_optional_text(contact_no)),
        }
        .insert(&self.database)
        .await
        .map_err(|err| email_taken(err, &email))?;
        tracing::info!(customer_id = model.id, "customer created");
        Ok(model.into())
    }

    pub async fn customer(&self, customer_id: i32) -> ResultEngine<Customer> {
        Ok(require_customer(&self.database, customer_id).await?.into())
    }

    /// Resolves a caller from its role and id.
    ///
    /// The administrator is not stored; only id `0` is accepted for it.
    pub async fn resolve_actor(&self, role: ActorRole, id: i32) -> ResultEngine<Actor> {
        let name = match role {
            ActorRole::Admin if id == ADMIN_ID => return Ok(Actor::admin()),
            ActorRole::Admin => {
                return Err(EngineError::KeyNotFound(format!("admin {id}")));
            }
            ActorRole::Employee => require_employee(&self.database, id).await?.name,
            ActorRole::Customer => require_customer(&self.database, id).await?.name,
        };
        Ok(Actor { role, id, name })
    }
}
