use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

pub use server::{app, run, run_with_listener, spawn_with_listener};

mod items;
mod movements;
mod prices;
mod reports;
mod server;
mod stockings;
mod transfers;

pub mod types {
    pub use api_types::ErrorBody;

    pub mod stocking {
        pub use api_types::stocking::{
            StockReplayView, StockRowView, StockingCreated, StockingNew, StockingUpdate,
        };
    }

    pub mod item {
        pub use api_types::item::ItemView;
    }

    pub mod movement {
        pub use api_types::movement::{
            LedgerEntryView, LedgerPageView, LedgerQuery, MovementNew, MovementRecorded,
            MovementReversed,
        };
    }

    pub mod transfer {
        pub use api_types::transfer::{TransferDone, TransferNew};
    }

    pub mod price {
        pub use api_types::price::{PriceAdjust, PriceAdjusted};
    }

    pub mod report {
        pub use api_types::report::{
            EmployeeActivityView, InventoryLineView, LowStockView, SupplierPerformanceView,
            WarehouseValueView,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    /// The caller is known but may not perform the operation.
    Forbidden(String),
    /// The caller could not be identified from the request headers.
    Unauthorized(String),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Unavailable => "unavailable",
        ErrorKind::Internal => "internal",
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Unavailable(reason) => {
            tracing::warn!("storage unavailable: {reason}");
            "storage temporarily unavailable, retry".to_string()
        }
        other => other.to_string(),
    }
}

fn engine_error_body(err: EngineError) -> ErrorBody {
    let kind = kind_label(err.kind()).to_string();
    let available = match &err {
        EngineError::InsufficientStock { available, .. } => Some(*available),
        _ => None,
    };
    ErrorBody {
        error: message_for_engine_error(err),
        kind,
        available,
    }
}

fn plain_body(error: String, kind: &str) -> ErrorBody {
    ErrorBody {
        error,
        kind: kind.to_string(),
        available: None,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), engine_error_body(err)),
            ServerError::Forbidden(err) => (StatusCode::FORBIDDEN, plain_body(err, "forbidden")),
            ServerError::Unauthorized(err) => {
                (StatusCode::UNAUTHORIZED, plain_body(err, "unauthorized"))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, plain_body(err, "bad_request")),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn insufficient_stock_maps_to_409() {
        let res = ServerError::from(EngineError::InsufficientStock {
            available: 3,
            requested: 5,
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn insufficient_stock_body_carries_available() {
        let body = engine_error_body(EngineError::InsufficientStock {
            available: 3,
            requested: 5,
        });
        assert_eq!(body.kind, "conflict");
        assert_eq!(body.available, Some(3));
        assert_eq!(body.error, "Insufficient stock: available 3, requested 5");
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::DuplicateInWarehouse {
            item_id: 1,
            warehouse_id: 2,
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_unavailable_maps_to_503() {
        let res = ServerError::from(EngineError::Unavailable("pool".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn database_error_is_hidden() {
        let body = engine_error_body(EngineError::Database(sea_orm_err()));
        assert_eq!(body.kind, "internal");
        assert_eq!(body.error, "internal server error");
    }

    #[test]
    fn forbidden_maps_to_403() {
        let res = ServerError::Forbidden("customers cannot move stock".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized("missing actor".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    fn sea_orm_err() -> sea_orm::DbErr {
        sea_orm::DbErr::Custom("disk I/O error".to_string())
    }
}
