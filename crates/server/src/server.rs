use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::{ServerError, items, movements, prices, reports, stockings, transfers};
use engine::{Actor, ActorRole, Engine};

static ACTOR_ROLE_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-actor-role");
static ACTOR_ID_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-actor-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

fn single_header_value<'i, I>(values: &mut I) -> Result<&'i str, AxumError>
where
    I: Iterator<Item = &'i axum::http::HeaderValue>,
{
    let value = values.next().ok_or_else(AxumError::invalid)?;
    value.to_str().map_err(|_| AxumError::invalid())
}

/// `x-actor-role`: `customer`, `employee` or `admin`.
#[derive(Debug)]
struct ActorRoleHeader(ActorRole);

impl Header for ActorRoleHeader {
    fn name() -> &'static axum::http::HeaderName {
        &ACTOR_ROLE_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = single_header_value(values)?;
        let Ok(role) = ActorRole::try_from(value) else {
            return Err(AxumError::invalid());
        };

        Ok(ActorRoleHeader(role))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(axum::http::HeaderValue::from_static(
            self.0.as_str(),
        )));
    }
}

/// `x-actor-id`: id of the customer or employee, `0` for the administrator.
#[derive(Debug)]
struct ActorIdHeader(i32);

impl Header for ActorIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &ACTOR_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = single_header_value(values)?;
        let Ok(id) = value.trim().parse() else {
            return Err(AxumError::invalid());
        };

        Ok(ActorIdHeader(id))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let as_string = self.0.to_string();
        match axum::http::HeaderValue::from_str(&as_string) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-actor-id header"),
        }
    }
}

/// Resolves the calling actor once per request and stores it in the
/// request extensions.
async fn actor(
    role_header: Option<TypedHeader<ActorRoleHeader>>,
    id_header: Option<TypedHeader<ActorIdHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let (Some(TypedHeader(role)), Some(TypedHeader(id))) = (role_header, id_header) else {
        return Err(ServerError::Unauthorized(
            "x-actor-role and x-actor-id headers are required".to_string(),
        ));
    };

    let actor = state
        .engine
        .resolve_actor(role.0, id.0)
        .await
        .map_err(|err| match err.kind() {
            engine::ErrorKind::NotFound => ServerError::Unauthorized(err.to_string()),
            _ => ServerError::Engine(err),
        })?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Actor allowed to change stock: an employee or the administrator.
pub(crate) struct StockWriter(pub Actor);

impl<S> FromRequestParts<S> for StockWriter
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or_else(|| ServerError::Unauthorized("unknown actor".to_string()))?;
        if !actor.role.can_mutate_stock() {
            tracing::debug!(actor_id = actor.id, role = actor.role.as_str(), "write refused");
            return Err(ServerError::Forbidden(format!(
                "{} actors cannot change stock",
                actor.role.as_str()
            )));
        }
        Ok(StockWriter(actor))
    }
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/stockings", post(stockings::create))
        .route(
            "/stockings/{item_id}/{warehouse_id}",
            get(stockings::get)
                .patch(stockings::update)
                .delete(stockings::remove),
        )
        .route(
            "/stockings/{item_id}/{warehouse_id}/replay",
            get(stockings::replay),
        )
        .route("/items/{item_id}", get(items::get))
        .route("/movements", post(movements::record).get(movements::list))
        .route(
            "/movements/{id}",
            axum::routing::delete(movements::reverse),
        )
        .route("/transfers", post(transfers::transfer))
        .route("/prices/adjust", post(prices::adjust))
        .route("/reports/inventory-value", get(reports::inventory_value))
        .route(
            "/reports/warehouse-value/{id}",
            get(reports::warehouse_value),
        )
        .route("/reports/low-stock/{threshold}", get(reports::low_stock))
        .route(
            "/reports/supplier-performance",
            get(reports::supplier_performance),
        )
        .route("/reports/top-supplier", get(reports::top_supplier))
        .route("/reports/inventory", get(reports::inventory))
        .route("/reports/employees", get(reports::employees))
        .route_layer(middleware::from_fn_with_state(state.clone(), actor))
        .with_state(state)
}

/// Router serving `engine`, without a listener.
pub fn app(engine: Engine) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
    })
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
