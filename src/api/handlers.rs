//! Route handlers.
//!
//! Each handler validates its typed request, runs one catalog statement through
//! [`execute_once`], and answers exactly once: the result as JSON, or the error
//! through [`DeskError`]'s response mapping.

use axum::extract::State;
use axum::Json;
use schemars::JsonSchema;
use serde::Serialize;

use crate::engine::{execute_once, ConnectionProvider, QueryOutput, Statement};
use crate::error::Result;
use crate::pool::PoolStatus;
use crate::validation::Validate;

use super::payload::{PathParam, Payload, QueryParams};
use super::requests::{AgentPath, AgentRename, AgentTerms, NewAgent, OrderFilter};
use super::statements::{self, Table};
use super::AppState;

async fn run<P: ConnectionProvider>(state: &AppState<P>, statement: Statement) -> Result<Json<QueryOutput>> {
    execute_once(state.provider(), &statement).await.map(Json)
}

pub async fn create_agent<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
    Payload(agent): Payload<NewAgent>,
) -> Result<Json<QueryOutput>> {
    agent.validate()?;
    run(&state, statements::insert_agent(agent)).await
}

pub async fn list_agents<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::list_agents()).await
}

pub async fn rename_agent<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
    Payload(rename): Payload<AgentRename>,
) -> Result<Json<QueryOutput>> {
    rename.validate()?;
    run(&state, statements::rename_agent(rename)).await
}

pub async fn update_agent_terms<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
    Payload(terms): Payload<AgentTerms>,
) -> Result<Json<QueryOutput>> {
    terms.validate()?;
    run(&state, statements::update_agent_terms(terms)).await
}

pub async fn delete_agent<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
    PathParam(id): PathParam<String>,
) -> Result<Json<QueryOutput>> {
    let path = AgentPath::from(id);
    path.validate()?;
    run(&state, statements::delete_agent(path)).await
}

pub async fn list_customers<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::list_table(Table::Customers)).await
}

pub async fn list_company<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::list_table(Table::Company)).await
}

pub async fn list_days_orders<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::list_table(Table::DaysOrder)).await
}

pub async fn list_despatch<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::list_table(Table::Despatch)).await
}

pub async fn list_foods<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::list_table(Table::Foods)).await
}

/// An unknown code yields `[]`, not 404
pub async fn customer_by_code<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
    PathParam(code): PathParam<String>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::customer_by_code(code)).await
}

pub async fn orders_by_amount<P: ConnectionProvider>(
    State(state): State<AppState<P>>,
    QueryParams(filter): QueryParams<OrderFilter>,
) -> Result<Json<QueryOutput>> {
    run(&state, statements::orders_by_amount(filter)).await
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Health {
    pub status: &'static str,
    pub engine: String,
    pub pool: PoolStatus,
}

pub async fn health<P: ConnectionProvider>(State(state): State<AppState<P>>) -> Result<Json<Health>> {
    let provider = state.provider();
    execute_once(provider, &statements::probe()).await?;

    Ok(Json(Health {
        status: "ok",
        engine: provider.engine().to_string(),
        pool: provider.status(),
    }))
}
