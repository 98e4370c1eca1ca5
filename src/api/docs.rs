//! OpenAPI description and the Swagger UI page serving it.

use std::sync::OnceLock;

use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use schemars::gen::{SchemaGenerator, SchemaSettings};
use schemars::JsonSchema;
use serde_json::{json, Value};

use crate::engine::WriteOutcome;
use crate::output::{ErrorBody, ValidationEnvelope};

use super::handlers::Health;
use super::requests::{Agent, AgentRename, AgentTerms, NewAgent};

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>agentdesk API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api-docs/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

/// Documentation routes, usable with any router state
pub fn routes<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new()
        .route("/api-docs", get(|| async { Html(SWAGGER_UI) }))
        .route(OPENAPI_PATH, get(|| async { Json(openapi().clone()) }))
}

/// The OpenAPI 3.0 document, built once
pub fn openapi() -> &'static Value {
    static DOCUMENT: OnceLock<Value> = OnceLock::new();
    DOCUMENT.get_or_init(build_openapi)
}

fn build_openapi() -> Value {
    let mut generator = SchemaSettings::openapi3().into_generator();

    let agent = schema_ref::<Agent>(&mut generator);
    let new_agent = schema_ref::<NewAgent>(&mut generator);
    let rename = schema_ref::<AgentRename>(&mut generator);
    let terms = schema_ref::<AgentTerms>(&mut generator);
    let write = schema_ref::<WriteOutcome>(&mut generator);
    let invalid = schema_ref::<ValidationEnvelope>(&mut generator);
    let failure = schema_ref::<ErrorBody>(&mut generator);
    let health = schema_ref::<Health>(&mut generator);

    let any_rows = json!({"type": "array", "items": {"type": "object"}});
    let agent_rows = json!({"type": "array", "items": agent});

    let mut paths = serde_json::Map::new();
    paths.insert(
        "/agent".to_string(),
        json!({
            "post": write_op("Agents", "Create an agent", &new_agent, &write, &invalid, &failure),
            "put": write_op("Agents", "Rename an agent", &rename, &write, &invalid, &failure),
            "patch": write_op("Agents", "Change commission and working area", &terms, &write, &invalid, &failure),
        }),
    );
    paths.insert(
        "/agent/{id}".to_string(),
        json!({
            "delete": {
                "tags": ["Agents"],
                "summary": "Delete an agent",
                "parameters": [path_param("id", "AGENT_CODE of the agent to delete")],
                "responses": responses(&write, "Write result", Some(&invalid), &failure),
            }
        }),
    );
    paths.insert("/agents".to_string(), read_path("Agents", "List agents", &agent_rows, &failure));

    for (path, tag, summary) in [
        ("/customers", "Customers", "List customers"),
        ("/company", "Company", "List companies"),
        ("/daysorder", "Daysorder", "List day orders"),
        ("/despatch", "Despatch", "List despatches"),
        ("/foods", "Foods", "List foods"),
    ] {
        paths.insert(path.to_string(), read_path(tag, summary, &any_rows, &failure));
    }

    paths.insert(
        "/customer/{id}".to_string(),
        json!({
            "get": {
                "tags": ["Customers"],
                "summary": "Find a customer by CUST_CODE",
                "parameters": [path_param("id", "CUST_CODE to look up")],
                "responses": responses(&any_rows, "Matching rows, empty when none", None, &failure),
            }
        }),
    );
    paths.insert(
        "/orders".to_string(),
        json!({
            "get": {
                "tags": ["Orders"],
                "summary": "Find orders by exact amount",
                "parameters": [{
                    "name": "amount",
                    "in": "query",
                    "required": false,
                    "description": "ORD_AMOUNT to match",
                    "schema": {"type": "string"},
                }],
                "responses": responses(&any_rows, "Matching rows", None, &failure),
            }
        }),
    );
    paths.insert(
        "/health".to_string(),
        json!({
            "get": {
                "tags": ["Health"],
                "summary": "Database round trip and pool report",
                "responses": responses(&health, "Service is healthy", None, &failure),
            }
        }),
    );

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "agentdesk",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "CRUD REST API over the agents sample database",
        },
        "paths": paths,
        "components": {"schemas": generator.take_definitions()},
    })
}

fn schema_ref<T: JsonSchema>(generator: &mut SchemaGenerator) -> Value {
    json!(generator.subschema_for::<T>())
}

fn path_param(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": {"type": "string"},
    })
}

fn read_path(tag: &str, summary: &str, rows: &Value, failure: &Value) -> Value {
    json!({
        "get": {
            "tags": [tag],
            "summary": summary,
            "responses": responses(rows, "Rows in store column order", None, failure),
        }
    })
}

fn write_op(
    tag: &str,
    summary: &str,
    body: &Value,
    write: &Value,
    invalid: &Value,
    failure: &Value,
) -> Value {
    json!({
        "tags": [tag],
        "summary": summary,
        "requestBody": {
            "required": true,
            "content": {
                "application/json": {"schema": body},
                "application/x-www-form-urlencoded": {"schema": body},
            },
        },
        "responses": responses(write, "Write result", Some(invalid), failure),
    })
}

fn responses(ok: &Value, description: &str, invalid: Option<&Value>, failure: &Value) -> Value {
    let mut responses = json!({
        "200": {"description": description, "content": {"application/json": {"schema": ok}}},
        "500": {"description": "Statement failed", "content": {"application/json": {"schema": failure}}},
        "503": {"description": "No database connection", "content": {"application/json": {"schema": failure}}},
    });
    if let (Some(invalid), Some(map)) = (invalid, responses.as_object_mut()) {
        map.insert(
            "422".to_string(),
            json!({"description": "Validation failed", "content": {"application/json": {"schema": invalid}}}),
        );
    }
    responses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let paths = openapi()["paths"].as_object().unwrap();
        for path in [
            "/agent",
            "/agent/{id}",
            "/agents",
            "/customers",
            "/customer/{id}",
            "/company",
            "/daysorder",
            "/despatch",
            "/foods",
            "/orders",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert!(openapi()["paths"]["/agent"]["patch"]["responses"]["422"].is_object());
        assert!(openapi()["paths"]["/orders"]["get"]["responses"]["422"].is_null());
    }

    #[test]
    fn test_schemas_are_components() {
        let schemas = openapi()["components"]["schemas"].as_object().unwrap();
        assert!(schemas.contains_key("NewAgent"));
        assert!(schemas.contains_key("Agent"));
        assert_eq!(
            openapi()["paths"]["/agent"]["post"]["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/NewAgent"
        );
    }
}
