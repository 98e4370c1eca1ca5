//! Typed request payloads and the rules each route declares.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validation::{FieldValue, Location, Rule, Validate};

const AGENT_CODE: Rule = Rule::non_empty("AGENT_CODE", Location::Body);
const AGENT_NAME: Rule = Rule::non_empty("AGENT_NAME", Location::Body);
const WORKING_AREA: Rule = Rule::non_empty("WORKING_AREA", Location::Body);
const COMMISSION: Rule = Rule::non_empty("COMMISSION", Location::Body);
const PHONE_NO: Rule = Rule::non_empty("PHONE_NO", Location::Body);
const COUNTRY: Rule = Rule::non_empty("COUNTRY", Location::Body);
const AGENT_ID: Rule = Rule::non_empty("id", Location::Params).labelled("AGENT_CODE");

/// Body of `POST /agent`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewAgent {
    #[serde(rename = "AGENT_CODE", default)]
    pub agent_code: Option<FieldValue>,
    #[serde(rename = "AGENT_NAME", default)]
    pub agent_name: Option<FieldValue>,
    #[serde(rename = "WORKING_AREA", default)]
    pub working_area: Option<FieldValue>,
    #[serde(rename = "COMMISSION", default)]
    pub commission: Option<FieldValue>,
    #[serde(rename = "PHONE_NO", default)]
    pub phone_no: Option<FieldValue>,
    #[serde(rename = "COUNTRY", default)]
    pub country: Option<FieldValue>,
}

impl Validate for NewAgent {
    fn checks(&self) -> Vec<(Rule, Option<&FieldValue>)> {
        vec![
            (AGENT_CODE, self.agent_code.as_ref()),
            (AGENT_NAME, self.agent_name.as_ref()),
            (WORKING_AREA, self.working_area.as_ref()),
            (COMMISSION, self.commission.as_ref()),
            (PHONE_NO, self.phone_no.as_ref()),
            (COUNTRY, self.country.as_ref()),
        ]
    }
}

/// Body of `PUT /agent`: renames an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentRename {
    #[serde(rename = "AGENT_CODE", default)]
    pub agent_code: Option<FieldValue>,
    #[serde(rename = "AGENT_NAME", default)]
    pub agent_name: Option<FieldValue>,
}

impl Validate for AgentRename {
    fn checks(&self) -> Vec<(Rule, Option<&FieldValue>)> {
        vec![(AGENT_CODE, self.agent_code.as_ref()), (AGENT_NAME, self.agent_name.as_ref())]
    }
}

/// Body of `PATCH /agent`: changes commission and working area
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentTerms {
    #[serde(rename = "AGENT_CODE", default)]
    pub agent_code: Option<FieldValue>,
    #[serde(rename = "WORKING_AREA", default)]
    pub working_area: Option<FieldValue>,
    #[serde(rename = "COMMISSION", default)]
    pub commission: Option<FieldValue>,
}

impl Validate for AgentTerms {
    fn checks(&self) -> Vec<(Rule, Option<&FieldValue>)> {
        vec![
            (AGENT_CODE, self.agent_code.as_ref()),
            (WORKING_AREA, self.working_area.as_ref()),
            (COMMISSION, self.commission.as_ref()),
        ]
    }
}

/// Path of `DELETE /agent/{id}`
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPath {
    pub id: Option<FieldValue>,
}

impl From<String> for AgentPath {
    fn from(id: String) -> Self {
        Self { id: Some(FieldValue::Text(id)) }
    }
}

impl Validate for AgentPath {
    fn checks(&self) -> Vec<(Rule, Option<&FieldValue>)> {
        vec![(AGENT_ID, self.id.as_ref())]
    }
}

/// Query string of `GET /orders`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, JsonSchema)]
pub struct OrderFilter {
    /// Exact `ORD_AMOUNT` to match
    pub amount: Option<String>,
}

/// An `agents` row, as documented for API consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Agent {
    #[serde(rename = "AGENT_CODE")]
    pub agent_code: String,
    #[serde(rename = "AGENT_NAME")]
    pub agent_name: Option<String>,
    #[serde(rename = "WORKING_AREA")]
    pub working_area: Option<String>,
    #[serde(rename = "COMMISSION")]
    pub commission: Option<f64>,
    #[serde(rename = "PHONE_NO")]
    pub phone_no: Option<String>,
    #[serde(rename = "COUNTRY")]
    pub country: Option<String>,
}
