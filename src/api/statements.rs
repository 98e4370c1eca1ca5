//! The fixed statement catalog.
//!
//! Every route runs exactly one of these templates. Table and column names are
//! an external contract owned by the database schema.

use crate::engine::{Param, Statement, StatementKind};

use super::requests::{AgentPath, AgentRename, AgentTerms, NewAgent, OrderFilter};

const INSERT_AGENT: &str = "INSERT INTO agents (AGENT_CODE, AGENT_NAME, WORKING_AREA, COMMISSION, PHONE_NO, COUNTRY) VALUES (?,?,?,?,?,?)";
const SELECT_AGENTS: &str = "SELECT * from agents";
const RENAME_AGENT: &str = "UPDATE agents SET AGENT_NAME = ? WHERE AGENT_CODE = ?";
const UPDATE_AGENT_TERMS: &str =
    "UPDATE agents SET COMMISSION = ?, WORKING_AREA = ? WHERE AGENT_CODE = ?";
const DELETE_AGENT: &str = "DELETE FROM agents WHERE AGENT_CODE = ?";
const SELECT_CUSTOMER: &str = "SELECT * from customer where CUST_CODE = ?";
const SELECT_ORDERS_BY_AMOUNT: &str = "SELECT * from orders where ORD_AMOUNT = ?";

/// Read-only tables exposed verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Customers,
    Company,
    DaysOrder,
    Despatch,
    Foods,
}

impl Table {
    const fn select_all(self) -> &'static str {
        match self {
            Self::Customers => "SELECT * from customer",
            Self::Company => "SELECT * from company",
            Self::DaysOrder => "SELECT * from daysorder",
            Self::Despatch => "SELECT * from despatch",
            Self::Foods => "SELECT * from foods",
        }
    }
}

pub fn insert_agent(agent: NewAgent) -> Statement {
    Statement::new(StatementKind::Insert, INSERT_AGENT)
        .bind(agent.agent_code)
        .bind(agent.agent_name)
        .bind(agent.working_area)
        .bind(agent.commission)
        .bind(agent.phone_no)
        .bind(agent.country)
}

pub fn list_agents() -> Statement {
    Statement::new(StatementKind::Select, SELECT_AGENTS)
}

pub fn rename_agent(rename: AgentRename) -> Statement {
    Statement::new(StatementKind::Update, RENAME_AGENT)
        .bind(rename.agent_name)
        .bind(rename.agent_code)
}

pub fn update_agent_terms(terms: AgentTerms) -> Statement {
    Statement::new(StatementKind::Update, UPDATE_AGENT_TERMS)
        .bind(terms.commission)
        .bind(terms.working_area)
        .bind(terms.agent_code)
}

pub fn delete_agent(path: AgentPath) -> Statement {
    Statement::new(StatementKind::Delete, DELETE_AGENT).bind(path.id)
}

pub fn list_table(table: Table) -> Statement {
    Statement::new(StatementKind::Select, table.select_all())
}

pub fn customer_by_code(code: String) -> Statement {
    Statement::new(StatementKind::Select, SELECT_CUSTOMER).bind(code)
}

/// A missing amount binds NULL, which matches no row
pub fn orders_by_amount(filter: OrderFilter) -> Statement {
    let amount = filter.amount.map_or(Param::Null, Param::Text);
    Statement::new(StatementKind::Select, SELECT_ORDERS_BY_AMOUNT).bind(amount)
}

/// Liveness probe used by `/health` and `ping`
pub fn probe() -> Statement {
    Statement::new(StatementKind::Select, "SELECT 1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldValue;

    #[test]
    fn test_insert_binds_columns_in_order() {
        let agent = NewAgent {
            agent_code: Some("A019".into()),
            agent_name: Some("Jyosthna".into()),
            working_area: Some("Bengaluru".into()),
            commission: Some(FieldValue::Number(serde_json::Number::from_f64(0.34).unwrap())),
            phone_no: Some("123-12345678".into()),
            country: Some("India".into()),
        };

        let stmt = insert_agent(agent);
        assert_eq!(stmt.kind, StatementKind::Insert);
        assert_eq!(stmt.sql.matches('?').count(), 6);
        assert_eq!(
            stmt.params,
            vec![
                Param::from("A019"),
                Param::from("Jyosthna"),
                Param::from("Bengaluru"),
                Param::Float(0.34),
                Param::from("123-12345678"),
                Param::from("India"),
            ]
        );
    }

    #[test]
    fn test_update_binds_key_last() {
        let stmt = update_agent_terms(AgentTerms {
            agent_code: Some("A019".into()),
            working_area: Some("Tirupathi".into()),
            commission: Some("2.08".into()),
        });
        assert_eq!(
            stmt.params,
            vec![Param::from("2.08"), Param::from("Tirupathi"), Param::from("A019")]
        );

        let stmt = rename_agent(AgentRename {
            agent_code: Some("A019".into()),
            agent_name: Some("Jyo".into()),
        });
        assert_eq!(stmt.params, vec![Param::from("Jyo"), Param::from("A019")]);
    }

    #[test]
    fn test_orders_without_amount_binds_null() {
        let stmt = orders_by_amount(OrderFilter::default());
        assert_eq!(stmt.params, vec![Param::Null]);

        let stmt = orders_by_amount(OrderFilter { amount: Some("1000".to_string()) });
        assert_eq!(stmt.params, vec![Param::from("1000")]);
    }

    #[test]
    fn test_list_tables() {
        assert_eq!(list_table(Table::DaysOrder).sql, "SELECT * from daysorder");
        assert!(list_table(Table::Foods).params.is_empty());
        assert!(list_table(Table::Customers).kind.returns_rows());
    }
}
