//! Statement Execution Benchmarks
//!
//! Measures one request's worth of database work through the SQLite provider:
//! - Pooled checkout + `SELECT * from agents` + release
//! - Parameterized customer lookup
//! - Validation of an agent body (no database)

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use agentdesk::api::requests::NewAgent;
use agentdesk::api::statements;
use agentdesk::engine::sqlite::SqliteProvider;
use agentdesk::{execute_once, ConnectionConfig, PoolConfig, Validate};

fn seeded_provider(name: &str) -> (std::path::PathBuf, SqliteProvider) {
    let path = std::env::temp_dir().join(format!("agentdesk_bench_{name}.db"));
    let _ = std::fs::remove_file(&path);

    {
        let conn = rusqlite::Connection::open(&path).expect("Failed to create database");
        conn.execute_batch(
            "CREATE TABLE agents (
                AGENT_CODE CHAR(6) PRIMARY KEY, AGENT_NAME CHAR(40), WORKING_AREA CHAR(35),
                COMMISSION NUMERIC(10,2), PHONE_NO CHAR(15), COUNTRY VARCHAR(25)
            );
            CREATE TABLE customer (CUST_CODE VARCHAR(6) PRIMARY KEY, CUST_NAME VARCHAR(40));",
        )
        .expect("Failed to create tables");

        for i in 1..=100 {
            conn.execute(
                "INSERT INTO agents VALUES (?, ?, 'Bangalore', 0.14, '077-12346674', 'India')",
                [format!("A{i:03}"), format!("Agent {i}")],
            )
            .expect("Failed to insert agent");
            conn.execute(
                "INSERT INTO customer VALUES (?, ?)",
                [format!("C{i:05}"), format!("Customer {i}")],
            )
            .expect("Failed to insert customer");
        }
    }

    let provider = SqliteProvider::new(&ConnectionConfig::sqlite(path.clone()), PoolConfig::default())
        .expect("Failed to build provider");
    (path, provider)
}

fn bench_list_agents(c: &mut Criterion) {
    let (path, provider) = seeded_provider("list_agents");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let statement = statements::list_agents();

    c.bench_function("sqlite_list_agents", |b| {
        b.iter(|| {
            let result = runtime.block_on(execute_once(&provider, black_box(&statement)));
            assert!(result.is_ok());
            result
        });
    });

    let _ = std::fs::remove_file(&path);
}

fn bench_customer_lookup(c: &mut Criterion) {
    let (path, provider) = seeded_provider("customer_lookup");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("sqlite_customer_by_code", |b| {
        b.iter(|| {
            let statement = statements::customer_by_code(black_box("C00042").to_string());
            let result = runtime.block_on(execute_once(&provider, &statement));
            assert!(result.is_ok());
            result
        });
    });

    let _ = std::fs::remove_file(&path);
}

fn bench_validate_new_agent(c: &mut Criterion) {
    let agent: NewAgent = serde_json::from_value(serde_json::json!({
        "AGENT_CODE": "A019",
        "AGENT_NAME": "Jyosthna",
        "WORKING_AREA": "Bengaluru",
        "COMMISSION": 0.34,
        "PHONE_NO": "123-12345678",
    }))
    .unwrap();

    c.bench_function("validate_new_agent", |b| {
        b.iter(|| black_box(&agent).violations());
    });
}

criterion_group!(benches, bench_list_agents, bench_customer_lookup, bench_validate_new_agent);
criterion_main!(benches);
