//! Compile command
//!
//! Shows the membership query a filter resolves through, without running it.

use chrono::{DateTime, Utc};
use colored::Colorize;
use sase_subscription_rules::domain::MembershipQuery;
use sase_subscription_rules::infrastructure::FixedClock;
use sase_subscription_rules::{ConditionCatalog, ConditionCompiler, ExpirationWindow, RawFilter, RulesConfig, SqlValue};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tabled::Tabled;

use crate::output::OutputFormat;

pub struct CompileArgs {
    pub property: String,
    pub operator: String,
    pub now: Option<String>,
    pub values: Vec<String>,
}

#[derive(Serialize)]
struct CompiledFilter {
    property: String,
    operator: String,
    window: Option<ExpirationWindow>,
    sql: String,
    params: Vec<SqlValue>,
}

enum Outcome {
    Skipped(String),
    Compiled(CompiledFilter),
}

#[derive(Tabled)]
struct BindingRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Value")]
    value: String,
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>, String> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| format!("Invalid --now {:?}: {}", raw, e)),
        None => Ok(Utc::now()),
    }
}

fn compile(config: &RulesConfig, args: CompileArgs) -> Result<Outcome, String> {
    let now = parse_now(args.now.as_deref())?;
    let offset = config.utc_offset().map_err(|e| e.to_string())?;

    // Gates are not consulted; every catalog entry compiles
    let compiler = ConditionCompiler::new(ConditionCatalog::with_enabled(true), Arc::new(FixedClock(now)), offset);
    let raw = RawFilter {
        property: args.property,
        operator: Some(args.operator),
        value: Value::Array(args.values.into_iter().map(Value::String).collect()),
    };

    let (condition, predicate) = match compiler.compile(&raw) {
        Ok(compiled) => compiled,
        Err(e) if e.is_skippable() => return Ok(Outcome::Skipped(e.to_string())),
        Err(e) => return Err(e.to_string()),
    };

    let window = predicate.window().copied();
    let query = MembershipQuery::new(&config.schema(), predicate);
    Ok(Outcome::Compiled(CompiledFilter {
        property: condition.kind.to_string(),
        operator: condition.operator.to_string(),
        window,
        sql: query.sql().to_string(),
        params: query.params().to_vec(),
    }))
}

pub fn handle(config_path: &Path, args: CompileArgs, format: OutputFormat) -> Result<(), String> {
    let config = crate::config::load(config_path)?;
    let compiled = match compile(&config, args)? {
        Outcome::Compiled(compiled) => compiled,
        Outcome::Skipped(reason) => {
            println!("{} {}", "Skipped:".yellow(), reason);
            return Ok(());
        }
    };

    if let OutputFormat::Table = format {
        println!("{}", compiled.sql.bold());
    }
    let rows: Vec<BindingRow> = compiled
        .params
        .iter()
        .enumerate()
        .map(|(i, value)| BindingRow { position: i + 1, value: value.to_string() })
        .collect();
    format.print(&compiled, rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_now() {
        let now = parse_now(Some("2026-03-01T22:30:00+02:00")).unwrap();
        assert_eq!(now.to_rfc3339(), "2026-03-01T20:30:00+00:00");
        assert!(parse_now(Some("yesterday")).is_err());
    }

    fn args(property: &str, values: &[&str]) -> CompileArgs {
        CompileArgs {
            property: property.into(),
            operator: "in".into(),
            now: Some("2026-03-01T10:00:00Z".into()),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_unknown_property_is_skipped() {
        let outcome = compile(&RulesConfig::default(), args("has_subscription_bogus", &["42"])).unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn test_malformed_values_only_is_skipped() {
        let outcome = compile(&RulesConfig::default(), args("has_subscription_active", &["abc"])).unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn test_expiring_window_follows_now_and_offset() {
        let config = RulesConfig { utc_offset_hours: 5.5, ..RulesConfig::default() };
        let compiled = match compile(&config, args("subscription_expiring_7d", &["42"])).unwrap() {
            Outcome::Compiled(compiled) => compiled,
            Outcome::Skipped(reason) => panic!("unexpected skip: {}", reason),
        };

        assert_eq!(compiled.property, "subscription_expiring_7d");
        assert!(compiled.window.is_some());
        assert!(compiled.sql.ends_with("WHERE ((sub.product_id = ?)) AND sub.status = ? AND sub.expiration >= ? AND sub.expiration <= ?"));
        assert_eq!(
            compiled.params,
            vec![
                SqlValue::UInt(42),
                SqlValue::from("active"),
                SqlValue::from("2026-03-01 15:30:00"),
                SqlValue::from("2026-03-08 23:59:59"),
            ]
        );
    }
}
