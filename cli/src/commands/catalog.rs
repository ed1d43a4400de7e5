//! Catalog command

use colored::Colorize;
use sase_subscription_rules::infrastructure::StaticFeatureGates;
use sase_subscription_rules::{ConditionCatalog, ConditionItem};
use std::path::Path;
use tabled::Tabled;

use crate::output::OutputFormat;

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Condition")]
    key: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Operators")]
    operators: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ConditionItem> for CatalogRow {
    fn from(item: &ConditionItem) -> Self {
        let operators = item
            .custom_operators
            .iter()
            .map(|(op, label)| format!("{} ({})", op, label))
            .collect::<Vec<_>>()
            .join(", ");
        let status = if item.disabled { "disabled".red() } else { "enabled".green() };
        Self { key: item.value.clone(), label: item.label.clone(), operators, status: status.to_string() }
    }
}

pub fn handle(config_path: &Path, commerce_enabled: bool, recurring: bool, format: OutputFormat) -> Result<(), String> {
    let config = crate::config::load(config_path)?;
    let providers = commerce_enabled.then(|| config.commerce_provider.clone());
    let gates = StaticFeatureGates::new(providers, recurring);

    let group = ConditionCatalog::new(&gates, &config.commerce_provider).filter_group();
    let rows: Vec<CatalogRow> = group.children.iter().map(CatalogRow::from).collect();
    format.print(&group, rows);
    Ok(())
}
