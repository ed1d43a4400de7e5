//! Product selector options
//!
//! Feeds the product selector shown next to every subscription condition.
//! Variable-price products expand to one option per price.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::RulesConfig;
use crate::domain::value_objects::ProductSelector;
use crate::error::RuleResult;
use crate::ports::inbound::{SelectorOption, SelectorOptions};
use crate::ports::outbound::{Product, ProductCatalog};

pub struct ProductSelectorOptions {
    catalog: Arc<dyn ProductCatalog>,
    search_limit: usize,
}

impl ProductSelectorOptions {
    pub fn new(catalog: Arc<dyn ProductCatalog>, search_limit: usize) -> Self {
        Self { catalog, search_limit }
    }

    /// Search limited by `selector_search_limit`
    pub fn from_config(config: &RulesConfig, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self::new(catalog, config.selector_search_limit)
    }

    fn options_for(product: &Product) -> Vec<SelectorOption> {
        if product.variable_prices.is_empty() {
            return vec![SelectorOption {
                id: ProductSelector::product(product.id).to_string(),
                title: product.title.clone(),
            }];
        }

        product
            .variable_prices
            .iter()
            .map(|price| {
                let name = match price.name.as_deref() {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => format!("Price Option {}", price.id),
                };
                SelectorOption {
                    id: ProductSelector::variant(product.id, price.id).to_string(),
                    title: format!("{} - {}", product.title, name),
                }
            })
            .collect()
    }
}

impl SelectorOptions for ProductSelectorOptions {
    /// Search hits first, then `included_ids`, each product once
    fn product_selector_options(&self, search: &str, included_ids: &[u64]) -> RuleResult<Vec<SelectorOption>> {
        let hits = self.catalog.search(search, self.search_limit)?;

        let mut seen = BTreeSet::new();
        let mut options = Vec::new();
        for id in hits.into_iter().chain(included_ids.iter().copied()) {
            if !seen.insert(id) {
                continue;
            }
            if let Some(product) = self.catalog.product(id)? {
                options.extend(Self::options_for(&product));
            }
        }
        Ok(options)
    }
}
