//! Product Selector Value Object
//!
//! A user-chosen product, or one price variant of it, written as
//! `"product"` or `"product:variant"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RuleError, RuleResult};

/// Separates product and variant ids in a selector token
pub const SELECTOR_SEPARATOR: char = ':';

/// Product selector with optional price variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductSelector {
    product_id: u64,
    variant_id: Option<u64>,
}

impl ProductSelector {
    /// Selector matching every variant of a product
    pub fn product(product_id: u64) -> Self {
        Self { product_id, variant_id: None }
    }

    /// Selector matching a single price variant
    pub fn variant(product_id: u64, variant_id: u64) -> Self {
        Self { product_id, variant_id: Some(variant_id) }
    }

    /// Parse a selector token
    pub fn parse(token: &str) -> RuleResult<Self> {
        let token = token.trim();
        match token.split_once(SELECTOR_SEPARATOR) {
            Some((product, variant)) => {
                let product_id = Self::parse_product(token, product)?;
                let variant_id = variant.trim().parse::<u64>().map_err(|_| {
                    RuleError::MalformedSelector {
                        token: token.to_string(),
                        reason: format!("variant id {:?} is not an integer", variant),
                    }
                })?;
                Ok(Self::variant(product_id, variant_id))
            }
            None => Ok(Self::product(Self::parse_product(token, token)?)),
        }
    }

    fn parse_product(token: &str, product: &str) -> RuleResult<u64> {
        match product.trim().parse::<u64>() {
            Ok(0) => Err(RuleError::MalformedSelector {
                token: token.to_string(),
                reason: "product id must be positive".into(),
            }),
            Ok(id) => Ok(id),
            Err(_) => Err(RuleError::MalformedSelector {
                token: token.to_string(),
                reason: format!("product id {:?} is not an integer", product),
            }),
        }
    }

    pub fn product_id(&self) -> u64 { self.product_id }
    pub fn variant_id(&self) -> Option<u64> { self.variant_id }

    /// Whether a subscription row for this product/price is selected
    pub fn selects(&self, product_id: u64, price_id: Option<u64>) -> bool {
        if self.product_id != product_id {
            return false;
        }
        match self.variant_id {
            None => true,
            Some(variant) => price_id == Some(variant),
        }
    }
}

impl FromStr for ProductSelector {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProductSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_id {
            Some(variant) => write!(f, "{}{}{}", self.product_id, SELECTOR_SEPARATOR, variant),
            None => write!(f, "{}", self.product_id),
        }
    }
}
