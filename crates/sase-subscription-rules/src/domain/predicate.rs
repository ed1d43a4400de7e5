//! Subscription predicate
//!
//! Compiles selectors, a status restriction and an optional expiration
//! window into a parameterized WHERE fragment over the subscription table.
//! Values are bound in exactly the order their `?` placeholders appear.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SubscriptionColumns;
use crate::domain::records::SubscriptionRecord;
use crate::domain::value_objects::{ProductSelector, SubscriptionStatus};
use crate::error::{RuleError, RuleResult};

/// Timestamp format of the expiration column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Positional SQL parameter
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Int(i64),
    UInt(u64),
    Text(String),
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self { Self::UInt(v) }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self { Self::Int(v) }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self { Self::Text(v.to_string()) }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self { Self::Text(v) }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
        }
    }
}

/// SQL text with its positional bindings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlFragment {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self { sql: sql.into(), params }
    }

    pub fn sql(&self) -> &str { &self.sql }
    pub fn params(&self) -> &[SqlValue] { &self.params }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }

    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Inclusive range of site-local expiration timestamps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationWindow {
    from: NaiveDateTime,
    to: NaiveDateTime,
}

impl ExpirationWindow {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// From the site-local `now` to the end of the site-local day `days` ahead.
    ///
    /// `offset` is the site's UTC offset; the store keeps expirations in site time.
    pub fn ending_in_days(now: DateTime<Utc>, days: u32, offset: FixedOffset) -> RuleResult<Self> {
        let from = now.with_timezone(&offset).naive_local();
        let to = from
            .checked_add_signed(Duration::days(i64::from(days)))
            .and_then(|end| end.date().and_hms_opt(23, 59, 59))
            .ok_or_else(|| RuleError::Config(format!("expiration window of {} days is out of range", days)))?;
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDateTime { self.from }
    pub fn to(&self) -> NaiveDateTime { self.to }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.from <= timestamp && timestamp <= self.to
    }
}

/// Compiled membership test over subscription rows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionPredicate {
    selectors: Vec<ProductSelector>,
    statuses: Vec<SubscriptionStatus>,
    window: Option<ExpirationWindow>,
}

impl SubscriptionPredicate {
    /// Build a predicate.
    ///
    /// An empty `statuses` means any status. With a `window` the status is
    /// pinned to active regardless of `statuses`.
    pub fn build(
        selectors: Vec<ProductSelector>,
        statuses: Vec<SubscriptionStatus>,
        window: Option<ExpirationWindow>,
    ) -> RuleResult<Self> {
        if selectors.is_empty() {
            return Err(RuleError::EmptySelectorSet);
        }
        Ok(Self { selectors, statuses, window })
    }

    pub fn selectors(&self) -> &[ProductSelector] { &self.selectors }
    pub fn window(&self) -> Option<&ExpirationWindow> { self.window.as_ref() }

    /// Statuses a matching row must have; empty means any
    pub fn required_statuses(&self) -> Vec<SubscriptionStatus> {
        match self.window {
            Some(_) => vec![SubscriptionStatus::Active],
            None => self.statuses.clone(),
        }
    }

    /// Render as a WHERE fragment over `alias`
    pub fn render(&self, alias: &str, columns: &SubscriptionColumns) -> SqlFragment {
        let product = format!("{}.{}", alias, columns.product_id);
        let price = format!("{}.{}", alias, columns.price_id);
        let status = format!("{}.{}", alias, columns.status);
        let expiration = format!("{}.{}", alias, columns.expiration);

        let mut params = Vec::new();
        let mut branches = Vec::with_capacity(self.selectors.len());
        for selector in &self.selectors {
            params.push(SqlValue::from(selector.product_id()));
            match selector.variant_id() {
                None => branches.push(format!("({} = ?)", product)),
                Some(variant) => {
                    params.push(SqlValue::from(variant));
                    branches.push(format!("({} = ? AND {} = ?)", product, price));
                }
            }
        }
        let mut sql = format!("({})", branches.join(" OR "));

        match &self.window {
            Some(window) => {
                sql.push_str(&format!(" AND {} = ? AND {} >= ? AND {} <= ?", status, expiration, expiration));
                params.push(SqlValue::from(SubscriptionStatus::Active.as_str()));
                params.push(SqlValue::from(window.from.format(TIMESTAMP_FORMAT).to_string()));
                params.push(SqlValue::from(window.to.format(TIMESTAMP_FORMAT).to_string()));
            }
            None if !self.statuses.is_empty() => {
                let placeholders = vec!["?"; self.statuses.len()].join(", ");
                sql.push_str(&format!(" AND {} IN ({})", status, placeholders));
                params.extend(self.statuses.iter().map(|s| SqlValue::from(s.as_str())));
            }
            None => {}
        }

        SqlFragment::new(sql, params)
    }

    /// Evaluate against one row, with the same semantics as `render`
    pub fn matches(&self, record: &SubscriptionRecord) -> bool {
        let selected = self
            .selectors
            .iter()
            .any(|s| s.selects(record.product_id, record.price_id));
        if !selected {
            return false;
        }

        let statuses = self.required_statuses();
        if !statuses.is_empty() && !statuses.iter().any(|s| s.as_str() == record.status) {
            return false;
        }

        match &self.window {
            Some(window) => record.expiration.is_some_and(|ts| window.contains(ts)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use proptest::prelude::*;

    fn columns() -> SubscriptionColumns {
        SubscriptionColumns::default()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    fn record(product_id: u64, price_id: Option<u64>, status: &str) -> SubscriptionRecord {
        SubscriptionRecord {
            id: 1,
            customer_id: 1,
            product_id,
            price_id,
            status: status.into(),
            expiration: Some(ts(2026, 1, 10, 12, 0, 0)),
        }
    }

    #[test]
    fn test_empty_selectors_rejected() {
        assert!(matches!(
            SubscriptionPredicate::build(vec![], vec![], None),
            Err(RuleError::EmptySelectorSet)
        ));
    }

    #[test]
    fn test_single_selector_has_one_branch() {
        for selector in [ProductSelector::parse("42").unwrap(), ProductSelector::parse("42:7").unwrap()] {
            let predicate = SubscriptionPredicate::build(vec![selector], vec![], None).unwrap();
            let fragment = predicate.render("sub", &columns());
            assert!(!fragment.sql().contains(" OR "));
        }
        let predicate = SubscriptionPredicate::build(vec![ProductSelector::variant(42, 7)], vec![], None).unwrap();
        let fragment = predicate.render("sub", &columns());
        assert_eq!(fragment.sql(), "((sub.product_id = ? AND sub.price_id = ?))");
        assert_eq!(fragment.params(), &[SqlValue::UInt(42), SqlValue::UInt(7)]);
    }

    #[test]
    fn test_any_status_has_no_status_clause() {
        let predicate = SubscriptionPredicate::build(vec![ProductSelector::product(42)], vec![], None).unwrap();
        let fragment = predicate.render("sub", &columns());
        assert_eq!(fragment.sql(), "((sub.product_id = ?))");
        assert!(!fragment.sql().contains("status"));
    }

    #[test]
    fn test_active_status_clause() {
        let predicate = SubscriptionPredicate::build(
            vec![ProductSelector::product(42)],
            vec![SubscriptionStatus::Active],
            None,
        )
        .unwrap();
        let fragment = predicate.render("sub", &columns());
        assert_eq!(fragment.sql(), "((sub.product_id = ?)) AND sub.status IN (?)");
        assert_eq!(fragment.params(), &[SqlValue::UInt(42), SqlValue::Text("active".into())]);
    }

    #[test]
    fn test_bindings_follow_placeholder_order() {
        let predicate = SubscriptionPredicate::build(
            vec![ProductSelector::product(1), ProductSelector::variant(2, 3), ProductSelector::product(4)],
            vec![SubscriptionStatus::Expired, SubscriptionStatus::Cancelled],
            None,
        )
        .unwrap();
        let fragment = predicate.render("sub", &columns());
        assert_eq!(
            fragment.sql(),
            "((sub.product_id = ?) OR (sub.product_id = ? AND sub.price_id = ?) OR (sub.product_id = ?)) AND sub.status IN (?, ?)"
        );
        assert_eq!(
            fragment.params(),
            &[
                SqlValue::UInt(1),
                SqlValue::UInt(2),
                SqlValue::UInt(3),
                SqlValue::UInt(4),
                SqlValue::from("expired"),
                SqlValue::from("cancelled"),
            ]
        );
    }

    #[test]
    fn test_window_pins_active_status() {
        let window = ExpirationWindow::new(ts(2026, 1, 1, 9, 0, 0), ts(2026, 1, 8, 23, 59, 59));
        let predicate = SubscriptionPredicate::build(
            vec![ProductSelector::product(9)],
            vec![SubscriptionStatus::Expired],
            Some(window),
        )
        .unwrap();
        let fragment = predicate.render("sub", &columns());
        assert_eq!(
            fragment.sql(),
            "((sub.product_id = ?)) AND sub.status = ? AND sub.expiration >= ? AND sub.expiration <= ?"
        );
        assert_eq!(
            fragment.params(),
            &[
                SqlValue::UInt(9),
                SqlValue::from("active"),
                SqlValue::from("2026-01-01 09:00:00"),
                SqlValue::from("2026-01-08 23:59:59"),
            ]
        );
        assert_eq!(predicate.required_statuses(), vec![SubscriptionStatus::Active]);
    }

    #[test]
    fn test_window_without_offset() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap();
        let window = ExpirationWindow::ending_in_days(now, 7, FixedOffset::east_opt(0).unwrap()).unwrap();
        assert_eq!(window.from(), ts(2026, 3, 1, 22, 30, 0));
        assert_eq!(window.to(), ts(2026, 3, 8, 23, 59, 59));
    }

    #[test]
    fn test_window_offset_moves_upper_bound_across_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap();
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let window = ExpirationWindow::ending_in_days(now, 7, offset).unwrap();
        assert_eq!(window.from(), ts(2026, 3, 2, 4, 0, 0));
        assert_eq!(window.to(), ts(2026, 3, 9, 23, 59, 59));

        let west = FixedOffset::west_opt(8 * 3600).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap();
        let window = ExpirationWindow::ending_in_days(early, 7, west).unwrap();
        assert_eq!(window.to(), ts(2026, 3, 7, 23, 59, 59));
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let window = ExpirationWindow::new(ts(2026, 1, 1, 0, 0, 0), ts(2026, 1, 8, 23, 59, 59));
        assert!(window.contains(ts(2026, 1, 1, 0, 0, 0)));
        assert!(window.contains(ts(2026, 1, 8, 23, 59, 59)));
        assert!(!window.contains(ts(2026, 1, 9, 0, 0, 0)));
    }

    #[test]
    fn test_matches() {
        let active_42 = SubscriptionPredicate::build(
            vec![ProductSelector::product(42)],
            vec![SubscriptionStatus::Active],
            None,
        )
        .unwrap();
        assert!(active_42.matches(&record(42, None, "active")));
        assert!(active_42.matches(&record(42, Some(7), "active")));
        assert!(!active_42.matches(&record(42, Some(7), "expired")));
        assert!(!active_42.matches(&record(43, None, "active")));

        let any_42_7 = SubscriptionPredicate::build(vec![ProductSelector::variant(42, 7)], vec![], None).unwrap();
        assert!(any_42_7.matches(&record(42, Some(7), "trialling")));
        assert!(!any_42_7.matches(&record(42, None, "active")));
    }

    #[test]
    fn test_matches_window() {
        let window = ExpirationWindow::new(ts(2026, 1, 1, 0, 0, 0), ts(2026, 1, 31, 23, 59, 59));
        let predicate = SubscriptionPredicate::build(vec![ProductSelector::product(42)], vec![], Some(window)).unwrap();
        assert!(predicate.matches(&record(42, None, "active")));
        assert!(!predicate.matches(&record(42, None, "expired")));

        let mut no_expiration = record(42, None, "active");
        no_expiration.expiration = None;
        assert!(!predicate.matches(&no_expiration));
    }

    #[test]
    fn test_text_display_escapes_quotes() {
        assert_eq!(SqlValue::from("o'neil").to_string(), "'o''neil'");
        assert_eq!(SqlValue::UInt(7).to_string(), "7");
    }

    fn selector_strategy() -> impl Strategy<Value = ProductSelector> {
        (1u64..10_000, proptest::option::of(0u64..100)).prop_map(|(product, variant)| match variant {
            Some(v) => ProductSelector::variant(product, v),
            None => ProductSelector::product(product),
        })
    }

    proptest! {
        #[test]
        fn prop_placeholders_match_bindings(
            selectors in proptest::collection::vec(selector_strategy(), 1..20),
            status_mask in 0usize..64,
            with_window in any::<bool>(),
        ) {
            let statuses: Vec<_> = SubscriptionStatus::ALL
                .into_iter()
                .enumerate()
                .filter(|(i, _)| status_mask & (1 << i) != 0)
                .map(|(_, s)| s)
                .collect();
            let window = with_window.then(|| ExpirationWindow::new(ts(2026, 1, 1, 0, 0, 0), ts(2026, 2, 1, 0, 0, 0)));
            let predicate = SubscriptionPredicate::build(selectors.clone(), statuses, window).unwrap();
            let fragment = predicate.render("sub", &SubscriptionColumns::default());

            prop_assert_eq!(fragment.placeholder_count(), fragment.params().len());

            // Selector bindings come first, product before variant
            let expected: Vec<SqlValue> = selectors
                .iter()
                .flat_map(|s| std::iter::once(SqlValue::UInt(s.product_id())).chain(s.variant_id().map(SqlValue::UInt)))
                .collect();
            prop_assert_eq!(&fragment.params()[..expected.len()], &expected[..]);
        }
    }
}
