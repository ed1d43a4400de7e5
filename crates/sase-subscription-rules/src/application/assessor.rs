//! Single-entity assessor
//!
//! Decides membership for one contact: find the commerce customer the
//! contact links to, then test that customer's subscriptions.

use std::sync::Arc;

use crate::config::Schema;
use crate::domain::{ContactRef, CustomerLookup, CustomerSubscriptionQuery, SubscriptionPredicate};
use crate::error::{RuleError, RuleResult};
use crate::ports::outbound::{CustomerRow, SubscriptionStore};

/// Membership of one contact, with the ambiguity found on the way if any
#[derive(Debug)]
pub struct MembershipCheck {
    pub member: bool,
    pub ambiguity: Option<RuleError>,
}

impl MembershipCheck {
    fn not_member() -> Self {
        Self { member: false, ambiguity: None }
    }
}

pub struct SingleEntityAssessor {
    store: Arc<dyn SubscriptionStore>,
    schema: Schema,
}

impl SingleEntityAssessor {
    pub fn new(store: Arc<dyn SubscriptionStore>, schema: Schema) -> Self {
        Self { store, schema }
    }

    pub fn check(&self, contact: &ContactRef, predicate: &SubscriptionPredicate) -> RuleResult<MembershipCheck> {
        let lookup = match CustomerLookup::new(&self.schema, contact.linked_account(), contact.linked_email()) {
            Some(lookup) => lookup,
            None => return Ok(MembershipCheck::not_member()),
        };

        let customers = self.store.find_customers(&lookup)?;
        let (customer_id, ambiguity) = match pick_customer(contact, &customers) {
            Some(picked) => picked,
            None => {
                tracing::debug!(contact_id = contact.id, "no commerce customer linked to contact");
                return Ok(MembershipCheck::not_member());
            }
        };

        if let Some(error) = &ambiguity {
            tracing::warn!(contact_id = contact.id, %error, "ambiguous customer match, using account id match");
        }

        let query = CustomerSubscriptionQuery::new(&self.schema, customer_id, predicate.clone());
        let member = self.store.has_matching_subscription(&query)?;
        Ok(MembershipCheck { member, ambiguity })
    }
}

/// Every returned row matched the lookup. The account id match wins;
/// otherwise the first row, the store orders them by id.
fn pick_customer(contact: &ContactRef, customers: &[CustomerRow]) -> Option<(u64, Option<RuleError>)> {
    let by_account = contact.linked_account().and_then(|account| {
        customers
            .iter()
            .find(|c| c.account_id.is_some_and(|id| u64::try_from(id).is_ok_and(|id| id == account)))
    });

    let account = match by_account {
        Some(account) => account,
        None => return customers.first().map(|c| (c.id, None)),
    };

    let other_by_email = contact.linked_email().and_then(|email| {
        customers
            .iter()
            .find(|c| c.id != account.id && c.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
    });
    let ambiguity = other_by_email
        .map(|other| RuleError::AmbiguousAccountMatch { by_account: account.id, by_email: other.id });
    Some((account.id, ambiguity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerRecord, MembershipQuery, ProductSelector, SubscriptionRecord, SubscriptionStatus};
    use crate::infrastructure::InMemorySubscriptionStore;
    use crate::ports::outbound::{IdentityRow, StoreError};

    fn subscription(id: u64, customer_id: u64, status: &str) -> SubscriptionRecord {
        SubscriptionRecord { id, customer_id, product_id: 42, price_id: None, status: status.into(), expiration: None }
    }

    fn store() -> Arc<InMemorySubscriptionStore> {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store.insert_customer(CustomerRecord { id: 1, account_id: None, email: Some("shared@example.com".into()) });
        store.insert_customer(CustomerRecord { id: 2, account_id: Some(7), email: Some("seven@example.com".into()) });
        store.insert_subscription(subscription(1, 1, "active"));
        store.insert_subscription(subscription(2, 2, "expired"));
        store
    }

    fn active_42() -> SubscriptionPredicate {
        SubscriptionPredicate::build(vec![ProductSelector::product(42)], vec![SubscriptionStatus::Active], None).unwrap()
    }

    #[test]
    fn test_contact_without_identity_skips_store() {
        let store = store();
        let assessor = SingleEntityAssessor::new(store.clone(), Schema::default());
        let check = assessor.check(&ContactRef::new(9, Some(0), Some("")), &active_42()).unwrap();
        assert!(!check.member);
        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn test_member_by_email() {
        let store = store();
        let assessor = SingleEntityAssessor::new(store.clone(), Schema::default());
        let check = assessor.check(&ContactRef::new(9, None, Some("shared@example.com")), &active_42()).unwrap();
        assert!(check.member);
        assert!(check.ambiguity.is_none());
        assert_eq!(store.call_count(), 2);
    }

    #[test]
    fn test_account_match_wins_and_reports_ambiguity() {
        let assessor = SingleEntityAssessor::new(store(), Schema::default());
        let check = assessor.check(&ContactRef::new(9, Some(7), Some("shared@example.com")), &active_42()).unwrap();
        // Customer 2's subscription is expired; customer 1's active one is not consulted
        assert!(!check.member);
        assert!(matches!(
            check.ambiguity,
            Some(RuleError::AmbiguousAccountMatch { by_account: 2, by_email: 1 })
        ));
    }

    #[test]
    fn test_unlinked_contact_is_not_member() {
        let store = store();
        let assessor = SingleEntityAssessor::new(store.clone(), Schema::default());
        let check = assessor.check(&ContactRef::new(9, Some(99), None), &active_42()).unwrap();
        assert!(!check.member);
        assert_eq!(store.call_count(), 1);
    }

    #[test]
    fn test_any_status_has_no_restriction() {
        let assessor = SingleEntityAssessor::new(store(), Schema::default());
        let any = SubscriptionPredicate::build(vec![ProductSelector::product(42)], vec![], None).unwrap();
        assert!(assessor.check(&ContactRef::new(9, Some(7), None), &any).unwrap().member);
    }

    /// Store whose email comparison ignores case, like a MySQL collation
    struct CaseInsensitiveStore {
        customers: Vec<CustomerRow>,
        members: Vec<u64>,
    }

    impl SubscriptionStore for CaseInsensitiveStore {
        fn fetch_identities(&self, _query: &MembershipQuery) -> Result<Vec<IdentityRow>, StoreError> {
            Ok(vec![])
        }

        fn find_customers(&self, lookup: &CustomerLookup) -> Result<Vec<CustomerRow>, StoreError> {
            Ok(self
                .customers
                .iter()
                .filter(|c| match (lookup.email(), c.email.as_deref()) {
                    (Some(wanted), Some(email)) => wanted.eq_ignore_ascii_case(email),
                    _ => false,
                })
                .cloned()
                .collect())
        }

        fn has_matching_subscription(&self, query: &CustomerSubscriptionQuery) -> Result<bool, StoreError> {
            Ok(self.members.contains(&query.customer_id()))
        }
    }

    #[test]
    fn test_returned_row_counts_regardless_of_email_case() {
        let store = Arc::new(CaseInsensitiveStore {
            customers: vec![CustomerRow { id: 1, account_id: None, email: Some("bob@example.com".into()) }],
            members: vec![1],
        });
        let assessor = SingleEntityAssessor::new(store, Schema::default());
        let check = assessor.check(&ContactRef::new(9, None, Some("Bob@Example.com")), &active_42()).unwrap();
        assert!(check.member);
        assert!(check.ambiguity.is_none());
    }

    #[test]
    fn test_ambiguity_ignores_email_case() {
        let rows = vec![
            CustomerRow { id: 1, account_id: None, email: Some("Shared@Example.com".into()) },
            CustomerRow { id: 2, account_id: Some(7), email: None },
        ];
        let (id, ambiguity) = pick_customer(&ContactRef::new(9, Some(7), Some("shared@example.com")), &rows).unwrap();
        assert_eq!(id, 2);
        assert!(matches!(ambiguity, Some(RuleError::AmbiguousAccountMatch { by_account: 2, by_email: 1 })));
    }

    #[test]
    fn test_pick_customer_prefers_lowest_email_match() {
        let rows = vec![
            CustomerRow { id: 3, account_id: None, email: Some("x@example.com".into()) },
            CustomerRow { id: 5, account_id: None, email: Some("x@example.com".into()) },
        ];
        let (id, ambiguity) = pick_customer(&ContactRef::new(1, None, Some("x@example.com")), &rows).unwrap();
        assert_eq!(id, 3);
        assert!(ambiguity.is_none());
    }
}
