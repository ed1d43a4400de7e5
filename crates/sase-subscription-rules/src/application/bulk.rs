//! Bulk filter applier
//!
//! Second phase of the bulk path. An `in` filter with no matching identities
//! must select nobody, while a `not_in` filter with none selects everybody.

use crate::config::ContactColumns;
use crate::domain::{MatchedIdentitySet, Operator, SqlValue};
use crate::ports::outbound::ContactQueryBuilder;

/// Value no contact id takes
const IMPOSSIBLE_ID: u64 = 0;

pub struct BulkFilterApplier {
    columns: ContactColumns,
}

impl BulkFilterApplier {
    pub fn new(columns: ContactColumns) -> Self {
        Self { columns }
    }

    /// Constrain `query` to contacts satisfying `operator` against `identities`
    pub fn apply(&self, query: &mut dyn ContactQueryBuilder, operator: Operator, identities: &MatchedIdentitySet) {
        let accounts: Vec<SqlValue> = identities.account_ids().iter().map(|id| SqlValue::UInt(*id)).collect();
        let emails: Vec<SqlValue> = identities.emails().iter().map(|e| SqlValue::from(e.as_str())).collect();

        match operator {
            Operator::In if identities.is_empty() => {
                query.where_eq(&self.columns.id, SqlValue::UInt(IMPOSSIBLE_ID));
            }
            Operator::In => {
                let columns = &self.columns;
                query.where_group(&|group: &mut dyn ContactQueryBuilder| {
                    if !accounts.is_empty() {
                        group.where_in(&columns.account_id, accounts.clone());
                    }
                    if !emails.is_empty() {
                        if accounts.is_empty() {
                            group.where_in(&columns.email, emails.clone());
                        } else {
                            group.or_where_in(&columns.email, emails.clone());
                        }
                    }
                });
            }
            Operator::NotIn if identities.is_empty() => {}
            Operator::NotIn => {
                if !accounts.is_empty() {
                    query.where_not_in(&self.columns.account_id, accounts);
                }
                if !emails.is_empty() {
                    query.where_not_in(&self.columns.email, emails);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContactRef;
    use crate::infrastructure::RecordingQueryBuilder;
    use crate::ports::outbound::IdentityRow;

    fn contacts() -> Vec<ContactRef> {
        vec![
            ContactRef::new(1, Some(10), Some("a@example.com")),
            ContactRef::new(2, None, Some("b@example.com")),
            ContactRef::new(3, Some(30), Some("c@example.com")),
            ContactRef::new(4, Some(40), Some("d@example.com")),
        ]
    }

    fn identities(rows: &[(Option<i64>, Option<&str>)]) -> MatchedIdentitySet {
        MatchedIdentitySet::from_rows(
            rows.iter().map(|(a, e)| IdentityRow { account_id: *a, email: e.map(str::to_string) }),
        )
    }

    fn selected(operator: Operator, set: &MatchedIdentitySet) -> (RecordingQueryBuilder, Vec<u64>) {
        let mut query = RecordingQueryBuilder::new(ContactColumns::default());
        BulkFilterApplier::new(ContactColumns::default()).apply(&mut query, operator, set);
        let ids = query.filter(&contacts()).into_iter().map(|c| c.id).collect();
        (query, ids)
    }

    #[test]
    fn test_in_with_empty_set_selects_nobody() {
        let (query, ids) = selected(Operator::In, &MatchedIdentitySet::new());
        assert!(ids.is_empty());
        assert_eq!(query.to_sql().sql(), "id = ?");
        assert_eq!(query.to_sql().params(), &[SqlValue::UInt(0)]);
    }

    #[test]
    fn test_not_in_with_empty_set_selects_everybody() {
        let (query, ids) = selected(Operator::NotIn, &MatchedIdentitySet::new());
        assert!(query.is_unconstrained());
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_in_matches_either_key() {
        let set = identities(&[(Some(10), None), (None, Some("b@example.com"))]);
        let (query, ids) = selected(Operator::In, &set);
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(query.to_sql().sql(), "(user_id IN (?) OR email IN (?))");
    }

    #[test]
    fn test_in_with_emails_only() {
        let set = identities(&[(None, Some("c@example.com"))]);
        let (query, ids) = selected(Operator::In, &set);
        assert_eq!(ids, vec![3]);
        assert_eq!(query.to_sql().sql(), "(email IN (?))");
    }

    #[test]
    fn test_not_in_excludes_both_keys() {
        let set = identities(&[(Some(10), None), (None, Some("c@example.com"))]);
        let (query, ids) = selected(Operator::NotIn, &set);
        // Contact 2 has no account id, and a NULL key fails NOT IN
        assert_eq!(ids, vec![4]);
        assert_eq!(query.to_sql().sql(), "user_id NOT IN (?) AND email NOT IN (?)");
    }
}
