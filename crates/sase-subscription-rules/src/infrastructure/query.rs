//! Recording contact query builder
//!
//! Records the WHERE tree a segment filter builds. The tree renders to SQL
//! and can also be evaluated against in-memory contacts.

use crate::config::ContactColumns;
use crate::domain::{ContactRef, SqlFragment, SqlValue};
use crate::ports::outbound::ContactQueryBuilder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Clause {
    In { column: String, values: Vec<SqlValue> },
    NotIn { column: String, values: Vec<SqlValue> },
    Eq { column: String, value: SqlValue },
    Group(Vec<(Connector, Clause)>),
}

#[derive(Clone, Debug, Default)]
pub struct RecordingQueryBuilder {
    columns: ContactColumns,
    clauses: Vec<(Connector, Clause)>,
}

impl RecordingQueryBuilder {
    pub fn new(columns: ContactColumns) -> Self {
        Self { columns, clauses: Vec::new() }
    }

    pub fn clauses(&self) -> &[(Connector, Clause)] {
        &self.clauses
    }

    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }

    /// WHERE body; empty when unconstrained
    pub fn to_sql(&self) -> SqlFragment {
        let mut params = Vec::new();
        let sql = render(&self.clauses, &mut params);
        SqlFragment::new(sql, params)
    }

    pub fn matches(&self, contact: &ContactRef) -> bool {
        evaluate(&self.clauses, &|clause| self.matches_clause(clause, contact))
    }

    /// Contacts the recorded constraints select
    pub fn filter<'a>(&self, contacts: &'a [ContactRef]) -> Vec<&'a ContactRef> {
        contacts.iter().filter(|c| self.matches(c)).collect()
    }

    fn matches_clause(&self, clause: &Clause, contact: &ContactRef) -> bool {
        match clause {
            Clause::In { column, values } => self
                .value_of(column, contact)
                .is_some_and(|v| values.iter().any(|x| same_value(&v, x))),
            Clause::NotIn { values, .. } if values.is_empty() => true,
            // NULL NOT IN (...) is never true
            Clause::NotIn { column, values } => self
                .value_of(column, contact)
                .is_some_and(|v| !values.iter().any(|x| same_value(&v, x))),
            Clause::Eq { column, value } => self
                .value_of(column, contact)
                .is_some_and(|v| same_value(&v, value)),
            Clause::Group(clauses) => evaluate(clauses, &|inner| self.matches_clause(inner, contact)),
        }
    }

    fn value_of(&self, column: &str, contact: &ContactRef) -> Option<SqlValue> {
        if column == self.columns.id {
            Some(SqlValue::UInt(contact.id))
        } else if column == self.columns.account_id {
            contact.account_id.map(SqlValue::Int)
        } else if column == self.columns.email {
            contact.email.clone().map(SqlValue::Text)
        } else {
            None
        }
    }

    fn push(&mut self, connector: Connector, clause: Clause) {
        self.clauses.push((connector, clause));
    }
}

impl ContactQueryBuilder for RecordingQueryBuilder {
    fn where_in(&mut self, column: &str, values: Vec<SqlValue>) {
        self.push(Connector::And, Clause::In { column: column.into(), values });
    }

    fn or_where_in(&mut self, column: &str, values: Vec<SqlValue>) {
        self.push(Connector::Or, Clause::In { column: column.into(), values });
    }

    fn where_not_in(&mut self, column: &str, values: Vec<SqlValue>) {
        self.push(Connector::And, Clause::NotIn { column: column.into(), values });
    }

    fn where_eq(&mut self, column: &str, value: SqlValue) {
        self.push(Connector::And, Clause::Eq { column: column.into(), value });
    }

    fn where_group(&mut self, group: &dyn Fn(&mut dyn ContactQueryBuilder)) {
        let mut inner = Self::new(self.columns.clone());
        group(&mut inner);
        if !inner.clauses.is_empty() {
            self.push(Connector::And, Clause::Group(inner.clauses));
        }
    }
}

fn same_value(a: &SqlValue, b: &SqlValue) -> bool {
    match (a, b) {
        (SqlValue::Int(x), SqlValue::UInt(y)) | (SqlValue::UInt(y), SqlValue::Int(x)) => {
            u64::try_from(*x).is_ok_and(|x| x == *y)
        }
        _ => a == b,
    }
}

/// AND binds tighter than OR; the first connector is ignored
fn evaluate(clauses: &[(Connector, Clause)], matches: &dyn Fn(&Clause) -> bool) -> bool {
    if clauses.is_empty() {
        return true;
    }
    let mut any_term = false;
    let mut term = true;
    for (i, (connector, clause)) in clauses.iter().enumerate() {
        if i > 0 && *connector == Connector::Or {
            any_term |= term;
            term = true;
        }
        term = term && matches(clause);
    }
    any_term || term
}

fn render(clauses: &[(Connector, Clause)], params: &mut Vec<SqlValue>) -> String {
    let mut sql = String::new();
    for (i, (connector, clause)) in clauses.iter().enumerate() {
        if i > 0 {
            sql.push_str(match connector {
                Connector::And => " AND ",
                Connector::Or => " OR ",
            });
        }
        match clause {
            Clause::In { values, .. } | Clause::NotIn { values, .. } if values.is_empty() => {
                sql.push_str(if matches!(clause, Clause::In { .. }) { "0 = 1" } else { "1 = 1" });
            }
            Clause::In { column, values } => {
                sql.push_str(&format!("{} IN ({})", column, placeholders(values.len())));
                params.extend(values.iter().cloned());
            }
            Clause::NotIn { column, values } => {
                sql.push_str(&format!("{} NOT IN ({})", column, placeholders(values.len())));
                params.extend(values.iter().cloned());
            }
            Clause::Eq { column, value } => {
                sql.push_str(&format!("{} = ?", column));
                params.push(value.clone());
            }
            Clause::Group(inner) => {
                sql.push('(');
                sql.push_str(&render(inner, params));
                sql.push(')');
            }
        }
    }
    sql
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
