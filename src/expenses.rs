//! Small expense-splitting book: people, expenses with per-person splits, and
//! who-owes-whom settlements. Money is handled in whole cents internally.

use crate::store::KvStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const EXPENSES_KEY: &str = "expenses";

/// Splits may differ from the total by at most this much.
pub const SPLIT_TOLERANCE: f64 = 0.01;

pub type PersonId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub person_id: PersonId,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub date: chrono::NaiveDate,
    pub paid_by: PersonId,
    pub splits: Vec<Split>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: f64,
    pub date: chrono::NaiveDate,
    pub paid_by: PersonId,
    pub splits: Vec<Split>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: PersonId,
    pub to: PersonId,
    pub amount: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ExpenseError {
    #[error("description is required")]
    EmptyDescription,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("unknown person '{0}'")]
    UnknownPerson(PersonId),
    #[error("add at least one split")]
    NoSplits,
    #[error("splits add up to {splits:.2} but the expense is {amount:.2}")]
    SplitMismatch { amount: f64, splits: f64 },
    #[error("person name is required")]
    EmptyName,
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Divide `amount` equally. Leftover cents go to the first participants, so
/// 100 over three people is 33.34, 33.33, 33.33.
pub fn split_equal(amount: f64, people: &[PersonId]) -> Vec<Split> {
    if people.is_empty() {
        return Vec::new();
    }
    let total = to_cents(amount);
    let n = people.len() as i64;
    let base = total.div_euclid(n);
    let remainder = total.rem_euclid(n);
    people
        .iter()
        .enumerate()
        .map(|(i, p)| Split {
            person_id: p.clone(),
            amount: from_cents(base + if (i as i64) < remainder { 1 } else { 0 }),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBook {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl ExpenseBook {
    pub fn load(store: &mut dyn KvStore) -> Self {
        match store.get(EXPENSES_KEY) {
            None => Self::default(),
            Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "expenses entry is corrupt; starting empty");
                if let Err(e) = store.remove(EXPENSES_KEY) {
                    tracing::warn!(error = %e, "could not clear expenses entry");
                }
                Self::default()
            }),
        }
    }

    pub fn persist(&self, store: &mut dyn KvStore) -> Result<()> {
        let text = serde_json::to_string(self).context("serializing expense book")?;
        store.set(EXPENSES_KEY, &text)
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.person(id).map(|p| p.name.as_str()).unwrap_or(id)
    }

    pub fn add_person(&mut self, name: &str) -> Result<Person, ExpenseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ExpenseError::EmptyName);
        }
        let person = Person {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        self.people.push(person.clone());
        Ok(person)
    }

    pub fn add_expense(&mut self, draft: ExpenseDraft) -> Result<Expense, ExpenseError> {
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(ExpenseError::EmptyDescription);
        }
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(ExpenseError::NonPositiveAmount);
        }
        if self.person(&draft.paid_by).is_none() {
            return Err(ExpenseError::UnknownPerson(draft.paid_by));
        }
        if draft.splits.is_empty() {
            return Err(ExpenseError::NoSplits);
        }
        if let Some(s) = draft.splits.iter().find(|s| self.person(&s.person_id).is_none()) {
            return Err(ExpenseError::UnknownPerson(s.person_id.clone()));
        }
        let sum: f64 = draft.splits.iter().map(|s| s.amount).sum();
        // small epsilon so an exact 0.01 difference is still accepted
        if (sum - draft.amount).abs() > SPLIT_TOLERANCE + 1e-9 {
            return Err(ExpenseError::SplitMismatch {
                amount: draft.amount,
                splits: sum,
            });
        }
        let expense = Expense {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.to_string(),
            amount: draft.amount,
            date: draft.date,
            paid_by: draft.paid_by,
            splits: draft.splits,
        };
        tracing::debug!(id = %expense.id, amount = expense.amount, "expense added");
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    pub fn remove_expense(&mut self, id: &str) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        self.expenses.len() != before
    }

    /// Net position per person in cents: positive means others owe them.
    fn balance_cents(&self) -> BTreeMap<PersonId, i64> {
        let mut out: BTreeMap<PersonId, i64> =
            self.people.iter().map(|p| (p.id.clone(), 0)).collect();
        for e in &self.expenses {
            *out.entry(e.paid_by.clone()).or_default() += to_cents(e.amount);
            for s in &e.splits {
                *out.entry(s.person_id.clone()).or_default() -= to_cents(s.amount);
            }
        }
        out
    }

    pub fn balances(&self) -> BTreeMap<PersonId, f64> {
        self.balance_cents()
            .into_iter()
            .map(|(k, v)| (k, from_cents(v)))
            .collect()
    }

    /// Greedy: the largest debtor pays the largest creditor until everyone is square.
    pub fn settlements(&self) -> Vec<Settlement> {
        let mut debtors: Vec<(PersonId, i64)> = Vec::new();
        let mut creditors: Vec<(PersonId, i64)> = Vec::new();
        for (id, cents) in self.balance_cents() {
            if cents < 0 {
                debtors.push((id, -cents));
            } else if cents > 0 {
                creditors.push((id, cents));
            }
        }
        let mut out = Vec::new();
        loop {
            debtors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            creditors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let (Some(d), Some(c)) = (debtors.first_mut(), creditors.first_mut()) else {
                break;
            };
            let pay = d.1.min(c.1);
            if pay <= 0 {
                break;
            }
            out.push(Settlement {
                from: d.0.clone(),
                to: c.0.clone(),
                amount: from_cents(pay),
            });
            d.1 -= pay;
            c.1 -= pay;
            debtors.retain(|x| x.1 > 0);
            creditors.retain(|x| x.1 > 0);
        }
        out
    }
}
