//! Computes the figures of a budget month from the budget's history.
//!
//! Envelope balances carry over from month to month. A negative balance at
//! the end of a month is carried over only if the envelope's overspend mode
//! for that month is [OverspendMode::AffectEnvelope], otherwise the envelope
//! starts the next month at zero and the overspent amount is taken from the
//! money available to budget.

use std::collections::HashMap;

use crate::{
    budget_month::BudgetMonth,
    envelope::{EnvelopeId, OverspendMode},
};

/// Everything that happened in a budget up to some month, aggregated per month.
#[derive(Debug, Clone, Default)]
pub struct BudgetHistory {
    /// The envelopes of the budget.
    pub envelopes: Vec<EnvelopeId>,
    pub allocations: HashMap<(EnvelopeId, BudgetMonth), f64>,
    /// The net flow of money into an envelope, negative when money was spent.
    pub spent: HashMap<(EnvelopeId, BudgetMonth), f64>,
    /// Only months with a stored configuration, others use the default mode.
    pub overspend_modes: HashMap<(EnvelopeId, BudgetMonth), OverspendMode>,
    /// The income that became available to budget in each month.
    pub income: HashMap<BudgetMonth, f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvelopeFigures {
    pub allocation: f64,
    pub spent: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthFigures {
    pub income: f64,
    pub available: f64,
    pub envelopes: HashMap<EnvelopeId, EnvelopeFigures>,
}

impl BudgetHistory {
    /// The earliest month with any recorded activity.
    fn first_month(&self) -> Option<BudgetMonth> {
        let envelope_months = self
            .allocations
            .keys()
            .chain(self.spent.keys())
            .chain(self.overspend_modes.keys())
            .map(|(_, month)| *month);

        envelope_months.chain(self.income.keys().copied()).min()
    }

    /// Calculate the figures for `month`.
    ///
    /// Data after `month` is ignored.
    pub fn calculate(&self, month: BudgetMonth) -> MonthFigures {
        let start = self.first_month().map_or(month, |first| first.min(month));

        let mut carry: HashMap<EnvelopeId, f64> = HashMap::new();
        let mut absorbed_overspend = 0.0;
        let mut envelopes = HashMap::with_capacity(self.envelopes.len());

        for current in start.iter_until(month) {
            for &envelope_id in &self.envelopes {
                let allocation = self
                    .allocations
                    .get(&(envelope_id, current))
                    .copied()
                    .unwrap_or(0.0);
                let spent = self
                    .spent
                    .get(&(envelope_id, current))
                    .copied()
                    .unwrap_or(0.0);
                let balance = carry.get(&envelope_id).copied().unwrap_or(0.0) + allocation + spent;

                if current == month {
                    envelopes.insert(
                        envelope_id,
                        EnvelopeFigures {
                            allocation,
                            spent,
                            balance,
                        },
                    );
                    continue;
                }

                let mode = self
                    .overspend_modes
                    .get(&(envelope_id, current))
                    .copied()
                    .unwrap_or_default();

                if balance < 0.0 && mode == OverspendMode::AffectAvailable {
                    absorbed_overspend -= balance;
                    carry.insert(envelope_id, 0.0);
                } else {
                    carry.insert(envelope_id, balance);
                }
            }
        }

        let income_until: f64 = self
            .income
            .iter()
            .filter(|(income_month, _)| **income_month <= month)
            .map(|(_, amount)| amount)
            .sum();
        let allocated_until: f64 = self
            .allocations
            .iter()
            .filter(|((_, allocation_month), _)| *allocation_month <= month)
            .map(|(_, amount)| amount)
            .sum();

        MonthFigures {
            income: self.income.get(&month).copied().unwrap_or(0.0),
            available: income_until - allocated_until - absorbed_overspend,
            envelopes,
        }
    }
}
