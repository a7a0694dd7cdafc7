//! Dashboard grouping and aggregation.
//!
//! Pure, deterministic transformations from flat entity lists into the
//! grouped/sorted views the dashboard renders. Source lists are borrowed
//! and never mutated.

use std::collections::HashMap;

use shared::{Commitment, CommitmentType, Expense};

/// Card-group label used when a card commitment carries no card name.
pub const OTHER_CARD: &str = "Other";

/// One display group of commitments: a type section, or one card's
/// statement within the card section.
#[derive(Debug, PartialEq)]
pub struct CommitmentGroup<'a> {
    pub kind: CommitmentType,
    /// Card name for [`CommitmentType::Card`] groups, `None` otherwise.
    pub card: Option<String>,
    pub items: Vec<&'a Commitment>,
    /// Sum of the group's amounts, for statement-total headers.
    pub total: f64,
}

impl CommitmentGroup<'_> {
    /// Header label, e.g. "Fixo" or "Cartão • Itaú".
    pub fn label(&self) -> String {
        match &self.card {
            Some(card) => format!("{} • {}", self.kind.label(), card),
            None => self.kind.label().to_string(),
        }
    }
}

/// Group a flat commitment list for display.
///
/// Groups are emitted in fixed order: Fixed, Variable, then one group per
/// card following `card_order`, then any cards the configuration does not
/// know (alphabetical), then the no-card fallback. Empty groups are
/// omitted. Within a card group, rows sort ascending by due date with ties
/// broken by descending installment count, so the longer plan lists first.
pub fn group_commitments<'a>(
    commitments: &'a [Commitment],
    card_order: &[String],
) -> Vec<CommitmentGroup<'a>> {
    let mut fixed = Vec::new();
    let mut variable = Vec::new();
    let mut cards: HashMap<&str, Vec<&Commitment>> = HashMap::new();

    for commitment in commitments {
        match commitment.commitment_type {
            CommitmentType::Fixed => fixed.push(commitment),
            CommitmentType::Variable => variable.push(commitment),
            CommitmentType::Card => {
                let card = commitment.card.as_deref().unwrap_or(OTHER_CARD);
                cards.entry(card).or_default().push(commitment);
            }
        }
    }

    let mut groups = Vec::new();
    push_group(&mut groups, CommitmentType::Fixed, None, fixed);
    push_group(&mut groups, CommitmentType::Variable, None, variable);

    for card in card_order {
        if let Some(items) = cards.remove(card.as_str()) {
            push_card_group(&mut groups, card, items);
        }
    }
    let mut leftover: Vec<&str> = cards
        .keys()
        .copied()
        .filter(|card| *card != OTHER_CARD)
        .collect();
    leftover.sort_unstable();
    for card in leftover {
        if let Some(items) = cards.remove(card) {
            push_card_group(&mut groups, card, items);
        }
    }
    if let Some(items) = cards.remove(OTHER_CARD) {
        push_card_group(&mut groups, OTHER_CARD, items);
    }

    groups
}

fn push_group<'a>(
    groups: &mut Vec<CommitmentGroup<'a>>,
    kind: CommitmentType,
    card: Option<String>,
    items: Vec<&'a Commitment>,
) {
    if items.is_empty() {
        return;
    }
    let total = items.iter().map(|c| c.amount).sum();
    groups.push(CommitmentGroup {
        kind,
        card,
        items,
        total,
    });
}

fn push_card_group<'a>(
    groups: &mut Vec<CommitmentGroup<'a>>,
    card: &str,
    mut items: Vec<&'a Commitment>,
) {
    // ISO dates compare correctly as strings; larger series win date ties.
    items.sort_by(|a, b| {
        a.due_date.cmp(&b.due_date).then_with(|| {
            b.total_installments
                .unwrap_or(0)
                .cmp(&a.total_installments.unwrap_or(0))
        })
    });
    push_group(groups, CommitmentType::Card, Some(card.to_string()), items);
}

/// Per-category expense totals, largest first; equal totals order
/// alphabetically for a stable display.
pub fn category_totals(expenses: &[Expense]) -> Vec<(String, f64)> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for expense in expenses {
        *totals.entry(expense.category.as_str()).or_default() += expense.amount;
    }
    let mut totals: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(category, total)| (category.to_string(), total))
        .collect();
    totals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    totals
}

/// Total amount per month of one year, derived from `YYYY-MM` reference
/// months. Months with no data are omitted; output is ordered by month.
pub fn monthly_totals<'a, I>(entries: I, year: i32) -> Vec<(u32, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let prefix = format!("{:04}-", year);
    let mut totals: HashMap<u32, f64> = HashMap::new();
    for (reference_month, amount) in entries {
        if let Some(month) = reference_month
            .strip_prefix(&prefix)
            .and_then(|m| m.parse::<u32>().ok())
        {
            if (1..=12).contains(&month) {
                *totals.entry(month).or_default() += amount;
            }
        }
    }
    let mut totals: Vec<(u32, f64)> = totals.into_iter().collect();
    totals.sort_unstable_by_key(|(month, _)| *month);
    totals
}
