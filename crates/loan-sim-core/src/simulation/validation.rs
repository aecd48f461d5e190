use rust_decimal::Decimal;

use crate::simulation::input::SimulationDraft;
use crate::types::{Percent, MAX_INSTALLMENTS, MIN_INSTALLMENTS, ONE_HUNDRED};

pub const BANK_REQUIRED: &str = "bank is required";
pub const BALANCE_NOT_POSITIVE: &str = "balance must be greater than zero";
pub const INSTALLMENTS_OUT_OF_RANGE: &str = "installment count must be between 1 and 240";
pub const RATE_OUT_OF_RANGE: &str = "interest rate must be between 0% and 100%";
pub const INSURANCE_NEGATIVE: &str = "insurance must be non-negative";
pub const CONSULTANCY_OUT_OF_RANGE: &str = "consultancy percentage must be between 0% and 100%";
pub const COEFFICIENT_NOT_POSITIVE: &str = "coefficient must be greater than zero";

/// A broken rule: the offending field and the message shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Violation {
    pub field: &'static str,
    pub message: &'static str,
}

/// Check every rule and return one message per broken rule, in rule order.
///
/// An empty list means the draft converts into a
/// [`SimulationInput`](crate::simulation::SimulationInput). An absent field
/// always breaks its rule.
pub fn validate_simulation_input(draft: &SimulationDraft) -> Vec<String> {
    violations(draft)
        .into_iter()
        .map(|v| v.message.to_string())
        .collect()
}

pub(crate) fn violations(draft: &SimulationDraft) -> Vec<Violation> {
    let mut found = Vec::new();

    if !draft.bank.as_deref().is_some_and(|b| !b.trim().is_empty()) {
        found.push(Violation {
            field: "bank",
            message: BANK_REQUIRED,
        });
    }
    if !draft.outstanding_balance.is_some_and(|b| b > Decimal::ZERO) {
        found.push(Violation {
            field: "outstanding_balance",
            message: BALANCE_NOT_POSITIVE,
        });
    }
    if !installment_count_in_range(draft.installment_count) {
        found.push(Violation {
            field: "installment_count",
            message: INSTALLMENTS_OUT_OF_RANGE,
        });
    }
    if !percent_in_range(draft.monthly_interest_rate) {
        found.push(Violation {
            field: "monthly_interest_rate",
            message: RATE_OUT_OF_RANGE,
        });
    }
    if !draft.mandatory_insurance.is_some_and(|i| i >= Decimal::ZERO) {
        found.push(Violation {
            field: "mandatory_insurance",
            message: INSURANCE_NEGATIVE,
        });
    }
    if !percent_in_range(draft.consultancy_percentage) {
        found.push(Violation {
            field: "consultancy_percentage",
            message: CONSULTANCY_OUT_OF_RANGE,
        });
    }
    if draft.coefficient.is_some_and(|c| c <= Decimal::ZERO) {
        found.push(Violation {
            field: "coefficient",
            message: COEFFICIENT_NOT_POSITIVE,
        });
    }

    found
}

pub(crate) fn installment_count_in_range(count: Option<i64>) -> bool {
    count.is_some_and(|n| (MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&n))
}

pub(crate) fn percent_in_range(value: Option<Percent>) -> bool {
    value.is_some_and(|p| p >= Decimal::ZERO && p <= ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn valid_draft() -> SimulationDraft {
        SimulationDraft {
            bank: Some("Itaú".into()),
            outstanding_balance: Some(dec!(30000)),
            installment_count: Some(96),
            monthly_interest_rate: Some(dec!(1.8)),
            mandatory_insurance: Some(dec!(1000)),
            consultancy_percentage: Some(dec!(12)),
            coefficient: None,
        }
    }

    #[test]
    fn test_valid_draft_has_no_messages() {
        assert!(validate_simulation_input(&valid_draft()).is_empty());
    }

    #[test]
    fn test_empty_draft_reports_all_six_rules() {
        let messages = validate_simulation_input(&SimulationDraft::default());
        assert_eq!(
            messages,
            vec![
                BANK_REQUIRED,
                BALANCE_NOT_POSITIVE,
                INSTALLMENTS_OUT_OF_RANGE,
                RATE_OUT_OF_RANGE,
                INSURANCE_NEGATIVE,
                CONSULTANCY_OUT_OF_RANGE,
            ]
        );
    }

    #[test]
    fn test_installment_count_boundaries() {
        for (count, ok) in [(0, false), (1, true), (240, true), (241, false), (-3, false)] {
            let draft = SimulationDraft {
                installment_count: Some(count),
                ..valid_draft()
            };
            let messages = validate_simulation_input(&draft);
            if ok {
                assert!(messages.is_empty(), "count {count}: {messages:?}");
            } else {
                assert_eq!(messages, vec![INSTALLMENTS_OUT_OF_RANGE], "count {count}");
            }
        }
    }

    #[test]
    fn test_rate_and_consultancy_bounds_inclusive() {
        let draft = SimulationDraft {
            monthly_interest_rate: Some(Decimal::ZERO),
            consultancy_percentage: Some(dec!(100)),
            ..valid_draft()
        };
        assert!(validate_simulation_input(&draft).is_empty());

        let draft = SimulationDraft {
            monthly_interest_rate: Some(dec!(100.01)),
            consultancy_percentage: Some(dec!(-0.5)),
            ..valid_draft()
        };
        assert_eq!(
            validate_simulation_input(&draft),
            vec![RATE_OUT_OF_RANGE, CONSULTANCY_OUT_OF_RANGE]
        );
    }

    #[test]
    fn test_zero_insurance_allowed_negative_rejected() {
        let draft = SimulationDraft {
            mandatory_insurance: Some(Decimal::ZERO),
            ..valid_draft()
        };
        assert!(validate_simulation_input(&draft).is_empty());

        let draft = SimulationDraft {
            mandatory_insurance: Some(dec!(-0.01)),
            ..valid_draft()
        };
        assert_eq!(validate_simulation_input(&draft), vec![INSURANCE_NEGATIVE]);
    }

    #[test]
    fn test_non_positive_coefficient_rejected() {
        let draft = SimulationDraft {
            coefficient: Some(Decimal::ZERO),
            ..valid_draft()
        };
        assert_eq!(validate_simulation_input(&draft), vec![COEFFICIENT_NOT_POSITIVE]);
    }

    #[test]
    fn test_violation_fields() {
        let draft = SimulationDraft {
            outstanding_balance: Some(Decimal::ZERO),
            ..valid_draft()
        };
        let found = violations(&draft);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field, "outstanding_balance");
    }
}
