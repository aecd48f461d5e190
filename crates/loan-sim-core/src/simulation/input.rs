use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanSimError;
use crate::simulation::validation::validate_simulation_input;
use crate::types::{Money, Percent};

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// Untrusted simulation parameters, exactly as a form or JSON body sent them.
///
/// Every field is optional and numeric fields accept out-of-range values so
/// that validation, not deserialization, reports what is wrong. Field names
/// accept both snake_case and the camelCase used by the web front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(alias = "outstandingBalance", skip_serializing_if = "Option::is_none")]
    pub outstanding_balance: Option<Money>,
    #[serde(alias = "installmentCount", skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<i64>,
    /// Monthly rate in percent (1.8 = 1.8% a month).
    #[serde(alias = "monthlyInterestRate", skip_serializing_if = "Option::is_none")]
    pub monthly_interest_rate: Option<Percent>,
    #[serde(alias = "mandatoryInsurance", skip_serializing_if = "Option::is_none")]
    pub mandatory_insurance: Option<Money>,
    #[serde(alias = "consultancyPercentage", skip_serializing_if = "Option::is_none")]
    pub consultancy_percentage: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<Decimal>,
}

impl From<&SimulationInput> for SimulationDraft {
    fn from(input: &SimulationInput) -> Self {
        SimulationDraft {
            bank: Some(input.bank.clone()),
            outstanding_balance: Some(input.outstanding_balance),
            installment_count: Some(i64::from(input.installment_count)),
            monthly_interest_rate: Some(input.monthly_interest_rate),
            mandatory_insurance: Some(input.mandatory_insurance),
            consultancy_percentage: Some(input.consultancy_percentage),
            coefficient: input.coefficient,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated input
// ---------------------------------------------------------------------------

/// Fully-populated simulation parameters.
///
/// Deserializing one goes through [`SimulationDraft`] and fails with the
/// complete list of validation messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimulationDraft")]
pub struct SimulationInput {
    pub bank: String,
    pub outstanding_balance: Money,
    pub installment_count: u32,
    /// Monthly rate in percent.
    pub monthly_interest_rate: Percent,
    pub mandatory_insurance: Money,
    /// Fee over the disbursed amount, in percent.
    pub consultancy_percentage: Percent,
    /// Pre-negotiated amortization coefficient; derived from the rate when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<Decimal>,
}

impl TryFrom<SimulationDraft> for SimulationInput {
    type Error = LoanSimError;

    fn try_from(draft: SimulationDraft) -> Result<Self, Self::Error> {
        let messages = validate_simulation_input(&draft);
        if !messages.is_empty() {
            return Err(LoanSimError::ValidationFailed(messages));
        }

        let SimulationDraft {
            bank: Some(bank),
            outstanding_balance: Some(outstanding_balance),
            installment_count: Some(installment_count),
            monthly_interest_rate: Some(monthly_interest_rate),
            mandatory_insurance: Some(mandatory_insurance),
            consultancy_percentage: Some(consultancy_percentage),
            coefficient,
        } = draft
        else {
            return Err(LoanSimError::InsufficientData(
                "simulation draft is missing required fields".into(),
            ));
        };

        let installment_count =
            u32::try_from(installment_count).map_err(|_| LoanSimError::InvalidInput {
                field: "installment_count".into(),
                reason: "Installment count does not fit in 32 bits".into(),
            })?;

        Ok(SimulationInput {
            bank: bank.trim().to_string(),
            outstanding_balance,
            installment_count,
            monthly_interest_rate,
            mandatory_insurance,
            consultancy_percentage,
            coefficient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn complete_draft() -> SimulationDraft {
        SimulationDraft {
            bank: Some("  Banco do Brasil ".into()),
            outstanding_balance: Some(dec!(30000)),
            installment_count: Some(96),
            monthly_interest_rate: Some(dec!(1.8)),
            mandatory_insurance: Some(dec!(1000)),
            consultancy_percentage: Some(dec!(12)),
            coefficient: None,
        }
    }

    #[test]
    fn test_try_from_complete_draft() {
        let input = SimulationInput::try_from(complete_draft()).unwrap();
        assert_eq!(
            input,
            SimulationInput {
                bank: "Banco do Brasil".into(),
                outstanding_balance: dec!(30000),
                installment_count: 96,
                monthly_interest_rate: dec!(1.8),
                mandatory_insurance: dec!(1000),
                consultancy_percentage: dec!(12),
                coefficient: None,
            }
        );
    }

    #[test]
    fn test_try_from_reports_every_message() {
        let draft = SimulationDraft {
            bank: Some("   ".into()),
            installment_count: Some(0),
            ..complete_draft()
        };
        let err = SimulationInput::try_from(draft).unwrap_err();
        assert_eq!(
            err.validation_messages().unwrap(),
            &[
                "bank is required".to_string(),
                "installment count must be between 1 and 240".to_string(),
            ]
        );
    }

    #[test]
    fn test_deserialize_camel_case_body() {
        let body = r#"{
            "bank": "Caixa",
            "outstandingBalance": 15000,
            "installmentCount": 84,
            "monthlyInterestRate": "2.14",
            "mandatoryInsurance": 0,
            "consultancyPercentage": 10
        }"#;
        let input: SimulationInput = serde_json::from_str(body).unwrap();
        assert_eq!(input.installment_count, 84);
        assert_eq!(input.monthly_interest_rate, dec!(2.14));
        assert_eq!(input.coefficient, None);
    }

    #[test]
    fn test_deserialize_invalid_body_carries_messages() {
        let body = r#"{ "bank": "Caixa", "outstanding_balance": -1 }"#;
        let err = serde_json::from_str::<SimulationInput>(body).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("balance must be greater than zero"), "{text}");
        assert!(text.contains("insurance must be non-negative"), "{text}");
    }

    #[test]
    fn test_draft_from_input_round_trip() {
        let input = SimulationInput::try_from(complete_draft()).unwrap();
        let draft = SimulationDraft::from(&input);
        assert_eq!(SimulationInput::try_from(draft).unwrap(), input);
    }
}
