//! Onboarding stage resolution.

use serde::{Deserialize, Serialize};

use super::flags::{ClientFlags, ContractStage, KycStatus};

/// The checkpoints of client onboarding, in precedence order.
///
/// Each stage is a hard prerequisite for the next: CompanyDetails → Kyc →
/// Contract → CabinAllocation → Payment → Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CompanyDetails,
    Kyc,
    Contract,
    CabinAllocation,
    Payment,
    Complete,
}

impl Stage {
    /// Every stage, in precedence order.
    pub const ALL: [Stage; 6] = [
        Stage::CompanyDetails,
        Stage::Kyc,
        Stage::Contract,
        Stage::CabinAllocation,
        Stage::Payment,
        Stage::Complete,
    ];

    /// Whether onboarding is done.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CompanyDetails => "company_details",
            Self::Kyc => "kyc",
            Self::Contract => "contract",
            Self::CabinAllocation => "cabin_allocation",
            Self::Payment => "payment",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Determine the first incomplete onboarding stage.
///
/// Checks run in a fixed order and the first failing one wins. The payment
/// check is always evaluated: a client with everything but payment done is
/// `Payment`, never `Complete`.
pub fn resolve(flags: &ClientFlags) -> Stage {
    if !flags.company_details_complete {
        Stage::CompanyDetails
    } else if flags.kyc_status != KycStatus::Verified {
        Stage::Kyc
    } else if flags.contract_stage != ContractStage::Active {
        Stage::Contract
    } else if !flags.cabin_allocated {
        Stage::CabinAllocation
    } else if !flags.is_paid() {
        Stage::Payment
    } else {
        Stage::Complete
    }
}
