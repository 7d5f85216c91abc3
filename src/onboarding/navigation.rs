//! Stage → route mapping.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::flags::{BuildingRef, ClientFlags};
use super::stage::Stage;

/// Keys written to the staged-context store for the cabin-allocation screen.
pub mod staged_keys {
    pub const CLIENT_ID: &str = "client_id";
    pub const SELECTED_BUILDING: &str = "selected_building";
}

/// Console screens the onboarding flow can send a user to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "kebab-case")]
pub enum RouteId {
    CompanyDetailsForm,
    KycVerification,
    UploadSignedContract { contract_id: String },
    ContractOverview,
    CabinAllocation,
    Payments,
    ClientDashboard,
}

impl RouteId {
    /// Route identifier, without parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CompanyDetailsForm => "company-details-form",
            Self::KycVerification => "kyc-verification",
            Self::UploadSignedContract { .. } => "upload-signed-contract",
            Self::ContractOverview => "contract-overview",
            Self::CabinAllocation => "cabin-allocation",
            Self::Payments => "payments",
            Self::ClientDashboard => "client-dashboard",
        }
    }

    /// Console URL path for this route.
    pub fn path(&self, client_id: &str) -> String {
        match self {
            Self::CompanyDetailsForm => format!("/clients/{client_id}/company-details"),
            Self::KycVerification => format!("/clients/{client_id}/kyc"),
            Self::UploadSignedContract { contract_id } => {
                format!("/clients/{client_id}/contracts/{contract_id}/upload")
            }
            Self::ContractOverview => format!("/clients/{client_id}/contracts"),
            Self::CabinAllocation => format!("/clients/{client_id}/cabin-allocation"),
            Self::Payments => format!("/clients/{client_id}/payments"),
            Self::ClientDashboard => format!("/clients/{client_id}"),
        }
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UploadSignedContract { contract_id } => {
                write!(f, "{}({contract_id})", self.name())
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Context the cabin-allocation screen reads instead of fetching again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedContext {
    pub client_id: String,
    pub building: BuildingRef,
}

impl StagedContext {
    /// Store entries, in write order.
    pub fn entries(&self) -> [(&'static str, String); 2] {
        [
            (staged_keys::CLIENT_ID, self.client_id.clone()),
            (staged_keys::SELECTED_BUILDING, self.building.payload.to_string()),
        ]
    }
}

/// Where to send the user next, and what to stage before going there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationDecision {
    pub client_id: String,
    pub stage: Stage,
    pub target: RouteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staged_context: Option<StagedContext>,
}

impl NavigationDecision {
    pub fn path(&self) -> String {
        self.target.path(&self.client_id)
    }
}

/// Map a resolved stage to a navigation decision.
///
/// Never fails: when secondary data (a pending contract, a building) is
/// missing, the coarser route is returned and the destination screen
/// fetches what it needs.
pub fn map_to_navigation(stage: Stage, client: &ClientFlags) -> NavigationDecision {
    let mut staged_context = None;
    let target = match stage {
        Stage::CompanyDetails => RouteId::CompanyDetailsForm,
        Stage::Kyc => RouteId::KycVerification,
        Stage::Contract => match client.pending_signature_contract() {
            Some(contract) => match &contract.id {
                Some(id) => RouteId::UploadSignedContract {
                    contract_id: id.clone(),
                },
                None => {
                    debug!(client_id = %client.id, "Pending contract has no id");
                    RouteId::ContractOverview
                }
            },
            None => RouteId::ContractOverview,
        },
        Stage::CabinAllocation => {
            staged_context = client.building.clone().map(|building| StagedContext {
                client_id: client.id.clone(),
                building,
            });
            RouteId::CabinAllocation
        }
        Stage::Payment => RouteId::Payments,
        Stage::Complete => RouteId::ClientDashboard,
    };

    NavigationDecision {
        client_id: client.id.clone(),
        stage,
        target,
        staged_context,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::onboarding::flags::{ContractRecord, ContractStage, KycStatus};
    use crate::onboarding::stage::resolve;

    fn client() -> ClientFlags {
        ClientFlags::new("cl_1")
    }

    #[test]
    fn simple_stages_map_to_fixed_routes() {
        let cases = [
            (Stage::CompanyDetails, "company-details-form"),
            (Stage::Kyc, "kyc-verification"),
            (Stage::Payment, "payments"),
            (Stage::Complete, "client-dashboard"),
        ];
        for (stage, route) in cases {
            let decision = map_to_navigation(stage, &client());
            assert_eq!(decision.target.name(), route);
            assert_eq!(decision.stage, stage);
            assert!(decision.staged_context.is_none());
        }
    }

    #[test]
    fn complete_client_lands_on_dashboard() {
        let c = ClientFlags {
            company_details_complete: true,
            kyc_status: KycStatus::Verified,
            contract_stage: ContractStage::Active,
            cabin_allocated: true,
            payment_status: "paid".to_string(),
            ..client()
        };
        let decision = map_to_navigation(resolve(&c), &c);
        assert_eq!(decision.target, RouteId::ClientDashboard);
        assert_eq!(decision.path(), "/clients/cl_1");
    }

    #[test]
    fn pending_contract_routes_to_upload() {
        let c = ClientFlags {
            contracts: vec![ContractRecord::new("c1", "pending_signature")],
            ..client()
        };
        let decision = map_to_navigation(Stage::Contract, &c);
        assert_eq!(
            decision.target,
            RouteId::UploadSignedContract {
                contract_id: "c1".to_string()
            }
        );
        assert_eq!(decision.path(), "/clients/cl_1/contracts/c1/upload");
    }

    #[test]
    fn first_pending_contract_wins() {
        let c = ClientFlags {
            contracts: vec![
                ContractRecord::new("c0", "draft"),
                ContractRecord::new("c2", "pending_signature"),
                ContractRecord::new("c1", "pending_signature"),
            ],
            ..client()
        };
        let decision = map_to_navigation(Stage::Contract, &c);
        assert_eq!(
            decision.target,
            RouteId::UploadSignedContract {
                contract_id: "c2".to_string()
            }
        );
    }

    #[test]
    fn pending_contract_without_id_routes_to_overview() {
        let c = ClientFlags {
            contracts: vec![
                ContractRecord::without_id("pending_signature"),
                ContractRecord::new("c2", "pending_signature"),
            ],
            ..client()
        };
        let decision = map_to_navigation(Stage::Contract, &c);
        assert_eq!(decision.target, RouteId::ContractOverview);
        assert_eq!(decision.path(), "/clients/cl_1/contracts");
    }

    #[test]
    fn no_pending_contract_routes_to_overview() {
        let c = ClientFlags {
            contracts: vec![ContractRecord::new("c1", "active")],
            ..client()
        };
        assert_eq!(map_to_navigation(Stage::Contract, &c).target, RouteId::ContractOverview);
        assert_eq!(map_to_navigation(Stage::Contract, &client()).target, RouteId::ContractOverview);
    }

    #[test]
    fn allocation_stages_client_and_building() {
        let c = ClientFlags {
            building: Some(BuildingRef::new("b7", json!({"id": "b7", "name": "Harbour House"}))),
            ..client()
        };
        let decision = map_to_navigation(Stage::CabinAllocation, &c);
        assert_eq!(decision.target, RouteId::CabinAllocation);

        let staged = decision.staged_context.unwrap();
        assert_eq!(staged.client_id, "cl_1");
        assert_eq!(staged.building.id, "b7");

        let [client_entry, building_entry] = staged.entries();
        assert_eq!(client_entry, (staged_keys::CLIENT_ID, "cl_1".to_string()));
        assert_eq!(building_entry.0, staged_keys::SELECTED_BUILDING);
        let payload: serde_json::Value = serde_json::from_str(&building_entry.1).unwrap();
        assert_eq!(payload["name"], "Harbour House");
    }

    #[test]
    fn allocation_without_building_still_navigates() {
        let decision = map_to_navigation(Stage::CabinAllocation, &client());
        assert_eq!(decision.target, RouteId::CabinAllocation);
        assert!(decision.staged_context.is_none());
    }

    #[test]
    fn route_serializes_with_tag() {
        let json = serde_json::to_value(RouteId::UploadSignedContract {
            contract_id: "c9".to_string(),
        })
        .unwrap();
        assert_eq!(json, json!({"route": "upload-signed-contract", "contract_id": "c9"}));

        let json = serde_json::to_value(RouteId::KycVerification).unwrap();
        assert_eq!(json, json!({"route": "kyc-verification"}));
    }

    #[test]
    fn display_includes_contract_parameter() {
        let route = RouteId::UploadSignedContract {
            contract_id: "c1".to_string(),
        };
        assert_eq!(route.to_string(), "upload-signed-contract(c1)");
        assert_eq!(RouteId::Payments.to_string(), "payments");
    }
}
