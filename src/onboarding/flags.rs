//! Client onboarding flags — the snapshot a stage is resolved from.
//!
//! The client-data service is loosely typed: enums arrive in any case,
//! booleans sometimes arrive as strings, and allocation is sometimes a
//! reference object instead of a flag. Everything is normalized here so the
//! resolver only ever sees well-typed values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// KYC verification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    None,
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    /// Case-insensitive parse. Unknown values are `None`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "verified" => Self::Verified,
            "rejected" => Self::Rejected,
            _ => Self::None,
        }
    }
}

/// Contract lifecycle stage, also used for individual contract records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStage {
    #[default]
    Draft,
    PendingSignature,
    Active,
}

impl ContractStage {
    /// Case-insensitive parse. Unknown values are `Draft`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending_signature" => Self::PendingSignature,
            "active" => Self::Active,
            _ => Self::Draft,
        }
    }
}

/// A contract attached to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Absent when the service sent a contract without an identifier.
    pub id: Option<String>,
    /// Raw status, lowercased. Contract statuses outside the onboarding
    /// stages (e.g. `expired`) are kept as-is.
    pub status: String,
}

impl ContractRecord {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status: status.into().trim().to_ascii_lowercase(),
        }
    }

    pub fn without_id(status: impl Into<String>) -> Self {
        Self {
            id: None,
            status: status.into().trim().to_ascii_lowercase(),
        }
    }

    pub fn is_pending_signature(&self) -> bool {
        self.status == "pending_signature"
    }
}

/// Reference to the building a client is being allocated into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRef {
    pub id: String,
    /// The full object as delivered, so the allocation screen can render it
    /// without fetching again.
    pub payload: Value,
}

impl BuildingRef {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// One client's onboarding progress at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientFlags {
    pub id: String,
    pub company_details_complete: bool,
    pub kyc_status: KycStatus,
    pub contract_stage: ContractStage,
    pub cabin_allocated: bool,
    /// Free-form; only `paid` counts as settled.
    pub payment_status: String,
    pub contracts: Vec<ContractRecord>,
    pub building: Option<BuildingRef>,
}

impl ClientFlags {
    /// A client with nothing completed yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company_details_complete: false,
            kyc_status: KycStatus::None,
            contract_stage: ContractStage::Draft,
            cabin_allocated: false,
            payment_status: "unpaid".to_string(),
            contracts: Vec::new(),
            building: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.trim().eq_ignore_ascii_case("paid")
    }

    /// First contract awaiting signature, in delivery order.
    pub fn pending_signature_contract(&self) -> Option<&ContractRecord> {
        self.contracts.iter().find(|c| c.is_pending_signature())
    }

    /// Build flags from a client object returned by the client-data service.
    ///
    /// Only a non-object payload or a missing/empty `id` is rejected; every
    /// other absent or unrecognized field falls back to its "not done" value.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", json_kind(value)))?;

        let id = obj
            .get("id")
            .or_else(|| obj.get("_id"))
            .and_then(scalar_to_string)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "missing client id".to_string())?;

        let field = |camel: &str, snake: &str| obj.get(camel).or_else(|| obj.get(snake));

        let company_details_complete = field("companyDetailsComplete", "company_details_complete")
            .map(is_truthy_flag)
            .unwrap_or(false);

        let kyc_status = field("kycStatus", "kyc_status")
            .and_then(Value::as_str)
            .map(KycStatus::parse)
            .unwrap_or_default();

        let contract_stage = field("contractStage", "contract_stage")
            .and_then(Value::as_str)
            .map(ContractStage::parse)
            .unwrap_or_default();

        let cabin_allocated = field("cabinAllocated", "cabin_allocated")
            .map(is_truthy_reference)
            .unwrap_or(false);

        let payment_status = field("paymentStatus", "payment_status")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unpaid".to_string());

        let contracts = obj
            .get("contracts")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(contract_from_json).collect())
            .unwrap_or_default();

        let building = obj.get("building").and_then(building_from_json);

        Ok(Self {
            id,
            company_details_complete,
            kyc_status,
            contract_stage,
            cabin_allocated,
            payment_status,
            contracts,
            building,
        })
    }
}

fn contract_from_json(value: &Value) -> Option<ContractRecord> {
    if !value.is_object() {
        return None;
    }
    let status = value.get("status").and_then(Value::as_str).unwrap_or("");
    let record = match value
        .get("id")
        .or_else(|| value.get("_id"))
        .and_then(scalar_to_string)
    {
        Some(id) => ContractRecord::new(id, status),
        None => ContractRecord::without_id(status),
    };
    Some(record)
}

fn building_from_json(value: &Value) -> Option<BuildingRef> {
    let id = value
        .get("id")
        .or_else(|| value.get("_id"))
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())?;
    Some(BuildingRef::new(id, value.clone()))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Strict boolean: `true` or the string `"true"`.
fn is_truthy_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Boolean or a reference to an allocated resource.
fn is_truthy_reference(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && !s.eq_ignore_ascii_case("false")
        }
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Null => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_full_client() {
        let flags = ClientFlags::from_json(&json!({
            "id": "cl_1",
            "companyDetailsComplete": true,
            "kycStatus": "verified",
            "contractStage": "active",
            "cabinAllocated": true,
            "paymentStatus": "paid",
            "contracts": [{"id": "c1", "status": "active"}],
            "building": {"id": "b7", "name": "Harbour House"},
            "unrelated": {"ignored": true}
        }))
        .unwrap();

        assert_eq!(flags.id, "cl_1");
        assert!(flags.company_details_complete);
        assert_eq!(flags.kyc_status, KycStatus::Verified);
        assert_eq!(flags.contract_stage, ContractStage::Active);
        assert!(flags.cabin_allocated);
        assert!(flags.is_paid());
        assert_eq!(flags.contracts, vec![ContractRecord::new("c1", "active")]);
        let building = flags.building.unwrap();
        assert_eq!(building.id, "b7");
        assert_eq!(building.payload["name"], "Harbour House");
    }

    #[test]
    fn absent_fields_default_to_not_done() {
        let flags = ClientFlags::from_json(&json!({"id": "cl_2"})).unwrap();
        assert_eq!(flags, ClientFlags::new("cl_2"));
        assert_eq!(flags.contract_stage, ContractStage::Draft);
        assert_eq!(flags.kyc_status, KycStatus::None);
    }

    #[test]
    fn enums_are_case_insensitive() {
        let flags = ClientFlags::from_json(&json!({
            "id": "cl_3",
            "kycStatus": "VERIFIED",
            "contractStage": " Pending_Signature ",
            "paymentStatus": "PAID"
        }))
        .unwrap();
        assert_eq!(flags.kyc_status, KycStatus::Verified);
        assert_eq!(flags.contract_stage, ContractStage::PendingSignature);
        assert!(flags.is_paid());
    }

    #[test]
    fn unknown_enum_values_fall_back() {
        assert_eq!(KycStatus::parse("approved-ish"), KycStatus::None);
        assert_eq!(ContractStage::parse("archived"), ContractStage::Draft);
        assert_eq!(KycStatus::parse(""), KycStatus::None);
    }

    #[test]
    fn snake_case_aliases_are_accepted() {
        let flags = ClientFlags::from_json(&json!({
            "id": 42,
            "company_details_complete": "true",
            "kyc_status": "pending",
            "contract_stage": "active",
            "cabin_allocated": {"id": "cabin-9"},
            "payment_status": "unpaid"
        }))
        .unwrap();
        assert_eq!(flags.id, "42");
        assert!(flags.company_details_complete);
        assert_eq!(flags.kyc_status, KycStatus::Pending);
        assert!(flags.cabin_allocated);
        assert!(!flags.is_paid());
    }

    #[test]
    fn cabin_reference_truthiness() {
        assert!(is_truthy_reference(&json!("cabin-1")));
        assert!(is_truthy_reference(&json!(3)));
        assert!(!is_truthy_reference(&json!("")));
        assert!(!is_truthy_reference(&json!(0)));
        assert!(!is_truthy_reference(&json!({})));
        assert!(!is_truthy_reference(&json!(null)));
        assert!(!is_truthy_reference(&json!("false")));
    }

    #[test]
    fn rejects_non_objects_and_missing_ids() {
        assert!(ClientFlags::from_json(&json!(null)).is_err());
        assert!(ClientFlags::from_json(&json!([{"id": "x"}])).is_err());
        assert!(ClientFlags::from_json(&json!({"kycStatus": "verified"})).is_err());
        assert!(ClientFlags::from_json(&json!({"id": ""})).is_err());
    }

    #[test]
    fn contracts_keep_delivery_order() {
        let flags = ClientFlags::from_json(&json!({
            "id": "cl_4",
            "contracts": [
                {"id": "c1", "status": "draft"},
                {"id": "c2", "status": "PENDING_SIGNATURE"},
                {"status": "pending_signature"},
                {"id": 3, "status": "pending_signature"}
            ]
        }))
        .unwrap();
        let ids: Vec<Option<&str>> = flags.contracts.iter().map(|c| c.id.as_deref()).collect();
        assert_eq!(ids, [Some("c1"), Some("c2"), None, Some("3")]);
        assert_eq!(
            flags.pending_signature_contract().unwrap().id.as_deref(),
            Some("c2")
        );
    }

    #[test]
    fn contract_without_id_keeps_its_place() {
        let flags = ClientFlags::from_json(&json!({
            "id": "cl_6",
            "contracts": [
                {"status": "pending_signature"},
                {"id": "c2", "status": "pending_signature"}
            ]
        }))
        .unwrap();
        let first = flags.pending_signature_contract().unwrap();
        assert_eq!(first, &ContractRecord::without_id("pending_signature"));
    }

    #[test]
    fn building_without_id_is_dropped() {
        let flags = ClientFlags::from_json(&json!({
            "id": "cl_5",
            "building": {"name": "No Id Tower"}
        }))
        .unwrap();
        assert!(flags.building.is_none());
    }
}
