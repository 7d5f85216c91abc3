//! Client onboarding — which stage a client is stuck at, and where to send
//! the user next.
//!
//! Data flows one way: the orchestrator fetches a client's flags, the
//! resolver picks the first incomplete stage, the mapper turns that into a
//! route, and the orchestrator stages any context the destination screen
//! needs before handing the decision back.

pub mod flags;
pub mod navigation;
pub mod orchestrator;
pub mod routes;
pub mod stage;

pub use flags::{BuildingRef, ClientFlags, ContractRecord, ContractStage, KycStatus};
pub use navigation::{NavigationDecision, RouteId, StagedContext, map_to_navigation, staged_keys};
pub use orchestrator::{DecisionHandle, DecisionOutcome, OnboardingOrchestrator};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use stage::{Stage, resolve};
