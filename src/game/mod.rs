//! Card effects, validation and the flows that drive them

pub mod actions;
pub mod card_manager;
pub mod context;
pub mod corporation;
pub mod forced_action;
pub mod parameters;
pub mod payment;
pub mod plan;
pub mod processor;
pub mod requirements;
pub mod selection;
pub mod subscriber;
pub mod tiles;

pub use actions::CardActionService;
pub use card_manager::{CardManager, PlayCardRequest};
pub use context::EngineContext;
pub use corporation::CorporationService;
pub use forced_action::ForcedActionManager;
pub use parameters::ParameterChange;
pub use payment::{CardPayment, PaymentEnvelope, PaymentResolver};
pub use plan::{EffectPlan, OutputScope};
pub use processor::CardProcessor;
pub use requirements::{check_production_floors, RequirementsValidator};
pub use selection::SelectionService;
pub use subscriber::EffectSubscriber;
pub use tiles::TileService;
