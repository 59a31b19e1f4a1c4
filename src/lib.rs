pub mod config;
pub mod cookies;
pub mod error;
pub mod gate;
pub mod guard;
pub mod layer;
pub mod session;

pub use config::{Parameters, SharedParameters, TARGETING_SESSION_ENABLED};
pub use error::{ConfigError, SessionError};
pub use gate::{ConfigFeatureGate, FeatureGate, TargetingState};
pub use guard::{RequestKind, TargetingSessionGuard};
pub use layer::{TargetingSessionLayer, TargetingSessionService};
pub use session::{
    targeting_bags, AttributeBag, Session, SessionBagDescriptor, DEFAULT_COOKIE_NAME,
    TARGETING_BAG_SESSION, TARGETING_BAG_VISITOR,
};
