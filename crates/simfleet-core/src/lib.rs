// simfleet-core: client-side state model between simfleet-api and consumers.
//
// Holds the device registry cache, the edit session with its parameter
// draft list, the single-slot listener subscription, and the panel
// controller that polls the backend and routes commands.

pub mod command;
pub mod config;
pub mod controller;
pub mod draft;
pub mod error;
pub mod listener;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::PanelConfig;
pub use controller::{PanelController, PanelState};
pub use draft::{ParamDraftList, ParamForm};
pub use error::CoreError;
pub use listener::SubscriptionState;
pub use session::{DeviceForm, EditSession, SessionMode, SubmitAction};
pub use store::{DeviceRegistry, FleetStats};
pub use stream::DeviceStream;

// Re-export the wire models at the crate root for ergonomics.
pub use simfleet_api::models::{
    BrokerStats, Device, DeviceStatus, GenerationMode, InboundMessage, ParamKind, Parameter,
};
