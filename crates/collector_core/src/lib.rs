//! Collector core: data model and the pure package lifecycle state machine.
mod control;
mod effect;
mod message;
mod msg;
mod package;
mod state;
mod update;
mod view_model;

pub use control::{
    normalize_package_name, ControlSignal, COMPLETE_MESSAGE, TEXT_START_MARKER, WORKFLOW_CATEGORY,
};
pub use effect::Effect;
pub use message::{ClassifiedMessage, PayloadFields};
pub use msg::Msg;
pub use package::{InvalidPackageId, Package, PackageId};
pub use state::{CollectorPhase, CollectorState, OpenPackage};
pub use update::update;
pub use view_model::CollectorView;
