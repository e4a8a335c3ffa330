//! Service layer: image storage, downstream notification, and the wastage
//! workflow.

pub mod inward_challan;
pub mod storage;
pub mod wastage;

pub use inward_challan::{InwardChallanClient, MouNotifier};
pub use storage::ImageStore;
pub use wastage::{UpsertOutcome, WastageService};
