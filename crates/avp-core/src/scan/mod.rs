//! Frame accumulation and scan session lifecycle.

mod accumulator;
#[cfg(feature = "native")]
mod actor;
mod merge;
mod session;
mod store;

pub use accumulator::{FrameAccumulator, Offer};
#[cfg(feature = "native")]
pub use actor::{ScanSession, SessionHandle};
pub use merge::{is_complete, merge};
pub use session::{SessionCore, SessionEvent};
pub use store::{MemoryStore, RecordStore};
