//! Events exchanged by the normalization stage
//!
//! - [`process`]: the processing event a pass reads from and writes to
//! - [`normalizing`]: the carrier lent to observers during a pass
//! - [`dispatcher`]: the observer registry and its dispatch contract

pub mod dispatcher;
pub mod normalizing;
pub mod process;

pub use dispatcher::{EventDispatcher, Listener, ListenerError, ListenerRegistry};
pub use normalizing::{Context, NormalizingEvent};
pub use process::{ProcessEvent, ProcessingEvent};
