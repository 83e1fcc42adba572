pub mod clock;
pub mod module;
pub mod registry;
pub mod settings;

pub use clock::{Clock, FixedClock, SystemClock};
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
