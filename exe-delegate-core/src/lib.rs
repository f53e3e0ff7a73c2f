pub mod author;
pub mod codec;
pub mod error;
mod host;
pub mod record;
pub mod runner;
pub mod settings;
mod sig;

pub use codec::*;
pub use error::*;
pub use host::HostFormat;
pub use record::*;
pub use settings::*;
