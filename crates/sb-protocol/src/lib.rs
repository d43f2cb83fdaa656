pub mod catalog;
pub mod intent;
pub mod session;
pub mod transcript;

pub use catalog::*;
pub use intent::*;
pub use session::*;
pub use transcript::*;
