pub mod enums;
pub mod profile;
pub mod result;
pub mod session;
pub mod settings;

pub use enums::*;
pub use profile::*;
pub use result::*;
pub use session::*;
pub use settings::*;
