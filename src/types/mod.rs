mod claim_value;
mod claims;
mod properties;
mod version;

pub use claim_value::*;
pub use claims::*;
pub use properties::*;
pub use version::*;
