pub mod analysis;
pub mod enums;
pub mod pet;
pub mod request;

pub use analysis::*;
pub use enums::*;
pub use pet::*;
pub use request::*;
