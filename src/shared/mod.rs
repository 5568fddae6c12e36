pub mod events;
pub mod utils;

pub use events::*;
pub use utils::*;
