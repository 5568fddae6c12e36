pub mod conversation;
pub mod lead;
pub mod nlu;
pub mod professional;
pub mod recovery;
pub mod slot;

pub use conversation::*;
pub use lead::*;
pub use nlu::*;
pub use professional::*;
pub use recovery::*;
pub use slot::*;
