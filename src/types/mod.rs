mod canonical;
mod course;
mod ids;
mod lecturer;
mod program;
mod room;
mod time_slot;
mod variable;

pub use canonical::*;
pub use course::*;
pub use ids::*;
pub use lecturer::*;
pub use program::*;
pub use room::*;
pub use time_slot::*;
pub use variable::*;
