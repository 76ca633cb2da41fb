//! Domain types shared by the parley crates.
//!
//! These are the shapes the stores and the presentation layer agree on.
//! Wire records live next to the API client in `parley-core`.

mod message;
mod session;
mod user;

pub use message::{Feedback, Message, Rating, Role, Source};
pub use session::{Session, relative_time};
pub use user::UserIdentity;
