//! ID type wrappers for type safety.

#[macro_use]
mod id_macro;

mod content_id;
mod user_id;

pub use content_id::ContentId;
pub use user_id::UserId;
