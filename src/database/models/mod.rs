pub mod book;
pub mod book_change;
pub mod profile;

pub use book::{Book, BookUpdate, NewBook};
pub use book_change::{BookChange, ChangeAction, NewBookChange};
pub use profile::{Profile, Role};
