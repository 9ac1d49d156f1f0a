// handlers/functions/mod.rs - The two file-touching operations
//
// Both re-verify the caller's admin role server-side before reading the body.

pub mod delete;
pub mod upload;

pub use delete::delete_book_and_files;
pub use upload::upload_and_insert;
