// handlers/console/mod.rs - Admin console endpoints
//
// Page navigation is gated by the route guard on the session token; each
// handler then takes an `AdminContext`, so a signed-in non-admin gets 403.
// Login and logout are the exceptions and need no admin role.

pub mod analytics;
pub mod books;
pub mod dashboard;
pub mod login;
pub mod settings;

pub use analytics::analytics;
pub use books::{book_detail, book_edit};
pub use dashboard::dashboard;
pub use login::{login, login_form, logout};
pub use settings::{invite, refresh_session, revoke_admin, settings};
