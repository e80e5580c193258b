//! Client side of the admin console: session handling, route guarding,
//! remote user directory access and the user form state machine.

pub mod directory;
pub mod error;
pub mod form;
pub mod navigation;
pub mod session;
pub mod shell;
pub mod transport;

pub use directory::{DirectoryClient, HttpDirectoryClient};
pub use error::{ClientError, ClientResult};
pub use form::{DiscardBehavior, FormField, FormMode, UserFormController};
pub use navigation::{NavigationShell, Navigator, Route};
pub use session::SessionStore;
pub use transport::HttpTransport;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
