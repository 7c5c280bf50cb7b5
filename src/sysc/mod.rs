pub mod brownout;
mod error;
pub mod hal;
pub mod ledctl;
pub mod logging;
pub mod power;
pub mod vector;
pub mod veneer;

#[cfg(not(target_os = "none"))]
pub mod sim;
#[cfg(target_os = "none")]
pub mod xmc;

#[cfg(target_os = "none")]
mod panic;

pub use error::{OsError, ReportableError};
pub type OsResult<T> = ::core::result::Result<T, OsError>;
