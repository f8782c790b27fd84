//! qprof core library: statement profiling, aggregation and reporting.

mod aggregate;
mod cmd;
mod config;
mod connect;
mod error;
mod executor;
mod fsutil;
mod mysql_session;
mod profile;
mod report;
mod statements;
mod summary;

pub use aggregate::*;
pub use cmd::*;
pub use config::*;
pub use connect::*;
pub use error::*;
pub use executor::*;
pub use fsutil::*;
pub use mysql_session::*;
pub use profile::*;
pub use report::*;
pub use statements::*;
pub use summary::*;
