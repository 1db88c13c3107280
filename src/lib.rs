//! Scanner for profitable Counter-Strike trade-up contracts.
//!
//! [`domain`] holds the pure evaluation core, [`infra`] the catalog, price and
//! report I/O around it, and [`util`] configuration and logging.

pub mod domain;
pub mod infra;
pub mod util;
