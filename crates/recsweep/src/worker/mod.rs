mod interface;
mod pool;
#[cfg(test)]
mod tests;
#[allow(clippy::module_inception)]
mod worker;

pub use interface::*;
pub use pool::*;
pub use worker::*;
