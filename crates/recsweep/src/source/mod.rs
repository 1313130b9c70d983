mod channel;
mod interface;
mod lock;
#[cfg(test)]
mod tests;

pub use channel::*;
pub use interface::*;
pub use lock::*;
