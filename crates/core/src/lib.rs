pub mod catalog;
pub mod config;
pub mod connection;
pub mod executor;
pub mod filters;
pub mod session;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;
