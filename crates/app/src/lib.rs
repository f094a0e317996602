//! Persistence, payment provider integration and checkout services.

pub mod context;
pub mod database;
pub mod domain;
pub mod payments;

#[cfg(test)]
mod test;

mod uuids;
