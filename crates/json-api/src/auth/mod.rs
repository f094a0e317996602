//! Caller identity, asserted by the upstream identity gateway.

pub(crate) mod middleware;
