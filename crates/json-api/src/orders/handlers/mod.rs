//! Order Handlers

pub(crate) mod create;
pub(crate) mod fail;
pub(crate) mod get;
pub(crate) mod verify;
