//! Order Repositories

mod orders;

pub(crate) use orders::PgOrdersRepository;
