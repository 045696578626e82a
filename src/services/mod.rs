pub mod invoice;
pub mod reconcile;
pub mod sweep;
