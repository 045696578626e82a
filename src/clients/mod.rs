pub mod notifications;
pub mod sentoo;
pub mod storage;
