pub mod admin_cleanup;
pub mod admin_login;
pub mod cron_revert;
pub mod health;
pub mod mark_sold;
pub mod orders;
pub mod payment_create;
pub mod payment_verify;
pub mod phones;
pub mod sentoo_webhook;
