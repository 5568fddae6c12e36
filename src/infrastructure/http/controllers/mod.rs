pub mod health;
pub mod leads;
pub mod messages;
pub mod professionals;
pub mod recovery;
pub mod webhooks;
