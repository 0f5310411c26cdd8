pub mod channels;
pub mod record;
pub mod store;
