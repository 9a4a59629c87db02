pub mod account;
pub mod analysis;
pub mod invitation;
pub mod seed;
