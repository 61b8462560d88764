pub mod filter;
pub mod view;
