pub mod backend;
pub mod bot;
pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

#[cfg(test)]
mod test;
