//! Route modules for the file dedup server

pub mod files;
pub mod health;
pub mod upload;
