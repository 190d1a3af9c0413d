// src/services/mod.rs
pub mod access_token;
pub mod dispatcher;
pub mod messaging_service;
pub mod token_store;
