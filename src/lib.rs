pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod redirect;
pub mod service;
pub mod shortener;
pub mod storage;
pub mod validation;
