pub mod cache;
pub mod cdn;
pub mod cli;
pub mod config;
pub mod database;
pub mod entities;
pub mod errors;
pub mod images;
pub mod models;
pub mod repositories;
pub mod services;
pub mod web;
