pub mod auth;
pub mod calendar;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod notify;
pub mod schedule;
pub mod school;
pub mod settings;
pub mod store;
pub mod terminal;
pub mod web;
