// src/lib.rs
pub mod app;
pub mod config;
pub mod crud;
pub mod db;
pub mod error;
pub mod mails;
pub mod messages;
pub mod models;
pub mod repository;
pub mod subscribers;
pub mod users;
