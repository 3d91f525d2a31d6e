//! # Marketplace Bot
//!
//! A Telegram bot and web mini-app for posting and browsing classified ads,
//! both backed by one SQLite store.

pub mod bot;
pub mod config;
pub mod db;
pub mod localization;
pub mod models;
pub mod web;
