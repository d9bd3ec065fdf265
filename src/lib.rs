//! Thorcast: US weather forecasts by city, state and period, served from a
//! cache that expires in step with forecast validity windows.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod normalize;
pub mod resolver;
pub mod routes;
pub mod service;
