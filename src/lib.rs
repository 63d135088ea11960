pub mod api;
pub mod auth;
pub mod config;
pub mod connector;
pub mod db;
pub mod docs;
pub mod model;
pub mod models;
pub mod report;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;
