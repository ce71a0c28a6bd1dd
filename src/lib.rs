//! Interactive explorer for the Massachusetts cannabis establishment
//! license dataset: a data pipeline (`data`) and the egui front-end built on it.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
