pub mod app;
pub mod config;
pub mod context;
pub mod events;
pub mod localization;
pub mod modal;
pub mod project;
pub mod rng;
pub mod scene;
pub mod storage;
pub mod ui;
