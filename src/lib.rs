pub mod api;
pub mod bot;
pub mod catalog;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod line;
pub mod market;
pub mod nutrients;
pub mod recommend;
pub mod storage;
