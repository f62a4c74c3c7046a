pub mod dataset;
pub mod db;
pub mod predict;
pub mod settings;
