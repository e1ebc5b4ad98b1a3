pub mod config_model;
