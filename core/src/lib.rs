pub mod aggregate;
pub mod logbook;
pub mod metabolic;
pub mod models;
pub mod period;
pub mod profile;
pub mod servings;
pub mod service;
pub mod store;
pub mod strategy;
