pub mod bank;
pub mod repository;
pub mod sqlite;
