pub mod app;
pub mod config;
pub mod error;
pub mod utils;
pub mod viewer;

pub mod schema {
    pub mod api;
    pub mod db;
}

pub mod api {
    pub mod db;
    pub mod endpoints;
    pub mod memory;
    pub mod pagination;
}
