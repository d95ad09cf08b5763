pub mod api;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod html_rewrite;
pub mod media;
pub mod model;
pub mod reading_time;
pub mod schema;
pub mod search;
pub mod sitemap;
pub mod text;
pub mod url;
