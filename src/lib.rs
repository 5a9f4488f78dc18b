pub mod app;
pub mod filters;
pub mod session;
pub mod suggest;
pub mod tmdb;
pub mod view;
