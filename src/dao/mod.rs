pub mod http;
pub mod models;
pub mod queries;
pub mod remote;
