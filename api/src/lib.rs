pub mod ai;
pub mod auth;
pub mod response;
pub mod routes;
pub mod verification;
pub mod ws;
