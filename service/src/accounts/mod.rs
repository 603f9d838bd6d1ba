//! Account registration and login.
//!
//! [`store`] owns the persisted collection; [`http`] exposes it over
//! `POST /register` and `POST /login`.

pub mod http;
pub mod store;
