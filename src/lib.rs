//! Blog Post API library.
//!
//! A REST backend for a blogging application: user registration and login,
//! post CRUD, and nested comment/reply CRUD with ownership- and role-based
//! authorization.

pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod web;
