#![forbid(unsafe_code)]

pub mod identity;
pub mod repository;
pub mod rest;
pub mod sqlite;
