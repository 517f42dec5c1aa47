//! Core types and trait definitions for the birth-declaration registry.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::RegistryStore`] and [`blob::BlobStore`]; the HTTP layer
//! drives the [`service::Registry`] actions with an explicit
//! [`actor::Actor`].

// Native `async fn` in traits; futures are declared `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod actor;
pub mod blob;
pub mod declaration;
pub mod error;
pub mod lifecycle;
pub mod org;
pub mod policy;
pub mod query;
pub mod render;
pub mod service;
pub mod store;

pub use error::{Error, FieldError, Result, ValidationErrors};
