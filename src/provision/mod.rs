// src/provision/mod.rs

//! Resource provisioners.
//!
//! A provisioner owns at most one live resource. `acquire` creates it and
//! returns a [`ResourceHandle`] describing how the child reaches it;
//! `release` tears it down. `release` is idempotent, never fails, and is
//! safe to call after a partial or interrupted `acquire`.
//!
//! - [`database`]: temporary PostgreSQL database via `createdb`/`dropdb`.
//! - [`virtualenv`]: temporary Python virtualenv populated from a
//!   requirements file.
//! - [`naming`]: unique database name generation.

use std::future::Future;
use std::pin::Pin;

use crate::errors::ProvisionError;
use crate::types::ResourceHandle;

pub mod database;
pub mod naming;
pub mod virtualenv;

pub use database::DatabaseProvisioner;
pub use naming::generate_database_name;
pub use virtualenv::VirtualenvProvisioner;

/// Future returned by [`Provisioner::acquire`].
pub type AcquireFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResourceHandle, ProvisionError>> + Send + 'a>>;

/// Future returned by [`Provisioner::release`].
pub type ReleaseFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

pub trait Provisioner: Send {
    /// Short name for logs, e.g. `"database"`.
    fn kind(&self) -> &'static str;

    /// Create the resource.
    ///
    /// Dropping the returned future before it completes leaves the
    /// provisioner in a state `release` can clean up.
    fn acquire(&mut self) -> AcquireFuture<'_>;

    /// Tear the resource down. Failures are logged, never returned.
    fn release(&mut self) -> ReleaseFuture<'_>;
}
