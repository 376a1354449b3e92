pub mod cache;
pub mod config;
mod constructors;
pub mod controllers;
pub mod entities;
pub mod error;
pub(crate) mod interactors;
pub mod presenters;
pub(crate) mod repositories;
pub mod usecases;
pub(crate) mod utils;

pub use constructors::*;
pub use controllers::Controller;
pub use error::{CoreError, CoreResult};
