//! Core types and utilities for FaceCensor.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - **Identifiers**: `AccountId`, `BlobId`, `TransactionId`, `ImageId`
//! - **Accounts**: `Account`
//! - **Credits**: `CreditTransaction`, `TransactionKind`
//! - **Images**: `ImageJob`, `ImageStatus`, `MediaType`
//!
//! # Credit Unit
//!
//! One credit pays for censoring one image, whatever its size or face count.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod credits;
pub mod error;
pub mod ids;
pub mod image;

pub use account::{Account, CREDITS_PER_IMAGE, DEFAULT_WELCOME_BONUS_CREDITS};
pub use credits::{CreditTransaction, TransactionKind};
pub use error::{FaceCensorError, Result};
pub use ids::{AccountId, BlobId, IdError, ImageId, TransactionId};
pub use image::{ImageJob, ImageStatus, MediaType};
