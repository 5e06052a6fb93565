//! FaceCensor Client SDK.
//!
//! This crate provides a client library for applications talking to the
//! FaceCensor API on behalf of a signed-in user.
//!
//! # Example
//!
//! ```no_run
//! use facecensor_client::FaceCensorClient;
//!
//! # async fn example() -> Result<(), facecensor_client::ClientError> {
//! let client = FaceCensorClient::new("http://facecensor:8080", "user-jwt")?;
//!
//! let bytes = std::fs::read("group.jpg").expect("read image");
//! let job = client.upload_image("group.jpg", "image/jpeg", bytes).await?;
//! println!("{} faces censored", job.faces_detected);
//!
//! if job.has_processed {
//!     let censored = client.download_processed(&job.id).await?;
//!     std::fs::write("group_censored.jpg", censored).expect("write image");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, FaceCensorClient};
pub use error::ClientError;
pub use types::*;
