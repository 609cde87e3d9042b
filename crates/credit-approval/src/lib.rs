//! credit-approval: credit card approval classifier behind `POST /predict`

pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod server;

pub use config::ClassifierConfig;
pub use error::{Error, Result};
pub use features::ApplicantRecord;
pub use model::TreeEnsemble;
