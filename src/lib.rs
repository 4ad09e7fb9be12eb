pub mod error;
pub mod location;
pub mod model;
pub mod selection;
pub mod utils;
pub mod verify;

pub use model::selected_file::SelectedFile;
pub use model::verification::{GpsCoordinates, ImageVerification, LocationSource, TrustLevel};
pub use verify::{ImageVerifier, VerificationPolicy};
