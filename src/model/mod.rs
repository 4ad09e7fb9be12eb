pub mod exif_field;
pub mod selected_file;
pub mod submission;
pub mod verification;
