use clap::{Parser, Subcommand};
use photo_provenance::error::{LocationError, MetadataError, UploadError};
use photo_provenance::location::{
    ManualLocation, NoDeviceLocator, ResolvedLocation, resolve_location,
};
use photo_provenance::model::selected_file::SelectedFile;
use photo_provenance::model::submission::ComplaintSubmission;
use photo_provenance::model::verification::ImageVerification;
use photo_provenance::utils::env_reader::EnvVariables;
use photo_provenance::utils::exif::read_exif_from_bytes;
use photo_provenance::verify::ImageVerifier;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "photo-provenance",
    version,
    about = "Checks how far complaint photos can be trusted as on-site evidence"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the verdict for each image as JSON
    Verify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Dump the raw Exif tags of an image
    Exif { file: PathBuf },
    /// Show the form fields a complaint with this image would be submitted with
    Submit {
        file: PathBuf,
        #[arg(long)]
        description: String,
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: `{0}`")]
    IO(#[from] std::io::Error),
    #[error("JSON error: `{0}`")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("{0}")]
    Other(String),
}

pub async fn run_cli(
    cli: Cli,
    vars: &EnvVariables,
    verifier: &ImageVerifier,
) -> Result<(), CliError> {
    match cli.command {
        Command::Verify { files, pretty } => verify_files(verifier, files, pretty).await,
        Command::Exif { file } => dump_exif(file).await,
        Command::Submit {
            file,
            description,
            lat,
            lng,
            address,
        } => {
            let manual = lat.zip(lng).map(|(lat, lng)| ManualLocation {
                lat,
                lng,
                address: address.clone(),
            });
            preview_submission(verifier, vars, file, description, manual, address).await
        }
    }
}

async fn verify_files(
    verifier: &ImageVerifier,
    paths: Vec<PathBuf>,
    pretty: bool,
) -> Result<(), CliError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let file = SelectedFile::read_from_path(path).await?;
        if let Err(e) = file.check_upload() {
            warn!("{} would be rejected by the upload form: {e}", path.display());
        }
        files.push(file);
    }

    let names: Vec<String> = files.iter().map(|file| file.name.clone()).collect();
    let verifications = verifier.verify_all(files).await;
    let report = verification_report(names, verifications);

    let output = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{output}");

    Ok(())
}

async fn dump_exif(path: PathBuf) -> Result<(), CliError> {
    let bytes = tokio::fs::read(&path).await?;
    let exif = task::spawn_blocking(move || read_exif_from_bytes(&bytes))
        .await
        .map_err(|e| CliError::Other(e.to_string()))??;

    match exif {
        Some(fields) => {
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }
        None => Err(CliError::Other(format!(
            "Exif data not found in {}",
            path.display()
        ))),
    }
}

async fn preview_submission(
    verifier: &ImageVerifier,
    vars: &EnvVariables,
    path: PathBuf,
    description: String,
    manual: Option<ManualLocation>,
    address: Option<String>,
) -> Result<(), CliError> {
    let file = SelectedFile::read_from_path(&path).await?;
    file.check_upload()?;

    let verification = verifier.verify(file).await;
    info!(
        "{}: {} ({})",
        path.display(),
        verification.trust_level().label(),
        verification.trust_level().summary()
    );
    for warning in verification.warnings() {
        warn!("{warning}");
    }

    let location = resolve_location(
        &verification,
        &NoDeviceLocator,
        manual,
        vars.geolocation_timeout,
    )
    .await?;

    let fields = submission_fields(
        description,
        location,
        address,
        verification,
        &vars.address_field_name,
    )?;
    for (name, value) in fields {
        println!("{name}: {value}");
    }

    Ok(())
}

fn verification_report(
    names: Vec<String>,
    verifications: Vec<ImageVerification>,
) -> Vec<serde_json::Value> {
    names
        .into_iter()
        .zip(verifications)
        .map(|(file, verification)| json!({ "file": file, "verification": verification }))
        .collect()
}

/// `--address` fills in the address only when the resolved location has none.
fn submission_fields(
    description: String,
    mut location: ResolvedLocation,
    address: Option<String>,
    verification: ImageVerification,
    address_field: &str,
) -> serde_json::Result<Vec<(String, String)>> {
    if location.address.is_none() {
        location.address = address;
    }

    ComplaintSubmission::new(description, location, verification).form_fields(address_field)
}
