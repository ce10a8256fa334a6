//! Merrow CLI library
//!
//! This module contains the core CLI logic: load configuration overrides,
//! read a definition, render it into an in-memory scene and write the SVG.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io, path::Path};

use log::{debug, info};
use url::Url;

use merrow::{
    Merrow, MerrowError, RenderOutcome, RenderRequest,
    scene::{DocumentLocation, Scene},
};

/// Run the Merrow CLI application
///
/// This function renders the input file through the Merrow pipeline and
/// writes the resulting SVG to the output file.
///
/// # Errors
///
/// Returns `MerrowError` for:
/// - File I/O errors
/// - Input no diagram type recognises
/// - Configuration loading errors
/// - Parsing errors
/// - Rendering errors
/// - An invalid `--base-url`
pub fn run(args: &Args) -> Result<(), MerrowError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let overrides = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let location = match &args.base_url {
        Some(url) => DocumentLocation::parse(url)?,
        None => output_location(Path::new(&args.output))?,
    };
    debug!(location:%; "Document location");

    let mut merrow = Merrow::with_scene(Scene::new(location));
    merrow.initialize(&overrides);

    let markup = match merrow.render(RenderRequest::new(&args.id, &source))? {
        RenderOutcome::Rendered { markup, .. } => markup,
        RenderOutcome::Unrecognized => {
            return Err(MerrowError::Unrecognized(args.input.clone()));
        }
        RenderOutcome::Declined => {
            return Err(MerrowError::Io(io::Error::other(
                "no scene is available to render into",
            )));
        }
    };

    fs::write(&args.output, markup)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}

/// `file://` location of the output file.
fn output_location(output: &Path) -> io::Result<DocumentLocation> {
    let absolute = std::path::absolute(output)?;
    let url = Url::from_file_path(&absolute).map_err(|()| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{}` cannot be expressed as a file URL", absolute.display()),
        )
    })?;
    Ok(DocumentLocation::from(&url))
}
