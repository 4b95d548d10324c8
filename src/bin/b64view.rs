//! b64view CLI
//!
//! Inspect pasted base64 payloads and convert images to data URIs.

use anyhow::{anyhow, bail, Context, Result};
use b64view::{format_human_size, summary_line, Decoder, Encoder, RenderOutcome, UnknownSignaturePolicy, ViewerState};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "b64view")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Base64 image/PDF payload viewer and converter")]
struct Cli {
    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a base64 payload or data URI and describe it
    View {
        /// Payload text (default: read from --input or stdin)
        text: Option<String>,

        /// File containing the payload text
        #[arg(short = 'i', long, conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Print the canonical data URI
        #[arg(long)]
        uri: bool,

        /// Print the bare normalized payload
        #[arg(long, conflicts_with = "uri")]
        payload: bool,

        /// Save the decoded file into this directory
        #[arg(long)]
        save: Option<PathBuf>,

        /// What to report for payloads with no known signature
        #[arg(long, value_enum, default_value_t = UnknownType::Png)]
        unknown: UnknownType,
    },

    /// Convert an image file into a data URI
    Convert {
        /// Image file to encode
        file: PathBuf,

        /// Declared MIME type (default: guessed from the extension)
        #[arg(long)]
        mime: Option<String>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnknownType {
    /// Assume image/png
    Png,
    /// Report application/octet-stream
    OctetStream,
}

impl From<UnknownType> for UnknownSignaturePolicy {
    fn from(value: UnknownType) -> Self {
        match value {
            UnknownType::Png => UnknownSignaturePolicy::default(),
            UnknownType::OctetStream => UnknownSignaturePolicy::OctetStream,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::View { text, input, uri, payload, save, unknown } => {
            view_payload(text, input, uri, payload, save, unknown)?;
        }
        Commands::Convert { file, mime, output } => {
            convert_file(file, mime, output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn view_payload(
    text: Option<String>,
    input: Option<PathBuf>,
    print_uri: bool,
    print_payload: bool,
    save: Option<PathBuf>,
    unknown: UnknownType,
) -> Result<()> {
    let raw = match (text, input) {
        (Some(text), _) => text,
        (None, Some(input_path)) => fs::read_to_string(&input_path)
            .with_context(|| format!("Failed to read: {}", input_path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let decoder = Decoder::new().with_unknown_signature(unknown.into());
    let mut viewer = ViewerState::with_decoder(decoder);
    let request = viewer.submit(&raw).map_err(|e| anyhow!("{}", e.status()))?;

    // A payload that validates but does not decode is a rendering failure
    if let Err(err) = request.payload.decode_bytes() {
        viewer.complete(request.token, RenderOutcome::Failed);
        return Err(err.context(viewer.status().to_string()));
    }

    let payload = &request.payload;
    if print_uri {
        if let Some(uri) = viewer.copy_data_url() {
            println!("{}", uri);
        }
    } else if print_payload {
        println!("{}", payload.payload());
    } else {
        println!("Type: {}", payload.mime_type());
        println!("Size: {}", format_human_size(payload.decoded_byte_size() as u64));
        println!("Name: {}", payload.download_name());
        println!("Info: {}", summary_line(payload));
    }

    if let Some(dir) = save {
        let path = viewer.save_current(&dir)?;
        eprintln!("Saved: {}", path.display());
    }

    Ok(())
}

fn convert_file(file: PathBuf, mime: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let mime = match mime {
        Some(mime) => mime,
        None => mime_guess::from_path(&file)
            .first_raw()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Cannot guess MIME type of {}; pass --mime", file.display()))?,
    };

    let encoder = Encoder::new();
    let payload = match encoder.encode_path(&file, &mime) {
        Ok(payload) => payload,
        Err(err) => match err.downcast_ref::<b64view::ParseError>() {
            Some(parse_err) => bail!("{}", parse_err.status()),
            None => return Err(err),
        },
    };

    if let Some(output_path) = output {
        fs::write(&output_path, payload.canonical_uri())
            .with_context(|| format!("Failed to write: {}", output_path.display()))?;
        eprintln!(
            "Wrote: {} ({}, {})",
            output_path.display(),
            payload.mime_type(),
            format_human_size(payload.decoded_byte_size() as u64)
        );
    } else {
        println!("{}", payload.canonical_uri());
    }

    info!(target: "telemetry", event = "copy_base64_output", source = "converter");
    Ok(())
}
