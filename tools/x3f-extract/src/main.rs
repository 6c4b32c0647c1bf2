//! Command line extractor for X3F files
//!
//! Every input `<file>` produces `<file>.<ext>` next to it. A file that cannot be
//! read or dumped is reported and the batch moves on to the next one.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use x3f::{
    ppm_bytes, raw_samples, tiff_bytes, write_info, write_jpeg, DecodedImage, Histogram,
    HistogramOptions, PpmEncoding, ScaleOptions, X3fFile,
};

#[derive(Parser, Debug)]
#[command(name = "x3f-extract")]
#[command(version, about = "Extract images and metadata from Sigma X3F files", long_about = None)]
struct Args {
    /// Dump the embedded JPEG thumbnail (alone unless a RAW kind is also given)
    #[arg(long)]
    jpg: bool,

    /// Copy the RAW section as stored in the file
    #[arg(long, group = "kind")]
    raw: bool,

    /// Dump decoded RAW samples as little-endian 16-bit words
    #[arg(long, group = "kind")]
    raw_decoded: bool,

    /// Dump RAW as 16-bit TIFF (default)
    #[arg(long, group = "kind")]
    tiff: bool,

    /// Dump RAW as binary PPM (P6)
    #[arg(long, group = "kind")]
    ppm: bool,

    /// Dump RAW as ASCII PPM (P3)
    #[arg(long, group = "kind")]
    ppm_ascii: bool,

    /// Dump a RAW histogram as CSV
    #[arg(long, group = "kind")]
    histogram: bool,

    /// Dump a RAW histogram as CSV, binned by log exposure
    #[arg(long, group = "kind")]
    loghist: bool,

    /// Dump the plain or Huffman thumbnail as PPM
    #[arg(long, group = "kind")]
    thumb: bool,

    /// List header, directory, properties and CAMF entry names as text
    #[arg(long, group = "kind")]
    print: bool,

    /// Gamma for scaled TIFF/PPM output
    #[arg(long)]
    gamma: Option<f64>,

    /// Black level for scaled output (default: smallest sample)
    #[arg(long)]
    min: Option<u16>,

    /// White level for scaled output (default: largest sample)
    #[arg(long)]
    max: Option<u16>,

    /// X3F files to process
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpKind {
    Raw,
    RawDecoded,
    Tiff,
    Ppm(PpmEncoding),
    Histogram { log: bool },
    Thumb,
    Print,
}

impl DumpKind {
    fn extension(&self) -> &'static str {
        match self {
            DumpKind::Raw => "raw",
            DumpKind::RawDecoded => "decoded.raw",
            DumpKind::Tiff => "tif",
            DumpKind::Ppm(_) => "ppm",
            DumpKind::Histogram { .. } => "csv",
            DumpKind::Thumb => "thumb.ppm",
            DumpKind::Print => "txt",
        }
    }

    fn accepts_scaling(&self) -> bool {
        matches!(self, DumpKind::Tiff | DumpKind::Ppm(_))
    }
}

#[derive(Debug)]
struct Plan {
    jpg: bool,
    dump: Option<DumpKind>,
    scale: ScaleOptions,
}

impl Args {
    fn explicit_kind(&self) -> Option<DumpKind> {
        [
            (self.raw, DumpKind::Raw),
            (self.raw_decoded, DumpKind::RawDecoded),
            (self.tiff, DumpKind::Tiff),
            (self.ppm, DumpKind::Ppm(PpmEncoding::Binary)),
            (self.ppm_ascii, DumpKind::Ppm(PpmEncoding::Ascii)),
            (self.histogram, DumpKind::Histogram { log: false }),
            (self.loghist, DumpKind::Histogram { log: true }),
            (self.thumb, DumpKind::Thumb),
            (self.print, DumpKind::Print),
        ]
        .into_iter()
        .find_map(|(set, kind)| set.then_some(kind))
    }

    fn plan(&self) -> Result<Plan, clap::Error> {
        let explicit = self.explicit_kind();
        let dump = match (self.jpg, explicit) {
            (true, None) => None,
            (_, kind) => Some(kind.unwrap_or(DumpKind::Tiff)),
        };

        let scale = ScaleOptions {
            gamma: self.gamma,
            min: self.min,
            max: self.max,
        };
        let mut cmd = Args::command();
        if scale.gamma.is_none() && (scale.min.is_some() || scale.max.is_some()) {
            return Err(cmd.error(ErrorKind::MissingRequiredArgument, "--min/--max need --gamma"));
        }
        if scale.is_scaled() && !dump.is_some_and(|kind| kind.accepts_scaling()) {
            return Err(cmd.error(
                ErrorKind::ArgumentConflict,
                "--gamma only applies to TIFF and PPM output",
            ));
        }
        scale
            .validate()
            .map_err(|e| cmd.error(ErrorKind::ValueValidation, e))?;

        Ok(Plan {
            jpg: self.jpg,
            dump,
            scale,
        })
    }
}

fn output_path(input: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn dump_jpeg(file: &X3fFile, input: &Path) -> Result<()> {
    let index = file
        .find_thumb_jpeg()
        .ok_or_else(|| anyhow!("no JPEG thumbnail"))?;
    let jpeg = file
        .image(index)?
        .jpeg()
        .ok_or_else(|| anyhow!("entry {} holds no JPEG data", index))?;

    let out = output_path(input, "jpg");
    info!("Dump JPEG to {}", out.display());
    let writer = fs::File::create(&out).with_context(|| format!("creating {}", out.display()))?;
    write_jpeg(jpeg, writer)?;
    Ok(())
}

fn decoded<'a>(file: &'a X3fFile, index: usize) -> Result<&'a DecodedImage> {
    file.image(index)?
        .image()
        .ok_or_else(|| anyhow!("entry {} holds no decodable samples", index))
}

fn raw_index(file: &X3fFile, input: &Path) -> Result<usize> {
    let index = file.find_raw().ok_or_else(|| anyhow!("no RAW image"))?;
    info!("Load RAW block from {}", input.display());
    Ok(index)
}

fn dump(file: &X3fFile, input: &Path, kind: DumpKind, scale: &ScaleOptions) -> Result<()> {
    let out = output_path(input, kind.extension());

    let bytes = match kind {
        DumpKind::Print => {
            info!("Dump file structure to {}", out.display());
            let mut text = Vec::new();
            write_info(file, &mut text)?;
            text
        }
        DumpKind::Thumb => {
            let index = file
                .find_thumb_plain()
                .or_else(|| file.find_thumb_huffman())
                .ok_or_else(|| anyhow!("no thumbnail"))?;
            info!("Dump thumbnail as PPM to {}", out.display());
            ppm_bytes(decoded(file, index)?, scale, PpmEncoding::Binary)?
        }
        DumpKind::Raw => {
            let index = raw_index(file, input)?;
            info!("Dump RAW block to {}", out.display());
            file.section_bytes(index)?.to_vec()
        }
        DumpKind::RawDecoded => {
            let index = raw_index(file, input)?;
            info!("Dump decoded RAW to {}", out.display());
            raw_samples(decoded(file, index)?)
        }
        DumpKind::Tiff => {
            let index = raw_index(file, input)?;
            info!("Dump RAW as TIFF to {}", out.display());
            tiff_bytes(decoded(file, index)?, scale)?
        }
        DumpKind::Ppm(encoding) => {
            let index = raw_index(file, input)?;
            info!("Dump RAW as PPM to {}", out.display());
            ppm_bytes(decoded(file, index)?, scale, encoding)?
        }
        DumpKind::Histogram { log } => {
            let index = raw_index(file, input)?;
            info!("Dump RAW as CSV histogram to {}", out.display());
            let samples = decoded(file, index)?.to_u16_samples();
            let histogram = Histogram::from_samples(&samples, HistogramOptions::new().log(log))?;
            let mut csv = Vec::new();
            histogram.write_csv(&mut csv)?;
            csv
        }
    };

    fs::write(&out, bytes).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

fn process(input: &Path, plan: &Plan) -> Result<()> {
    info!("READ THE X3F FILE {}", input.display());
    let file =
        X3fFile::open_path(input).with_context(|| format!("reading {}", input.display()))?;

    if plan.jpg {
        if let Err(e) = dump_jpeg(&file, input) {
            error!("Could not dump JPEG from {}: {:#}", input.display(), e);
        }
    }
    if let Some(kind) = plan.dump {
        dump(&file, input, kind, &plan.scale)
            .with_context(|| format!("dumping {}", input.display()))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let plan = match args.plan() {
        Ok(plan) => plan,
        Err(e) => e.exit(),
    };

    for input in &args.files {
        if let Err(e) = process(input, &plan) {
            error!("{:#}", e);
        }
    }
    ExitCode::SUCCESS
}
