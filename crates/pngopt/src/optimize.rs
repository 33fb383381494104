//! Single-file pipeline: decode, count colors, pick a palette, map pixels,
//! write an indexed PNG.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::decoder::{decode_png, DecodeOptions};
use crate::encoder::encode_indexed;
use crate::histogram::Histogram;
use crate::palette::Palette;
use crate::quantize::quantize;
use crate::{PngOptError, Result, DEFAULT_COLOR_LIMIT, MAX_PATH_LEN};

/// Where the optimized file is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// `<stem>_opt<ext>` next to the input
    #[default]
    Sibling,
    /// Overwrite the input file
    InPlace,
}

/// Options for optimizing a PNG.
#[derive(Clone, Debug)]
pub struct OptimizeOptions {
    /// Maximum number of palette entries, clamped to 1-256 when used.
    pub color_limit: u16,
    pub decode: DecodeOptions,
    pub output: OutputMode,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            color_limit: DEFAULT_COLOR_LIMIT,
            decode: DecodeOptions::default(),
            output: OutputMode::Sibling,
        }
    }
}

/// Result of optimizing one image in memory.
#[derive(Debug, Clone)]
pub struct Optimized {
    /// The encoded indexed PNG
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
    /// Distinct RGBA colors in the source
    pub source_colors: usize,
}

/// Quantize a PNG held in memory and re-encode it as an indexed PNG.
///
/// # Errors
///
/// Any decode error from [`decode_png`], or a compression error.
pub fn optimize_png(data: &[u8], opts: &OptimizeOptions) -> Result<Optimized> {
    let image = decode_png(data, &opts.decode)?;

    let hist = Histogram::from_rgba(&image.pixels);
    debug_assert_eq!(hist.total(), image.pixel_count() as u64);

    let palette = Palette::build(&hist, opts.color_limit)?;
    let indices = quantize(&image.pixels, &palette);
    drop(image.pixels);

    let png = encode_indexed(image.width, image.height, &palette, &indices)?;
    Ok(Optimized {
        png,
        width: image.width,
        height: image.height,
        palette,
        source_colors: hist.len(),
    })
}

/// Output path for `input`: `<stem>_opt<ext>` in the same directory.
///
/// # Errors
///
/// Returns [`PngOptError::PathTooLong`] if the result exceeds 2048 bytes.
pub fn output_path_for(input: &Path) -> Result<PathBuf> {
    let stem = input.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push("_opt");
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    let out = input.with_file_name(name);
    if out.as_os_str().len() >= MAX_PATH_LEN {
        return Err(PngOptError::PathTooLong(out));
    }
    Ok(out)
}

/// Optimize the PNG at `input` and write the result according to
/// `opts.output`. Returns the path written.
///
/// On failure no output file is left behind in [`OutputMode::Sibling`] mode.
pub fn optimize_file(input: &Path, opts: &OptimizeOptions) -> Result<PathBuf> {
    let out_path = match opts.output {
        OutputMode::Sibling => output_path_for(input)?,
        OutputMode::InPlace => {
            if input.as_os_str().len() >= MAX_PATH_LEN {
                return Err(PngOptError::PathTooLong(input.to_path_buf()));
            }
            input.to_path_buf()
        }
    };

    let data = fs::read(input).map_err(|e| PngOptError::io(input, e))?;
    let optimized = optimize_png(&data, opts)?;
    drop(data);

    if let Err(e) = fs::write(&out_path, &optimized.png) {
        warn!(path = %out_path.display(), error = %e, "failed to write output");
        if opts.output == OutputMode::Sibling {
            discard_partial_output(&out_path);
        }
        return Err(PngOptError::io(out_path, e));
    }

    debug!(
        input = %input.display(),
        output = %out_path.display(),
        width = optimized.width,
        height = optimized.height,
        source_colors = optimized.source_colors,
        palette = optimized.palette.len(),
        bytes = optimized.png.len(),
        "optimized"
    );
    Ok(out_path)
}

fn discard_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove partial output"),
    }
}
