//! Command line tool for extracting color palettes from images.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};
use swatch::{
    batch_extract_colors, palettes_to_json, BatchResult, ColorSpace, ExtractOptions,
    KmeansOptions, Palette, PaletteSize, QuantizeMethod, SortMode,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Median cut
    Mc,
    /// K-means
    Km,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortBy {
    Luminance,
    Frequency,
}

impl From<SortBy> for SortMode {
    fn from(sort_by: SortBy) -> Self {
        match sort_by {
            SortBy::Luminance => SortMode::Luminance,
            SortBy::Frequency => SortMode::Frequency,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Space {
    Rgb,
    Hsv,
    Hls,
}

impl From<Space> for ColorSpace {
    fn from(space: Space) -> Self {
        match space {
            Space::Rgb => ColorSpace::Rgb,
            Space::Hsv => ColorSpace::Hsv,
            Space::Hls => ColorSpace::Hls,
        }
    }
}

/// Extract color palettes from images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image files to extract palettes from
    sources: Vec<PathBuf>,

    /// Extraction method
    #[arg(long, value_enum, default_value_t = Mode::Km)]
    mode: Mode,

    /// Number of colors to extract
    #[arg(short, long, default_value_t = PaletteSize::DEFAULT.into_inner())]
    n: u16,

    /// Palette order
    #[arg(long, value_enum, default_value_t = SortBy::Luminance)]
    sort_by: SortBy,

    /// Quantize the image at full size instead of downsampling it first
    #[arg(long)]
    no_resize: bool,

    /// Ignore pixels with an alpha value at or below this threshold
    #[arg(long)]
    alpha_mask_threshold: Option<u8>,

    /// Colorspace to report colors in
    #[arg(long, value_enum, default_value_t = Space::Rgb)]
    colorspace: Space,

    /// Write each palette as CSV
    #[arg(long)]
    export_csv: bool,

    /// Write each palette as JSON
    #[arg(long)]
    export_json: bool,

    /// Output directory, or a single `.json`/`.csv` file to write all palettes to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not print the palettes
    #[arg(long)]
    no_stdout: bool,

    /// Number of worker threads (0 = number of CPUs)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Seed for k-means
    #[arg(long, default_value_t = KmeansOptions::DEFAULT_SEED)]
    seed: u64,
}

impl Args {
    /// Rejects flag combinations that cannot be carried out.
    fn validate(&self) -> Result<()> {
        if self.output.is_none() {
            if self.export_json {
                bail!("--output is required when using --export-json");
            }
            if self.export_csv {
                bail!("--output is required when using --export-csv");
            }
        }
        Ok(())
    }

    fn options(&self) -> Result<ExtractOptions> {
        let palette_size = PaletteSize::try_from(self.n).context("invalid --n")?;

        let quantize_method = match self.mode {
            Mode::Mc => QuantizeMethod::MedianCut,
            Mode::Km => KmeansOptions::new().seed(self.seed).into(),
        };

        Ok(ExtractOptions::new()
            .palette_size(palette_size)
            .quantize_method(quantize_method)
            .sort_mode(Some(self.sort_by.into()))
            .resize(!self.no_resize)
            .alpha_mask_threshold(self.alpha_mask_threshold)
            .threads(self.threads))
    }
}

fn print_palette(out: &mut impl Write, result: &BatchResult, colorspace: ColorSpace) -> Result<()> {
    let Some(palette) = result.palette() else {
        return Ok(());
    };

    writeln!(out, "{}", result.source())?;
    for color in palette {
        let [a, b, c] = color.values(colorspace);
        let values = match colorspace {
            ColorSpace::Rgb => format!("{a:>3} {b:>3} {c:>3}"),
            ColorSpace::Hsv | ColorSpace::Hls => format!("{a:>6.2} {b:.3} {c:.3}"),
        };
        writeln!(out, "  {}  {values}  {:.4}", color.hex(), color.frequency())?;
    }

    Ok(())
}

/// Where an export writes its palettes.
#[derive(Debug, PartialEq, Eq)]
enum ExportTarget {
    /// All palettes in one file.
    Combined(PathBuf),
    /// One `palette_NNN` file per palette in a directory.
    Directory(PathBuf),
}

impl ExportTarget {
    /// A single file if `output` has the given extension, otherwise a directory.
    fn new(output: &Path, extension: &str) -> Self {
        if output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            Self::Combined(output.to_owned())
        } else {
            Self::Directory(output.to_owned())
        }
    }
}

/// The file for the `index`th (zero-based) palette in an export directory.
fn palette_file(dir: &Path, index: usize, extension: &str) -> PathBuf {
    dir.join(format!("palette_{:03}.{extension}", index + 1))
}

fn write_csv(palettes: &[&Palette], output: &Path, colorspace: ColorSpace) -> Result<()> {
    match ExportTarget::new(output, "csv") {
        ExportTarget::Combined(path) => {
            let mut file = BufWriter::new(File::create(&path)?);
            for palette in palettes {
                palette.write_csv(&mut file, colorspace, true)?;
            }
        }
        ExportTarget::Directory(dir) => {
            fs::create_dir_all(&dir)?;
            for (i, palette) in palettes.iter().enumerate() {
                let file = File::create(palette_file(&dir, i, "csv"))?;
                palette.write_csv(BufWriter::new(file), colorspace, true)?;
            }
        }
    }

    info!("exported {} palettes to {}", palettes.len(), output.display());
    Ok(())
}

fn write_json(palettes: &[&Palette], output: &Path, colorspace: ColorSpace) -> Result<()> {
    match ExportTarget::new(output, "json") {
        ExportTarget::Combined(path) => {
            fs::write(path, palettes_to_json(palettes.iter().copied(), colorspace)?)?;
        }
        ExportTarget::Directory(dir) => {
            fs::create_dir_all(&dir)?;
            for (i, palette) in palettes.iter().enumerate() {
                fs::write(palette_file(&dir, i, "json"), palette.to_json(colorspace)?)?;
            }
        }
    }

    info!("exported {} palettes to {}", palettes.len(), output.display());
    Ok(())
}

/// The exit code for a run where `ok` of `total` images produced a palette:
/// `0` if all did, `1` if none did (or there were no images), `2` otherwise.
fn exit_code(ok: usize, total: usize) -> u8 {
    match (ok, total) {
        (0, _) => 1,
        (ok, total) if ok == total => 0,
        _ => 2,
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    args.validate()?;

    if args.sources.is_empty() {
        error!("no images given");
        return Ok(ExitCode::from(exit_code(0, 0)));
    }

    let options = args.options()?;
    let colorspace = ColorSpace::from(args.colorspace);

    let results = batch_extract_colors(args.sources.iter().map(PathBuf::as_path), &options);

    if !args.no_stdout {
        let mut stdout = io::stdout().lock();
        for result in &results {
            print_palette(&mut stdout, result, colorspace)?;
        }
    }

    for result in &results {
        if let Some(err) = result.error() {
            eprintln!("{}: {err}", result.source());
        }
    }

    let palettes = results.iter().filter_map(BatchResult::palette).collect::<Vec<_>>();

    if let (Some(output), false) = (&args.output, palettes.is_empty()) {
        if args.export_csv {
            write_csv(&palettes, output, colorspace).context("failed to export CSV")?;
        }
        if args.export_json {
            write_json(&palettes, output, colorspace).context("failed to export JSON")?;
        }
    }

    Ok(ExitCode::from(exit_code(palettes.len(), results.len())))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use palette::Srgb;
    use swatch::Color;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("swatch").chain(argv.iter().copied())).unwrap()
    }

    /// A fresh, empty directory under the system temp dir.
    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("swatch-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn palettes() -> Vec<Palette> {
        vec![
            Palette::new(vec![
                Color::new(Srgb::new(255, 0, 0), 0.75),
                Color::new(Srgb::new(0, 0, 255), 0.25),
            ]),
            Palette::new(vec![Color::new(Srgb::new(10, 20, 30), 1.0)]),
        ]
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(3, 3), 0);
        assert_eq!(exit_code(0, 3), 1);
        assert_eq!(exit_code(0, 0), 1);
        assert_eq!(exit_code(1, 3), 2);
    }

    #[test]
    fn export_requires_output() {
        let err = args(&["a.png", "--export-json"]).validate().unwrap_err();
        assert_eq!(err.to_string(), "--output is required when using --export-json");
        assert!(args(&["a.png", "--export-csv"]).validate().is_err());

        assert!(args(&["a.png", "--export-json", "-o", "out"]).validate().is_ok());
        assert!(args(&["a.png"]).validate().is_ok());
    }

    #[test]
    fn export_target_from_extension() {
        assert_eq!(
            ExportTarget::new(Path::new("out/all.JSON"), "json"),
            ExportTarget::Combined("out/all.JSON".into())
        );
        assert_eq!(
            ExportTarget::new(Path::new("out/all.json"), "csv"),
            ExportTarget::Directory("out/all.json".into())
        );
        assert_eq!(palette_file(Path::new("out"), 0, "csv"), Path::new("out/palette_001.csv"));
        assert_eq!(palette_file(Path::new("out"), 41, "json"), Path::new("out/palette_042.json"));
    }

    #[test]
    fn export_json_directory_and_file() {
        let palettes = palettes();
        let palettes = palettes.iter().collect::<Vec<_>>();
        let dir = temp_dir("json");

        write_json(&palettes, &dir.join("each"), ColorSpace::Rgb).unwrap();
        let first = fs::read_to_string(dir.join("each/palette_001.json")).unwrap();
        assert_eq!(Palette::from_json(&first).unwrap().colors(), palettes[0].colors());
        assert!(dir.join("each/palette_002.json").is_file());
        assert!(!dir.join("each/palette_003.json").exists());

        let combined = dir.join("all.json");
        write_json(&palettes, &combined, ColorSpace::Hsv).unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&combined).unwrap()).unwrap();
        assert_eq!(document["total_count"], 2);
        assert_eq!(document["colorspace"], "hsv");
        assert_eq!(document["palettes"].as_array().unwrap().len(), 2);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn export_csv_directory_and_file() {
        let palettes = palettes();
        let palettes = palettes.iter().collect::<Vec<_>>();
        let dir = temp_dir("csv");

        write_csv(&palettes, &dir.join("each"), ColorSpace::Rgb).unwrap();
        let first = fs::read_to_string(dir.join("each/palette_001.csv")).unwrap();
        assert_eq!(first, "255,0,0,0.75\n0,0,255,0.25\n");
        assert_eq!(
            fs::read_to_string(dir.join("each/palette_002.csv")).unwrap(),
            "10,20,30,1\n"
        );

        let combined = dir.join("all.csv");
        write_csv(&palettes, &combined, ColorSpace::Rgb).unwrap();
        assert_eq!(fs::read_to_string(&combined).unwrap().lines().count(), 3);

        fs::remove_dir_all(dir).unwrap();
    }
}
