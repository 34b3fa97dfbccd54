use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use rawstream::{
    DEFAULT_LOOKAHEAD_FACTOR, DEFAULT_LOOKAHEAD_SLACK, DEFAULT_LOOKBACK, DEFAULT_PREVIEW_LEN, ScanEntry, ScanOptions,
    ScanReport, scan,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Locate stream objects in PDF files and report their dictionaries, lengths and payloads.",
    arg_required_else_help = true
)]
pub struct Args {
    /// PDF files to scan
    #[clap(required = true)]
    pub files: Vec<PathBuf>,

    /// Bytes searched backward from each `stream` keyword for its dictionary.
    #[clap(long, default_value_t = DEFAULT_LOOKBACK)]
    pub lookback: usize,

    /// Forward search window for `endstream`, in multiples of the declared length.
    #[clap(long, default_value_t = DEFAULT_LOOKAHEAD_FACTOR)]
    pub lookahead_factor: usize,

    /// Extra bytes added to the forward search window.
    #[clap(long, default_value_t = DEFAULT_LOOKAHEAD_SLACK)]
    pub lookahead_slack: usize,

    /// Payload bytes shown per object.
    #[clap(long, default_value_t = DEFAULT_PREVIEW_LEN)]
    pub preview: usize,

    /// Optional output directory for the raw payloads of recovered objects.
    #[clap(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Only print failed objects and the summary.
    #[clap(long)]
    pub failures_only: bool,

    /// Raise log verbosity: -v info, -vv debug, -vvv trace.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions::builder()
            .lookback(self.lookback)
            .lookahead_factor(self.lookahead_factor)
            .lookahead_slack(self.lookahead_slack)
            .preview_len(self.preview)
            .build()
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn payload_path(dir: &Path, source: &Path, index: usize, offset: usize) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("stream"));
    dir.join(format!("{}-{:04}-{}.bin", stem, index, offset))
}

fn write_payloads(report: &ScanReport, source: &Path, dir: &Path) -> io::Result<usize> {
    fs::create_dir_all(dir)?;
    let mut written = 0;
    for (index, entry) in report.entries.iter().enumerate() {
        if let ScanEntry::Recovered(object) = entry {
            fs::write(payload_path(dir, source, index, object.offset), object.payload)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Scan one file and render its report.
fn dump_file(path: &Path, args: &Args, options: &ScanOptions) -> io::Result<String> {
    let buffer = fs::read(path)?;
    let report = scan(&buffer, options);

    if let Some(dir) = &args.output_dir {
        let written = write_payloads(&report, path, dir)?;
        info!("Wrote {} payloads from {} to {}.", written, path.display(), dir.display());
    }

    let body = if args.failures_only {
        report.failures_only().to_string()
    } else {
        report.to_string()
    };
    Ok(format!("# {} ({} bytes)\n{}\n", path.display(), buffer.len(), body))
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level())).init();

    let options = args.scan_options();

    #[cfg(feature = "rayon")]
    let results: Vec<io::Result<String>> = args
        .files
        .par_iter()
        .map(|path| dump_file(path, &args, &options))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let results: Vec<io::Result<String>> = args.files.iter().map(|path| dump_file(path, &args, &options)).collect();

    let mut stdout = io::stdout().lock();
    let mut status = ExitCode::SUCCESS;
    for (path, result) in args.files.iter().zip(results) {
        match result {
            Ok(text) => {
                if let Err(e) = stdout.write_all(text.as_bytes()) {
                    error!("Failed to write report: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                error!("Failed to scan {}: {}", path.display(), e);
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"%PDF-1.4\n1 0 obj\n<</Length 5>>\nstream\nHELLO\nendstream\nendobj\n\
2 0 obj\n<</Filter/FlateDecode/Length 3>>\nstream\nabc\nendstream\nendobj\n\
3 0 obj\n<</Length 9 0 R>>\nstream\nxyz\nendstream\nendobj\n";

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["streamdump"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parse_defaults() {
        let args = args(&["a.pdf", "b.pdf"]);
        assert_eq!(args.files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
        assert_eq!(args.scan_options(), ScanOptions::default());
        assert_eq!(args.log_level(), "warn");
    }

    #[test]
    fn parse_options() {
        let args = args(&["--lookback", "200", "--preview", "4", "-vv", "--failures-only", "a.pdf"]);
        let options = args.scan_options();
        assert_eq!(options.lookback, 200);
        assert_eq!(options.preview_len, 4);
        assert!(args.failures_only);
        assert_eq!(args.log_level(), "debug");
    }

    #[test]
    fn files_are_required() {
        assert!(Args::try_parse_from(["streamdump"]).is_err());
    }

    #[test]
    fn payload_file_names() {
        let path = payload_path(Path::new("out"), Path::new("/tmp/broken.pdf"), 3, 1234);
        assert_eq!(path, Path::new("out").join("broken-0003-1234.bin"));
    }

    #[test]
    fn dump_writes_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("sample.pdf");
        fs::write(&source, SAMPLE).unwrap();
        let output = dir.path().join("payloads");

        let args = args(&["--output-dir", output.to_str().unwrap(), source.to_str().unwrap()]);
        let text = dump_file(&source, &args, &args.scan_options()).unwrap();

        assert!(text.starts_with("# "));
        assert!(text.contains("length=5=5"));
        assert!(text.contains("MissingLength"));
        assert!(text.trim_end().ends_with("3 streams: 2 recovered, 1 failed"));

        let mut written: Vec<_> = fs::read_dir(&output)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        written.sort();
        assert_eq!(written.len(), 2);
        assert!(written[0].starts_with("sample-0000-"));
        assert!(written[1].starts_with("sample-0001-"));
        assert_eq!(fs::read(output.join(&written[0])).unwrap(), b"HELLO");
        assert_eq!(fs::read(output.join(&written[1])).unwrap(), b"abc");
    }

    #[test]
    fn failures_only_report() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("sample.pdf");
        fs::write(&source, SAMPLE).unwrap();

        let args = args(&["--failures-only", source.to_str().unwrap()]);
        let text = dump_file(&source, &args, &args.scan_options()).unwrap();
        assert!(!text.contains("length=5=5"));
        assert!(text.contains("  2: "));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("absent.pdf");
        let args = args(&[source.to_str().unwrap()]);
        assert!(dump_file(&source, &args, &args.scan_options()).is_err());
    }
}
