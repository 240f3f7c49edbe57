//! # Pagemark CLI
//!
//! Usage:
//!   pagemark notes.md notes.pdf
//!   pagemark notes.md notes.pdf --font-dir ./fonts --title "Notes"
//!   pagemark notes.md notes.pdf --config layout.json --dump-layout

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use pagemark::error::PagemarkError;
use pagemark::model::{LayoutConfig, Metadata};
use pagemark::pdf::PdfWriter;

/// Convert a Markdown file into a single-page PDF.
#[derive(Parser, Debug)]
#[command(name = "pagemark", version, about)]
struct Cli {
    /// Markdown file to convert (must end in .md).
    input: PathBuf,

    /// Where to write the PDF.
    output: PathBuf,

    /// Layout configuration as JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding Arial.ttf, Arial_Bold.ttf, Arial_Italic.ttf and
    /// Arial_Bold_Italic.ttf.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Document title for the PDF metadata.
    #[arg(long)]
    title: Option<String>,

    /// Print the laid-out draw instructions as JSON on stdout.
    #[arg(long)]
    dump_layout: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => {
            println!("Conversion completed successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            e.exit_code()
        }
    }
}

fn run(cli: &Cli) -> Result<(), PagemarkError> {
    validate_input(&cli.input)?;

    let config = match &cli.config {
        Some(path) => LayoutConfig::from_json(&read_existing(path)?)?,
        None => LayoutConfig::default(),
    };
    let metadata = Metadata {
        title: cli.title.clone(),
        ..Metadata::default()
    };

    let source = fs::read_to_string(&cli.input)?;
    let tree = pagemark::markup::parse_markdown(&source);
    let fonts = pagemark::build_font_context(&config, cli.font_dir.as_deref())?;
    let page = pagemark::generate_page(&tree, &fonts, &config)?;

    if cli.dump_layout {
        println!("{}", page.to_json()?);
    }

    let bytes = PdfWriter::new().write(&page, &metadata, &fonts)?;
    fs::write(&cli.output, &bytes)?;

    if !cli.output.exists() {
        return Err(PagemarkError::RenderError(format!(
            "Error when saving output file {}",
            cli.output.display()
        )));
    }
    log::info!("wrote {} bytes to {}", bytes.len(), cli.output.display());

    Ok(())
}

fn validate_input(path: &Path) -> Result<(), PagemarkError> {
    if !path.is_file() {
        return Err(PagemarkError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let is_markdown = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    if !is_markdown {
        return Err(PagemarkError::NotMarkdown {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn read_existing(path: &Path) -> Result<String, PagemarkError> {
    if !path.is_file() {
        return Err(PagemarkError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(input: PathBuf, output: PathBuf) -> Cli {
        Cli {
            input,
            output,
            config: None,
            font_dir: None,
            title: None,
            dump_layout: false,
        }
    }

    #[test]
    fn test_missing_input_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_input(&dir.path().join("absent.md"));
        assert!(matches!(result, Err(PagemarkError::FileNotFound { .. })));
    }

    #[test]
    fn test_non_markdown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "# Title\n").unwrap();
        assert!(matches!(validate_input(&path), Err(PagemarkError::NotMarkdown { .. })));
    }

    #[test]
    fn test_upper_case_extension_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NOTES.MD");
        fs::write(&path, "# Title\n").unwrap();
        assert!(validate_input(&path).is_ok());
    }

    #[test]
    fn test_missing_config_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_existing(&dir.path().join("layout.json"));
        assert!(matches!(result, Err(PagemarkError::FileNotFound { .. })));
    }

    #[test]
    fn test_run_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.md");
        let output = dir.path().join("notes.pdf");
        fs::write(&input, "# Title\n\nBody\n\n- One\n- Two\n").unwrap();

        run(&cli(input, output.clone())).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.md");
        let config = dir.path().join("layout.json");
        let output = dir.path().join("notes.pdf");
        fs::write(&input, "Body\n").unwrap();
        fs::write(&config, r#"{ "spacingAfterList": -1 }"#).unwrap();

        let mut args = cli(input, output.clone());
        args.config = Some(config);
        let err = run(&args).unwrap_err();

        assert!(matches!(err, PagemarkError::InvalidConfig(_)));
        assert_eq!(err.exit_code(), ExitCode::from(1));
        assert!(!output.exists());
    }
}
