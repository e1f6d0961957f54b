use crate::cli::{Cli, Command};
use anyhow::{bail, Context, Result};
use bookparse::format::SUPPORTED_FORMATS;
use bookparse::metadata::format_metadata;
use bookparse::{image, BookFormat, BookParsingService, ParseResult, ParserConfig};
use serde::Serialize;
use std::path::PathBuf;

pub async fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ParserConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ParserConfig::default(),
    };
    let service = BookParsingService::new(&config);

    match &cli.command {
        Command::Detect { input } => match service.detect_file_format(input) {
            Some(format) => println!("{}", format),
            None => bail!("Unsupported file format: {}", input.display()),
        },

        Command::Validate { input } => {
            let verdict = service.validate_book_file(input).await;
            print_json(&verdict)?;
            if !verdict.is_valid {
                bail!("{} is not a valid book", input.display());
            }
        }

        Command::Metadata { input, json } => {
            let result = service.parse_book_metadata(input).await;
            if *json {
                print_json(&result)?;
            } else {
                match result {
                    ParseResult::Success(metadata) => print!("{}", format_metadata(&metadata)),
                    ParseResult::Failure(error) => bail!("{}: {}", input.display(), error),
                }
            }
        }

        Command::Toc { input } => {
            let chapters = service.get_book_table_of_contents(input).await;
            let total: usize = chapters.iter().map(|c| c.len_recursive()).sum();
            print_json(&chapters)?;
            eprintln!("{} entries", total);
        }

        Command::Content { input, position } => {
            let content = service
                .try_get_book_content(input, position.as_deref())
                .await
                .with_context(|| format!("Failed to read content: {}", input.display()))?;
            print!("{}", content);
        }

        Command::Cover { input, output } => {
            let Some(cover) = service.extract_book_cover(input).await else {
                bail!("No cover found in {}", input.display());
            };
            let dir = output.clone().unwrap_or_else(|| PathBuf::from("."));
            let dest = image::save_cover(&cover, &dir)
                .with_context(|| format!("Failed to write cover into {}", dir.display()))?;
            eprintln!("Wrote {} ({} bytes) to {}", cover.media_type, cover.data.len(), dest.display());
        }

        Command::Formats => {
            let formats: Vec<FormatInfo> = SUPPORTED_FORMATS
                .iter()
                .chain(std::iter::once(&BookFormat::Mobi))
                .map(|f| FormatInfo {
                    format: f.as_str(),
                    display_name: service.get_format_display_name(f.as_str()),
                    supported: service.is_format_supported(f.as_str()),
                    capabilities: service.get_format_capabilities(f.as_str()),
                })
                .collect();
            print_json(&formats)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatInfo {
    format: &'static str,
    display_name: String,
    supported: bool,
    capabilities: bookparse::FormatCapabilities,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
