use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use quillpad_core::{
    collator_for, collect_statistics, convert_selection_case, dedup_selected_lines, read_text,
    sort_selected_lines, write_text, CaseTransform, EditorBuffer, EditorError, SortOrder,
};
use quillpad_settings::{LocalizationManager, LocalizationParams};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quillpad-cli",
    about = "Line transforms and statistics for Quillpad documents",
    author,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 依語系排序行。 / Sort lines using the collation of a language.
    Sort(SortArgs),
    /// 移除重複的行。 / Remove duplicate lines, keeping the first occurrence.
    Unique(TransformArgs),
    /// 轉換大小寫。 / Convert letter case.
    Case(CaseArgs),
    /// 顯示文件統計。 / Print document statistics.
    Stats(StatsArgs),
    /// 列出可用語系。 / List available locale catalogs.
    Locales(LocalesArgs),
}

#[derive(Args)]
struct TransformArgs {
    /// 輸入檔案。 / Input file.
    input: PathBuf,

    /// 限定行範圍（從 1 起算，含兩端）。 / Restrict to a line range, 1-based and inclusive.
    #[arg(long, value_name = "FIRST:LAST", value_parser = parse_line_range)]
    lines: Option<(usize, usize)>,

    /// 輸出檔案；預設寫到標準輸出。 / Output file; defaults to standard output.
    #[arg(long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// 就地覆寫輸入檔案。 / Overwrite the input file.
    #[arg(long)]
    in_place: bool,
}

#[derive(Args)]
struct SortArgs {
    #[command(flatten)]
    target: TransformArgs,

    /// 遞減排序。 / Sort in descending order.
    #[arg(long)]
    descending: bool,

    /// 排序所用的語系。 / Language whose collation is used.
    #[arg(long, value_name = "CODE", default_value = "en")]
    language: String,
}

#[derive(Args)]
struct CaseArgs {
    #[command(flatten)]
    target: TransformArgs,

    #[arg(long, value_enum)]
    mode: CaseChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CaseChoice {
    Upper,
    Lower,
    Invert,
}

impl From<CaseChoice> for CaseTransform {
    fn from(choice: CaseChoice) -> Self {
        match choice {
            CaseChoice::Upper => CaseTransform::Upper,
            CaseChoice::Lower => CaseTransform::Lower,
            CaseChoice::Invert => CaseTransform::Invert,
        }
    }
}

#[derive(Args)]
struct StatsArgs {
    input: PathBuf,

    /// 以 JSON 輸出。 / Emit JSON instead of text.
    #[arg(long)]
    json: bool,

    /// 訊息語系。 / Language of the printed summary.
    #[arg(long, value_name = "CODE")]
    language: Option<String>,
}

#[derive(Args)]
struct LocalesArgs {
    /// 額外的語系資料夾。 / Directory with additional locale files.
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Commands::Sort(args) => {
            let order = if args.descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            let collator = collator_for(&args.language);
            transform_file(&args.target, |buffer| {
                sort_selected_lines(buffer, order, collator.as_ref())
            })
        }
        Commands::Unique(args) => transform_file(&args, dedup_selected_lines),
        Commands::Case(args) => {
            let transform = CaseTransform::from(args.mode);
            transform_file(&args.target, |buffer| {
                convert_selection_case(buffer, transform)
            })
        }
        Commands::Stats(args) => execute_stats(args),
        Commands::Locales(args) => execute_locales(args),
    }
}

fn parse_line_range(value: &str) -> Result<(usize, usize), String> {
    let (first, last) = value
        .split_once(':')
        .ok_or_else(|| format!("expected FIRST:LAST, got '{value}'"))?;
    let parse = |part: &str| -> Result<usize, String> {
        match part.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("line numbers start at 1, got '{part}'")),
            Ok(line) => Ok(line),
        }
    };
    let (first, last) = (parse(first)?, parse(last)?);
    if first > last {
        return Err(format!("range {first}:{last} is reversed"));
    }
    Ok((first, last))
}

fn load_buffer(path: &Path) -> Result<EditorBuffer> {
    let text = read_text(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(EditorBuffer::new(text))
}

/// 最後一個有內容的行；結尾換行後的空行不算。 / Last line worth transforming; the empty line after a final newline does not count.
fn last_content_line(buffer: &EditorBuffer) -> usize {
    let count = buffer.line_count();
    if count > 1 && buffer.contents().ends_with('\n') {
        count - 2
    } else {
        count - 1
    }
}

fn transform_file<F>(args: &TransformArgs, edit: F) -> Result<()>
where
    F: FnOnce(&mut EditorBuffer) -> Result<bool, EditorError>,
{
    let mut buffer = load_buffer(&args.input)?;
    match args.lines {
        Some((first, last)) => buffer
            .select_lines(first - 1, last - 1)
            .with_context(|| format!("invalid line range {first}:{last}"))?,
        None => {
            let last = last_content_line(&buffer);
            buffer.select_lines(0, last)?;
        }
    }
    let changed = edit(&mut buffer)?;
    tracing::debug!("transform changed text: {changed}");

    let target = if args.in_place {
        Some(args.input.as_path())
    } else {
        args.output.as_deref()
    };
    match target {
        Some(path) => write_text(path, buffer.contents())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", buffer.contents()),
    }
    Ok(())
}

fn execute_stats(args: StatsArgs) -> Result<()> {
    let buffer = load_buffer(&args.input)?;
    let stats = collect_statistics(buffer.contents());
    if args.json {
        let value = json!({
            "characters": stats.characters,
            "non_blank_characters": stats.non_blank_characters,
            "lines": stats.lines,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mut manager = LocalizationManager::builtin();
    if let Some(code) = &args.language {
        if !manager.set_active_by_code(code) {
            bail!("unknown language '{code}'");
        }
    }
    for (key, count) in [
        ("stats.characters", stats.characters),
        ("stats.non_blank", stats.non_blank_characters),
        ("stats.lines", stats.lines),
    ] {
        let params = LocalizationParams::count_only(count as u64);
        println!("{}", manager.text_with_params(key, &params));
    }
    Ok(())
}

fn execute_locales(args: LocalesArgs) -> Result<()> {
    let manager = match &args.dir {
        Some(dir) => LocalizationManager::load_from_dir(dir, "en")
            .with_context(|| format!("failed to load locales from {}", dir.display()))?,
        None => LocalizationManager::builtin(),
    };
    for stats in manager.catalog_stats() {
        let missing = manager
            .missing_keys(&stats.code)
            .ok_or_else(|| anyhow!("catalog '{}' disappeared", stats.code))?;
        println!(
            "{}\t{}\t{} entries ({} plural)\t{} missing",
            stats.code,
            stats.display_name,
            stats.total_entries,
            stats.plural_entries,
            missing.len()
        );
        for key in missing {
            println!("  - {key}");
        }
    }
    Ok(())
}
