use clap::{Parser as _, Subcommand};
use markup_mapper::{
    Cursor, Document, Error, Language, Options, ast, detect_deletion, parse_with,
};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use walkdir::WalkDir;

#[derive(clap::Parser)]
#[command(name = "markup-mapper")]
#[command(about = "Tolerant markup/JSX parser with line-to-node source mapping")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse markup files and print their node tree
    Parse {
        /// Path to a file or directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Stylesheet whose class rules are applied to the tree
        #[arg(long)]
        css: Option<PathBuf>,

        /// Source language (default: guessed from the file extension)
        #[arg(long, value_enum)]
        language: Option<Language>,

        /// Output the document as JSON
        #[arg(long)]
        json: bool,

        /// Do not derive styles from utility class names
        #[arg(long)]
        no_heuristics: bool,
    },

    /// Print the node at a cursor position
    Locate {
        path: PathBuf,

        /// 1-based line
        #[arg(long)]
        line: usize,

        /// 1-based column
        #[arg(long, default_value_t = 1)]
        column: usize,

        #[arg(long, value_enum)]
        language: Option<Language>,

        /// Output the node as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify the edit between two snapshots at a cursor line
    Diff {
        old: PathBuf,
        new: PathBuf,

        /// 1-based cursor line
        #[arg(long)]
        line: usize,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, Error> {
    match command {
        Commands::Parse {
            path,
            stdin,
            css,
            language,
            json,
            no_heuristics,
        } => {
            let stylesheet = css
                .map(|css| fs::read_to_string(&css).map_err(|e| Error::io(css, e)))
                .transpose()?;
            let options = Options {
                language: language.unwrap_or_default(),
                class_heuristics: !no_heuristics,
                stylesheet,
            };

            match path {
                Some(path) if !stdin => parse_path(&path, language, &options, json),
                _ => parse_stdin(&options, json),
            }
        }

        Commands::Locate {
            path,
            line,
            column,
            language,
            json,
        } => {
            let source = read(&path)?;
            let options = Options {
                language: language.unwrap_or_else(|| Language::from_path(&path)),
                ..Options::default()
            };
            let document = parse_with(&source, &options);

            let Some(node) = document.node_at(Cursor::new(line, column)) else {
                eprintln!("No element at or above line {}", line);
                return Ok(ExitCode::FAILURE);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(node)?);
            } else {
                let (start, end) = node.source_lines();
                println!("{} {} lines {}-{}", node.id(), node.tag(), start, end);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Diff { old, new, line } => {
            let old_text = read(&old)?;
            let new_text = read(&new)?;
            let change = detect_deletion(&old_text, &new_text, line);
            println!("{}", serde_json::to_string(&change)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse_stdin(options: &Options, json: bool) -> Result<ExitCode, Error> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .map_err(|e| Error::io("<stdin>", e))?;

    let document = parse_with(&source, options);
    report(&document, &source, "<stdin>", json)?;
    Ok(ExitCode::SUCCESS)
}

fn parse_path(
    path: &Path,
    language: Option<Language>,
    options: &Options,
    json: bool,
) -> Result<ExitCode, Error> {
    let start = Instant::now();

    let files: Vec<PathBuf> = if path.is_dir() {
        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && Language::is_source(e.path()))
            .map(|e| e.into_path())
            .collect()
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        return Err(Error::NoInput(path.to_path_buf()));
    }

    for file in &files {
        let source = read(file)?;
        let options = Options {
            language: language.unwrap_or_else(|| Language::from_path(file)),
            ..options.clone()
        };
        let document = parse_with(&source, &options);

        if files.len() > 1 && !json {
            println!("== {} ==", file.display());
        }
        report(&document, &source, &file.display().to_string(), json)?;
    }

    print_summary(files.len(), start.elapsed());
    Ok(ExitCode::SUCCESS)
}

fn report(document: &Document, source: &str, filename: &str, json: bool) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string(document)?);
    } else {
        print!("{}", ast::outline(&document.nodes));
    }

    let is_tty = io::stderr().is_terminal();
    for diagnostic in &document.diagnostics {
        if is_tty {
            eprintln!("{}", diagnostic.render_color(source, filename));
        } else {
            eprintln!("{}", diagnostic.render(source, filename));
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if is_tty {
        eprintln!("\n\x1b[1mParsed {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\nParsed {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
