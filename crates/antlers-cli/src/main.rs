use anyhow::{Context, Result, bail};
use antlers_config::Config;
use antlers_syntax::{ParseError, ParseOptions, parse_with};
use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

const USAGE: &str = "Usage: antlers [--config PATH] [--tree] [FILE...]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    tree: bool,
    files: Vec<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a path\n{USAGE}");
                };
                parsed.config = Some(PathBuf::from(path));
            }
            "--tree" => parsed.tree = true,
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("Unknown option {flag}\n{USAGE}"),
            _ => parsed.files.push(PathBuf::from(&arg)),
        }
    }

    Ok(parsed)
}

/// 1-based line and column (in characters) of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Parse one template and report its diagnostics. Returns how many were
/// reported, counting a fatal error as one.
fn check_source(
    path: &Path,
    source: &str,
    options: &ParseOptions<'_>,
    tree: bool,
    out: &mut impl Write,
) -> Result<usize> {
    let parse = match parse_with(source, options) {
        Ok(parse) => parse,
        Err(err) => {
            let offset = match err {
                ParseError::RecursionLimit { offset, .. } => offset,
                ParseError::UnresolvedAmbiguity { offset } => offset,
            };
            let (line, col) = line_col(source, offset);
            writeln!(out, "{}:{line}:{col}: fatal: {err}", path.display())?;
            return Ok(1);
        }
    };

    if tree {
        write!(out, "{}", parse.debug_tree())?;
    }

    for error in parse.errors() {
        let (line, col) = line_col(source, usize::from(error.range.start()));
        writeln!(
            out,
            "{}:{line}:{col}: {}: {}",
            path.display(),
            error.kind,
            error.message
        )?;
    }

    Ok(parse.errors().len())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("No config file at {}", path.display())),
        None => {
            let config = Config::load()?;
            if config.is_none() {
                log::debug!(
                    "No config file at {}, using defaults",
                    Config::config_path().display()
                );
            }
            Ok(config.unwrap_or_else(|| Config::new(".")))
        }
    }
}

fn run(args: Args) -> Result<usize> {
    let config = load_config(args.config.as_deref())?;
    let keywords = config.parser.keywords();
    let options = config.parser.parse_options(&keywords);

    let files = if args.files.is_empty() {
        log::info!("Checking templates under {}", config.root.display());
        config.template_files()?
    } else {
        args.files
    };
    if files.is_empty() {
        log::warn!("No templates found");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut total = 0;
    for path in &files {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let count = check_source(path, &source, &options, args.tree, &mut out)?;
        log::debug!("{}: {count} diagnostic(s)", path.display());
        total += count;
    }

    log::info!("Checked {} template(s), {total} diagnostic(s)", files.len());
    Ok(total)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = parse_args(env::args().skip(1))?;
    if run(args)? > 0 {
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use antlers_syntax::StandardKeywords;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    fn check(source: &str, options: &ParseOptions<'_>) -> (usize, String) {
        let mut out = Vec::new();
        let count = check_source(Path::new("page.antlers.html"), source, options, false, &mut out)
            .unwrap();
        (count, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--config", "site.toml", "--tree", "a.html", "b.html"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                config: Some(PathBuf::from("site.toml")),
                tree: true,
                files: vec![PathBuf::from("a.html"), PathBuf::from("b.html")],
            }
        );

        assert_eq!(args(&[]).unwrap(), Args::default());
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }

    #[test]
    fn test_line_col() {
        let source = "ab\ncdé\nf";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 3), (2, 1));
        assert_eq!(line_col(source, 5), (2, 3));
        assert_eq!(line_col(source, 8), (3, 1));
        assert_eq!(line_col(source, 100), (3, 2));
    }

    #[test]
    fn test_clean_template_reports_nothing() {
        let (count, out) = check("<p>{{ title }}</p>", &ParseOptions::default());
        assert_eq!(count, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn test_diagnostic_format() {
        let (count, out) = check("<p>\n  {{ /if }}</p>", &ParseOptions::default());
        assert_eq!(count, 1);
        assert_eq!(
            out,
            "page.antlers.html:2:3: unmatched close: `/if` has no matching open tag\n"
        );
    }

    #[test]
    fn test_fatal_error_counts_once() {
        let keywords = StandardKeywords::new();
        let options = ParseOptions {
            max_depth: 2,
            keywords: &keywords,
        };
        let (count, out) = check("{{ (((1))) }}", &options);
        assert_eq!(count, 1);
        assert!(out.starts_with("page.antlers.html:1:"), "{out}");
        assert!(out.contains("fatal: nesting exceeds the recursion limit of 2"));
    }

    #[test]
    fn test_tree_output() {
        let mut out = Vec::new();
        check_source(
            Path::new("t.html"),
            "{{ x }}",
            &ParseOptions::default(),
            true,
            &mut out,
        )
        .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("ROOT@0..7\n"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_run_counts_diagnostics_across_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("good.antlers.html"), "{{ title }}").unwrap();
        std::fs::write(root.join("bad.antlers.html"), "{{ if x }}open").unwrap();

        let config_file = root.join("config.toml");
        Config::new(root).save_to_path(&config_file).unwrap();

        let total = run(Args {
            config: Some(config_file),
            ..Args::default()
        })
        .unwrap();
        assert_eq!(total, 1);
    }
}
