//! Quire CLI
//!
//! Lays out a box tree described in JSON and prints the geometry, either
//! as an indented dump or as a JSON snapshot for a painter.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use quire_layout::{LayoutConfig, LayoutEngine, Viewport};
use quire_tree::{LayoutTree, TreeDescription, dump};

/// Quire: CSS box layout for PDF painting
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the laid-out tree
    quire page.json

    # A4 at 96dpi, as JSON
    quire --width 794 --height 1123 --json page.json

    # Tune the approximate font metrics
    quire --config metrics.json page.json
"#)]
struct Cli {
    /// JSON box tree to lay out
    #[arg(value_name = "FILE")]
    tree: PathBuf,

    /// Viewport width in px
    #[arg(long, default_value = "800")]
    width: f32,

    /// Viewport height in px
    #[arg(long, default_value = "600")]
    height: f32,

    /// JSON file with engine configuration overrides
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a JSON geometry snapshot instead of the text dump
    #[arg(long)]
    json: bool,

    /// Log layout decisions (same as RUST_LOG=debug)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    print!("{}", render(cli)?);
    Ok(())
}

/// Lay out the tree named by `cli` and format the result.
fn render(cli: &Cli) -> Result<String> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LayoutConfig::default(),
    };
    let mut tree = load_tree(&cli.tree)?;
    let engine = LayoutEngine::new().with_config(config);
    log::debug!("laying out {} nodes", tree.len());

    let tree = engine
        .layout_tree(&mut tree, Viewport::new(cli.width, cli.height), None)
        .with_context(|| format!("laying out {}", cli.tree.display()))?;

    if cli.json {
        let snapshot = dump::snapshot(tree, tree.root()).context("tree has no root")?;
        return Ok(serde_json::to_string_pretty(&snapshot)? + "\n");
    }
    let mut out = String::new();
    dump::dump(tree, tree.root(), &mut out)?;
    writeln!(
        out,
        "{} {} boxes in {}x{}",
        "laid out".green(),
        tree.len(),
        cli.width,
        cli.height
    )?;
    Ok(out)
}

fn load_tree(path: &Path) -> Result<LayoutTree> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let description = TreeDescription::from_json(&json)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(description.into_tree()?)
}

fn load_config(path: &Path) -> Result<LayoutConfig> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const TREE: &str = r#"{
        "tag": "body",
        "style": { "display": "block" },
        "children": [
            { "tag": "div", "style": { "display": "block", "height": 20 } },
            { "tag": "p", "style": { "display": "block" }, "children": [ { "text": "Hello" } ] }
        ]
    }"#;

    /// Write `contents` to a file unique to this test.
    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("quire-cli-{}-{name}", std::process::id()));
        fs::write(&path, contents).expect("write scratch file");
        path
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quire").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let parsed = cli(&["page.json"]);
        assert_eq!(parsed.tree, PathBuf::from("page.json"));
        assert_eq!((parsed.width, parsed.height), (800.0, 600.0));
        assert!(!parsed.json && !parsed.verbose);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn test_dump_lists_every_box() {
        let path = scratch_file("dump.json", TREE);
        let out = render(&cli(&[path.to_str().unwrap(), "--width", "400"])).unwrap();
        let _ = fs::remove_file(&path);

        assert!(out.lines().next().unwrap().contains("body"));
        assert!(out.contains("div"));
        assert!(out.lines().last().unwrap().contains("boxes in 400x600"));
    }

    #[test]
    fn test_json_snapshot() {
        let path = scratch_file("snapshot.json", TREE);
        let out = render(&cli(&["--json", path.to_str().unwrap()])).unwrap();
        let _ = fs::remove_file(&path);

        let snapshot: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(snapshot["label"], "body");
        assert_eq!(snapshot["children"][0]["border_box"]["height"], 20.0);
    }

    #[test]
    fn test_config_overrides_depth_limit() {
        let tree = scratch_file("deep.json", TREE);
        let config = scratch_file("config.json", r#"{ "max-depth": 1 }"#);
        let err = render(&cli(&[
            tree.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]))
        .unwrap_err();
        let _ = fs::remove_file(&tree);
        let _ = fs::remove_file(&config);

        assert!(format!("{err:#}").contains("deeper than 1 levels"), "{err:#}");
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = render(&cli(&["/nonexistent/quire-tree.json"])).unwrap_err();
        assert!(format!("{err:#}").contains("reading /nonexistent/quire-tree.json"));
    }
}
