//! Minimal CLI: schema files → (selections | paths)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use shape_query::expr::SelectorExpr;
use shape_query::{Query, SchemaFormat, SchemaRegistry, Shape};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// declare selections over a nested schema and print them as a JSON query
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve selector expressions into a query
    Select(SelectOut),
    /// list every selectable leaf of a schema
    Paths(PathsOut),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    /// {"type":"object","fields":{...}}
    Native,
    /// {"type":"object","properties":{...}}
    JsonSchema,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// format of the schema files
    #[arg(long, value_enum, default_value_t = FormatArg::Native)]
    format: FormatArg,

    /// One or more schema files. May be literal paths or quoted glob patterns.
    /// Each file registers under its file stem.
    #[arg(long, short, num_args = 1.., required = true)]
    schema: Vec<String>,

    /// schema to select from (defaults to the only one loaded)
    #[arg(long)]
    root: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct SelectOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// selector expressions, e.g. `a.b[first].c` or `xs[0..1,-2..-1]`
    #[arg(long = "select", short = 'e', num_args = 1.., required = true)]
    selectors: Vec<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct PathsOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl From<FormatArg> for SchemaFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Native => SchemaFormat::Native,
            FormatArg::JsonSchema => SchemaFormat::JsonSchema,
        }
    }
}

impl SchemaSettings {
    /// Register every schema file and pick the root to select from.
    fn load(&self) -> Result<(SchemaRegistry, String)> {
        let source_paths = resolve_file_path_patterns(&self.schema)
            .map_err(|error| anyhow!("failed to resolve schema file paths: {error}"))?;
        let mut registry = SchemaRegistry::new();
        for source_path in source_paths {
            let name = source_path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| anyhow!("schema file has no usable name: {}", source_path.display()))?
                .to_owned();
            let source = std::fs::read(&source_path)
                .with_context(|| format!("failed to read schema file {}", source_path.display()))?;
            let shape = Shape::parse_bytes(&source, self.format.into())
                .with_context(|| format!("failed to parse schema file {}", source_path.display()))?;
            registry
                .register(name, shape)
                .with_context(|| format!("failed to register schema file {}", source_path.display()))?;
        }

        let root = match &self.root {
            Some(root) => root.clone(),
            None => {
                let mut names = registry.names();
                match (names.next(), names.next()) {
                    (Some(only), None) => only.to_owned(),
                    (None, _) => bail!("no schemas loaded"),
                    _ => bail!("several schemas loaded; pick one with --root"),
                }
            }
        };
        Ok((registry, root))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Select(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let (registry, root) = target.schema_settings.load()?;
                let builder = registry.builder(&root)?;

                // builders are read-only views, so selectors resolve independently
                let selections = target
                    .selectors
                    .par_iter()
                    .map(|src| {
                        src.parse::<SelectorExpr>()
                            .and_then(|expr| expr.select(&builder))
                            .with_context(|| format!("invalid selector `{src}`"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                tracing::info!(schema = %root, selections = selections.len(), "resolved selectors");

                let query = Query::new(root, selections);
                let query_src = if target.pretty {
                    serde_json::to_string_pretty(&query)?
                } else {
                    serde_json::to_string(&query)?
                };
                write_output(target.out.as_deref(), &query_src)
            }
            Command::Paths(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let (registry, root) = target.schema_settings.load()?;
                let shape = registry
                    .get(&root)
                    .ok_or_else(|| anyhow!("unknown schema `{root}`"))?;
                for path in shape.leaf_paths() {
                    let path = path.replace("[*]", &"[*]".cyan().to_string());
                    println!("{}{path}", format!("{root}: ").dimmed());
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }

    #[test]
    fn parses_select_arguments() {
        let cli = CommandLineInterface::try_parse_from([
            "shape-query", "select", "-s", "doc.json", "--format", "json-schema",
            "-e", "a.b[first].c", "a.b[last].d",
        ])
        .unwrap();
        match cli.cmd {
            Command::Select(target) => {
                assert_eq!(target.selectors, vec!["a.b[first].c", "a.b[last].d"]);
                assert!(matches!(target.schema_settings.format, FormatArg::JsonSchema));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["schemas/doc.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("schemas/doc.json")]);
    }
}
