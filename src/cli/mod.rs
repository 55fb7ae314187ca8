mod def;
mod edit;
include!(concat!(env!("OUT_DIR"), "/rustc_version.rs"));
use clap::Parser;
use std::io::Read;

use yaml_walk::yaml::{
    self, append_node, assign_node, codec, copy_node, parse_path, range_map, scalar_values_walker,
    walk, Error, NodeRef, RangeOptions, Result, WalkOptions,
};

pub mod log;

pub fn run() -> Result<bool> {
    let cli = def::Args::parse();

    // Split log strings upon comma, trim them and flatten all in
    // `logs`, remove empty values
    let logs = cli.log.clone().unwrap_or_default();
    let logs = logs
        .iter()
        .flat_map(|log| log.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>();

    log::setup(cli.verbose, logs, cli.log_time)?;

    if cli.color && cli.no_color {
        return Err("Cannot use both --color and --no-color".into());
    }
    if cli.color {
        colored::control::set_override(true);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.version {
        println!("version: {}", env!("CARGO_PKG_VERSION"));
        println!("libfyaml: {}", yaml::get_version()?);
        println!("Rust: {}", RUSTC_VERSION);
        return Ok(true);
    }

    let Some(action) = &cli.action else {
        return Err("Missing action".into());
    };
    let doc = load(cli.file.as_deref())?;

    match action {
        def::Actions::GetValue { path, default } => {
            let found = edit::matches(&doc, &parse_path(path))?;
            if found.is_empty() {
                if let Some(default) = default {
                    print!("{}", default);
                    return Ok(true);
                }
                return miss(cli.quiet, path);
            }
            let rendered = found
                .iter()
                .map(|node| render(node, cli.yaml))
                .collect::<Result<Vec<_>>>()?;
            print!("{}", rendered.join(if cli.yaml { "---\n" } else { "\n" }));
        }
        def::Actions::Scalars {
            path,
            breadth_first,
            max_depth,
        } => {
            let mut opts = WalkOptions::new();
            if *breadth_first {
                opts = opts.with_breadth_first();
            }
            if let Some(depth) = max_depth {
                opts = opts.with_max_depth(*depth);
            }
            if ::log::log_enabled!(::log::Level::Trace) {
                opts = opts.with_trace(yaml::log_tracer);
            }
            let Some(roots) = lookup(&doc, path.as_deref())? else {
                return miss(cli.quiet, path.as_deref().unwrap_or_default());
            };
            for root in roots {
                walk(
                    &root,
                    scalar_values_walker(|node| {
                        println!("{}", render(node, cli.yaml)?.trim_end_matches('\n'));
                        Ok(())
                    }),
                    opts.clone(),
                )?;
            }
        }
        def::Actions::Keys { path, merge } => {
            let Some(maps) = lookup(&doc, path.as_deref())? else {
                return miss(cli.quiet, path.as_deref().unwrap_or_default());
            };
            for map in maps {
                range_map(
                    &map,
                    |key, _| {
                        println!("{}", render(key, cli.yaml)?.trim_end_matches('\n'));
                        Ok(())
                    },
                    range_options(merge),
                )?;
            }
        }
        def::Actions::KeyValues { path, merge } => {
            let Some(maps) = lookup(&doc, path.as_deref())? else {
                return miss(cli.quiet, path.as_deref().unwrap_or_default());
            };
            for map in maps {
                range_map(
                    &map,
                    |key, value| {
                        println!("{}", render(key, cli.yaml)?.trim_end_matches('\n'));
                        println!("{}", render(value, cli.yaml)?.trim_end_matches('\n'));
                        Ok(())
                    },
                    range_options(merge),
                )?;
            }
        }
        def::Actions::SetValue { path, value, yaml } => {
            let value = parse_value(value, *yaml)?;
            let targets = edit::targets(&doc, &parse_path(path))?;
            if targets.is_empty() {
                return miss(cli.quiet, path);
            }
            for target in targets {
                assign_node(&target, &copy_node(&value));
            }
            print!("{}", codec::emit(&doc)?);
        }
        def::Actions::Append { path, value, yaml } => {
            let value = parse_value(value, *yaml)?;
            let targets = edit::targets(&doc, &parse_path(path))?;
            if targets.is_empty() {
                return miss(cli.quiet, path);
            }
            for target in targets {
                let target = target.indirect();
                if target.is_null() {
                    assign_node(&target, &NodeRef::sequence());
                }
                append_node(&target, &copy_node(&value))?;
            }
            print!("{}", codec::emit(&doc)?);
        }
        def::Actions::Del { path } => {
            if edit::delete(&doc, &parse_path(path))? == 0 {
                return miss(cli.quiet, path);
            }
            print!("{}", codec::emit(&doc)?);
        }
    }
    Ok(true)
}

/// Document from `file`, or from stdin when none is given.
fn load(file: Option<&str>) -> Result<NodeRef> {
    match file {
        Some(file) => codec::read_file(file),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            ::log::trace!("read {} bytes from stdin", text.len());
            codec::parse_str(&text)
        }
    }
}

/// Nodes at `path`, or the root when there is no path. `None` when the
/// path matches nothing.
fn lookup(doc: &NodeRef, path: Option<&str>) -> Result<Option<Vec<NodeRef>>> {
    let found = edit::matches(doc, &parse_path(path.unwrap_or_default()))?;
    Ok((!found.is_empty()).then_some(found))
}

fn miss(quiet: bool, path: &str) -> Result<bool> {
    if quiet {
        return Ok(false);
    }
    Err(Error::Path(format!("invalid path '{}'", path)))
}

fn render(node: &NodeRef, yaml: bool) -> Result<String> {
    if yaml {
        codec::emit(node)
    } else {
        codec::raw_string(node)
    }
}

fn parse_value(value: &str, parse_as_yaml: bool) -> Result<NodeRef> {
    if parse_as_yaml {
        Ok(codec::parse_str(value)?.unwrap_document())
    } else {
        Ok(NodeRef::string(value))
    }
}

fn range_options(merge: &def::MergeArgs) -> RangeOptions {
    let mut opts = RangeOptions::new();
    if merge.merges_last {
        opts = opts.with_merges_last();
    }
    if merge.allow_duplicate_merge_keys {
        opts = opts.with_allow_duplicate_merge_keys();
    }
    opts
}
