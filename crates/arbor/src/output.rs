//! Output formatting: tree, table, JSON, YAML, plain.
//!
//! Renders a snapshot in the format selected by `--output`. Table uses
//! `tabled`, structured formats use serde, plain emits one id per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use arbor_core::{Tree, TreeNode};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Table row ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Depth")]
    depth: usize,
    #[tabled(rename = "Children")]
    children: usize,
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a snapshot in the chosen format.
pub fn render_tree(format: &OutputFormat, tree: &Tree, color: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Tree => Ok(render_outline(tree, color)),
        OutputFormat::Table => {
            let rows: Vec<NodeRow> = tree
                .walk()
                .map(|entry| NodeRow {
                    id: entry.node.id.to_string(),
                    name: entry.node.name.clone(),
                    parent: entry.parent.to_string(),
                    depth: entry.depth,
                    children: entry.node.children.len(),
                })
                .collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => render_json(tree, false),
        OutputFormat::JsonCompact => render_json(tree, true),
        OutputFormat::Yaml => render_yaml(tree),
        OutputFormat::Plain => Ok(tree
            .walk()
            .map(|entry| entry.node.id.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render any serializable value. `Tree`/`Table` fall back to `detail_fn`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> Result<String, CliError>,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Tree | OutputFormat::Table | OutputFormat::Plain => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

/// Box-drawing outline:
///
/// ```text
/// r1
/// ├── Documents (n1)
/// │   └── Invoices (n2)
/// └── Photos (n3)
/// ```
fn render_outline(tree: &Tree, color: bool) -> String {
    let mut out = if color {
        tree.root_id.dimmed().to_string()
    } else {
        tree.root_id.to_string()
    };
    if tree.is_empty() {
        out.push_str("\n(empty)");
    }
    outline_children(&tree.children, "", color, &mut out);
    out
}

fn outline_children(nodes: &[TreeNode], prefix: &str, color: bool, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        out.push('\n');
        out.push_str(prefix);
        out.push_str(branch);
        if color {
            out.push_str(&format!("{} {}", node.name.bold(), format!("({})", node.id).dimmed()));
        } else {
            out.push_str(&format!("{} ({})", node.name, node.id));
        }

        outline_children(&node.children, &format!("{prefix}{indent}"), color, out);
    }
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let text = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(text)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
