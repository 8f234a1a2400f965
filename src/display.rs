//! Diff previews and result tables.

use colored::Colorize;
use reconcile::{
    DiffSummary, FunctionEntry, ItemResult, Outcome, Report, ResourceStateChanges,
    StateComparisonResult, SubgraphEntry, WebhookEntry,
};
use tabled::builder::Builder;
use tabled::settings::{Padding, Style};

const URL_WIDTH: usize = 48;

/// A plain-text table with left-aligned columns.
#[derive(Debug)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Header line followed by one line per row.
    pub fn render(&self) -> Vec<String> {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().copied());
        for row in &self.rows {
            builder.push_record(row.iter().map(String::as_str));
        }
        let table = builder
            .build()
            .with(Style::empty())
            .with(Padding::new(0, 2, 0, 0))
            .to_string();
        table
            .lines()
            .map(|line| format!("    {}", line.trim_end()))
            .collect()
    }

    pub fn print(&self) {
        let mut lines = self.render().into_iter();
        if let Some(header) = lines.next() {
            println!("{}", header.dimmed());
        }
        for line in lines {
            println!("{line}");
        }
    }
}

fn bucket(label: &str, table: &Table) {
    println!("  {} {}", "-".dimmed(), label);
    table.print();
}

fn yes_no(value: bool) -> String {
    value.to_string()
}

fn joined<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

// ============================================================================
// Deploy preview
// ============================================================================

fn subgraph_table(entries: &[SubgraphEntry]) -> Table {
    let mut table = Table::new(&["schema_name"]);
    for entry in entries {
        table.row(vec![entry.schema_name.clone()]);
    }
    table
}

fn webhook_table(entries: &[WebhookEntry], with_id: bool, with_changes: bool) -> Table {
    let mut headers = vec!["webhook_name", "url"];
    if with_id {
        headers.push("webhook_id");
    }
    if with_changes {
        headers.push("changes");
    }
    let mut table = Table::new(&headers);
    for entry in entries {
        let mut row = vec![
            entry.webhook_name.clone(),
            crate::ui::truncate(&entry.url, URL_WIDTH),
        ];
        if with_id {
            row.push(opt(entry.webhook_id.as_deref()));
        }
        if with_changes {
            row.push(joined(&entry.changes));
        }
        table.row(row);
    }
    table
}

fn function_table(entries: &[FunctionEntry], with_changes: bool) -> Table {
    let mut headers = vec!["function_name", "chain_id"];
    if !with_changes {
        headers.push("trigger_types");
    }
    headers.extend(["webhook", "should_send_std_streams"]);
    if with_changes {
        headers.push("changes");
    }
    let mut table = Table::new(&headers);
    for entry in entries {
        let mut row = vec![entry.function_name.clone(), entry.chain_id.clone()];
        if !with_changes {
            row.push(entry.trigger_types());
        }
        row.push(entry.webhook.clone());
        row.push(yes_no(entry.should_send_std_streams));
        if with_changes {
            row.push(joined(&entry.changes));
        }
        table.row(row);
    }
    table
}

fn kind_heading(title: &str, empty: bool) -> bool {
    println!();
    println!("{}", title.cyan().bold());
    if empty {
        println!("  {}", "(none)".dimmed());
    }
    !empty
}

/// Print every bucket of every kind, the way deploy will treat them.
pub fn print_deploy_preview(changes: &StateComparisonResult) {
    let subgraphs = &changes.subgraphs;
    if kind_heading("Subgraphs:", subgraphs.is_empty()) {
        print_buckets(
            subgraphs,
            subgraph_table,
            subgraph_table,
            subgraph_table,
        );
    }

    let webhooks = &changes.webhooks;
    if kind_heading("Webhooks:", webhooks.is_empty()) {
        print_buckets(
            webhooks,
            |e| webhook_table(e, false, false),
            |e| webhook_table(e, true, true),
            |e| webhook_table(e, true, false),
        );
        let rotated: Vec<&str> = webhooks
            .changed
            .iter()
            .filter(|w| w.secret_changed())
            .map(|w| w.webhook_name.as_str())
            .collect();
        if !rotated.is_empty() {
            crate::ui::warn(&format!(
                "Secret changes are not applied in place: {}",
                rotated.join(", ")
            ));
        }
    }

    let functions = &changes.functions;
    if kind_heading("Functions:", functions.is_empty()) {
        print_buckets(
            functions,
            |e| function_table(e, false),
            |e| function_table(e, true),
            |e| function_table(e, false),
        );
    }

    println!();
    crate::ui::dim(&DiffSummary::from_result(changes).to_string());
}

fn print_buckets<T>(
    changes: &ResourceStateChanges<T>,
    added: impl Fn(&[T]) -> Table,
    changed: impl Fn(&[T]) -> Table,
    other: impl Fn(&[T]) -> Table,
) {
    if !changes.added.is_empty() {
        bucket(&"To be created:".green().to_string(), &added(&changes.added));
    }
    if !changes.changed.is_empty() {
        bucket(&"Changed:".yellow().to_string(), &changed(&changes.changed));
    }
    if !changes.unchanged.is_empty() {
        bucket("Unchanged:", &other(&changes.unchanged));
    }
    if !changes.unreferenced.is_empty() {
        bucket(&"Unreferenced:".dimmed().to_string(), &other(&changes.unreferenced));
    }
}

// ============================================================================
// Destroy preview
// ============================================================================

fn print_destroy_kind<T: Clone + reconcile::types::Named>(
    title: &str,
    changes: &ResourceStateChanges<T>,
    table: impl Fn(&[T]) -> Table,
) {
    let targets: Vec<T> = changes.deployed().into_iter().cloned().collect();
    if !kind_heading(title, targets.is_empty() && changes.unreferenced.is_empty()) {
        return;
    }
    if !targets.is_empty() {
        bucket(&"To be destroyed:".red().to_string(), &table(&targets));
    }
    if !changes.unreferenced.is_empty() {
        bucket(&"Unreferenced:".dimmed().to_string(), &table(&changes.unreferenced));
    }
}

fn destroy_function_table(entries: &[FunctionEntry]) -> Table {
    let mut table = Table::new(&["function_name", "function_id", "chain_id", "webhook"]);
    for entry in entries {
        table.row(vec![
            entry.function_name.clone(),
            opt(entry.function_id.as_deref()),
            entry.chain_id.clone(),
            entry.webhook.clone(),
        ]);
    }
    table
}

/// Print what destroy would delete, in the order it deletes.
pub fn print_destroy_preview(changes: &StateComparisonResult) {
    print_destroy_kind("Functions:", &changes.functions, destroy_function_table);
    print_destroy_kind("Subgraphs:", &changes.subgraphs, subgraph_table);
    print_destroy_kind("Webhooks:", &changes.webhooks, |e| webhook_table(e, true, false));
}

// ============================================================================
// Results
// ============================================================================

/// Item rows as plain text: name, id, status, response.
pub fn result_rows(results: &[ItemResult]) -> Vec<[String; 4]> {
    results
        .iter()
        .map(|r| {
            let label = match r.outcome {
                Outcome::Deployed => "deployed",
                Outcome::Destroyed => "destroyed",
                Outcome::Skipped { .. } => "skipped",
                Outcome::Failed { .. } => "failed",
            };
            [
                r.name.clone(),
                opt(r.id.as_deref()),
                label.to_string(),
                r.response().unwrap_or_default().to_string(),
            ]
        })
        .collect()
}

fn print_results(title: &str, results: &[ItemResult]) {
    if results.is_empty() {
        return;
    }
    println!();
    println!("{}", title.bold());
    let mut table = Table::new(&["name", "id", "status", "response"]);
    for row in result_rows(results) {
        table.row(row.to_vec());
    }
    table.print();
    let failed = results.iter().filter(|r| r.failed()).count();
    if failed > 0 {
        println!("    {}", crate::ui::count(failed, "failure", "failures").red());
    }
}

/// Print per-kind result tables in execution order.
pub fn print_report(report: &Report, destroying: bool) {
    if destroying {
        print_results("Function results:", &report.functions);
        print_results("Subgraph results:", &report.subgraphs);
        print_results("Webhook results:", &report.webhooks);
    } else {
        print_results("Subgraph results:", &report.subgraphs);
        print_results("Webhook results:", &report.webhooks);
        print_results("Function results:", &report.functions);
    }
}
