//! Output formatting for the CLI.

use boutique_storefront::commerce::checkout::{CheckoutView, StatusKind};
use boutique_storefront::commerce::notify::{Notification, NotificationStage};
use boutique_storefront::commerce::view::CartView;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a step in a process.
    pub fn step(&self, num: usize, total: usize, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style(format!("[{}/{}]", num, total)).dim(), msg);
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print the cart overlay.
    pub fn cart(&self, view: &CartView) {
        if self.json {
            return;
        }
        if let Some(message) = view.empty_message() {
            println!("  {}", style(message).dim());
            return;
        }
        for (i, row) in view.rows.iter().enumerate() {
            self.table_row(&[&format!("{}.", i + 1), &row.name, &row.price], &[3, 28, 10]);
        }
        self.table_row(&["", "Total", &view.total], &[3, 28, 10]);
    }

    /// Print the payment modal.
    pub fn checkout(&self, view: &CheckoutView) {
        if self.json {
            return;
        }
        println!("  {} {}", style("Order summary").bold(), style(view.phase).dim());
        for row in &view.rows {
            self.table_row(&[&row.name, &row.price], &[31, 10]);
        }
        self.table_row(&["Total", &view.total], &[31, 10]);

        if let Some(status) = &view.status {
            match status.kind {
                StatusKind::Success => println!("  {}", style(&status.text).green()),
                StatusKind::Error => println!("  {}", style(&status.text).red()),
            }
        }

        let pay = format!("[ {} ]", view.pay.label);
        if view.pay.enabled {
            println!("  {}", style(pay).cyan().bold());
        } else {
            println!("  {}", style(pay).dim());
        }
    }

    /// Print visible notifications.
    pub fn notifications(&self, notifications: &[Notification]) {
        if self.json {
            return;
        }
        for notification in notifications {
            match notification.stage {
                NotificationStage::Visible => {
                    println!("  {} {}", style("🔔").yellow(), notification.message)
                }
                NotificationStage::Leaving => println!(
                    "  {} {}",
                    style("🔔").dim(),
                    style(&notification.message).dim()
                ),
            }
        }
    }
}
