//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or the serialized value as JSON
pub fn print_table<T: Tabled>(rows: Vec<T>, empty_message: &str) {
    if rows.is_empty() {
        print_warning(empty_message);
        return;
    }
    println!("{}", Table::new(rows).with(Style::rounded()));
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2}Mi", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Format a ratio in [0, 1] as a percentage
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn format_optional_ratio(ratio: Option<f64>) -> String {
    ratio.map(format_ratio).unwrap_or_else(|| "-".to_string())
}

pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a match probability in [0, 1]
pub fn color_probability(probability: f64) -> String {
    let formatted = format!("{:.2}%", probability * 100.0);
    if probability >= 0.7 {
        formatted.green().to_string()
    } else if probability > 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

pub fn format_label(label: u8) -> String {
    if label == 1 {
        "match".green().bold().to_string()
    } else {
        "no match".red().to_string()
    }
}
