use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};

use crate::config::{AppConfig, BackendKind, StoredConfig, config_file_path, parse_latency};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration.
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring tickets CLI.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!();

    let stdin = io::stdin();
    Wizard::new(stdin.lock(), io::stdout()).edit(&mut cfg)?;
    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Backend: {}", display_value(&cfg.backend));
    println!("API base URL: {}", display_value(&cfg.api_base_url));
    println!("Data directory: {}", display_value(&cfg.data_dir));
    println!("User name: {}", display_value(&cfg.user_name));
    println!("Mock latency (ms): {}", display_value(&cfg.mock_latency_ms));
    if let Err(err) = AppConfig::resolve(cfg) {
        println!("\nWarning: {err}");
    }

    Ok(())
}

/// What the user typed for one setting.
#[derive(Debug, PartialEq)]
enum Answer {
    Keep,
    Clear,
    Set(String),
}

impl Answer {
    fn read(line: &str) -> Self {
        match line.trim() {
            "" => Answer::Keep,
            "-" => Answer::Clear,
            value => Answer::Set(value.to_string()),
        }
    }
}

type Check = fn(&str) -> AppResult<()>;

fn any_value(_: &str) -> AppResult<()> {
    Ok(())
}

fn backend_name(value: &str) -> AppResult<()> {
    BackendKind::parse(value).map(|_| ())
}

fn latency_ms(value: &str) -> AppResult<()> {
    parse_latency(value).map(|_| ())
}

/// Walks the stored settings one question at a time. Rejected answers are
/// explained and asked again; end of input keeps the remaining values.
struct Wizard<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn edit(&mut self, cfg: &mut StoredConfig) -> AppResult<()> {
        self.ask("Backend (http/mock)", &mut cfg.backend, backend_name)?;
        self.ask(
            "Ticket API base URL (e.g., http://localhost:5000)",
            &mut cfg.api_base_url,
            any_value,
        )?;
        self.ask("Local data directory", &mut cfg.data_dir, any_value)?;
        self.ask("Display name for new tickets", &mut cfg.user_name, any_value)?;
        self.ask("Mock backend latency (ms)", &mut cfg.mock_latency_ms, latency_ms)
    }

    fn ask(&mut self, label: &str, target: &mut Option<String>, check: Check) -> AppResult<()> {
        loop {
            match target.as_deref() {
                Some(value) => write!(self.output, "{label} [{value}]: ")?,
                None => write!(self.output, "{label}: ")?,
            }
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            match Answer::read(&line) {
                Answer::Keep => {}
                Answer::Clear => *target = None,
                Answer::Set(value) => {
                    if let Err(err) = check(&value) {
                        writeln!(self.output, "  {err}")?;
                        continue;
                    }
                    *target = Some(value);
                }
            }
            return Ok(());
        }
    }
}

fn display_value(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("<not set>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_wizard(cfg: &mut StoredConfig, typed: &str) -> String {
        let mut output = Vec::new();
        Wizard::new(Cursor::new(typed.as_bytes()), &mut output)
            .edit(cfg)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn answers_keep_clear_or_set() {
        assert_eq!(Answer::read("\n"), Answer::Keep);
        assert_eq!(Answer::read(" - \n"), Answer::Clear);
        assert_eq!(Answer::read(" mock\n"), Answer::Set("mock".to_string()));
    }

    #[test]
    fn wizard_edits_each_setting_in_turn() {
        let mut cfg = StoredConfig {
            backend: Some("http".to_string()),
            data_dir: Some("/tmp/tickets".to_string()),
            ..StoredConfig::default()
        };

        let shown = run_wizard(&mut cfg, "mock\n\n-\nAna\n0\n");

        assert_eq!(cfg.backend.as_deref(), Some("mock"));
        assert_eq!(cfg.api_base_url, None);
        assert_eq!(cfg.data_dir, None);
        assert_eq!(cfg.user_name.as_deref(), Some("Ana"));
        assert_eq!(cfg.mock_latency_ms.as_deref(), Some("0"));
        assert!(shown.contains("Backend (http/mock) [http]: "));
    }

    #[test]
    fn rejected_answers_are_asked_again() {
        let mut cfg = StoredConfig::default();
        let shown = run_wizard(&mut cfg, "ftp\nhttp\n\n\n\nsoon\n250\n");

        assert_eq!(cfg.backend.as_deref(), Some("http"));
        assert_eq!(cfg.mock_latency_ms.as_deref(), Some("250"));
        assert!(shown.contains("unknown backend 'ftp'"));
        assert!(shown.contains("invalid mock latency 'soon'"));
    }

    #[test]
    fn end_of_input_keeps_remaining_values() {
        let mut cfg = StoredConfig {
            user_name: Some("Ana".to_string()),
            ..StoredConfig::default()
        };
        run_wizard(&mut cfg, "mock\n");

        assert_eq!(cfg.backend.as_deref(), Some("mock"));
        assert_eq!(cfg.user_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn blank_values_show_as_not_set() {
        assert_eq!(display_value(&None), "<not set>");
        assert_eq!(display_value(&Some(String::new())), "<not set>");
        assert_eq!(display_value(&Some("mock".to_string())), "mock");
    }
}
