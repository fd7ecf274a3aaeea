//! Terminal implementations of the host ports

use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use quickfix_core::{Notifier, Picker};
use tracing::warn;

/// Prints notices: info to stdout, errors to stderr
#[derive(Debug, Default)]
pub struct TerminalNotifier;

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn info(&self, message: &str) {
        println!("{}", message);
    }

    async fn error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Interactive single-select; Esc or `q` cancels
#[derive(Debug, Default)]
pub struct DialoguerPicker;

#[async_trait]
impl Picker for DialoguerPicker {
    async fn pick_one(&self, items: &[String], placeholder: &str) -> Option<String> {
        let items = items.to_vec();
        let prompt = placeholder.to_string();

        let picked = tokio::task::spawn_blocking(move || {
            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .items(&items)
                .default(0)
                .interact_opt();
            match selection {
                Ok(index) => index.and_then(|i| items.get(i).cloned()),
                Err(err) => {
                    warn!("Selection prompt failed: {}", err);
                    None
                }
            }
        })
        .await;

        picked.unwrap_or_else(|err| {
            warn!("Selection prompt panicked: {}", err);
            None
        })
    }
}

/// Non-interactive: always takes the first item
#[derive(Debug, Default)]
pub struct FirstChoicePicker;

#[async_trait]
impl Picker for FirstChoicePicker {
    async fn pick_one(&self, items: &[String], placeholder: &str) -> Option<String> {
        let choice = items.first().cloned();
        if let Some(choice) = &choice {
            println!("{}: {}", placeholder, choice);
        }
        choice
    }
}
