//! Line-oriented interactive session over both screens.
//!
//! Screens stay mounted between commands, so a delete dialog opened by
//! one line is answered by a later `confirm` or `cancel`.

use std::io::BufRead;

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::backend::Backend;
use crate::cli::Invocation;
use crate::commands::{self, Deferred};
use crate::config::Config;
use crate::driver::Workspace;
use crate::render::ScreenView;

const PROMPT: &str = "staffdesk> ";

#[instrument(skip_all)]
pub async fn run<B, V, R>(ws: &mut Workspace<B>, cfg: &Config, view: &mut V, input: R) -> anyhow::Result<()>
where
    B: Backend,
    V: ScreenView,
    R: BufRead,
{
    view.line("staffdesk shell. Type `help` for commands or `quit` to leave.")?;
    ws.ensure_employees().await;
    ws.ensure_projects().await;
    let notices = ws.take_notices();
    view.notices(&notices)?;

    let mut lines = input.lines();
    loop {
        view.prompt(PROMPT)?;
        let Some(line) = lines.next() else {
            view.line("")?;
            break;
        };
        let line = line.context("failed reading shell input")?;

        let words = match split_words(&line) {
            Ok(words) => words,
            Err(err) => {
                view.line(&format!("error: {err:#}"))?;
                continue;
            }
        };
        let Some(head) = words.first().cloned() else {
            continue;
        };
        debug!(?words, "shell line");

        let outcome = match head.as_str() {
            "quit" | "exit" => break,
            "confirm" => commands::confirm_open(ws, view).await,
            "cancel" => {
                commands::cancel_open(ws);
                view.line("Dialog closed.")
            }
            "refresh" => {
                ws.mount_employees().await;
                ws.mount_projects().await;
                Ok(())
            }
            _ => match Invocation::from_tokens(cfg, words) {
                Ok(inv) => commands::dispatch(ws, view, &mut Deferred, inv).await,
                Err(err) => Err(err),
            },
        };

        let notices = ws.take_notices();
        view.notices(&notices)?;
        if let Err(err) = outcome {
            warn!(error = %err, "shell command failed");
            view.line(&format!("error: {err:#}"))?;
        }
    }

    info!("shell closed");
    Ok(())
}

/// Splits a line on whitespace. Single or double quotes group words
/// and a backslash escapes the next character.
pub fn split_words(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| anyhow!("line ends with a dangling backslash"))?;
                current.push(escaped);
                in_word = true;
            }
            (Some(open), c) if c == open => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(open) = quote {
        return Err(anyhow!("unterminated {open} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::split_words;

    #[test]
    fn quotes_group_words() {
        let words = split_words(r#"projects add name:"Website Revamp" desc:'new site' "#)
            .expect("split");
        assert_eq!(
            words,
            vec!["projects", "add", "name:Website Revamp", "desc:new site"]
        );
    }

    #[test]
    fn empty_quotes_make_an_empty_word() {
        assert_eq!(
            split_words(r#"projects edit P1 assigned:"""#).expect("split"),
            vec!["projects", "edit", "P1", "assigned:"]
        );
        assert_eq!(split_words(r#""""#).expect("split"), vec![String::new()]);
        assert!(split_words("   ").expect("split").is_empty());
    }

    #[test]
    fn escapes_and_unterminated_quotes() {
        assert_eq!(
            split_words(r"name:Ada\ Lovelace").expect("split"),
            vec!["name:Ada Lovelace"]
        );
        assert!(split_words("name:\"open").is_err());
        assert!(split_words("trailing\\").is_err());
    }
}
