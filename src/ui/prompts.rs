//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{IdeError, IdeResult};

fn prompt_failed(e: impl std::fmt::Display) -> IdeError {
    IdeError::User(format!("Prompt failed: {}", e))
}

/// Ask for confirmation; `default` when non-interactive, yes under --yes
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> IdeResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(prompt_failed)?
    .map_err(prompt_failed)
}

/// Pick one of `options` (value, label, hint).
///
/// Non-interactive callers get `None` so they can ask for an explicit
/// argument instead of silently acting on the first entry.
pub async fn select<T: Clone + Send + Eq + 'static>(
    ctx: &UiContext,
    message: &str,
    options: &[(T, String, String)],
) -> IdeResult<Option<T>> {
    if !ctx.is_interactive() || options.is_empty() {
        return Ok(None);
    }

    let message = message.to_string();
    let items = options.to_vec();
    let picked = tokio::task::spawn_blocking(move || {
        let mut select = cliclack::select(&message);
        for (value, label, hint) in items {
            select = select.item(value, label, hint);
        }
        select.interact()
    })
    .await
    .map_err(prompt_failed)?
    .map_err(prompt_failed)?;

    Ok(Some(picked))
}

/// Read a secret without echoing it
pub async fn password(ctx: &UiContext, message: &str) -> IdeResult<String> {
    if !ctx.is_interactive() {
        return Err(IdeError::User(
            "No terminal to prompt on. Pass the key with --key".to_string(),
        ));
    }

    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::password(&message)
            .mask('▪')
            .validate(|input: &String| {
                if input.trim().is_empty() {
                    Err("Enter password")
                } else {
                    Ok(())
                }
            })
            .interact()
    })
    .await
    .map_err(prompt_failed)?
    .map_err(prompt_failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirm_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(confirm(&ctx, "Deploy?", false).await.unwrap());
    }

    #[tokio::test]
    async fn confirm_non_interactive_default() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Deploy?", true).await.unwrap());
        assert!(!confirm(&ctx, "Deploy?", false).await.unwrap());
    }

    #[tokio::test]
    async fn select_non_interactive_declines() {
        let ctx = UiContext::non_interactive();
        let options = vec![
            ("p1".to_string(), "Demo".to_string(), "p1".to_string()),
            ("p2".to_string(), "Tracker".to_string(), "p2".to_string()),
        ];
        assert_eq!(select(&ctx, "Open which project?", &options).await.unwrap(), None);
    }

    #[tokio::test]
    async fn password_requires_terminal() {
        let ctx = UiContext::non_interactive();
        assert!(matches!(
            password(&ctx, "Access key").await,
            Err(IdeError::User(_))
        ));
    }
}
