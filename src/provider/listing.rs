//! Model listing and discovery against Ollama's `/api/tags`.

use anyhow::Result;
use colored::Colorize;

use super::wire::TagsResponse;
use crate::error::BackendError;

/// Names of the models installed on the server.
pub async fn list_models(base_url: &str) -> Result<Vec<String>, BackendError> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url).await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let tags: TagsResponse = response
        .json()
        .await
        .map_err(|e| BackendError::Stream(e.to_string()))?;
    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

/// First installed model whose name contains `wanted`.
fn pick_model<'a>(installed: &'a [String], wanted: &str) -> Option<&'a String> {
    installed.iter().find(|name| name.contains(wanted))
}

/// Resolve the configured model name to an installed one.
pub async fn discover_model(base_url: &str, wanted: &str) -> Result<String, BackendError> {
    let installed = list_models(base_url).await?;
    tracing::debug!(?installed, wanted, "discovering model");
    pick_model(&installed, wanted)
        .cloned()
        .ok_or_else(|| BackendError::ModelNotFound(wanted.to_string()))
}

/// Print installed models, marking the one `current` resolves to.
pub async fn print_models(base_url: &str, current: &str) -> Result<()> {
    println!("Available models ({base_url}):\n");
    match list_models(base_url).await {
        Ok(models) if models.is_empty() => {
            println!("  (no models found -- run `ollama pull {current}`)");
        }
        Ok(models) => {
            let selected = pick_model(&models, current);
            for model in &models {
                if Some(model) == selected {
                    println!("  {} {}", model.bold(), "(selected)".dimmed());
                } else {
                    println!("  {model}");
                }
            }
        }
        Err(e) => {
            println!("  {}", format!("(ollama not reachable: {e})").red());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_model_matches_substring_in_order() {
        let installed = vec![
            "llama3.2:latest".to_string(),
            "qwen2.5-coder:7b".to_string(),
            "qwen2.5-coder:14b".to_string(),
        ];
        assert_eq!(
            pick_model(&installed, "qwen2.5-coder").map(String::as_str),
            Some("qwen2.5-coder:7b")
        );
        assert_eq!(
            pick_model(&installed, "llama3").map(String::as_str),
            Some("llama3.2:latest")
        );
        assert!(pick_model(&installed, "mistral").is_none());
    }
}
