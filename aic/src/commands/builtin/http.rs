//! http command - fetch a URL and include the response body

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::commands::{Call, CommandContext, CommandError, CommandHandler, RenderScope, one_string};
use crate::prompt::Arg;

pub struct HttpCommand;

/// Prepend `https://` when the input carries no scheme
fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

#[async_trait]
impl CommandHandler for HttpCommand {
    fn name(&self) -> &'static str {
        "http"
    }

    fn usage(&self) -> &'static str {
        "$http(\"example.com/page\") - GET a URL and include the body"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        debug!(?args, "HttpCommand::validate: called");
        let raw = one_string("http", args)?;
        let normalized = normalize_url(raw);

        let url = Url::parse(&normalized).map_err(|e| CommandError::BadUrl {
            url: normalized.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CommandError::BadUrl {
                url: normalized,
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(CommandError::BadUrl {
                url: normalized,
                reason: "missing host".to_string(),
            });
        }
        Ok(Call::Http { url })
    }

    async fn render(&self, call: &Call, ctx: &CommandContext, _scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Http { url } = call else {
            return Err(CommandError::CallMismatch { name: "http" });
        };
        debug!(%url, "HttpCommand::render: called");

        let client = reqwest::Client::builder()
            .timeout(ctx.http.timeout())
            .user_agent(ctx.http.user_agent.clone())
            .build()
            .unwrap_or_default();

        let response = match client.get(url.clone()).send().await {
            Ok(r) => {
                debug!(status = %r.status(), "HttpCommand::render: response received");
                r
            }
            Err(e) => {
                debug!(%e, "HttpCommand::render: request failed");
                return Ok(format!("HTTP ERROR: {}\nURL: {}\n", e, url));
            }
        };

        if !response.status().is_success() {
            return Ok(format!("HTTP ERROR: {}\nURL: {}\n", response.status(), url));
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                debug!(%e, "HttpCommand::render: failed to read body");
                return Ok(format!("HTTP ERROR: {}\nURL: {}\n", e, url));
            }
        };

        let mut out = format!("URL: {}\n{}", url, body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
        Ok(out)
    }
}
