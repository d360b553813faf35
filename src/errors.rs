use std::time::Duration;

use thiserror::Error;

/// Failures that abort one refresh cycle; the previous snapshot stays visible.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("K8s API error: {0}")]
    K8sApiError(String),

    #[error("K8s API did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Helper for mapping any fetch error into a K8s API error, keeping the context chain
pub fn k8s_error(err: anyhow::Error) -> AppError {
    AppError::K8sApiError(format!("{:#}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn keeps_context_chain_in_message() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused")).context("failed to list nodes");
        let app_err = k8s_error(err.unwrap_err());
        assert_eq!(app_err.to_string(), "K8s API error: failed to list nodes: connection refused");
    }

    #[test]
    fn timeout_message_names_the_limit() {
        assert_eq!(
            AppError::Timeout(Duration::from_secs(30)).to_string(),
            "K8s API did not answer within 30s"
        );
    }
}
