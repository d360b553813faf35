use anyhow::{Context, Result};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use tracing::debug;

/// Creates a Kubernetes client from the local kubeconfig or in-cluster service account.
///
/// An explicit context name selects that kubeconfig context instead of the current one.
pub async fn build_kube_client(context: Option<&str>) -> Result<Client> {
    let client = match context {
        Some(ctx) => {
            debug!("Using kubeconfig context '{}'", ctx);
            let options = KubeConfigOptions {
                context: Some(ctx.to_string()),
                ..Default::default()
            };
            let config = Config::from_kubeconfig(&options)
                .await
                .with_context(|| format!("failed to load kubeconfig context '{ctx}'"))?;
            Client::try_from(config).context("failed to build kube client")?
        }
        None => {
            debug!("Using default kubeconfig / in-cluster configuration");
            Client::try_default()
                .await
                .context("failed to load kubeconfig")?
        }
    };

    debug!("Kubernetes client initialized successfully");
    Ok(client)
}
