#![cfg_attr(test, allow(clippy::expect_used, clippy::panic))]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use plugin_studio_client::config::{MIN_TIMEOUT_MS, validate_base_url};
use plugin_studio_client::{ClientConfig, PluginStudioClient};
use plugin_studio_core::{
    ChatMessage, DetachedSurface, MessageTone, SaveOutcome, StudioBackend, StudioController,
};

#[derive(Parser, Debug)]
#[command(name = "plugin-studio")]
#[command(about = "Plugin Studio command line client")]
pub struct PluginStudioCli {
    /// Backend base URL (overrides PLUGIN_STUDIO_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Per-request timeout in milliseconds (overrides PLUGIN_STUDIO_TIMEOUT_MS)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List workspaces
    Projects,
    /// List the files of a workspace
    Files { workspace: String },
    /// Print a file
    Cat { workspace: String, file: String },
    /// Replace a file with the contents of a local file
    Put {
        workspace: String,
        file: String,
        local_path: PathBuf,
    },
    /// Send one message to the assistant
    Chat {
        message: String,
        /// Talk within this workspace instead of the creation chat
        #[arg(long)]
        workspace: Option<String>,
    },
    /// Ask the assistant to push a workspace to Azure DevOps
    Push { workspace: String, target: String },
    /// List Azure DevOps targets and the connection status
    Targets,
}

/// Environment configuration with command-line overrides applied.
pub fn client_config(
    cli: &PluginStudioCli,
    base: ClientConfig,
) -> anyhow::Result<ClientConfig> {
    let mut config = base;
    if let Some(base_url) = &cli.base_url {
        config.base_url = validate_base_url(base_url)?;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms.max(MIN_TIMEOUT_MS);
    }
    Ok(config)
}

pub async fn run(cli: PluginStudioCli, out: &mut impl Write) -> anyhow::Result<()> {
    let config = client_config(&cli, ClientConfig::from_env()?)?;
    tracing::debug!(base_url = %config.base_url, "using backend");
    let client = PluginStudioClient::new(config)?;
    run_command(client, cli.command, out).await
}

pub async fn run_command<B: StudioBackend>(
    backend: B,
    command: Commands,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let controller = StudioController::new(backend, DetachedSurface::default());

    match command {
        Commands::Projects => {
            controller.refresh_workspaces().await;
            let session = controller.session();
            if let Some(error) = session.workspaces_error() {
                bail!("{error}");
            }
            for name in session.workspaces() {
                writeln!(out, "{name}")?;
            }
        }
        Commands::Files { workspace } => {
            controller.select_workspace(&workspace).await?;
            let session = controller.session();
            if let Some(error) = session.files().error() {
                bail!("{error}");
            }
            for name in session.files().ready().into_iter().flatten() {
                writeln!(out, "{name}")?;
            }
        }
        Commands::Cat { workspace, file } => {
            let content = open_in(&controller, &workspace, &file).await?;
            write!(out, "{content}")?;
        }
        Commands::Put {
            workspace,
            file,
            local_path,
        } => {
            let content = std::fs::read_to_string(&local_path)
                .with_context(|| format!("read {}", local_path.display()))?;
            open_in(&controller, &workspace, &file).await?;
            controller.edit_active_buffer(content);

            match controller.save_active_tab().await {
                Some(SaveOutcome::Saved { filename }) => writeln!(out, "Saved {filename}")?,
                Some(SaveOutcome::Failed { error, .. }) => bail!("{error}"),
                Some(SaveOutcome::Stale) | None => bail!("save of {file} was not applied"),
            }
        }
        Commands::Chat { message, workspace } => {
            let reply = match workspace {
                Some(workspace) => {
                    controller.select_workspace(&workspace).await?;
                    controller.send_message(&message).await?;
                    last_reply(controller.session().conversation().messages())?
                }
                None => {
                    controller.send_creation_message(&message).await?;
                    last_reply(controller.session().creation_chat().messages())?
                }
            };
            writeln!(out, "{reply}")?;
        }
        Commands::Push { workspace, target } => {
            controller.select_workspace(&workspace).await?;
            controller.push_to_azdo(&target).await?;
            let reply = last_reply(controller.session().conversation().messages())?;
            writeln!(out, "{reply}")?;
        }
        Commands::Targets => {
            controller.refresh_connection_status().await;
            controller.load_azdo_targets().await;
            let session = controller.session();
            if let Some(status) = session.connection().ready() {
                let state = if status.azdo { "connected" } else { "not connected" };
                writeln!(out, "Azure DevOps: {state}")?;
            }
            if let Some(error) = session.azdo_targets().error() {
                bail!("{error}");
            }
            for name in session.azdo_targets().ready().into_iter().flatten() {
                writeln!(out, "{name}")?;
            }
        }
    }

    Ok(())
}

/// Selects `workspace`, opens `file` and returns its buffer content.
async fn open_in<B: StudioBackend>(
    controller: &StudioController<B, DetachedSurface>,
    workspace: &str,
    file: &str,
) -> anyhow::Result<String> {
    controller.select_workspace(workspace).await?;
    controller.open_file(file).await?;

    let session = controller.session();
    let filename = file.trim();
    if let Some(error) = session.tabs().open_error(filename) {
        bail!("{filename}: {error}");
    }
    session
        .tabs()
        .active_tab()
        .map(|tab| tab.buffer().text().to_string())
        .ok_or_else(|| anyhow!("{filename} was not opened"))
}

fn last_reply(messages: &[ChatMessage]) -> anyhow::Result<String> {
    let Some(message) = messages.last() else {
        bail!("no reply");
    };
    match message.tone {
        MessageTone::Error => Err(anyhow!("{}", message.content)),
        _ => Ok(message.content.clone()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use async_trait::async_trait;
    use clap::Parser;
    use clap::error::ErrorKind;
    use plugin_studio_core::{BackendError, ChatRequest, ConnectionStatus};

    use super::*;

    #[test]
    fn cli_requires_subcommand() {
        let err = match PluginStudioCli::try_parse_from(["plugin-studio"]) {
            Ok(_) => panic!("expected missing subcommand parse error"),
            Err(err) => err,
        };
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn cli_rejects_unknown_subcommand() {
        let err = match PluginStudioCli::try_parse_from(["plugin-studio", "deploy"]) {
            Ok(_) => panic!("expected invalid subcommand parse error"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn chat_accepts_optional_workspace_and_global_flags() {
        let cli = PluginStudioCli::try_parse_from([
            "plugin-studio",
            "chat",
            "build it",
            "--workspace",
            "Alpha",
            "--base-url",
            "http://studio.local:5000",
        ])
        .expect("parse");

        assert_eq!(cli.base_url.as_deref(), Some("http://studio.local:5000"));
        assert_eq!(
            cli.command,
            Commands::Chat {
                message: "build it".to_string(),
                workspace: Some("Alpha".to_string()),
            }
        );
    }

    #[test]
    fn flags_override_environment_config() {
        let cli = PluginStudioCli::try_parse_from([
            "plugin-studio",
            "--timeout-ms",
            "900",
            "--base-url",
            "https://studio.example.com/",
            "projects",
        ])
        .expect("parse");

        let config = client_config(&cli, ClientConfig::new("http://127.0.0.1:5000"))
            .expect("config");
        assert_eq!(config.base_url, "https://studio.example.com");
        assert_eq!(config.timeout_ms, 900);

        let cli = PluginStudioCli::try_parse_from([
            "plugin-studio",
            "--base-url",
            "not a url",
            "projects",
        ])
        .expect("parse");
        assert!(client_config(&cli, ClientConfig::new("http://127.0.0.1:5000")).is_err());
    }

    #[derive(Default)]
    struct FakeBackend {
        writes: Rc<RefCell<Vec<(String, String)>>>,
    }

    #[async_trait(?Send)]
    impl StudioBackend for FakeBackend {
        async fn list_projects(&self) -> Result<Vec<String>, BackendError> {
            Ok(vec!["Alpha".to_string()])
        }

        async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
            if request.azdo_project.is_some() {
                return Err(BackendError::http(400, "Azure DevOps is not connected"));
            }
            Ok(format!("re: {}", request.message))
        }

        async fn list_azdo_targets(&self) -> Result<Vec<String>, BackendError> {
            Ok(vec!["Contoso".to_string()])
        }

        async fn connection_status(&self) -> Result<ConnectionStatus, BackendError> {
            Ok(ConnectionStatus { azdo: false })
        }

        async fn list_plugin_files(&self, _workspace: &str) -> Result<Vec<String>, BackendError> {
            Ok(vec!["A.cs".to_string()])
        }

        async fn read_plugin_file(
            &self,
            _workspace: &str,
            filename: &str,
        ) -> Result<String, BackendError> {
            if filename == "A.cs" {
                Ok("class A {}".to_string())
            } else {
                Err(BackendError::http(404, "File not found"))
            }
        }

        async fn write_plugin_file(
            &self,
            _workspace: &str,
            filename: &str,
            content: &str,
        ) -> Result<(), BackendError> {
            self.writes
                .borrow_mut()
                .push((filename.to_string(), content.to_string()));
            Ok(())
        }
    }

    async fn output_of(command: Commands) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run_command(FakeBackend::default(), command, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn cat_prints_file_content() {
        let output = output_of(Commands::Cat {
            workspace: "Alpha".to_string(),
            file: "A.cs".to_string(),
        })
        .await
        .expect("cat");
        assert_eq!(output, "class A {}");
    }

    #[tokio::test]
    async fn cat_reports_open_failure() {
        let error = output_of(Commands::Cat {
            workspace: "Alpha".to_string(),
            file: "Missing.cs".to_string(),
        })
        .await
        .expect_err("missing file");
        assert_eq!(error.to_string(), "Missing.cs: HTTP 404: File not found");
    }

    #[tokio::test]
    async fn put_saves_local_content_through_the_tab() {
        let dir = tempfile::tempdir().expect("tempdir");
        let local_path = dir.path().join("A.cs");
        std::fs::write(&local_path, "class A { int x; }").expect("write local file");

        let backend = FakeBackend::default();
        let writes = Rc::clone(&backend.writes);
        let mut out = Vec::new();
        run_command(
            backend,
            Commands::Put {
                workspace: "Alpha".to_string(),
                file: "A.cs".to_string(),
                local_path,
            },
            &mut out,
        )
        .await
        .expect("put");

        assert_eq!(String::from_utf8(out).expect("utf8"), "Saved A.cs\n");
        assert_eq!(
            writes.borrow().as_slice(),
            [("A.cs".to_string(), "class A { int x; }".to_string())]
        );
    }

    #[tokio::test]
    async fn chat_without_workspace_uses_creation_chat() {
        let output = output_of(Commands::Chat {
            message: "create Gamma".to_string(),
            workspace: None,
        })
        .await
        .expect("chat");
        assert_eq!(output, "re: create Gamma\n");
    }

    #[tokio::test]
    async fn failed_push_is_an_error() {
        let error = output_of(Commands::Push {
            workspace: "Alpha".to_string(),
            target: "Contoso".to_string(),
        })
        .await
        .expect_err("push fails");
        assert_eq!(
            error.to_string(),
            "Error: HTTP 400: Azure DevOps is not connected"
        );
    }

    #[tokio::test]
    async fn targets_lists_connection_and_names() {
        let output = output_of(Commands::Targets).await.expect("targets");
        assert_eq!(output, "Azure DevOps: not connected\nContoso\n");
    }
}
