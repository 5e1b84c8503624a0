//! azdo - Azure DevOps MCP server and credential management.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use azdo_client::{AzureDevOpsClient, Credential};
use azdo_core::config::Config;
use azdo_core::domains::enabled_domains;
use azdo_core::{CoreApi, UserAgent};
use azdo_mcp::{McpServer, Services, ToolHandler};
use azdo_storage::{pat_key, CredentialStore, KeychainStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "azdo")]
#[command(author, version, about = "Azure DevOps tools for MCP clients", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio
    Serve {
        /// Azure DevOps organization name
        #[arg(env = "ADO_ORG_NAME")]
        organization: Option<String>,

        /// Personal access token
        #[arg(long, env = "ADO_PAT", hide_env_values = true)]
        pat: Option<String>,

        /// OAuth access token, sent as Bearer credentials
        #[arg(long, env = "ADO_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Tool domains to enable (core, work, work-items, builds, releases, wiki, test-plans, all)
        #[arg(short, long, num_args = 1..)]
        domains: Vec<String>,

        /// Collection URL of an Azure DevOps Server
        #[arg(long)]
        server_url: Option<String>,
    },

    /// Validate a personal access token and save it in the keychain
    Login {
        /// Azure DevOps organization name
        #[arg(env = "ADO_ORG_NAME")]
        organization: Option<String>,

        /// Personal access token (prompted for when omitted)
        #[arg(long)]
        pat: Option<String>,
    },

    /// Remove the saved personal access token
    Logout {
        /// Azure DevOps organization name
        #[arg(env = "ADO_ORG_NAME")]
        organization: Option<String>,
    },

    /// Read or change the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print one value (e.g. azure_devops.organization)
    Get { key: String },

    /// Set one value (e.g. mcp.domains "work-items,builds")
    Set { key: String, value: String },

    /// Show current configuration
    Show,
}

const CONFIG_KEYS: &[&str] = &[
    "azure_devops.organization",
    "azure_devops.server_url",
    "mcp.domains",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries JSON-RPC frames; logs go to stderr.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Some(Commands::Serve {
            organization,
            pat,
            token,
            domains,
            server_url,
        }) => serve(organization, pat, token, domains, server_url).await,
        Some(Commands::Login { organization, pat }) => login(organization, pat).await,
        Some(Commands::Logout { organization }) => {
            let organization = resolve_organization(organization, &Config::load()?)?;
            KeychainStore::new().delete(&pat_key(&organization))?;
            println!("Removed the saved token for {}", organization);
            Ok(())
        }
        Some(Commands::Config { command }) => run_config(command),
        None => {
            println!("azdo - Azure DevOps tools for MCP clients");
            println!("Run with --help for usage information");
            Ok(())
        }
    }
}

async fn serve(
    organization: Option<String>,
    pat: Option<String>,
    token: Option<String>,
    domains: Vec<String>,
    server_url: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let organization = resolve_organization(organization, &config)?;
    let credential = resolve_credential(&organization, pat, token, &KeychainStore::new())?;
    let server_url = server_url.or_else(|| configured_server_url(&config));

    let domains = if domains.is_empty() {
        enabled_domains(config.domains())
    } else {
        enabled_domains(&domains)
    };

    tracing::info!(
        organization = %organization,
        credential = ?credential,
        domains = domains.len(),
        "Starting azdo MCP server"
    );

    let user_agent = Arc::new(UserAgent::new(VERSION));
    let client = Arc::new(AzureDevOpsClient::new(
        &organization,
        server_url.as_deref(),
        credential,
        user_agent.clone(),
    ));
    let handler = ToolHandler::new(Services::from_client(client), &domains);

    McpServer::new(handler, user_agent).run().await?;
    Ok(())
}

async fn login(organization: Option<String>, pat: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let organization = resolve_organization(organization, &config)?;
    let pat = match pat {
        Some(pat) => pat,
        None => prompt_pat()?,
    };

    let client = AzureDevOpsClient::new(
        &organization,
        configured_server_url(&config).as_deref(),
        Credential::Pat(pat.clone()),
        Arc::new(UserAgent::new(VERSION)),
    );
    let connection = client
        .connection_data()
        .await
        .with_context(|| format!("Failed to validate the token for {}", organization))?;
    let user = connection["authenticatedUser"]["providerDisplayName"]
        .as_str()
        .unwrap_or("unknown user");

    KeychainStore::new().store(&pat_key(&organization), &pat)?;
    println!("Logged in to {} as {}", organization, user);
    Ok(())
}

fn run_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Get { key } => {
            let config = Config::load()?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("{} is not set", key),
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }
        ConfigCommands::Show => {
            let config = Config::load()?;
            println!("# {}", Config::config_path()?.display());
            for key in CONFIG_KEYS {
                if let Some(value) = config.get(key)? {
                    println!("{} = {}", key, value);
                }
            }
        }
    }
    Ok(())
}

fn configured_server_url(config: &Config) -> Option<String> {
    config
        .azure_devops
        .as_ref()
        .and_then(|c| c.server_url.clone())
        .filter(|url| !url.trim().is_empty())
}

/// Organization from the command line (or `ADO_ORG_NAME`), else the config file.
fn resolve_organization(organization: Option<String>, config: &Config) -> anyhow::Result<String> {
    let organization = organization
        .map(|org| org.trim().to_string())
        .filter(|org| !org.is_empty())
        .or_else(|| config.organization().map(str::to_string));

    match organization {
        Some(organization) => Ok(organization),
        None => bail!(
            "No organization given. Pass it as an argument, set ADO_ORG_NAME, \
             or run `azdo config set azure_devops.organization <name>`"
        ),
    }
}

/// Bearer token, else the PAT from the command line, else the saved PAT.
fn resolve_credential(
    organization: &str,
    pat: Option<String>,
    token: Option<String>,
    store: &dyn CredentialStore,
) -> anyhow::Result<Credential> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        return Ok(Credential::Bearer(token));
    }
    if let Some(pat) = pat.filter(|p| !p.is_empty()) {
        return Ok(Credential::Pat(pat));
    }
    match store.get(&pat_key(organization))? {
        Some(pat) => Ok(Credential::Pat(pat)),
        None => bail!(
            "No credentials for {}. Run `azdo login {}` or set ADO_PAT",
            organization,
            organization
        ),
    }
}

fn prompt_pat() -> anyhow::Result<String> {
    eprint!("Personal access token: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let pat = line.trim().to_string();
    if pat.is_empty() {
        bail!("No personal access token entered");
    }
    Ok(pat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdo_core::config::AzureDevOpsConfig;
    use azdo_storage::MemoryStore;
    use clap::CommandFactory;

    fn config_with_org(organization: &str) -> Config {
        Config {
            azure_devops: Some(AzureDevOpsConfig {
                organization: organization.to_string(),
                server_url: None,
            }),
            mcp: None,
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from([
            "azdo", "serve", "contoso", "--pat", "secret", "-d", "work-items", "builds",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Serve {
                organization,
                pat,
                domains,
                ..
            }) => {
                assert_eq!(organization.as_deref(), Some("contoso"));
                assert_eq!(pat.as_deref(), Some("secret"));
                assert_eq!(domains, vec!["work-items", "builds"]);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["azdo", "config", "set", "mcp.domains", "wiki"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommands::Set { .. }
            })
        ));
    }

    #[test]
    fn test_organization_argument_wins() {
        let org = resolve_organization(Some(" fabrikam ".into()), &config_with_org("contoso"));
        assert_eq!(org.unwrap(), "fabrikam");
    }

    #[test]
    fn test_organization_from_config() {
        let org = resolve_organization(None, &config_with_org("contoso"));
        assert_eq!(org.unwrap(), "contoso");
    }

    #[test]
    fn test_organization_missing() {
        let err = resolve_organization(Some("".into()), &Config::default()).unwrap_err();
        assert!(err.to_string().starts_with("No organization given"));
    }

    #[test]
    fn test_token_selects_bearer() {
        let store = MemoryStore::with_credentials([("contoso/pat".to_string(), "saved".to_string())]);
        let credential =
            resolve_credential("contoso", Some("pat".into()), Some("oauth".into()), &store).unwrap();
        assert!(matches!(credential, Credential::Bearer(t) if t == "oauth"));
    }

    #[test]
    fn test_pat_argument_before_keychain() {
        let store = MemoryStore::with_credentials([("contoso/pat".to_string(), "saved".to_string())]);
        let credential = resolve_credential("contoso", Some("given".into()), None, &store).unwrap();
        assert!(matches!(credential, Credential::Pat(p) if p == "given"));
    }

    #[test]
    fn test_pat_from_keychain() {
        let store = MemoryStore::with_credentials([("contoso/pat".to_string(), "saved".to_string())]);
        let credential = resolve_credential("Contoso", None, None, &store).unwrap();
        assert!(matches!(credential, Credential::Pat(p) if p == "saved"));
    }

    #[test]
    fn test_no_credentials() {
        let err = resolve_credential("contoso", None, None, &MemoryStore::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No credentials for contoso. Run `azdo login contoso` or set ADO_PAT"
        );
    }
}
