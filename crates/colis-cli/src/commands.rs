//! CLI commands

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;

use colis_core::api::{ApiClient, ApiConfig};
use colis_core::auth::Session;
use colis_core::models::{
    ColisRequest, PaginationParams, Priority, SortDirection, Statut, UserRole, ZoneRequest,
};
use colis_core::Config;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with username and password
    Login {
        /// Defaults to the last username used
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Forget the stored tokens
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Reload the profile from the server instead of the local cache
        #[arg(long)]
        fresh: bool,
    },

    /// Renew the access token now
    Refresh,

    /// Print the provider login URL to open in a browser
    OauthUrl {
        /// google, apple, facebook or okta
        provider: String,
    },

    /// Package operations
    Colis {
        #[command(subcommand)]
        command: ColisCommands,
    },

    /// Delivery zone operations
    Zones {
        #[command(subcommand)]
        command: ZoneCommands,
    },

    /// User lookups
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum ColisCommands {
    /// List packages, one page at a time
    List(PageArgs),

    Get {
        id: String,
    },

    Create(ColisArgs),

    Update {
        id: String,
        #[command(flatten)]
        fields: ColisArgs,
    },

    /// Set a package status (CREATED, COLLECTED, IN_STOCK, IN_TRANSIT, DELIVERED)
    UpdateStatus {
        id: String,
        #[arg(value_parser = parse_statut)]
        status: Statut,
    },

    /// Move a package to the next status in its lifecycle
    Advance {
        id: String,
    },

    ByStatus {
        #[arg(value_parser = parse_statut)]
        status: Statut,
    },

    ByZone {
        zone_id: String,
    },

    ByLivreur {
        livreur_id: String,
    },

    ByClient {
        client_id: String,
    },

    Search {
        term: String,
    },

    /// Assign a package to a courier
    Assign {
        colis_id: String,
        livreur_id: String,
    },

    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ZoneCommands {
    List,

    Get {
        id: String,
    },

    Create(ZoneArgs),

    Update {
        id: String,
        #[command(flatten)]
        fields: ZoneArgs,
    },

    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    List {
        /// Only users with this role
        #[arg(long, value_parser = parse_role)]
        role: Option<UserRole>,
    },

    Get {
        id: String,
    },
}

#[derive(Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    page: u32,

    #[arg(long, default_value_t = 10)]
    size: u32,

    #[arg(long, default_value = "id")]
    sort_by: String,

    #[arg(long, value_enum, default_value_t = SortArg::Asc)]
    sort_dir: SortArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

#[derive(Args)]
pub struct ColisArgs {
    /// Weight in kilograms
    #[arg(long)]
    poids: f64,

    #[arg(long)]
    ville: String,

    /// Sender user id
    #[arg(long)]
    client: String,

    #[arg(long)]
    zone: Option<String>,

    /// Recipient user id
    #[arg(long)]
    destinataire: Option<String>,

    #[arg(long, value_parser = parse_priority)]
    priorite: Option<Priority>,
}

#[derive(Args)]
pub struct ZoneArgs {
    #[arg(long)]
    nome: String,

    #[arg(long)]
    code_postal: String,
}

impl From<PageArgs> for PaginationParams {
    fn from(args: PageArgs) -> Self {
        PaginationParams {
            page: args.page,
            size: args.size,
            sort_by: args.sort_by,
            sort_dir: match args.sort_dir {
                SortArg::Asc => SortDirection::Asc,
                SortArg::Desc => SortDirection::Desc,
            },
        }
    }
}

impl From<ColisArgs> for ColisRequest {
    fn from(args: ColisArgs) -> Self {
        ColisRequest {
            poids: args.poids,
            ville_destination: args.ville,
            zone_id: args.zone,
            client_expediteur_id: args.client,
            destinataire_id: args.destinataire,
            priorite: args.priorite,
        }
    }
}

impl From<ZoneArgs> for ZoneRequest {
    fn from(args: ZoneArgs) -> Self {
        ZoneRequest {
            nome: args.nome,
            code_postal: args.code_postal,
        }
    }
}

fn parse_statut(s: &str) -> Result<Statut, String> {
    Statut::parse(s).ok_or_else(|| format!("unknown status '{}'", s))
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse(s).ok_or_else(|| format!("unknown priority '{}'", s))
}

fn parse_role(s: &str) -> Result<UserRole, String> {
    UserRole::parse(s).ok_or_else(|| format!("unknown role '{}'", s))
}

impl Commands {
    pub async fn execute(self, config: &mut Config, api_config: ApiConfig) -> Result<()> {
        let tokens = config.token_store()?;
        let session = Session::new(ApiClient::new(api_config, tokens)?);

        match self {
            Commands::Login { username } => login(&session, config, username).await,
            Commands::Logout => {
                session.logout();
                println!("Logged out");
                Ok(())
            }
            Commands::Whoami { fresh } => {
                require_session(&session).await?;
                let user = match session.current_user() {
                    Some(user) if !fresh => user,
                    _ => session.refresh_user().await?,
                };
                print_json(&user)
            }
            Commands::Refresh => {
                session
                    .client()
                    .refresh_tokens()
                    .await
                    .context("Failed to renew access token")?;
                println!("Access token renewed");
                Ok(())
            }
            Commands::OauthUrl { provider } => {
                println!("{}", session.oauth_url(&provider));
                Ok(())
            }
            Commands::Colis { command } => {
                require_session(&session).await?;
                command.execute(session.client()).await
            }
            Commands::Zones { command } => {
                require_session(&session).await?;
                command.execute(session.client()).await
            }
            Commands::Users { command } => {
                require_session(&session).await?;
                command.execute(session.client()).await
            }
        }
    }
}

impl ColisCommands {
    async fn execute(self, client: &ApiClient) -> Result<()> {
        let colis = client.colis();
        match self {
            ColisCommands::List(args) => print_json(&colis.list(&args.into()).await?),
            ColisCommands::Get { id } => print_json(&colis.get(&id).await?),
            ColisCommands::Create(fields) => print_json(&colis.create(&fields.into()).await?),
            ColisCommands::Update { id, fields } => {
                print_json(&colis.update(&id, &fields.into()).await?)
            }
            ColisCommands::UpdateStatus { id, status } => {
                print_json(&colis.update_status(&id, status).await?)
            }
            ColisCommands::Advance { id } => {
                let current = colis.get(&id).await?;
                let Some(statut) = current.statut else {
                    bail!("Package {} has no status", id);
                };
                let Some(next) = statut.next() else {
                    bail!("Package {} is already {}", id, statut);
                };
                print_json(&colis.update_status(&id, next).await?)
            }
            ColisCommands::ByStatus { status } => print_json(&colis.by_status(status).await?),
            ColisCommands::ByZone { zone_id } => print_json(&colis.by_zone(&zone_id).await?),
            ColisCommands::ByLivreur { livreur_id } => {
                print_json(&colis.by_livreur(&livreur_id).await?)
            }
            ColisCommands::ByClient { client_id } => {
                print_json(&colis.by_client(&client_id).await?)
            }
            ColisCommands::Search { term } => print_json(&colis.search(&term).await?),
            ColisCommands::Assign {
                colis_id,
                livreur_id,
            } => print_json(&colis.assign(&colis_id, &livreur_id).await?),
            ColisCommands::Delete { id } => {
                colis.delete(&id).await?;
                println!("Deleted package {}", id);
                Ok(())
            }
        }
    }
}

impl ZoneCommands {
    async fn execute(self, client: &ApiClient) -> Result<()> {
        let zones = client.zones();
        match self {
            ZoneCommands::List => print_json(&zones.list().await?),
            ZoneCommands::Get { id } => print_json(&zones.get(&id).await?),
            ZoneCommands::Create(fields) => print_json(&zones.create(&fields.into()).await?),
            ZoneCommands::Update { id, fields } => {
                print_json(&zones.update(&id, &fields.into()).await?)
            }
            ZoneCommands::Delete { id } => {
                zones.delete(&id).await?;
                println!("Deleted zone {}", id);
                Ok(())
            }
        }
    }
}

impl UserCommands {
    async fn execute(self, client: &ApiClient) -> Result<()> {
        let users = client.users();
        match self {
            UserCommands::List { role: Some(role) } => print_json(&users.by_role(role).await?),
            UserCommands::List { role: None } => print_json(&users.list().await?),
            UserCommands::Get { id } => print_json(&users.get(&id).await?),
        }
    }
}

async fn login(session: &Session, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(username) => username,
        None => prompt_username()?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let response = session.login(&username, &password).await?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", response.user.username);
    Ok(())
}

/// Fail early unless a usable session is stored, renewing it if needed
async fn require_session(session: &Session) -> Result<()> {
    if !session.restore().await {
        bail!("Not logged in. Run `colis login` first.");
    }
    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
