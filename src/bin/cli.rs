use anyhow::Context;
use axum::http::{Method, Request};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde_json::json;

use sm_authz::app::default_filters;
use sm_authz::authz::{with_user, ChainOutcome, UserContext};
use sm_authz::config::Settings;
use sm_authz::jwt::{JwtConfig, TokenClaims};

#[derive(Parser, Debug)]
#[command(author, version, about = "sm-authz policy tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a signed bearer token for local testing
    MintToken {
        #[arg(long)]
        cid: String,
        #[arg(long, default_value = "uaa")]
        zid: String,
        /// Token scope; repeat for several
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
    /// Evaluate the default policies for a request without serving it
    Check {
        #[arg(long, default_value = "GET")]
        method: String,
        #[arg(long)]
        path: String,
        #[arg(long)]
        cid: String,
        #[arg(long, default_value = "uaa")]
        zid: String,
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MintToken { cid, zid, scopes } => {
            let jwt = JwtConfig::from_env()?;
            let token = jwt.encode(&TokenClaims {
                cid,
                zid,
                scopes,
                user_name: None,
            })?;
            println!("{token}");
        }
        Commands::Check {
            method,
            path,
            cid,
            zid,
            scopes,
        } => {
            let settings = Settings::from_env()?;
            let filters = default_filters(&settings)?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;

            let (mut parts, _) = Request::builder()
                .method(method)
                .uri(path.as_str())
                .body(())
                .context("invalid request path")?
                .into_parts();
            with_user(&mut parts, UserContext::bearer(json!({"cid": cid, "zid": zid, "scope": scopes})));

            let report = match filters.authorize(&mut parts) {
                ChainOutcome::Unmatched => json!({"outcome": "unmatched"}),
                ChainOutcome::Abstained => json!({"outcome": "abstained"}),
                ChainOutcome::Allowed(level) => json!({"outcome": "allowed", "access_level": level}),
                ChainOutcome::Denied { filter, error } => {
                    json!({"outcome": "denied", "filter": filter, "error": error.to_string()})
                }
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
