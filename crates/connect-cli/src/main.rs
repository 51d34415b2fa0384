//! gocardless-connect CLI
//!
//! Prints signed Connect URLs and confirms redirect callbacks. Credentials
//! and environment come from `GOCARDLESS_*` variables (a `.env` file is
//! honoured).

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use gocardless_connect::{
    Bill, ConfirmResource, Connect, IntervalUnit, MockHttpClient, PreAuthorization, Redirect,
    Subscription, User,
};

/// Build signed GoCardless Connect URLs and confirm callbacks
#[derive(Parser, Debug)]
#[command(name = "gocardless-connect", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Signed URL for a one-off bill
    BillUrl {
        #[arg(long)]
        amount: Decimal,

        #[arg(long)]
        merchant_id: String,

        #[command(flatten)]
        details: Details,

        #[command(flatten)]
        redirect: RedirectArgs,
    },

    /// Signed URL for a subscription
    SubscriptionUrl {
        #[arg(long)]
        amount: Decimal,

        #[arg(long)]
        merchant_id: String,

        #[arg(long)]
        interval_length: u32,

        /// day, week or month
        #[arg(long)]
        interval_unit: IntervalUnit,

        #[arg(long)]
        interval_count: Option<u32>,

        /// RFC 3339 start date
        #[arg(long)]
        start_at: Option<DateTime<Utc>>,

        #[command(flatten)]
        details: Details,

        #[command(flatten)]
        redirect: RedirectArgs,
    },

    /// Signed URL for a pre-authorization
    PreAuthorizationUrl {
        #[arg(long)]
        max_amount: Decimal,

        #[arg(long)]
        merchant_id: String,

        #[arg(long)]
        interval_length: u32,

        /// day, week or month
        #[arg(long)]
        interval_unit: IntervalUnit,

        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,

        #[command(flatten)]
        details: Details,

        #[command(flatten)]
        redirect: RedirectArgs,
    },

    /// Verify callback parameters and confirm the resource
    Confirm {
        #[arg(long)]
        resource_id: String,

        #[arg(long)]
        resource_type: String,

        #[arg(long)]
        resource_uri: String,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        signature: String,

        /// Verify and record the request without sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct Details {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Prefill the customer's email on the hosted page
    #[arg(long)]
    email: Option<String>,
}

impl Details {
    fn user(&self) -> Option<User> {
        self.email.as_ref().map(|email| User {
            email: Some(email.clone()),
            ..Default::default()
        })
    }
}

#[derive(Args, Debug)]
struct RedirectArgs {
    #[arg(long)]
    redirect_uri: Option<String>,

    #[arg(long)]
    cancel_uri: Option<String>,

    #[arg(long)]
    state: Option<String>,
}

impl RedirectArgs {
    fn as_redirect(&self) -> Redirect<'_> {
        Redirect {
            redirect_uri: self.redirect_uri.as_deref(),
            cancel_uri: self.cancel_uri.as_deref(),
            state: self.state.as_deref(),
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("gocardless_connect=debug,connect_cli=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gocardless_connect=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let connect = Connect::from_env().context("loading GOCARDLESS_* configuration")?;
    tracing::debug!(
        environment = connect.config().environment.as_str(),
        base = %connect.paths().base,
        "Connect client configured"
    );

    match cli.command {
        Commands::BillUrl {
            amount,
            merchant_id,
            details,
            redirect,
        } => {
            let mut bill = Bill::new(merchant_id, amount);
            bill.name = details.name.clone();
            bill.description = details.description.clone();
            bill.user = details.user();

            println!("{}", connect.new_bill_url(&bill, redirect.as_redirect())?);
        }

        Commands::SubscriptionUrl {
            amount,
            merchant_id,
            interval_length,
            interval_unit,
            interval_count,
            start_at,
            details,
            redirect,
        } => {
            let mut sub = Subscription::new(merchant_id, amount, interval_length, interval_unit);
            sub.interval_count = interval_count;
            sub.start_at = start_at;
            sub.name = details.name.clone();
            sub.description = details.description.clone();
            sub.user = details.user();

            println!("{}", connect.new_subscription_url(&sub, redirect.as_redirect())?);
        }

        Commands::PreAuthorizationUrl {
            max_amount,
            merchant_id,
            interval_length,
            interval_unit,
            expires_at,
            details,
            redirect,
        } => {
            let mut pre_auth =
                PreAuthorization::new(merchant_id, max_amount, interval_length, interval_unit);
            pre_auth.expires_at = expires_at;
            pre_auth.name = details.name.clone();
            pre_auth.description = details.description.clone();
            pre_auth.user = details.user();

            println!(
                "{}",
                connect.new_pre_authorization_url(&pre_auth, redirect.as_redirect())?
            );
        }

        Commands::Confirm {
            resource_id,
            resource_type,
            resource_uri,
            state,
            signature,
            dry_run,
        } => {
            let resource = ConfirmResource {
                resource_id,
                resource_type,
                resource_uri,
                state,
                signature,
            };

            if dry_run {
                let recorder = Arc::new(MockHttpClient::new());
                let connect = connect.with_http_client(recorder.clone());
                connect.confirm(&resource).await?;
                for request in recorder.requests() {
                    println!("POST {}\n{}", request.url, request.body);
                }
            } else {
                let response = connect.confirm(&resource).await?;
                println!("confirmed ({}): {}", response.status, response.body);
            }
        }
    }

    Ok(())
}
