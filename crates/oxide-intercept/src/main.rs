//! oxide-intercept CLI
//!
//! Command-line tool for trying out table resolution and field interception.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_intercept::handler::{MaskHandler, WILDCARD_TABLE, table_fields};
use oxide_intercept::naming::underscore_to_camel_case;
use oxide_intercept::{
    InterceptOutcome, InterceptorConfig, Node, ParameterInterceptor, Properties, resolve_statement,
};

/// Table-scoped field interception for SQL statements.
#[derive(Parser)]
#[command(name = "oxide-intercept")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the kind and target table of a statement.
    Resolve {
        /// The SQL statement.
        sql: String,
    },

    /// Print the camelCase field name of a column.
    Camel {
        /// The column name.
        name: String,
    },

    /// Mask fields of a JSON parameter graph the way the parameter
    /// interceptor would.
    Mask {
        /// The SQL statement the parameters belong to.
        #[arg(short, long)]
        sql: String,

        /// The parameters as JSON.
        #[arg(short, long)]
        params: String,

        /// Column to mask (repeatable).
        #[arg(short, long = "field", required = true)]
        fields: Vec<String>,

        /// Restrict masking to this table (all tables if not specified).
        #[arg(short, long)]
        table: Option<String>,

        /// Number of trailing characters left readable.
        #[arg(short, long, default_value_t = MaskHandler::DEFAULT_KEEP_LAST)]
        keep: usize,
    },

    /// Print the interceptor settings read from `OXIDE_INTERCEPT_*`
    /// variables.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Resolve { sql } => {
            let resolved = resolve_statement(&sql)?;
            println!("{} {}", resolved.kind, resolved.table);
        }

        Commands::Camel { name } => {
            println!("{}", underscore_to_camel_case(&name)?);
        }

        Commands::Mask {
            sql,
            params,
            fields,
            table,
            keep,
        } => {
            let json: serde_json::Value =
                serde_json::from_str(&params).context("--params is not valid JSON")?;
            let scope = table_fields(table.as_deref().unwrap_or(WILDCARD_TABLE), fields);

            let mut interceptor =
                ParameterInterceptor::new().with_properties(&Properties::from_env())?;
            interceptor.register_parameter_field_handler(MaskHandler::new(scope).keep_last(keep))?;

            let mut node = Node::from(json);
            match interceptor.before_execute(&sql, &mut node)? {
                InterceptOutcome::Intercepted { table, replaced } => {
                    info!("Masked {replaced} field(s) of table `{table}`.");
                }
                InterceptOutcome::Skipped(reason) => {
                    info!("Statement not intercepted: {reason:?}");
                }
            }
            println!("{}", serde_json::to_string_pretty(&node.to_json())?);
        }

        Commands::Config => {
            let config = InterceptorConfig::from_properties(&Properties::from_env())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
