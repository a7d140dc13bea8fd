use std::path::PathBuf;

use anyhow::{Context, Result};
use backend::api::{
    demo_logs, export_engagement, import_engagement, read_engagement, ApiContext, EngagementQuery,
};
use clap::{Parser, Subcommand};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/engagement.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load engagement rows from a CSV file.
    Import { file: PathBuf },
    /// Write all engagement rows as CSV to a file or stdout.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Summary {
        #[arg(long)]
        user_type: Option<String>,
        #[arg(long)]
        from_date: Option<String>,
        #[arg(long)]
        to_date: Option<String>,
    },
    SeedDemo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;
    let ctx = ApiContext { storage };

    match cli.command {
        Command::Import { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let response = import_engagement(&ctx, &bytes).await?;
            println!("{}", response.message.unwrap_or_default());
        }
        Command::Export { out } => {
            let bytes = export_engagement(&ctx, &Default::default()).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => print!("{}", String::from_utf8_lossy(&bytes)),
            }
        }
        Command::Summary {
            user_type,
            from_date,
            to_date,
        } => {
            let filter = EngagementQuery {
                user_type,
                from_date,
                to_date,
            }
            .to_filter()?;
            let response = read_engagement(&ctx, &filter).await?;
            for (key, value) in response.summary.display_entries() {
                println!("{key}: {value}");
            }
            println!("rows: {}", response.details.len());
        }
        Command::SeedDemo => {
            let inserted = ctx.storage.insert_logs(&demo_logs()).await?;
            println!("inserted {inserted} demo rows");
        }
    }

    Ok(())
}
