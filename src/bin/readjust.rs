//! Compute premium readjustments from the monthly extracts
//!
//! Writes the per-corporation result table (CSV or JSON), the editable
//! subset, or the result after operator MV / expurgo edits.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use readjustment_system::loader::{load_census, load_edits, load_financial, load_members};
use readjustment_system::report::{to_json, write_csv, write_editable_csv, RunSummary};
use readjustment_system::{
    CorporationTable, CostTable, EngineConfig, ReadjustmentSession, ReferenceTables, SourceTables,
};

#[derive(Parser)]
#[command(name = "readjust")]
#[command(about = "Premium readjustment for corporate health-plan contracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the result table
    Compute {
        #[command(flatten)]
        inputs: Inputs,

        /// Write JSON (rows + summary) instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Write the corporations open to manual MV / expurgo adjustment
    Eligible {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Apply operator edits and write the recomputed table
    Adjust {
        #[command(flatten)]
        inputs: Inputs,

        /// CSV with id_corporacao, empresa, ajuste_mv, expurgo (blank keeps the current value)
        #[arg(long)]
        edits: PathBuf,

        /// Write JSON (rows + summary) instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Price a product for a prospective corporation
    Quote {
        /// Product name, e.g. "UNIMED PLENO 100"
        #[arg(long)]
        product: String,

        /// Base value (R$)
        #[arg(long)]
        base_value: f64,

        /// Number of lives
        #[arg(long, default_value_t = 1)]
        lives: u64,
    },

    /// Print the reference tables
    Reference {
        /// Cost table override (faixa_etaria, cm_masculino, cm_feminino)
        #[arg(long)]
        cost_table: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Inputs {
    /// Financial base (base_12m.xlsx or CSV)
    #[arg(long)]
    base: PathBuf,

    /// Readjustment / census file (Reajuste_MMYYYY.csv)
    #[arg(long)]
    reajuste: PathBuf,

    /// Member usage file (usr_MMYY.csv)
    #[arg(long)]
    usr: Option<PathBuf>,

    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cost table override (faixa_etaria, cm_masculino, cm_feminino)
    #[arg(long)]
    cost_table: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn reference_tables(cost_table: Option<&Path>) -> Result<ReferenceTables> {
    match cost_table {
        Some(path) => {
            let table = CostTable::load_csv(path)
                .with_context(|| format!("Failed to load cost table {}", path.display()))?;
            Ok(ReferenceTables::with_cost_table(table))
        }
        None => Ok(ReferenceTables::default()),
    }
}

fn open_session(inputs: &Inputs) -> Result<ReadjustmentSession> {
    let config = match &inputs.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let reference = reference_tables(inputs.cost_table.as_deref())?;
    let mut session = ReadjustmentSession::new(config, reference);

    let financial = load_financial(&inputs.base)
        .with_context(|| format!("Failed to read {}", inputs.base.display()))?;
    let census = load_census(&inputs.reajuste)
        .with_context(|| format!("Failed to read {}", inputs.reajuste.display()))?;
    let members = inputs
        .usr
        .as_deref()
        .map(|path| load_members(path).with_context(|| format!("Failed to read {}", path.display())))
        .transpose()?;

    let start = Instant::now();
    let table = session.load(&SourceTables::new(financial, census, members))?;
    log::info!("Pipeline finished for {} corporations in {:?}", table.len(), start.elapsed());
    Ok(session)
}

fn output_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(File::create(p).with_context(|| format!("Failed to create {}", p.display()))?),
        None => Box::new(io::stdout().lock()),
    })
}

fn write_table(session: &ReadjustmentSession, table: &CorporationTable, json: bool, output: Option<&Path>) -> Result<()> {
    let mut out = output_writer(output)?;
    if json {
        let payload = serde_json::json!({
            "summary": RunSummary::new(table, session.engine()),
            "rows": to_json(table)?,
        });
        serde_json::to_writer_pretty(&mut out, &payload)?;
        writeln!(out)?;
    } else {
        write_csv(table, &mut out)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compute { inputs, json } => {
            let session = open_session(&inputs)?;
            let table = session.current().context("No table computed")?;
            write_table(&session, table, json, inputs.output.as_deref())?;
        }

        Commands::Eligible { inputs } => {
            let session = open_session(&inputs)?;
            let editable = session.editable_subset()?;
            eprintln!("{} corporations eligible for manual adjustment", editable.len());
            write_editable_csv(&editable, output_writer(inputs.output.as_deref())?)?;
        }

        Commands::Adjust { inputs, edits, json } => {
            let mut session = open_session(&inputs)?;
            let edits = load_edits(&edits)
                .with_context(|| format!("Failed to read edits {}", edits.display()))?;
            let eligible = session.editable_subset()?.len();
            eprintln!("{} corporations eligible, applying {} edits", eligible, edits.len());

            session.apply_edits(&edits)?;
            let table = session.current().context("No table computed")?;
            write_table(&session, table, json, inputs.output.as_deref())?;
        }

        Commands::Quote { product, base_value, lives } => {
            let reference = ReferenceTables::default();
            let quote = reference
                .products
                .quote(&product, base_value, lives, &reference.equilibrium)?;
            println!("Product:           {}", quote.product);
            println!("Multiplier:        {:.9}", quote.multiplier);
            println!("Adjusted price:    R$ {:.2}", quote.adjusted_price);
            println!("Equilibrium point: {:.2}%", quote.equilibrium_point * 100.0);
            println!("Margin:            {:.2}%", quote.margin * 100.0);
        }

        Commands::Reference { cost_table } => {
            let reference = reference_tables(cost_table.as_deref())?;

            println!("Average cost (CM) by age band");
            println!("{:<8} {:>12} {:>12}", "Band", "Male", "Female");
            for row in reference.cost_table.rows() {
                println!("{:<8} {:>12.2} {:>12.2}", row.band.label(), row.male, row.female);
            }

            println!("\nEquilibrium point by lives");
            for (band, point) in reference.equilibrium.describe() {
                println!("{:<14} {:>5.0}%", band, point * 100.0);
            }

            println!("\nProducts");
            for (name, multiplier) in reference.products.products() {
                println!("{:<32} {:.9}", name, multiplier);
            }
        }
    }

    Ok(())
}
