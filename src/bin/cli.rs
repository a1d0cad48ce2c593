use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use clap::Subcommand;

use salary_predictor::currency::format_currency;
use salary_predictor::pipeline::loader::{read_pipeline, DEFAULT_MODEL_PATH};
use salary_predictor::pipeline::{EmployeeRecord, SalaryEstimator};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the serialized salary pipeline
    #[arg(short, long, env, global = true, default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the salary for a single employee without starting the server
    Predict {
        #[clap(long)]
        years_experience: f64,

        #[clap(long)]
        age: i64,

        #[clap(long)]
        job_title: String,

        #[clap(long)]
        education_level: String,

        #[clap(long)]
        department: String,
    },
    /// Print the preprocessing steps and regressor of the pipeline
    Inspect,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let pipeline = read_pipeline(&args.model_path)?;

    match args.cmd {
        Commands::Predict {
            years_experience,
            age,
            job_title,
            education_level,
            department,
        } => {
            let record = EmployeeRecord {
                years_experience,
                age,
                job_title,
                education_level,
                department,
            };
            let estimate = pipeline.estimate(&record)?;
            println!("{}", format_currency(estimate)?);
        }
        Commands::Inspect => println!("{}", pipeline),
    }
    Ok(())
}
