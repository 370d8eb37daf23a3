//! # codeppl
//!
//! Computes the perplexity of a causal language model over every source file
//! found under a directory.
//!
//! ## Getting started
//!
//! ```sh
//! codeppl --model_name gpt2 --texts_dir ./repos --device cpu
//! Perplexity: 5.1234
//! ```
//!
//! Logging is controlled with `RUST_LOG` (skipped files are reported at `warn`).
use structopt::StructOpt;

use codeppl::error::Error;
use codeppl::pipeline::PerplexityPipeline;

#[macro_use]
extern crate log;

mod cli;

fn run() -> Result<(), Error> {
    let opt = cli::Codeppl::from_args();
    debug!("cli args\n{:#?}", opt);

    let config = opt.to_config()?;
    let report = PerplexityPipeline::new(config).run()?;

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Perplexity: {:.4}", report.perplexity);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{:?}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
