//! Writes the Earth cloud layer texture.
//!
//! Run with: `cargo run -p terra-assets --bin terra-clouds -- --seed 7`

use std::path::PathBuf;

use clap::Parser;
use terra_assets::{CloudCanvas, CloudParams};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "terra-clouds", about = "Generate the Earth cloud texture")]
struct Args {
    /// Output PNG path.
    #[arg(long, default_value = "public/textures/earth/earth_clouds.png")]
    output: PathBuf,

    /// RNG seed. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 512)]
    height: u32,

    /// Number of clouds.
    #[arg(long, default_value_t = 100)]
    clouds: u32,
}

fn main() {
    let args = Args::parse();
    terra_log::init_logging(None, "terra-clouds.log", false, None);

    let seed = args.seed.unwrap_or_else(rand::random);
    let params = CloudParams {
        width: args.width,
        height: args.height,
        clouds: args.clouds,
        ..CloudParams::default()
    };

    let canvas = match CloudCanvas::generate(&params, seed) {
        Ok(canvas) => canvas,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = canvas.save(&args.output) {
        error!("{e}");
        std::process::exit(1);
    }

    info!(
        "Cloud texture written to {} (seed {seed}, {:.0}% covered)",
        args.output.display(),
        canvas.coverage() * 100.0
    );
}
