// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;

use aural::config::Scene;
use aural::simulator::{Pacing, Simulator};
use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Triggers and mixes sounds from a scene file."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plays a scene against a simulated output device and prints a report.
    Simulate {
        /// The path to the scene file.
        path: String,
        /// Run as fast as possible instead of in real time.
        #[arg(short, long)]
        fast: bool,
    },
    /// Loads and verifies a scene file.
    Verify {
        /// The path to the scene file.
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { path, fast } => {
            let scene = Scene::deserialize(&PathBuf::from(&path))?.resolve()?;
            let pacing = if fast { Pacing::Fast } else { Pacing::RealTime };

            let mut simulator = Simulator::new(scene);
            let report = simulator.run(pacing).await?;
            println!("{}", report);
        }
        Commands::Verify { path } => {
            let scene = match Scene::deserialize(&PathBuf::from(&path))
                .and_then(|scene| scene.resolve())
            {
                Ok(scene) => scene,
                Err(e) => {
                    println!("Scene {} is invalid: {}", path, e);
                    return Err(e.into());
                }
            };
            print!("{}", scene);
        }
    };

    Ok(())
}
