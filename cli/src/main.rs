// Copyright 2026 The GhostFS Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line front end: format a carrier file as a fresh GhostFS
//! filesystem, or list its contents.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use ghostfs_carrier::{Bmp, Carrier, Wav};
use ghostfs_codec::LsbCodec;
use ghostfs_err::Result;
use ghostfs_fs::{format, mount};
use log::error;

/// Either concrete carrier kind, so the CLI can pick one at runtime without
/// a trait object.
enum AnyCarrier {
    Bmp(Bmp),
    Wav(Wav),
}

impl Carrier for AnyCarrier {
    fn sample_count(&self) -> u64 {
        match self {
            AnyCarrier::Bmp(c) => c.sample_count(),
            AnyCarrier::Wav(c) => c.sample_count(),
        }
    }

    fn read_sample(&self, index: u64) -> Result<u8> {
        match self {
            AnyCarrier::Bmp(c) => c.read_sample(index),
            AnyCarrier::Wav(c) => c.read_sample(index),
        }
    }

    fn write_sample(&self, index: u64, value: u8) -> Result<()> {
        match self {
            AnyCarrier::Bmp(c) => c.write_sample(index, value),
            AnyCarrier::Wav(c) => c.write_sample(index, value),
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CarrierKind {
    Bmp,
    Wav,
}

#[derive(Parser)]
#[command(name = "ghostfs", about = "GhostFS steganographic filesystem tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Format a carrier file as an empty GhostFS filesystem.
    Format {
        carrier: String,
        #[arg(long, value_enum, default_value = "bmp")]
        kind: CarrierKind,
    },
    /// List the contents of a mounted carrier, recursively, from `/`.
    Ls {
        carrier: String,
        #[arg(long, value_enum, default_value = "bmp")]
        kind: CarrierKind,
    },
}

fn open_storage(carrier: &str, kind: CarrierKind) -> Result<LsbCodec<AnyCarrier>> {
    let carrier = match kind {
        CarrierKind::Bmp => AnyCarrier::Bmp(Bmp::open(carrier)?),
        CarrierKind::Wav => AnyCarrier::Wav(Wav::open(carrier)?),
    };
    Ok(LsbCodec::new(carrier))
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Format { carrier, kind } => {
            let storage = open_storage(&carrier, kind)?;
            format(&storage)?;
            println!("formatted {carrier}");
        }
        Command::Ls { carrier, kind } => {
            let storage = open_storage(&carrier, kind)?;
            let fs = mount(storage)?;
            print!("{}", fs.debug("/")?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("ghostfs: {e}");
            ExitCode::FAILURE
        }
    }
}
