// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use eeprom_config::{codec, image};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Trace the section walk and other internals
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sections of an image
    List {
        /// Path to the EEPROM image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Write every section's payload to a file named after the section
    ExtractAll {
        /// Path to the EEPROM image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Directory to extract into
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },
    /// Replace a section's payload with the contents of a file
    UpdateFile {
        /// Path to the EEPROM image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Name of the section to update
        #[arg(value_name = "NAME")]
        target: String,

        /// File holding the new payload
        #[arg(value_name = "FILE")]
        src: PathBuf,

        /// Where to write the updated image (default: in place)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Replace a section's payload with the raw key from a PEM file
    UpdateKey {
        /// Path to the EEPROM image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Name of the section to update
        #[arg(value_name = "NAME")]
        target: String,

        /// PEM file holding a P-384 public key
        #[arg(value_name = "PEM")]
        pem: PathBuf,

        /// Where to write the updated image (default: in place)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the boot configuration file
    ReadBootconf {
        /// Path to the EEPROM image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Copy an image to a file, or to stdout
    Write {
        /// Path to the EEPROM image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Destination file, or `-` for stdout
        #[arg(value_name = "OUTPUT")]
        output: String,
    },
    /// Compress a file with the bootloader's LZ scheme
    Compress {
        /// File to compress
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Destination file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Expand a file compressed with the bootloader's LZ scheme
    Decompress {
        /// File to decompress
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Destination file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = SimpleLogger::new().with_level(level).init();
    let result = match &cli.command {
        Commands::List { image } => image::list(image),
        Commands::ExtractAll { image, dir } => image::extract_all(image, dir),
        Commands::UpdateFile {
            image,
            target,
            src,
            output,
        } => image::update_file(image, target, src, output.as_deref()),
        Commands::UpdateKey {
            image,
            target,
            pem,
            output,
        } => image::update_key(image, target, pem, output.as_deref()),
        Commands::ReadBootconf { image } => image::read_bootconf(image),
        Commands::Write { image, output } => image::write(image, output),
        Commands::Compress { input, output } => codec::compress(input, output.as_deref()),
        Commands::Decompress { input, output } => codec::decompress(input, output.as_deref()),
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
}
