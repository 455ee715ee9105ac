//! Hunkdisk CLI - inspect, read, pack and unpack hunk-compressed disc images.
//!
//! This is the main entry point for the hunkdisk command-line application.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use hunkdisk::prelude::*;

/// Hunkdisk - hunk-compressed disc image tool
#[derive(Parser)]
#[command(name = "hunkdisk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Sector addressing shared by every command that reads an image.
#[derive(Args, Clone, Copy)]
struct Addressing {
    /// Bytes per sector
    #[arg(long, env = "HUNKDISK_BLOCK_SIZE", default_value_t = BlockConfig::DEFAULT_BLOCK_SIZE)]
    block_size: u32,

    /// Bytes skipped before sector 0
    #[arg(long, env = "HUNKDISK_DATA_OFFSET", default_value_t = 0)]
    data_offset: u32,
}

impl From<Addressing> for BlockConfig {
    fn from(a: Addressing) -> Self {
        BlockConfig {
            block_size: a.block_size,
            data_offset: a.data_offset,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show format, geometry and sector count of an image
    Info {
        /// Path to the image
        image: PathBuf,

        #[command(flatten)]
        addressing: Addressing,
    },

    /// Report which format, if any, accepts each file
    Probe {
        /// Files to probe
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Read sectors from an image
    Read {
        /// Path to the image
        image: PathBuf,

        /// First sector to read
        #[arg(short, long)]
        sector: u32,

        /// Number of sectors
        #[arg(short, long, default_value_t = 1)]
        count: u32,

        /// Write the sectors to this file instead of hex-dumping them
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        addressing: Addressing,
    },

    /// Pack a raw image into an HNK container
    Pack {
        /// Raw input image
        input: PathBuf,

        /// Output HNK file
        output: PathBuf,

        /// Decompressed bytes per hunk
        #[arg(long, default_value_t = WriterOptions::DEFAULT_HUNK_SIZE)]
        hunk_size: u32,

        /// Hunk codec
        #[arg(long, value_enum, default_value_t = CodecArg::Zstd)]
        codec: CodecArg,

        /// Compression level
        #[arg(long, default_value_t = 3)]
        level: i32,
    },

    /// Stream every sector of an image into a raw file
    Unpack {
        /// Path to the image
        image: PathBuf,

        /// Output raw file
        output: PathBuf,

        /// Sectors per read
        #[arg(long, default_value_t = 64)]
        batch: u32,

        #[command(flatten)]
        addressing: Addressing,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    Store,
    Deflate,
    Zstd,
}

impl From<CodecArg> for Codec {
    fn from(c: CodecArg) -> Self {
        match c {
            CodecArg::Store => Codec::Store,
            CodecArg::Deflate => Codec::Deflate,
            CodecArg::Zstd => Codec::Zstd,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { image, addressing } => {
            cmd_info(&image, addressing.into())?;
        }
        Commands::Probe { paths } => {
            cmd_probe(&paths);
        }
        Commands::Read {
            image,
            sector,
            count,
            output,
            addressing,
        } => {
            cmd_read(&image, sector, count, output.as_deref(), addressing.into())?;
        }
        Commands::Pack {
            input,
            output,
            hunk_size,
            codec,
            level,
        } => {
            let options = WriterOptions {
                hunk_size,
                codec: codec.into(),
                level,
            };
            cmd_pack(&input, &output, options)?;
        }
        Commands::Unpack {
            image,
            output,
            batch,
            addressing,
        } => {
            cmd_unpack(&image, &output, batch, addressing.into())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_image(path: &Path, config: BlockConfig) -> Result<AnyReader> {
    AnyReader::open_with(path, config)
        .with_context(|| format!("Failed to open image {}", path.display()))
}

fn cmd_info(image: &Path, config: BlockConfig) -> Result<()> {
    let reader = open_image(image, config)?;

    println!("Image:        {}", image.display());
    println!("Format:       {}", reader.format());
    if let Some(size) = reader.logical_size() {
        println!("Logical size: {size} bytes");
    }
    if let Some(geometry) = reader.geometry() {
        println!("Hunk size:    {} bytes", geometry.hunk_size());
        println!("Hunk count:   {}", geometry.hunk_count());
    }
    println!("Block size:   {} bytes", config.block_size);
    println!("Data offset:  {} bytes", config.data_offset);
    println!("Blocks:       {}", reader.block_count());

    Ok(())
}

fn cmd_probe(paths: &[PathBuf]) {
    for path in paths {
        match ImageFormat::detect(path) {
            Some(format) => println!("{:<6} {}", format.name(), path.display()),
            None => println!("{:<6} {}", "-", path.display()),
        }
    }
}

fn cmd_read(
    image: &Path,
    sector: u32,
    count: u32,
    output: Option<&Path>,
    config: BlockConfig,
) -> Result<()> {
    let mut reader = open_image(image, config)?;

    let len = usize::try_from(u64::from(count) * u64::from(config.block_size))
        .context("Read size too large")?;
    let mut buf = vec![0u8; len];
    let read = reader.read_sync(&mut buf, sector, count);
    if read < len {
        eprintln!("Short read: {read} of {len} bytes");
    }

    match output {
        Some(path) => {
            fs::write(path, &buf[..read]).context("Failed to write output file")?;
            println!("Wrote {read} bytes to {}", path.display());
        }
        None => hex_dump(&buf[..read], u64::from(sector) * u64::from(config.block_size)),
    }

    Ok(())
}

fn cmd_pack(input: &Path, output: &Path, options: WriterOptions) -> Result<()> {
    println!("Packing: {} -> {}", input.display(), output.display());

    let data = fs::read(input).context("Failed to read input image")?;
    let writer = HnkWriter::new(options).context("Invalid writer options")?;
    tracing::debug!(
        hunk_size = options.hunk_size,
        codec = %options.codec,
        level = options.level,
        "writer configured"
    );

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("compressing {} bytes", data.len()));

    let start = Instant::now();
    let summary = writer
        .write(&data, output)
        .context("Failed to write HNK container")?;
    pb.finish_and_clear();

    let ratio = if summary.logical_size == 0 {
        1.0
    } else {
        summary.file_size as f64 / summary.logical_size as f64
    };
    println!(
        "Wrote {} hunks ({} stored) in {:?}: {} -> {} bytes ({:.1}%)",
        summary.hunk_count,
        summary.stored_hunks,
        start.elapsed(),
        summary.logical_size,
        summary.file_size,
        ratio * 100.0
    );

    Ok(())
}

fn cmd_unpack(image: &Path, output: &Path, batch: u32, config: BlockConfig) -> Result<()> {
    let mut reader = open_image(image, config)?;
    let blocks = reader.block_count();
    let batch = batch.max(1);

    println!("Unpacking {} sectors from {}", blocks, image.display());

    let pb = ProgressBar::new(u64::from(blocks));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let file = File::create(output).context("Failed to create output file")?;
    let mut out = BufWriter::new(file);
    let mut buf = vec![0u8; batch as usize * config.block_size as usize];

    let start = Instant::now();
    let mut sector = 0u32;
    while sector < blocks {
        let count = batch.min(blocks - sector);
        let want = count as usize * config.block_size as usize;

        let read = reader.read_sync(&mut buf[..want], sector, count);
        out.write_all(&buf[..read])?;
        if read < want {
            tracing::warn!(sector, read, want, "short read");
            pb.abandon();
            anyhow::bail!("Short read at sector {sector}: {read} of {want} bytes");
        }

        sector += count;
        pb.inc(u64::from(count));
    }
    out.flush()?;

    pb.finish_with_message("Done");
    println!("Unpacked in {:?}", start.elapsed());

    Ok(())
}

/// Classic 16-bytes-per-line hex dump.
fn hex_dump(data: &[u8], base: u64) {
    for (i, line) in data.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<47}  |{}|", base + (i * 16) as u64, hex.join(" "), ascii);
    }
}
