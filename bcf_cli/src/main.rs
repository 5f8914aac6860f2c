mod config;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, info};

use bcf_codecs::{CodecKind, CODEC_NAMES};
use bcf_core::format::{FLAG_CHECKSUM, FRAME_HEADER_SIZE};
use bcf_core::frame::{open, seal};
use bcf_core::{
    decode, decode_framed, decode_parallel, encode, encode_parallel, peek_header, scan, Layout,
};

use config::{Config, ContainerConfig, Flags, Settings};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bcf",
    about = "Block Container Format: compress, decompress, and inspect block containers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a framed block container
    Compress {
        /// Source file to compress ("-" reads stdin)
        input: PathBuf,
        /// Destination container ("-" writes to stdout)
        output: PathBuf,
        /// Codec to use: stored | zstd | lz4 | deflate [default: zstd]
        #[arg(short, long)]
        codec: Option<String>,
        /// Compression level (zstd 1-22, deflate 0-9)
        #[arg(short, long)]
        level: Option<i32>,
        /// Raw bytes per block [default: 1048576]
        #[arg(short, long)]
        block_size: Option<u32>,
        /// Worker threads; more than one selects the parallel engine
        #[arg(short, long)]
        threads: Option<usize>,
        /// Write a raw container without the frame header
        #[arg(long)]
        raw: bool,
        /// Do not store a checksum in the frame header
        #[arg(long)]
        no_checksum: bool,
        /// TOML file with a [container] table of defaults
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Decompress a block container back to raw bytes
    Decompress {
        /// Source container ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
        /// Input is a raw container; requires --codec
        #[arg(long, requires = "codec")]
        raw: bool,
        /// Codec of a raw container
        #[arg(short, long)]
        codec: Option<String>,
        /// Worker threads; more than one selects the parallel engine
        #[arg(short, long, default_value_t = 1)]
        threads: usize,
    },
    /// Print header metadata and block record statistics
    Inspect {
        /// Container to inspect
        file: PathBuf,
        /// Print per-block details
        #[arg(long)]
        blocks: bool,
        /// Input is a raw container without a frame header
        #[arg(long)]
        raw: bool,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn is_stdio(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if is_stdio(path) {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("reading input file {:?}", path))
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if is_stdio(path) {
        let mut out = io::stdout().lock();
        out.write_all(bytes).context("writing stdout")?;
        out.flush().context("flushing stdout")
    } else {
        std::fs::write(path, bytes).with_context(|| format!("writing output file {:?}", path))
    }
}

fn thread_pool(threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("building worker thread pool")
}

fn throughput(bytes: u64, secs: f64) -> String {
    if secs > 0.0 {
        format!("{}/s", human_bytes((bytes as f64 / secs) as u64))
    } else {
        "n/a".to_string()
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    settings: Settings,
    raw: bool,
) -> anyhow::Result<()> {
    let data = read_input(&input)?;
    let kind = settings.codec;
    let mut codec = kind.build();
    let codec_display = codec.name();
    debug!("compress settings: {:?}", settings);

    let t0 = Instant::now();
    let container = if settings.threads > 1 {
        let pool = thread_pool(settings.threads)?;
        pool.install(|| encode_parallel(&data, || kind.build(), settings.block_size))
    } else {
        encode(&data, &mut codec, settings.block_size)
    }
    .with_context(|| format!("compressing {:?}", input))?;
    let elapsed = t0.elapsed();

    let block_count = scan(&container)?.block_count();
    let bytes = if raw {
        container
    } else {
        let flags = if settings.checksum { FLAG_CHECKSUM } else { 0 };
        seal(&container, kind.id(), settings.block_size, flags)
    };
    write_output(&output, &bytes)?;
    info!("wrote {} bytes to {:?}", bytes.len(), output);

    let raw_size = data.len() as u64;
    let compressed_size = bytes.len() as u64;
    let ratio = if compressed_size == 0 {
        1.0
    } else {
        raw_size as f64 / compressed_size as f64
    };

    eprintln!("  codec       : {}", codec_display);
    eprintln!("  block size  : {}", human_bytes(settings.block_size as u64));
    eprintln!("  blocks      : {}", block_count);
    eprintln!("  threads     : {}", settings.threads);
    eprintln!("  framed      : {}", !raw);
    eprintln!("  raw size    : {}", human_bytes(raw_size));
    eprintln!("  compressed  : {}", human_bytes(compressed_size));
    eprintln!("  ratio       : {:.2}x", ratio);
    eprintln!(
        "  throughput  : {}",
        throughput(raw_size, elapsed.as_secs_f64())
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decompress(
    input: PathBuf,
    output: PathBuf,
    raw: bool,
    codec_name: Option<String>,
    threads: usize,
) -> anyhow::Result<()> {
    let bytes = read_input(&input)?;

    // A frame names its own codec; a raw container needs one from the user.
    let kind = if raw {
        let name = codec_name
            .as_deref()
            .context("a raw container needs --codec")?;
        CodecKind::from_name(name, None).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown codec '{}'. Valid options: {}",
                name,
                CODEC_NAMES.join(", ")
            )
        })?
    } else {
        let header = peek_header(&bytes).with_context(|| format!("reading {:?}", input))?;
        CodecKind::from_id(header.codec_id)
            .ok_or_else(|| anyhow::anyhow!("unknown codec id {}", header.codec_id))?
    };

    let t0 = Instant::now();
    let data = if threads > 1 {
        let body = if raw { &bytes[..] } else { open(&bytes)?.1 };
        let pool = thread_pool(threads)?;
        pool.install(|| decode_parallel(body, || kind.build()))?
    } else if raw {
        decode(&bytes, &mut kind.build())?
    } else {
        decode_framed(&bytes, &mut kind.build())?
    };
    let elapsed = t0.elapsed();

    write_output(&output, &data)?;

    let raw_size = data.len() as u64;
    eprintln!("  codec       : {}", kind.build().name());
    eprintln!("  raw size    : {}", human_bytes(raw_size));
    eprintln!(
        "  throughput  : {}",
        throughput(raw_size, elapsed.as_secs_f64())
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, show_blocks: bool, raw: bool) -> anyhow::Result<()> {
    let bytes = read_input(&file)?;

    println!("=== BCF container: {:?} ===", file);
    println!();

    let (layout, body_offset): (Layout, usize) = if raw {
        (scan(&bytes)?, 0)
    } else {
        let (header, body) = open(&bytes).with_context(|| format!("opening {:?}", file))?;
        let codec = CodecKind::from_id(header.codec_id)
            .map(|kind| kind.build().name())
            .unwrap_or("unknown");
        println!("  frame version  : {}", header.version);
        println!("  codec          : {} (id={})", codec, header.codec_id);
        println!(
            "  block size     : {}",
            human_bytes(header.block_size as u64)
        );
        println!("  flags          : 0x{:08x}", header.flags);
        if header.has_flag(FLAG_CHECKSUM) {
            println!("  checksum       : {:016x}", header.checksum);
        }
        (scan(body)?, FRAME_HEADER_SIZE)
    };

    println!("  block count    : {}", layout.block_count());
    println!(
        "  raw size       : {}",
        human_bytes(layout.total_uncompressed_size as u64)
    );
    println!("  compressed     : {}", human_bytes(layout.compressed_size()));
    println!("  file on disk   : {}", human_bytes(bytes.len() as u64));
    println!("  ratio          : {:.2}x", layout.ratio());

    if show_blocks {
        println!();
        println!(
            "  {:>8}  {:>14}  {:>12}  {:>12}  {:>14}",
            "block", "file offset", "compressed", "raw", "raw offset"
        );
        println!("  {}", "-".repeat(66));
        for (i, r) in layout.records.iter().enumerate() {
            println!(
                "  {:>8}  {:>14}  {:>12}  {:>12}  {:>14}",
                i,
                body_offset + r.offset,
                human_bytes(r.compressed_size as u64),
                human_bytes(r.uncompressed_size as u64),
                r.output_offset
            );
        }
    }

    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            codec,
            level,
            block_size,
            threads,
            raw,
            no_checksum,
            config,
        } => {
            let file = match config {
                Some(path) => Config::load(&path)?.container,
                None => ContainerConfig::default(),
            };
            let flags = Flags {
                block_size,
                codec,
                level,
                threads,
                no_checksum,
            };
            run_compress(input, output, Settings::resolve(&file, &flags)?, raw)
        }
        Commands::Decompress {
            input,
            output,
            raw,
            codec,
            threads,
        } => run_decompress(input, output, raw, codec, threads),
        Commands::Inspect { file, blocks, raw } => run_inspect(file, blocks, raw),
    }
}
