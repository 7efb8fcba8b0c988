//! texframe CLI - Inspect, play through and verify `.gv` containers.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use texframe::{
    ContainerIndex, LoadMode, LoaderConfig, MemoryResidentReader, ReaderLoader, ReaderSlot,
    SharedVideoReader, StreamingReader, VideoReader, container::FileSource, open,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 3 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let path = PathBuf::from(&args[2]);
    let result = match args[1].as_str() {
        "info" => info(&path),
        "play" => {
            let mode = args
                .get(3)
                .map(|s| s.parse::<LoadMode>())
                .transpose()
                .unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                })
                .unwrap_or_default();
            let passes: u32 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(1);
            play(&path, mode, passes)
        }
        "verify" => verify(&path),
        "run" => run(&path),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> <path> [args]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file.gv>                   Print header and index summary");
    eprintln!("  play <file.gv> [mode] [passes]   Read every frame, report throughput");
    eprintln!("  verify <file.gv>                 Check all strategies agree on every frame");
    eprintln!("  run <config.json>                Load in the background and play once");
    eprintln!();
    eprintln!("Modes: streaming (default), memory_resident, precomputed");
    eprintln!("Example configuration is printed with --example.");
}

fn info(path: &Path) -> texframe::Result<()> {
    let mut source = FileSource::open(path)?;
    let index = ContainerIndex::parse(&mut source)?;
    let header = &index.header;

    println!("{}", path.display());
    println!("=====================");
    println!(
        "{}",
        serde_json::to_string_pretty(header).unwrap_or_else(|e| e.to_string())
    );
    println!();
    println!("File size:        {} bytes", index.file_len);
    println!("Index table at:   {}", index.index_start);
    println!("Compressed data:  {} bytes", index.compressed_bytes());
    println!("Decompressed:     {} bytes", header.decompressed_bytes());
    if index.compressed_bytes() > 0 {
        println!(
            "Ratio:            {:.2}x",
            header.decompressed_bytes() as f64 / index.compressed_bytes() as f64
        );
    }
    println!("Largest block:    {} bytes", index.max_compressed_size);
    if header.frames_per_second > 0.0 {
        println!(
            "Duration:         {:.2}s",
            header.frame_count as f32 / header.frames_per_second
        );
    }
    if !header.frame_bytes_consistent() {
        println!(
            "Warning: frame size {} does not match {} implied by dimensions",
            header.frame_bytes,
            header.expected_frame_bytes()
        );
    }
    Ok(())
}

fn play(path: &Path, mode: LoadMode, passes: u32) -> texframe::Result<()> {
    let load_start = Instant::now();
    let mut reader = open(path, mode)?;
    let load_time = load_start.elapsed();

    let frame_count = reader.frame_count();
    println!("Loaded {} as {} in {:.1} ms", path.display(), mode, ms(load_time));
    println!(
        "{}x{} {:?}, {} frames @ {} fps, {} bytes/frame",
        reader.width(),
        reader.height(),
        reader.format(),
        frame_count,
        reader.frames_per_second(),
        reader.frame_bytes()
    );

    if frame_count == 0 {
        println!("Nothing to play.");
        return Ok(());
    }

    let mut dst = vec![0u8; reader.frame_bytes() as usize];
    let mut worst = Duration::ZERO;
    let start = Instant::now();

    for pass in 0..passes {
        for frame in 0..frame_count {
            let t = Instant::now();
            reader.read(&mut dst, frame)?;
            worst = worst.max(t.elapsed());
        }

        let done = u64::from(pass + 1) * u64::from(frame_count);
        let elapsed = start.elapsed().as_secs_f64();
        println!(
            "  Pass {}/{}: {:.1} frames/s",
            pass + 1,
            passes,
            done as f64 / elapsed
        );
    }

    let total = u64::from(passes) * u64::from(frame_count);
    let elapsed = start.elapsed();
    println!();
    println!(
        "Mean latency: {:.3} ms, worst: {:.3} ms",
        ms(elapsed) / total.max(1) as f64,
        ms(worst)
    );
    Ok(())
}

fn verify(path: &Path) -> texframe::Result<()> {
    let memory = MemoryResidentReader::open(path)?;
    let frame_count = memory.frame_count();
    let frame_bytes = memory.frame_bytes() as usize;

    // Each worker streams from its own file handle and checks every byte
    // against the shared memory-resident reader
    let start = Instant::now();
    let mut failures: Vec<(u32, String)> = (0..frame_count)
        .into_par_iter()
        .map_init(
            || {
                (
                    StreamingReader::open(path),
                    vec![0u8; frame_bytes],
                    vec![0u8; frame_bytes],
                )
            },
            |state: &mut (texframe::Result<StreamingReader>, Vec<u8>, Vec<u8>), frame: u32| {
                let (streaming, expected, actual) = state;
                compare_frame(&memory, streaming, expected, actual, frame)
                    .err()
                    .map(|msg| (frame, msg))
            },
        )
        .flatten()
        .collect();
    failures.sort_by_key(|&(frame, _)| frame);

    println!(
        "Compared {} frames in {:.1} ms",
        frame_count,
        ms(start.elapsed())
    );
    for (frame, msg) in &failures {
        println!("  frame {}: {}", frame, msg);
    }

    if failures.is_empty() {
        println!("OK: {} frames consistent across strategies", frame_count);
        Ok(())
    } else {
        eprintln!("{} of {} frames failed", failures.len(), frame_count);
        process::exit(2);
    }
}

fn compare_frame(
    memory: &MemoryResidentReader,
    streaming: &mut texframe::Result<StreamingReader>,
    expected: &mut [u8],
    actual: &mut [u8],
    frame: u32,
) -> Result<(), String> {
    memory
        .read_shared(expected, frame)
        .map_err(|e| format!("memory-resident: {}", e))?;
    streaming
        .as_mut()
        .map_err(|e| format!("streaming open: {}", e))?
        .read(actual, frame)
        .map_err(|e| format!("streaming: {}", e))?;

    match first_difference(expected, actual) {
        None => Ok(()),
        Some(offset) => Err(format!(
            "streaming and memory-resident reads differ at byte {}",
            offset
        )),
    }
}

/// Offset of the first differing byte, or of the end of the shorter slice.
fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then_some(a.len().min(b.len())))
}

fn run(config_path: &Path) -> texframe::Result<()> {
    let config_str = fs::read_to_string(config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        process::exit(1);
    });

    let config: LoaderConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        process::exit(1);
    });

    println!("Loading {} ({})...", config.path.display(), config.mode);
    let mut slot = ReaderSlot::new();
    let mut loader = ReaderLoader::spawn(config)?;

    // Stand-in for a render loop ticking while the load runs
    let mut ticks = 0u64;
    let generation = loop {
        if let Some(result) = slot.poll(&mut loader) {
            break result?;
        }
        ticks += 1;
        std::thread::sleep(Duration::from_millis(1));
    };
    println!("Ready after {} idle ticks (generation {})", ticks, generation);

    let Some(staging) = slot.staging_mut() else {
        return Ok(());
    };
    let layout = staging.upload_layout();
    println!(
        "Upload layout: {:?} {}x{}, {} bytes/row x {} rows",
        layout.format, layout.width, layout.height, layout.bytes_per_row, layout.rows
    );

    let frame_count = staging.reader().frame_count();
    let mut uploads = 0;
    let start = Instant::now();
    for frame in 0..i64::from(frame_count) {
        staging.update(frame)?;
        if staging.take_upload().is_some() {
            uploads += 1;
        }
    }
    println!(
        "Staged {} frames in {:.1} ms",
        uploads,
        ms(start.elapsed())
    );
    Ok(())
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn print_example_config() {
    let config = LoaderConfig {
        path: PathBuf::from("clips/intro.gv"),
        mode: LoadMode::MemoryResident,
        strict_frame_bytes: false,
    };

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
}
