use {
    anyhow::Context,
    flapcp::{config::RunConfig, pipeline},
    std::{fs::File, io::BufWriter, time::Instant},
    tracing::Level,
    tracing_subscriber::fmt::SubscriberBuilder,
};

fn main() -> anyhow::Result<()> {
    let config = RunConfig::from_env().context(
        "usage: flapcp <placeCount> <algorithm> [outputDir] [--threads N] [--verbose]",
    )?;

    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();

    if let Some(num_threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .context("building thread pool")?;
    }

    let writer = match config.output_path() {
        Some(path) => {
            if let Some(dir) = &config.output_dir {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
            let file =
                File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            println!("enables file output.");
            Some(BufWriter::new(file))
        }
        None => None,
    };

    println!("#place = {}", config.place_count);

    let now = Instant::now();
    let report = pipeline::run(config.place_count, config.algorithm, writer)?;
    let time = now.elapsed();

    println!("{report}");
    println!("time: {}[sec]", time.as_secs_f64());

    Ok(())
}
