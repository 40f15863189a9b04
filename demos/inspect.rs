use std::path::PathBuf;

use ndarray::Axis;

use video_index::{BatchPolicy, Slice, VideoBuilder};

use clap::Parser;

/// Print the metadata of a video and the mean color of a selection of its frames.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    filename: PathBuf,

    /// First frame of the selection. Negative values count from the end.
    #[arg(long, allow_hyphen_values = true)]
    start: Option<i64>,

    /// End of the selection (exclusive). Negative values count from the end.
    #[arg(long, allow_hyphen_values = true)]
    stop: Option<i64>,

    /// Step between selected frames.
    #[arg(long, allow_hyphen_values = true)]
    step: Option<i64>,

    /// Report every corrupt frame instead of stopping at the first one.
    #[arg(long)]
    collect_errors: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    video_index::init()?;

    let args = Args::parse();
    let batch_policy = if args.collect_errors {
        BatchPolicy::CollectAll
    } else {
        BatchPolicy::AbortOnFirst
    };

    let mut video = VideoBuilder::new(args.filename.as_path())
        .with_batch_policy(batch_policy)
        .build()?;
    println!("{video}");
    println!("duration: {:.3}s", video.duration().as_secs_f64());

    if args.start.is_some() || args.stop.is_some() || args.step.is_some() {
        let frames = video.slice(Slice::new(args.start, args.stop, args.step))?;
        println!("selected {} frame(s)", frames.len_of(Axis(0)));
        for (position, frame) in frames.outer_iter().enumerate() {
            let mean = frame
                .map(|&sample| sample as f64)
                .mean_axis(Axis(0))
                .and_then(|rows| rows.mean_axis(Axis(0)));
            if let Some(mean) = mean {
                println!(
                    "  #{position}: r={:.1} g={:.1} b={:.1}",
                    mean[0], mean[1], mean[2]
                );
            }
        }
    }

    video.close()?;
    Ok(())
}
