//! Simulated training run showing nested progress bars.
//!
//! Every epoch has a bar with one bar per batch set nested under it, and
//! a validation bar with an unknown total. Press `q` or Ctrl+C to quit.
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use arbor::{Producer, Session, Tracked};

#[derive(Debug, Parser)]
#[clap(about = "Show a simulated nested workload as live progress bars")]
struct Cli {
    #[clap(flatten)]
    flags: arbor::cli::Flags,
    /// Number of epochs
    #[clap(long, default_value_t = 3)]
    epochs: usize,
    /// Number of batches per epoch
    #[clap(long, default_value_t = 40)]
    batches: usize,
    /// Delay of each batch, in milliseconds
    #[clap(long, default_value_t = 50)]
    delay_ms: u64,
    /// Exit when the workload is done, instead of waiting for quit
    #[clap(long)]
    exit: bool,
}

fn main() -> ExitCode {
    arbor::cli::run(|| {
        let cli = Cli::parse();
        let config = cli.flags.apply()?;
        let session = Session::start(config)?;
        let signal = session.quit_signal();
        let producer = session.producer();
        let delay = Duration::from_millis(cli.delay_ms);

        let worker = std::thread::spawn(move || {
            simulate(&producer, cli.epochs, cli.batches, delay, || signal.is_signaled())
        });
        let completed = worker
            .join()
            .map_err(|_| arbor::Error::msg("workload thread panicked"))?;
        if completed {
            log::info!("workload done");
            if cli.exit {
                session.quit();
            }
        }
        session.wait()
    })
}

/// Run the workload. Returns false if it was cut short by quit.
fn simulate(
    producer: &Producer,
    epochs: usize,
    batches: usize,
    delay: Duration,
    quit: impl Fn() -> bool,
) -> bool {
    let all = Tracked::new(0..epochs, producer, "epochs");
    let all_id = all.id();
    for epoch in all {
        let train = Tracked::new(0..batches, producer, format!("epoch {}", epoch + 1))
            .child_of(all_id);
        let train_id = train.id();
        for batch in train {
            if quit() {
                return false;
            }
            // a sub-step bar every 10 batches
            if batch % 10 == 0 {
                let steps = Tracked::new(0..5, producer, "shuffle").child_of(train_id);
                for _ in steps {
                    std::thread::sleep(delay / 5);
                }
            }
            std::thread::sleep(delay);
        }

        let mut validate = Tracked::new(std::iter::empty::<()>(), producer, "validate")
            .child_of(all_id);
        for _ in 0..batches / 4 {
            if quit() {
                return false;
            }
            validate.update(1);
            std::thread::sleep(delay);
        }
    }
    true
}
