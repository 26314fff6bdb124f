//! Inflation curve simulation CLI.
//!
//! Tabulate the curve and run multi-epoch supply scenarios.

#[cfg(feature = "cli")]
mod cli {
    use clap::{Parser, Subcommand};
    use rand::prelude::*;
    use rand_distr::Normal;
    use um_inflation_curve::{
        inflation_rate, saturated_rate, smooth, waterfall_split, CurveParams,
    };

    #[derive(Parser)]
    #[command(name = "curve-sim")]
    #[command(about = "Simulate utilization-driven inflation")]
    pub struct Cli {
        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand)]
    pub enum Command {
        /// Print the inflation curve and pool split
        Curve {
            /// Number of sample points
            #[arg(short = 'n', long, default_value = "20")]
            samples: usize,

            /// Locked share of supply (0.0 to 1.0)
            #[arg(short, long, default_value = "0.0")]
            locked: f32,

            /// Value-transfer constant
            #[arg(long, default_value = "0.0185")]
            value_transfer: f32,
        },

        /// Run a supply scenario with noisy daily utilization
        Supply {
            /// Mean combined utilization (0.0 to 1.0)
            #[arg(short, long, default_value = "0.3")]
            utilization: f32,

            /// Standard deviation of daily utilization
            #[arg(short, long, default_value = "0.05")]
            stddev: f32,

            /// Locked share of supply (0.0 to 1.0)
            #[arg(short, long, default_value = "0.2")]
            locked: f32,

            /// Initial circulating supply in minor units
            #[arg(long, default_value = "10000000000000")]
            supply: u64,

            /// Smoothing window in epochs
            #[arg(short, long, default_value = "5")]
            drag_limit: u32,

            /// Number of epochs to simulate
            #[arg(short = 'n', long, default_value = "365")]
            epochs: u32,

            /// RNG seed
            #[arg(long, default_value = "7")]
            seed: u64,
        },
    }

    pub fn run(cli: Cli) {
        match cli.command {
            Command::Curve {
                samples,
                locked,
                value_transfer,
            } => run_curve_table(samples, locked, value_transfer),
            Command::Supply {
                utilization,
                stddev,
                locked,
                supply,
                drag_limit,
                epochs,
                seed,
            } => run_supply_scenario(utilization, stddev, locked, supply, drag_limit, epochs, seed),
        }
    }

    fn run_curve_table(samples: usize, locked: f32, value_transfer: f32) {
        let params = CurveParams {
            value_transfer,
            ..CurveParams::default()
        };

        println!("Inflation Curve");
        println!("===============");
        println!(
            "VT: {}  MP: {}  locked: {:.1}%  saturation: {:.3}%",
            params.value_transfer,
            params.operator_share,
            locked * 100.0,
            saturated_rate(&params) * 100.0
        );
        println!();

        println!(
            "{:>11} {:>10} {:>10} {:>10} {:>10}",
            "Utilization", "Inflation", "Operator", "Reserve", "Rebate"
        );
        println!("{:-<11} {:-<10} {:-<10} {:-<10} {:-<10}", "", "", "", "", "");

        let samples = samples.max(1);
        for i in 0..=samples {
            let u = i as f32 / samples as f32;
            let inflation = inflation_rate(u, &params);
            let split = waterfall_split(inflation, u, locked, &params);
            println!(
                "{:>10.1}% {:>9.3}% {:>9.3}% {:>9.3}% {:>9.3}%",
                u * 100.0,
                split.inflation * 100.0,
                split.operator * 100.0,
                split.reserve * 100.0,
                split.rebate * 100.0
            );
        }
    }

    fn run_supply_scenario(
        utilization: f32,
        stddev: f32,
        locked: f32,
        initial_supply: u64,
        drag_limit: u32,
        epochs: u32,
        seed: u64,
    ) {
        let params = CurveParams::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = match Normal::new(utilization, stddev.max(0.0)) {
            Ok(noise) => noise,
            Err(e) => {
                eprintln!("Invalid distribution: {e}");
                return;
            }
        };

        println!("Supply Scenario");
        println!("===============");
        println!(
            "mean u: {:.1}%  stddev: {:.1}%  locked: {:.1}%  drag limit: {}",
            utilization * 100.0,
            stddev * 100.0,
            locked * 100.0,
            drag_limit
        );
        println!();

        println!(
            "{:>6} {:>8} {:>8} {:>10} {:>16} {:>14}",
            "Epoch", "Daily u", "EMA u", "Inflation", "Supply", "Minted"
        );
        println!("{:-<6} {:-<8} {:-<8} {:-<10} {:-<16} {:-<14}", "", "", "", "", "", "");

        let drag_limit = drag_limit.max(1);
        let mut supply = initial_supply;
        let mut history: Vec<f32> = Vec::with_capacity(epochs as usize);
        let mut ema = 0.0f32;
        let mut total_minted = 0u64;
        let report_every = (epochs / 12).max(1);

        for epoch in 0..epochs {
            let daily: f32 = noise.sample(&mut rng).clamp(0.0, 1.0);
            let window = drag_limit.saturating_sub(1) as usize;
            let window_sum: f32 = history.iter().rev().take(window).sum();
            let epoch_count = epoch + 1;
            let smoothed = smooth(
                window_sum,
                ema,
                daily,
                epoch_count,
                epoch_count as u64,
                drag_limit,
            );
            history.push(daily);
            ema = smoothed.ema;

            let inflation = inflation_rate(ema, &params);
            let amounts = waterfall_split(inflation, ema, locked, &params)
                .daily()
                .amounts(supply);
            supply = supply.saturating_add(amounts.total());
            total_minted = total_minted.saturating_add(amounts.total());

            if epoch % report_every == 0 || epoch + 1 == epochs {
                println!(
                    "{:>6} {:>7.2}% {:>7.2}% {:>9.3}% {:>16} {:>14}",
                    epoch,
                    daily * 100.0,
                    ema * 100.0,
                    inflation * 100.0,
                    supply,
                    amounts.total()
                );
            }
        }

        println!();
        println!(
            "Realized growth: {:.3}% over {} epochs ({} minted)",
            total_minted as f64 / initial_supply.max(1) as f64 * 100.0,
            epochs,
            total_minted
        );
    }
}

#[cfg(feature = "cli")]
fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();
    cli::run(cli);
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary requires the 'cli' feature. Build with:");
    eprintln!("  cargo build -p um-inflation-curve --features cli --bin curve-sim");
}
