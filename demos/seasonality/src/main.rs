use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vibequant::{AsyncVibeQuant, InstrumentClass, VibeQuant};

#[derive(Parser, Debug)]
#[command(about = "Seasonal statistics for a stock or crypto ticker")]
struct Args {
    /// Ticker symbol, e.g. AAPL or BTC-USD
    ticker: Option<String>,

    /// View tags to print: W, D, M, WM, DWM
    #[arg(short, long, value_delimiter = ',', default_value = "W,M")]
    views: Vec<String>,

    /// Instrument class: stock or crypto
    #[arg(short, long, default_value = "stock")]
    class: InstrumentClass,

    #[arg(long)]
    start: Option<NaiveDate>,

    #[arg(long)]
    end: Option<NaiveDate>,

    /// |t| above which a weekday is reported
    #[arg(long, default_value_t = 2.0)]
    threshold: f64,

    /// Print the ticker list for the class and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> vibequant::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let vq = AsyncVibeQuant::new(VibeQuant::builder()).await?;

    if args.list {
        for ticker in vq.list_tickers(args.class).await? {
            println!("{ticker}");
        }
        return Ok(());
    }

    let ticker = match args.ticker {
        Some(t) => t,
        None => match args.class {
            InstrumentClass::Stock => "AAPL".to_string(),
            InstrumentClass::Crypto => "BTC-USD".to_string(),
        },
    };

    let first = args.views.first().cloned();
    let mut vf = vq
        .build_view(&ticker, first.as_deref(), args.start, args.end, Some(args.class))
        .await?;

    for tag in &args.views {
        if vf.change_view(tag)? {
            println!("{vf}");
            vf.print()?;
            println!();
        } else {
            eprintln!("skipping unknown view '{tag}'");
        }
    }

    let ranked = vf.significant_groups("Weekday", args.threshold)?;
    if ranked.is_empty() {
        println!("No weekday with |t| > {}", args.threshold);
    }
    for group in ranked {
        println!(
            "{:<10} mean={:>7.3}% std={:>7.3} n={:>5} t={:>7.3}",
            group.key.to_string(),
            group.mean,
            group.std,
            group.count,
            group.t_stat
        );
    }
    Ok(())
}
