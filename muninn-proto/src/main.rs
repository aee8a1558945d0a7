#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use clap::Parser;
use muninn_proto_lib::{
    dump, load_from_path, registry_from_model, DtClass, MemType, OpAttr, OpId, ProtoSelect,
    SelectParam, Worker,
};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Muninn protocol threshold explorer")]
struct Cli {
    /// Path to the protocol model TOML file
    #[arg(short, long, value_name = "FILE")]
    model: PathBuf,

    /// Operation to select for (default: sweep all operations)
    #[arg(long)]
    op: Option<OpId>,

    /// Datatype class
    #[arg(long, default_value = "contig")]
    dt: DtClass,

    /// Memory type
    #[arg(long, default_value = "host")]
    mem: MemType,

    /// Scatter-gather entry count
    #[arg(long, default_value_t = 1)]
    sg: usize,

    /// Request fast completion
    #[arg(long)]
    fast_cmpl: bool,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!(%err, "selection failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> muninn_proto_lib::Result<()> {
    let model = load_from_path(&cli.model)?;
    let worker = Worker::new(registry_from_model(&model)?);

    let mut attr = OpAttr::empty();
    if cli.fast_cmpl {
        attr |= OpAttr::FAST_CMPL;
    }

    let ops: Vec<OpId> = match cli.op {
        Some(op) => vec![op],
        None => OpId::ALL.to_vec(),
    };

    let mut select = ProtoSelect::new();
    for op in ops {
        let param = SelectParam::new(op, attr, cli.dt, cli.mem, cli.sg);
        if let Err(err) = select.lookup_slow(&worker, 0, 0, &param) {
            warn!(%param, %err, "selection unavailable");
        }
    }

    dump(&worker, 0, 0, &select, &mut io::stdout().lock())?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
