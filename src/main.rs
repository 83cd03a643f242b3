use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use msgpipe::definition::{
    AggregateDefinition, ExtractDefinition, FieldExtractorDefinition, FilterDefinition,
    PredicateDefinition,
};
use msgpipe::{AggregatorKind, InputFormat, PipelineDefinition, ProcessingStats};

#[derive(Parser)]
#[command(name = "msgpipe")]
#[command(about = "Filter, extract and aggregate exported message logs")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Input format (default: csv)
    #[arg(long, value_enum, global = true)]
    input_format: Option<InputFormat>,

    /// Input file (default: stdin)
    #[arg(short = 'i', long = "input", global = true)]
    input_file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output", global = true)]
    output_file: Option<PathBuf>,

    /// Fail on first malformed record instead of skipping it
    #[arg(long, global = true)]
    fail_fast: bool,

    /// Debug mode - log processing details to stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Keep records matching any of the configured filter chains
    Filter(FilterArgs),
    /// Write selected fields, optionally reformatting the timestamp
    Extract(ExtractArgs),
    /// Summarize records grouped by timestamp
    Aggregate(AggregateArgs),
    /// Run a pipeline described in a YAML file
    Run {
        /// Pipeline definition file
        #[arg(short = 'c', long = "config")]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Inbound,
    Outbound,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum AddrTypeArg {
    #[value(name = "to_addr")]
    ToAddr,
    #[value(name = "from_addr")]
    FromAddr,
}

impl AddrTypeArg {
    fn as_str(&self) -> &'static str {
        match self {
            AddrTypeArg::ToAddr => "to_addr",
            AddrTypeArg::FromAddr => "from_addr",
        }
    }
}

#[derive(ClapArgs)]
struct FilterArgs {
    /// MSISDN to extract messages for
    #[arg(short = 'm', long)]
    msisdn: Option<String>,

    /// Which address field the MSISDN must match (ignored with --direction)
    #[arg(short = 't', long, value_enum, requires = "msisdn")]
    addr_type: Option<AddrTypeArg>,

    /// Message direction to extract
    #[arg(short = 'd', long, value_enum)]
    direction: Option<DirectionArg>,

    /// Date time to start from (e.g. 2013-09-01 01:00:00)
    #[arg(short = 's', long)]
    start: Option<String>,

    /// Date time to extract to, exclusive (e.g. 2013-09-10 03:00:00)
    #[arg(short = 'e', long, requires = "start")]
    end: Option<String>,

    /// Year for --week
    #[arg(long, requires = "week")]
    year: Option<i32>,

    /// Week numbers (%W numbering, comma separated)
    #[arg(long, value_delimiter = ',', requires = "year")]
    week: Vec<u32>,

    /// Session event to match (None matches records without one)
    #[arg(long)]
    session_event: Option<String>,

    /// Only messages that are replies
    #[arg(long, conflicts_with = "no_replies")]
    replies: bool,

    /// Only messages that are not replies
    #[arg(long)]
    no_replies: bool,

    /// File of sender addresses, one per line
    #[arg(long)]
    contacts: Option<PathBuf>,

    /// Field regex, as FIELD=PATTERN (matched from the start of the value)
    #[arg(long, value_name = "FIELD=PATTERN")]
    regex: Option<String>,

    /// Case-insensitive --regex
    #[arg(long, requires = "regex")]
    ignore_case: bool,
}

impl FilterArgs {
    /// Chains in the order they claim records. MSISDN and direction decide
    /// the chain list; every other condition is AND-ed onto each chain.
    fn chains(&self) -> Result<Vec<Vec<PredicateDefinition>>> {
        let direction = |d: &str| PredicateDefinition::Direction(d.to_string());
        let mut chains = Vec::new();

        if let Some(msisdn) = &self.msisdn {
            let address = |field: &str| PredicateDefinition::Address {
                field: field.to_string(),
                value: msisdn.clone(),
            };
            match (self.direction, self.addr_type) {
                (Some(DirectionArg::All), _) => {
                    chains.push(vec![direction("inbound"), address("from_addr")]);
                    chains.push(vec![direction("outbound"), address("to_addr")]);
                }
                (Some(DirectionArg::Inbound), _) => {
                    chains.push(vec![direction("inbound"), address("from_addr")]);
                }
                (Some(DirectionArg::Outbound), _) => {
                    chains.push(vec![direction("outbound"), address("to_addr")]);
                }
                (None, Some(addr_type)) => chains.push(vec![address(addr_type.as_str())]),
                (None, None) => {
                    chains.push(vec![address("to_addr")]);
                    chains.push(vec![address("from_addr")]);
                }
            }
        } else {
            match self.direction {
                Some(DirectionArg::All) => {
                    chains.push(vec![direction("inbound")]);
                    chains.push(vec![direction("outbound")]);
                }
                Some(DirectionArg::Inbound) => chains.push(vec![direction("inbound")]),
                Some(DirectionArg::Outbound) => chains.push(vec![direction("outbound")]),
                None => {}
            }
        }

        let shared = self.shared_predicates()?;
        if chains.is_empty() {
            if !shared.is_empty() {
                chains.push(shared);
            }
        } else {
            for chain in &mut chains {
                chain.extend(shared.iter().cloned());
            }
        }

        if chains.is_empty() {
            bail!("no filter conditions given");
        }
        Ok(chains)
    }

    fn shared_predicates(&self) -> Result<Vec<PredicateDefinition>> {
        let mut shared = Vec::new();
        if let Some(start) = &self.start {
            shared.push(PredicateDefinition::TimeRange {
                start: start.clone(),
                end: self.end.clone(),
            });
        }
        if let Some(year) = self.year {
            shared.push(PredicateDefinition::Week {
                year,
                weeks: self.week.clone(),
            });
        }
        if let Some(event) = &self.session_event {
            shared.push(PredicateDefinition::SessionEvent(Some(event.clone())));
        }
        if self.replies {
            shared.push(PredicateDefinition::IsReply);
        }
        if self.no_replies {
            shared.push(PredicateDefinition::IsNotReply);
        }
        if let Some(path) = &self.contacts {
            shared.push(PredicateDefinition::ContactsFile(path.clone()));
        }
        if let Some(expr) = &self.regex {
            let Some((field, pattern)) = expr.split_once('=') else {
                bail!("--regex expects FIELD=PATTERN, got '{}'", expr);
            };
            shared.push(PredicateDefinition::Regex {
                field: field.to_string(),
                pattern: pattern.to_string(),
                ignore_case: self.ignore_case,
            });
        }
        Ok(shared)
    }
}

#[derive(ClapArgs)]
struct ExtractArgs {
    /// Fields to keep besides the timestamp (comma separated)
    #[arg(short = 'f', long, value_delimiter = ',', required = true)]
    fields: Vec<String>,

    /// strftime pattern for the timestamp (e.g. %Y-%m-%d)
    #[arg(long)]
    date_format: Option<String>,
}

#[derive(ClapArgs)]
struct AggregateArgs {
    /// Kind of summary
    #[arg(short = 'k', long, value_enum, default_value = "uniques")]
    kind: AggregatorKind,

    /// Fields to summarize (comma separated)
    #[arg(short = 'f', long, value_delimiter = ',', required = true)]
    fields: Vec<String>,
}

impl Args {
    fn definition(&self) -> Result<PipelineDefinition> {
        let mut definition = match &self.command {
            Command::Filter(filter) => PipelineDefinition {
                filter: Some(FilterDefinition {
                    chains: filter.chains()?,
                }),
                ..Default::default()
            },
            Command::Extract(extract) => PipelineDefinition {
                extract: Some(ExtractDefinition {
                    chains: vec![vec![FieldExtractorDefinition {
                        fields: extract.fields.clone(),
                        date_format: extract.date_format.clone(),
                    }]],
                }),
                ..Default::default()
            },
            Command::Aggregate(aggregate) => PipelineDefinition {
                aggregate: Some(AggregateDefinition {
                    kind: aggregate.kind,
                    fields: aggregate.fields.clone(),
                }),
                ..Default::default()
            },
            Command::Run { config } => PipelineDefinition::from_file(config)
                .with_context(|| format!("Failed to load pipeline file '{}'", config.display()))?,
        };

        if let Some(input_format) = self.input_format {
            definition.input_format = input_format;
        }
        definition.fail_fast |= self.fail_fast;
        Ok(definition)
    }
}

fn main() {
    let args = Args::parse();
    msgpipe::logging::init_logging(args.debug);

    match run(args) {
        Ok(stats) if stats.has_errors() => {
            eprintln!(
                "msgpipe: {} record(s) skipped, run with --debug for details",
                stats.errors
            );
            std::process::exit(1);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<ProcessingStats> {
    // Build (and validate) everything before touching the streams
    let pipeline = args
        .definition()?
        .build()
        .context("Invalid pipeline configuration")?;

    let input: Box<dyn Read> = if let Some(input_path) = &args.input_file {
        let file = File::open(input_path)
            .with_context(|| format!("Failed to open input file '{}'", input_path.display()))?;
        Box::new(BufReader::new(file))
    } else {
        Box::new(BufReader::new(io::stdin()))
    };

    let mut output: Box<dyn Write> = if let Some(output_path) = &args.output_file {
        let file = File::create(output_path).with_context(|| {
            format!("Failed to create output file '{}'", output_path.display())
        })?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    let stats = pipeline
        .run(input, &mut output)
        .context("Processing failed")?;
    output.flush()?;

    stats.report();
    Ok(stats)
}
