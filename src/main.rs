// kaleidoc: Kaleidoscope compiler and evaluator

use std::fs::File;
use std::io::{self, BufReader, Read};

use clap::Parser;

use kaleidoc::ir::interp::MAX_CALL_DEPTH;
use kaleidoc::parser::ast::Item;
use kaleidoc::{Outcome, Session, SessionConfig};

/// Compile Kaleidoscope source and evaluate its top-level expressions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source file; standard input when omitted
    filename: Option<String>,

    /// Generate top-level expressions without running them
    #[arg(long)]
    no_eval: bool,

    /// Deepest call nesting allowed while evaluating
    #[arg(long, default_value_t = MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Print each parsed form, fully parenthesized
    #[arg(long)]
    emit_ast: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut reader: Box<dyn Read> = match args.filename {
        Some(ref filename) => Box::new(BufReader::new(File::open(filename)?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut source = String::new();
    reader.read_to_string(&mut source)?;

    let mut session = Session::new(SessionConfig {
        evaluate: !args.no_eval,
        call_depth_limit: args.max_call_depth,
        ..SessionConfig::default()
    });

    session.run_with(&source, |item, outcome| {
        if args.emit_ast {
            if let Some(item) = item {
                eprintln!("{}", item);
            }
        }
        report(item, outcome);
    });

    for warning in session.warnings() {
        eprintln!("Warning: {}", warning);
    }

    // Print out all of the generated code
    eprint!("{}", session.print_module());

    Ok(())
}

fn report(item: Option<&Item>, outcome: &Outcome) {
    match outcome {
        Outcome::Defined { .. } => eprintln!("Parsed a function definition."),
        Outcome::Declared { .. } => eprintln!("Parsed an extern."),
        Outcome::Evaluated(value) => eprintln!("Evaluated to {}", value),
        Outcome::Generated => eprintln!("Parsed a top-level expr."),
        Outcome::Failed(err) => match item {
            Some(item) => eprintln!("Error in `{}`: {}", item, err),
            None => eprintln!("Error: {}", err),
        },
    }
}
