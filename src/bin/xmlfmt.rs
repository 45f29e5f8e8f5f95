//! xmlfmt: check and re-serialize XML documents.
//!
//! Parses each input (files, or stdin for `-` or no arguments), reports the
//! first well-formedness error with its position, and writes the document
//! back out, optionally indented.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use xmlgrove::parser::{DecodingSource, OnMismatch, ParseOptions};
use xmlgrove::serial::{serialize_with_options, SerializeOptions};
use xmlgrove::{Cursor, Document, XmlError};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xmlfmt -- check well-formedness and re-serialize XML files.
#[derive(Parser, Debug)]
#[command(name = "xmlfmt", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to process (use `-` for stdin; stdin when none are given).
    files: Vec<String>,

    // -- Parsing options ---------------------------------------------------
    /// Remove blank (whitespace-only) text nodes.
    #[arg(long)]
    noblanks: bool,

    /// Drop comments.
    #[arg(long)]
    nocomments: bool,

    /// Maximum element nesting depth.
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    // -- Output options ----------------------------------------------------
    /// Pretty-print (indent) the output.
    #[arg(long)]
    indent: bool,

    /// The string used for one level of indentation.
    #[arg(long, value_name = "STR", default_value = "  ")]
    indent_str: String,

    /// Do not write the XML declaration.
    #[arg(long)]
    nodecl: bool,

    /// Do not output the result tree.
    #[arg(long)]
    noout: bool,

    /// Ignore the inputs and write a new document with the given root element.
    #[arg(long, value_name = "ROOT")]
    create: Option<String>,

    /// Print timing information for parsing and serializing.
    #[arg(long)]
    timing: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(root) = &cli.create {
        let doc = Document::new(root.as_str());
        write_document(&cli, &doc);
        return ExitCode::from(EXIT_SUCCESS);
    }

    let stdin = [String::from("-")];
    let files = if cli.files.is_empty() {
        &stdin[..]
    } else {
        &cli.files[..]
    };

    let mut worst_exit = EXIT_SUCCESS;
    for file in files {
        worst_exit = worst_exit.max(process_file(&cli, file));
    }
    ExitCode::from(worst_exit)
}

/// Processes a single input and returns an exit code.
fn process_file(cli: &Cli, filename: &str) -> u8 {
    let start = Instant::now();
    let doc = match parse_input(cli, filename) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        eprintln!("Parsing {filename} took {:?}", start.elapsed());
    }

    if !cli.noout {
        let start = Instant::now();
        write_document(cli, &doc);
        if cli.timing {
            eprintln!("Serializing took {:?}", start.elapsed());
        }
    }
    EXIT_SUCCESS
}

fn parse_input(cli: &Cli, filename: &str) -> Result<Document, XmlError> {
    let reader: Box<dyn Read> = if filename == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(filename)?)
    };

    let mut options = ParseOptions::default()
        .no_blanks(cli.noblanks)
        .keep_comments(!cli.nocomments);
    if let Some(max) = cli.max_depth {
        options = options.max_depth(max);
    }

    let mut cursor = Cursor::new(DecodingSource::new(reader)?);
    // Raise mode reports a mismatch as an error, never as `None`.
    Document::parse_with_options(&mut cursor, &options, OnMismatch::Raise)?
        .ok_or_else(|| XmlError::Io(io::Error::other("no document")))
}

fn write_document(cli: &Cli, doc: &Document) {
    let options = SerializeOptions::default()
        .indent(cli.indent)
        .indent_str(&cli.indent_str)
        .declaration(!cli.nodecl);
    let output = serialize_with_options(doc, &options);
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(output.as_bytes()) {
        eprintln!("failed to write output: {e}");
    }
}
