
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

pub mod assembler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::path::{Path, PathBuf};

use assembler::MemorySink;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tOutfile: {}\n\tInfile: {}",
        args.occurrences_of("verbose"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap()
    );

    let ifile = args.value_of("INPUT").unwrap();
    let ipath = Path::new(ifile);

    // Read the whole source text up front; the assembler works on a block.
    let source = match std::fs::read_to_string(ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(text) => text,
    };

    let image = match assembler::assemble(&source) {
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
        Ok(image) => image,
    };

    if args.is_present("print-debug") {
        let mut grid = Grid::new(GridOptions {
            filling:     Filling::Spaces(1),
            direction:   Direction::LeftToRight,
        });

        for (addr, &word) in image.iter().enumerate() {
            if word == 0 {
                continue;
            }
            grid.add(Cell::from(format!("{:03}:", addr)));
            grid.add(Cell::from(format!("{:05}", word)));
        }

        println!("{}", grid.fit_into_columns(8));
    }

    let opath: PathBuf = if let Some(filename) = args.value_of("output") {
        PathBuf::from(filename)
    } else {
        ipath.with_extension("ram")
    };

    let ofile = match File::create(&opath) {
        Err(err) => {
            error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    let mut sink = FileSink { out: ofile };
    if let Err(err) = assembler::commit_image(&image, &mut sink) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }
}

/// Commits finished words as a plain-text memory dump, one `AAA VVVVV`
/// line per cell, in address order. A simulator session loads RAM from it.
struct FileSink {
    out: File,
}

impl MemorySink for FileSink {
    fn commit(&mut self, value: u32, address: usize) -> std::io::Result<()> {
        use std::io::Write;
        writeln!(self.out, "{:03} {:05}", address, value)
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write the memory dump to an outfile"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the nonzero memory cells to STDOUT"))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stdout())
        .apply().ok();
}
