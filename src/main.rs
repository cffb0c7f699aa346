use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use newton_package_reader::package::report;
use newton_package_reader::{DecodeOptions, PackageError, PackageHeader, PackageReader};

#[derive(Parser, Debug)]
#[command(name = "newtonpkg", version, about = "Dump the structure of a Newton package file")]
struct Args {
    /// Path to the package file
    package: PathBuf,

    /// Only print the directory and part table, skip object records
    #[arg(long)]
    headers_only: bool,

    /// Maximum number of object records listed per part
    #[arg(long, value_name = "N")]
    max_objects: Option<usize>,
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));
    let args = Args::parse();
    let file_name = args.package.display().to_string();

    let data = match fs::read(&args.package) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("ERROR: Can't open {}", file_name);
            eprintln!("  {}", e);
            process::exit(1);
        }
    };
    let len = data.len();

    let options = DecodeOptions {
        decode_objects: !args.headers_only,
        max_objects_per_part: args.max_objects,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = match PackageReader::from_bytes(data) {
        Ok(reader) => report::write_report(&mut out, &file_name, &reader, &options),
        Err(PackageError::UnsupportedRelocation { header }) => {
            // Recognized but not decoded; exits successfully.
            write_relocation_report(&mut out, &file_name, len, &header)
        }
        Err(e) => {
            eprintln!("ERROR: Can't decode {}", file_name);
            eprintln!("  {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = written.and_then(|_| out.flush()) {
        eprintln!("ERROR: Failed to write report: {}", e);
        process::exit(1);
    }
}

fn write_relocation_report<W: Write>(
    out: &mut W,
    file_name: &str,
    len: usize,
    header: &PackageHeader,
) -> io::Result<()> {
    report::write_preamble(out, file_name, len)?;
    report::write_signature_and_flags(out, header)?;
    report::write_relocation_notice(out)
}
