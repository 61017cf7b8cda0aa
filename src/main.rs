//! typeset – command-line XML document → PDF converter.
//!
//! Usage:
//!   typeset <input.xml> [output.pdf] [--title "My Report"] [--font-dir fonts/] [--layout-json]
//!
//! If `output.pdf` is omitted the PDF is written next to the input file with
//! the same stem (e.g. `report.xml` → `report.pdf`). With `--layout-json` the
//! recorded draw operations are written instead (default extension `.json`).

use std::{env, fs, path::PathBuf, process};

use typeset_forge::pipeline::{generate_layout, generate_pdf, PipelineConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut title: Option<String> = None;
    let mut font_dir: Option<PathBuf> = None;
    let mut layout_json = false;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--layout-json" | "-j" => layout_json = true,
            "--title" | "-t" => match iter.next() {
                Some(v) => title = Some(v.clone()),
                None => {
                    eprintln!("Missing value for {arg}");
                    process::exit(1);
                }
            },
            "--font-dir" | "-f" => match iter.next() {
                Some(v) => font_dir = Some(PathBuf::from(v)),
                None => {
                    eprintln!("Missing value for {arg}");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension(if layout_json { "json" } else { "pdf" });
        o
    });

    let xml = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    // Relative image paths resolve against the input's directory.
    let resource_dir = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from);

    let config = PipelineConfig {
        title,
        font_dir,
        resource_dir,
    };

    let (bytes, pages) = if layout_json {
        match generate_layout(&xml, &config).map(|rec| (rec.to_json(), rec.pages)) {
            Ok((Ok(json), pages)) => (json.into_bytes(), pages),
            Ok((Err(e), _)) => {
                eprintln!("Error encoding layout: {e}");
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error laying out document: {e}");
                process::exit(1);
            }
        }
    } else {
        match generate_pdf(&xml, &config) {
            Ok(compiled) => (compiled.bytes, compiled.pages),
            Err(e) => {
                eprintln!("Error generating PDF: {e}");
                process::exit(1);
            }
        }
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(&output, &bytes) {
        eprintln!("Error writing '{}': {e}", output.display());
        process::exit(1);
    }
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
}

fn print_usage(prog: &str) {
    eprintln!("typeset – XML document to PDF converter (typeset-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.xml> [output.pdf] [--title \"My Report\"] [--font-dir DIR] [--layout-json]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.xml>    Document to typeset");
    eprintln!("  [output.pdf]   Output path  (default: same stem as input)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --title, -t        Document title in PDF metadata (default: <meta><subject>)");
    eprintln!("  --font-dir, -f     Directory of <Family>-Regular.ttf style fonts to embed");
    eprintln!("  --layout-json, -j  Write the recorded draw operations as JSON instead of PDF");
    eprintln!("  --help             Print this message");
    eprintln!();
    eprintln!("Set RUST_LOG=debug (or warn, trace) for diagnostics.");
}
