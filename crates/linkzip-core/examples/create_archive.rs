//! Archives a directory, adding a `latest` symlink next to its contents.
//!
//! Usage: `cargo run --example create_archive -- <dir> <output.zip>`

use linkzip_core::ArchiveSession;
use linkzip_core::CreationConfig;
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let (Some(dir), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: create_archive <dir> <output.zip>");
        return ExitCode::FAILURE;
    };

    match run(&dir, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(dir: &str, output: &str) -> linkzip_core::Result<()> {
    let config = CreationConfig::default().with_compression_level(9);
    let mut session = ArchiveSession::with_config(config)?.with_destination(output);
    session.add_tree(dir)?;
    if let Some(first) = session.names().first().cloned() {
        session.add_symlink("latest", first)?;
    }
    session.close()?.into_result()?;

    let report = session.report();
    println!(
        "{output}: {} files, {} directories, {} symlinks ({:.1}x)",
        report.files_added,
        report.directories_added,
        report.symlinks_added,
        report.compression_ratio()
    );
    Ok(())
}
