use clap::Parser as _;
use dialoguer::Confirm;
use human_panic::setup_panic;
use image::Rgb;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{warn, Level};

use std::{
    env, error,
    io::{stderr, stdin, stdout, IsTerminal},
    process::ExitCode,
};

use imperator_setup_editor::{
    game_data::{ProvinceSetup, SetupError, SetupLoader},
    serializer::{verify_render, write_changed, write_localization, ProvinceBlock},
    session::EditSession,
    settings::Settings,
    types::ProvinceId,
};

/// A submodule for handling the command line arguments
mod args;
use args::{Args, Command};

type Error = Box<dyn error::Error>;

/// Loads the setup, showing a progress bar over the script files
fn load(settings: &Settings, load_map: bool) -> Result<ProvinceSetup, SetupError> {
    let mut loader = SetupLoader::new(settings, load_map)?;
    let files = loader.script_files()?;
    let bar_style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let progress_bar = ProgressBar::new(files.len() as u64);
    progress_bar.set_style(bar_style);
    for file in progress_bar.wrap_iter(files.iter()) {
        if let Some(name) = file.file_name() {
            progress_bar.set_message(name.to_string_lossy().into_owned());
        }
        loader.add_script_file(file)?;
    }
    progress_bar.finish_with_message("Setup files loaded");
    loader.finalize()
}

fn show(setup: &ProvinceSetup, id: ProvinceId) -> Result<(), Error> {
    let record = setup
        .record_for(id)
        .ok_or_else(|| format!("province {} is not defined in any setup file", id))?;
    if let Some(file) = setup.get_records().source_file(id) {
        println!("# {}", file.name);
    }
    print!("{}", ProvinceBlock::new(&record, &setup.name_for(id)));
    Ok(())
}

fn print_province(setup: &ProvinceSetup, id: Option<ProvinceId>) {
    match id {
        Some(id) => println!("{} ({})", id, setup.name_for(id)),
        None => println!("No province found"),
    }
}

fn apply(
    settings: &Settings,
    setup: &ProvinceSetup,
    session: &EditSession,
    interactive: bool,
) -> Result<(), Error> {
    let edited = session.edited_ids();
    for id in edited.iter() {
        if setup.get_records().source_file(*id).is_none() {
            warn!("province {} is not defined in any setup file, its edit is ignored", id);
        }
    }
    let files: Vec<_> = setup
        .get_records()
        .files()
        .iter()
        .filter(|f| f.provinces.iter().any(|id| edited.contains(id)))
        .map(|f| f.name.as_str())
        .collect();
    println!(
        "{} edited provinces in {} files: {}",
        edited.len(),
        files.len(),
        files.join(", ")
    );
    if interactive
        && !Confirm::new()
            .with_prompt(format!(
                "Write the changes to {}?",
                settings.output_path.display()
            ))
            .default(true)
            .interact()?
    {
        println!("Nothing was written");
        return Ok(());
    }
    for path in write_changed(setup, session, &settings.output_path)? {
        println!("Wrote {}", path.display());
    }
    let path = write_localization(setup, session, settings, &settings.output_path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn check(settings: &Settings, setup: &ProvinceSetup) -> Result<(), Error> {
    let mut problems = 0;
    for id in setup.get_records().ids() {
        let record = match setup.record_for(id) {
            Some(record) => record,
            None => continue,
        };
        for unknown in settings.unknown_values(&record) {
            println!(
                "province {}: unknown {} {:?}",
                id, unknown.field, unknown.value
            );
            problems += 1;
        }
        let text = ProvinceBlock::new(&record, &setup.name_for(id)).to_string();
        if let Err(e) = verify_render(&text) {
            println!("province {}: the game can't read its render: {}", id, e);
            problems += 1;
        }
    }
    if problems > 0 {
        return Err(format!("found {} problems", problems).into());
    }
    println!("{} provinces checked, no problems found", setup.get_records().len());
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    let settings = Settings::load(&args.settings)?;
    let load_map = matches!(args.command, Command::Pixel { .. });
    let setup = load(&settings, load_map)?;
    match &args.command {
        Command::Show { id } => show(&setup, *id),
        Command::Color { r, g, b } => {
            print_province(&setup, setup.id_for_color(Rgb([*r, *g, *b])));
            Ok(())
        }
        Command::Pixel { x, y } => {
            print_province(&setup, setup.province_at(*x, *y));
            Ok(())
        }
        Command::Apply { edits } => {
            let session = EditSession::load(edits)?;
            let interactive =
                !args.no_interaction && stdin().is_terminal() && stdout().is_terminal();
            apply(&settings, &setup, &session, interactive)
        }
        Command::Check => check(&settings, &setup),
    }
}

/// Main function. This is the entry point of the program.
///
/// Without arguments in a terminal, the user is prompted for what to do.
fn main() -> ExitCode {
    setup_panic!();
    let args = if env::args().len() < 2 && stdin().is_terminal() {
        match Args::get_from_user() {
            Ok(args) => args,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        Args::parse()
    };
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(stderr)
        .init();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
