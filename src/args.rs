use clap_derive::{Parser, Subcommand};
use derive_more::Display;
use dialoguer::{Input, Select};

use std::{error, path::PathBuf};

use imperator_setup_editor::types::ProvinceId;

#[derive(Debug, Display)]
enum InvalidPath {
    #[display("invalid path (does not exist)")]
    InvalidPath,
    #[display("not a file")]
    NotAFile,
}

impl error::Error for InvalidPath {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

/// A function to validate the file path input.
fn validate_file_path(input: &String) -> Result<(), InvalidPath> {
    let p = PathBuf::from(input);
    if !p.exists() {
        Err(InvalidPath::InvalidPath)
    } else if !p.is_file() {
        Err(InvalidPath::NotAFile)
    } else {
        Ok(())
    }
}

/// A function to parse the path argument.
fn parse_file_arg(input: &str) -> Result<PathBuf, &'static str> {
    let p = PathBuf::from(input);
    if p.is_file() {
        Ok(p)
    } else {
        Err("Invalid path")
    }
}

/// The things the editor can do.
#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the name and canonical form of a province.
    Show { id: ProvinceId },
    /// Find the province painted in the given color.
    Color { r: u8, g: u8, b: u8 },
    /// Find the province under a pixel of the province map.
    Pixel { x: u32, y: u32 },
    /// Apply an edit session, regenerating the edited files and the localization.
    Apply {
        #[arg(value_parser = parse_file_arg)]
        /// The json file holding the edits.
        edits: PathBuf,
    },
    /// Check every province against the vocabularies and the game's text reader.
    Check,
}

const COMMANDS: [&str; 5] = ["show", "color", "pixel", "apply", "check"];

/// The arguments to the program.
#[derive(Parser)]
pub struct Args {
    #[arg(short, long, default_value = "settings.json")]
    /// The path to the settings file.
    pub settings: PathBuf,
    #[arg(short, long, default_value_t = false)]
    /// A flag that enables debug logging.
    pub verbose: bool,
    #[arg(short, long, default_value_t = false)]
    /// A flag that tells the program not to interact with the user.
    pub no_interaction: bool,
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Create the object based on user input.
    pub fn get_from_user() -> Result<Self, dialoguer::Error> {
        println!("Welcome to the Imperator province setup editor!\nArrows cycle through possible options and enter confirms the selection.");
        let settings = PathBuf::from(
            Input::<String>::new()
                .with_prompt("Enter the settings file path")
                .with_initial_text("settings.json")
                .validate_with(validate_file_path)
                .interact_text()?,
        );
        let selection = Select::new()
            .with_prompt("Choose what to do")
            .items(&COMMANDS)
            .default(0)
            .interact()?;
        let command = match COMMANDS[selection] {
            "show" => Command::Show {
                id: Input::new().with_prompt("Enter the province id").interact_text()?,
            },
            "color" => Command::Color {
                r: Input::new().with_prompt("Red").interact_text()?,
                g: Input::new().with_prompt("Green").interact_text()?,
                b: Input::new().with_prompt("Blue").interact_text()?,
            },
            "pixel" => Command::Pixel {
                x: Input::new().with_prompt("X").interact_text()?,
                y: Input::new().with_prompt("Y").interact_text()?,
            },
            "apply" => Command::Apply {
                edits: PathBuf::from(
                    Input::<String>::new()
                        .with_prompt("Enter the edits file path")
                        .validate_with(validate_file_path)
                        .interact_text()?,
                ),
            },
            _ => Command::Check,
        };
        Ok(Args {
            settings,
            verbose: false,
            no_interaction: false,
            command,
        })
    }
}
