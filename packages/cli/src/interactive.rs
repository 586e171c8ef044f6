#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the address map tool.
//!
//! Walks the user through the same settings the subcommands take, using
//! `dialoguer` prompts with the command-line defaults pre-filled.

use std::path::PathBuf;

use address_map_cli_utils::MultiProgress;
use address_map_geocoder::cancel::CancellationToken;
use address_map_input::RegionFilter;
use address_map_map::{ComposeOptions, MarkerStyle, Viewport};
use dialoguer::{Confirm, Input, Password, Select};

use crate::{GeocodeRun, OutputTarget, run_combine, run_geocode, spawn_interrupt_handler};

/// Top-level actions in the menu.
enum Action {
    Geocode,
    Combine,
}

impl Action {
    const ALL: &[Self] = &[Self::Geocode, Self::Combine];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Geocode => "Geocode addresses and build a map",
            Self::Combine => "Combine saved maps",
        }
    }
}

const STYLES: &[MarkerStyle] = &[MarkerStyle::ContactCard, MarkerStyle::Label];

/// Runs the menu, prompting for an action and its settings.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected run fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Address Map");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Geocode => geocode(multi).await?,
        Action::Combine => combine()?,
    }

    Ok(())
}

async fn geocode(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt("Address CSV")
        .default("contacts.csv".to_string())
        .interact_text()?;

    let style_labels: Vec<&str> = STYLES
        .iter()
        .map(|style| match style {
            MarkerStyle::ContactCard => "Contact card (name, address, phone, email)",
            MarkerStyle::Label => "Label and address",
        })
        .collect();
    let style = STYLES[Select::new()
        .with_prompt("Marker popup style")
        .items(&style_labels)
        .default(0)
        .interact()?];

    let filter = if Confirm::new()
        .with_prompt("Filter rows by city and state?")
        .default(true)
        .interact()?
    {
        let city: String = Input::new()
            .with_prompt("City")
            .default("winnetka".to_string())
            .interact_text()?;
        let state: String = Input::new()
            .with_prompt("State")
            .default("il".to_string())
            .interact_text()?;
        RegionFilter::new(Some(&city), Some(&state))
    } else {
        RegionFilter::default()
    };

    let polygons = prompt_optional_path("Polygon CSV (empty for none)", "polygons.csv")?;

    let api_key = match std::env::var("LOCATIONIQ_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => Password::new()
            .with_prompt("LocationIQ API key")
            .interact()?,
    };

    let output_dir: String = Input::new()
        .with_prompt("Output directory")
        .default("output".to_string())
        .interact_text()?;

    let run = GeocodeRun {
        input: PathBuf::from(input),
        polygons,
        style,
        filter,
        api_key: Some(api_key),
        service: None,
        compose: ComposeOptions::default(),
        output: OutputTarget {
            dir: PathBuf::from(output_dir),
            prefix: "address_map".to_string(),
        },
    };

    let cancel = CancellationToken::new();
    let handler = spawn_interrupt_handler(cancel.clone());
    let result = run_geocode(&run, multi, &cancel).await;
    handler.abort();

    let written = result?;
    println!("Map saved to {}", written.html.display());
    if written.interrupted {
        println!("Geocoding was interrupted; the map holds partial results.");
    }

    Ok(())
}

fn combine() -> Result<(), Box<dyn std::error::Error>> {
    let list: String = Input::new()
        .with_prompt("Map scene files (.json), comma-separated")
        .interact_text()?;
    let inputs: Vec<PathBuf> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect();

    if inputs.is_empty() {
        println!("No maps selected.");
        return Ok(());
    }

    let target = OutputTarget {
        dir: PathBuf::from("output"),
        prefix: "combined".to_string(),
    };
    let written = run_combine(&inputs, Viewport::default(), &target)?;
    println!(
        "Combined {} markers into {}",
        written.markers,
        written.html.display()
    );

    Ok(())
}

/// Prompts for a path with `initial` pre-typed; clearing it yields `None`.
fn prompt_optional_path(
    prompt: &str,
    initial: &str,
) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok((!input.is_empty()).then(|| PathBuf::from(input)))
}
