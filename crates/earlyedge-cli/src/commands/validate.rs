//! The `earlyedge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use earlyedge_core::parser::{load_bank_directory, parse_bank, validate_bank};

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = if bank_path.is_dir() {
        load_bank_directory(&bank_path)?
    } else {
        vec![parse_bank(&bank_path)?]
    };

    anyhow::ensure!(!banks.is_empty(), "no bank files found in {}", bank_path.display());

    let mut total_warnings = 0usize;
    for bank in &banks {
        println!(
            "{}: {} ({}, {} items)",
            bank.id,
            bank.name,
            bank.test,
            bank.stimuli.len()
        );
        for warning in validate_bank(bank) {
            total_warnings += 1;
            match &warning.item_id {
                Some(id) => println!("  warning [{id}]: {}", warning.message),
                None => println!("  warning: {}", warning.message),
            }
        }
    }

    if total_warnings == 0 {
        println!("All question banks valid ({} banks)", banks.len());
    } else {
        println!("{total_warnings} warning(s) across {} banks", banks.len());
    }

    Ok(())
}
