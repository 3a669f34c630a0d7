//! Check command implementation.

use anyhow::{bail, Result};
use colored::Colorize;
use rollcall_core::{Field, Validity};
use tracing::info;

/// Execute the check command.
pub fn execute(field: Field, value: &str, quiet: bool) -> Result<()> {
    let mask = field.mask();
    let masked = mask.apply(value);
    let accepted = mask.accepts(&masked.value);

    info!(
        field = field.name(),
        validity = %masked.validity,
        accepted,
        "Checked field value"
    );

    if quiet {
        println!("{}", masked.value);
    } else {
        let validity = match masked.validity {
            Validity::Valid => "valid".green(),
            Validity::Partial => "partial".yellow(),
            Validity::Empty => "empty".dimmed(),
        };
        println!("   {} {}", "Field:".dimmed(), field);
        println!("   {} {}", "Masked:".dimmed(), masked.value);
        println!("   {} {}", "State:".dimmed(), validity);
        if let Some(max) = mask.max_len() {
            println!("   {} {} digits", "Length:".dimmed(), max);
        }
    }

    if field.is_strict() && !accepted {
        bail!(
            "Validation failed: '{}' is not a valid {}",
            masked.value,
            field
        );
    }
    Ok(())
}
