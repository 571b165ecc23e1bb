//! Version command implementation

use crate::cli::Output;
use crate::{PKG_DESCRIPTION, PKG_NAME, VERSION};
use anyhow::Result;

/// Execute the version command
pub async fn execute(output: &Output) -> Result<()> {
    output.header("seedpool Version Information");
    output.key_value("Version:", &format!("{PKG_NAME} v{VERSION}"), true);
    output.blank_line();

    output.category("About");
    output.key_value("Description:", PKG_DESCRIPTION, false);
    output.blank_line();

    output.category("Build Information");
    output.key_value("Rust edition:", "2024", false);
    output.key_value("Target:", std::env::consts::ARCH, false);
    output.key_value("Profile:", if cfg!(debug_assertions) { "debug" } else { "release" }, false);
    output.key_value("CPU cores:", &num_cpus::get().to_string(), false);

    output.blank_line();
    output.success("Run 'seedpool --help' for usage information");

    Ok(())
}
