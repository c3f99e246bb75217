//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `inquiry_core` linkage and one instance build/destroy cycle.
//! - Keep output deterministic apart from the temp path.

use inquiry_core::{Context, Inquiry};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("inquiry_core ping={}", inquiry_core::ping());
    println!("inquiry_core version={}", inquiry_core::core_version());

    let data_dir = std::env::temp_dir().join("inquiry-cli-smoke");
    let result = Context::new("inquiry_cli", data_dir)
        .and_then(|context| Inquiry::new_instance(context, None).build())
        .and_then(|instance| {
            let path = instance.database_path()?;
            instance.drop_table("smoke")?;
            println!(
                "inquiry_core instance={} database={}",
                instance.instance_name().unwrap_or_default(),
                path.display()
            );
            instance.destroy_instance();
            Ok(())
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("inquiry_core smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}
