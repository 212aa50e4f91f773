use crate::config::{Config, default_export_dir, expand_home};
use crate::db::Database;
use crate::store::Session;
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

pub fn run_onboarding(anonymous_flag: bool) -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to LiftLog onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();

    println!("\n[1/3] Sign in");
    let session = if anonymous_flag {
        Session::anonymous()
    } else {
        let user_id: String = Input::with_theme(&theme)
            .with_prompt("  User id (leave empty to continue anonymously)")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read user id")?;

        if user_id.trim().is_empty() {
            Session::anonymous()
        } else {
            Session::signed_in(user_id.trim())
        }
    };

    if session.anonymous {
        println!("  ✓ Anonymous session: {}", session.user_id);
    } else {
        println!("  ✓ Signed in as {}", session.user_id);
    }

    println!("\n[2/3] Export directory");
    let default_export_dir = default_export_dir().display().to_string();
    let export_dir_input: String = Input::with_theme(&theme)
        .with_prompt("  Folder where CSV exports will be saved")
        .default(default_export_dir)
        .interact_text()
        .context("Failed to read export directory")?;

    let export_dir = expand_home(&export_dir_input);
    println!("  ✓ {}", export_dir.display());

    println!("\n[3/3] Progress chart");
    let pick_default = Confirm::with_theme(&theme)
        .with_prompt("  Show ベンチプレス progress by default?")
        .default(true)
        .interact()
        .context("Failed to read default exercise input")?;

    let config = Config {
        export_dir,
        user_id: Some(session.user_id.clone()),
        anonymous_session: session.anonymous,
        default_exercise: pick_default.then(|| "ベンチプレス".to_string()),
        ..Config::default()
    };

    config.ensure_bootstrap_files()?;
    config.save()?;
    let _ = Database::open(&config.db_path)?;

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Run LiftLog log <exercise> <weight> <reps> to record a set.");
    println!("──────────────────────────────────────────");

    Ok(config)
}
