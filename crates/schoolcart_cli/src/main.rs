//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire config, logging and store selection the way an application would.
//! - Print the catalog and, given credentials, the user's saved cart.
//!
//! Usage: `schoolcart_cli [config.toml] [username password]`

use schoolcart_core::{init_logging, load_config, CartService, ServiceResult, StoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, credentials) = match args.as_slice() {
        [] => (None, None),
        [path] => (Some(path.as_str()), None),
        [username, password] => (None, Some((username.as_str(), password.as_str()))),
        [path, username, password] => (
            Some(path.as_str()),
            Some((username.as_str(), password.as_str())),
        ),
        _ => {
            eprintln!("usage: schoolcart_cli [config.toml] [username password]");
            return ExitCode::from(2);
        }
    };

    let config = match config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("config error: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => demo_config(),
    };

    if let Err(err) = init_logging(&config.log) {
        eprintln!("logging error: {err}");
        return ExitCode::FAILURE;
    }

    println!("schoolcart_core ping={}", schoolcart_core::ping());
    println!("schoolcart_core version={}", schoolcart_core::core_version());

    let service = match CartService::from_config(&config) {
        Ok(service) => service,
        Err(err) => {
            log::error!("event=cli_start module=cli status=error error={err}");
            eprintln!("store error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match print_report(&service, credentials) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("read error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn demo_config() -> StoreConfig {
    let mut config = StoreConfig {
        seed_sample_catalog: true,
        ..StoreConfig::default()
    };
    config.log.level = "warn".to_string();
    config
}

fn print_report<S: schoolcart_core::CartStore>(
    service: &CartService<S>,
    credentials: Option<(&str, &str)>,
) -> ServiceResult<()> {
    for school in service.list_schools()? {
        println!("school {} {}", school.id, school.name);
        for grade in service.list_grades(&school.id.to_string())? {
            let required = service.list_required_equipment(&grade.id.to_string())?;
            println!("  grade {} {} required_items={}", grade.id, grade.name, required.len());
        }
    }

    let Some((username, password)) = credentials else {
        return Ok(());
    };
    let Some(user_id) = service.resolve_user_id(username, password)? else {
        println!("no user matches the given credentials");
        return Ok(());
    };

    let cart = service.get_cart(&user_id)?;
    println!("cart user_id={user_id} entries={}", cart.len());
    for entry in cart {
        println!("  {} / {}", entry.school.name, entry.grade.name);
        for item in entry.items {
            println!("    {} x{}", item.equipment.name, item.quantity);
        }
    }
    Ok(())
}
