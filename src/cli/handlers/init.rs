use std::path::Path;

use chrono::Utc;

use crate::cli::commands::InitArgs;
use crate::io::{board_io, config_io};
use crate::ops::entity_ops::{Theme, ensure_admin, seed_sample_data};
use crate::ops::i18n::{Language, Translator};

/// Infer a board name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let language = match args.lang.as_deref() {
        Some(code) => Some(
            Language::from_code(code).ok_or_else(|| format!("unknown language \"{}\"", code))?,
        ),
        None => None,
    };
    let theme = match args.theme.as_deref() {
        Some(t) => Some(Theme::parse_theme(t).ok_or_else(|| format!("unknown theme \"{}\"", t))?),
        None => None,
    };

    // Check for parent board and warn
    if let Some(parent) = root.parent()
        && let Ok(parent_root) = board_io::discover_board(parent)
    {
        let parent_board = parent_root.join(board_io::BOARD_DIR);
        eprintln!("Note: parent board found at {}/", parent_board.display());
        eprintln!("Creating new board in ./{}/", board_io::BOARD_DIR);
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let mut board = board_io::init_board(root, &name, args.force)?;

    if language.is_some() || theme.is_some() {
        let (_, mut doc) = config_io::read_config(&board.board_dir)?;
        if let Some(language) = language {
            config_io::set_ui_value(&mut doc, "default_language", language.code());
        }
        if let Some(theme) = theme {
            config_io::set_ui_value(&mut doc, "default_theme", theme.as_str());
        }
        config_io::write_config(&board.board_dir, &doc)?;
    }

    let seeded = if args.sample {
        let tr = Translator::new(language.unwrap_or_default());
        seed_sample_data(&mut board.store, &tr, Utc::now())?
    } else {
        false
    };
    let admin = ensure_admin(&mut board.store)?;

    println!("Initialized taskboard: {}", name);
    println!("  current user: {} ({})", admin.name, admin.id);
    if seeded {
        println!("  added sample data");
    }
    Ok(())
}
