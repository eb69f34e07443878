use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use psm_core::{SaveManager, ServerLayout, ToolConfig, WorldEntry};
use tracing_subscriber::EnvFilter;

mod console;
mod menu;

use console::{BRIGHT, CYAN, Console, INTERRUPT, MenuError, MenuResult, YELLOW};

#[derive(Parser, Debug)]
#[command(
    name = "psm",
    about = "Switch, trash and restore Palworld dedicated server worlds",
    version
)]
struct Cli {
    /// Tool config file holding the server path
    #[arg(long, default_value = psm_core::config::CONFIG_FILE)]
    config: PathBuf,
    /// Server installation root; overrides the config file
    #[arg(long)]
    server_dir: Option<PathBuf>,
    /// Active world folder; skips detection from GameUserSettings.ini
    #[arg(long)]
    active: Option<String>,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Interactive menu (default)
    Menu,
    /// List inactive worlds
    List(ListArgs),
    /// List trashed worlds
    Trash(ListArgs),
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Emit JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Inside a menu action Ctrl+C only cancels the action; anywhere else it quits.
    if let Err(e) = ctrlc::set_handler(|| {
        if INTERRUPT.is_armed() {
            INTERRUPT.request();
            eprintln!("\nInterrupted, press Enter to return to menu");
        } else {
            std::process::exit(130);
        }
    }) {
        tracing::warn!(error = %e, "failed to install Ctrl+C handler");
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) | Err(MenuError::Cancelled) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> MenuResult<()> {
    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    let layout = resolve_layout(&cli, &mut console)?;
    let active = resolve_active(&cli, &layout, &mut console)?;
    let manager = SaveManager::open(layout, active)?;
    tracing::debug!(active = manager.active_id(), root = %manager.layout().root().display(), "opened saves");

    match cli.cmd.unwrap_or(Cmd::Menu) {
        Cmd::Menu => menu::Menu::new(manager, console).run(),
        Cmd::List(a) => write_entries(&mut io::stdout().lock(), &manager.worlds()?, a.json),
        Cmd::Trash(a) => write_entries(&mut io::stdout().lock(), &manager.trash()?, a.json),
    }
}

fn resolve_layout<R: BufRead, W: Write>(
    cli: &Cli,
    console: &mut Console<R, W>,
) -> MenuResult<ServerLayout> {
    if let Some(dir) = &cli.server_dir {
        return Ok(ServerLayout::new(dir));
    }
    if let Some(cfg) = ToolConfig::load(&cli.config)? {
        return Ok(cfg.layout());
    }
    let style = format!("{}{}", CYAN, BRIGHT);
    let dir = loop {
        let s = console.ask(
            &style,
            "Enter full path to your PalServer folder (ex. C:\\Program Files (x86)\\Steam\\SteamApps\\common\\PalServer): ",
        )?;
        if !s.is_empty() {
            break s;
        }
    };
    let cfg = ToolConfig::new(dir);
    cfg.save(&cli.config)?;
    Ok(cfg.layout())
}

fn resolve_active<R: BufRead, W: Write>(
    cli: &Cli,
    layout: &ServerLayout,
    console: &mut Console<R, W>,
) -> MenuResult<String> {
    if let Some(id) = &cli.active {
        return Ok(id.clone());
    }
    if let Some(id) = psm_core::detect_active_id(layout)? {
        return Ok(id);
    }
    let style = format!("{}{}", YELLOW, BRIGHT);
    loop {
        let id = console.ask(&style, "Enter the active world folder name manually: ")?;
        if !id.is_empty() && layout.world_dir(&id).is_dir() {
            return Ok(id);
        }
        console.say(
            YELLOW,
            &format!("No folder named {:?} in {}", id, layout.saves_dir().display()),
        )?;
    }
}

fn write_entries<W: Write>(out: &mut W, entries: &[WorldEntry], json: bool) -> MenuResult<()> {
    if json {
        let arr: Vec<serde_json::Value> = entries
            .iter()
            .map(|w| {
                serde_json::json!({
                    "folder": w.folder,
                    "name": w.display_name,
                    "modified": w.modified.map(|t| t.to_rfc3339()),
                })
            })
            .collect();
        let s = serde_json::to_string_pretty(&arr).map_err(io::Error::other)?;
        writeln!(out, "{}", s)?;
        return Ok(());
    }
    for (i, w) in entries.iter().enumerate() {
        let modified = w
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        writeln!(out, "{}. {}\t(Folder: {})\t{}", i + 1, w.display_name, w.folder, modified)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(folder: &str, name: &str) -> WorldEntry {
        WorldEntry {
            folder: folder.to_string(),
            display_name: name.to_string(),
            modified: None,
        }
    }

    fn render(entries: &[WorldEntry], json: bool) -> String {
        let mut out = Vec::new();
        write_entries(&mut out, entries, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn text_listing_numbers_entries() {
        let out = render(&[entry("world1", "Island"), entry("world3", "world3")], false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1. Island\t(Folder: world1)\t");
        assert!(lines[1].starts_with("2. world3\t(Folder: world3)"));
    }

    #[test]
    fn json_listing_has_folder_name_and_time() {
        let mut dated = entry("world2", "Desert");
        dated.modified = Some(chrono::Local::now());
        let out = render(&[entry("world1", "Island"), dated], true);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["folder"], "world1");
        assert_eq!(arr[0]["name"], "Island");
        assert!(arr[0]["modified"].is_null());
        assert!(arr[1]["modified"].is_string());
    }

    #[test]
    fn empty_listing() {
        assert_eq!(render(&[], true).trim(), "[]");
        assert_eq!(render(&[], false), "");
    }

    #[test]
    fn cli_parses_list_json() {
        let cli = Cli::try_parse_from(["psm", "--server-dir", "/srv/pal", "trash", "--json"]).unwrap();
        assert!(matches!(cli.cmd, Some(Cmd::Trash(ListArgs { json: true }))));
        assert_eq!(cli.server_dir, Some(PathBuf::from("/srv/pal")));
    }
}
