use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use vdeck::config::{self, Config};
use vdeck::contact::{DecorationItem, DecorationRole, WorkingSet};
use vdeck::decorate::{self, BatchAction};
use vdeck::store::Store;
use vdeck::vcard_io;

/// Exit code for rejected operations (bad user input), as opposed to faults.
const EXIT_REJECTED: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "vdeck",
    about = "Import, bulk-decorate and export vCard contact files"
)]
struct Cli {
    /// Alternate configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Alternate state file
    #[arg(long, global = true, value_name = "FILE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import contacts from a vCard file into the working set
    Import(ImportArgs),
    /// List the contacts in the working set
    List,
    /// Export the working set as a vCard 3.0 file
    Export(ExportArgs),
    /// Manage prefix/suffix decoration items
    #[command(subcommand)]
    Item(ItemCommand),
    /// Add or remove the configured decorations on selected contacts
    Apply(ApplyArgs),
    /// Delete all persisted state
    Reset,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Replace the current contacts instead of appending
    #[arg(long)]
    replace: bool,

    #[arg(value_name = "FILE")]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output file; defaults to vdeck_export_<YYYYMMDD>.vcf
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ItemCommand {
    /// Add a decoration item
    Add(ItemAddArgs),
    /// Delete a decoration item by id
    Rm(ItemIdArgs),
    /// Enable or disable a decoration item
    Toggle(ItemIdArgs),
    /// Move a decoration item up or down within its list
    Move(ItemMoveArgs),
    /// List all decoration items
    List,
}

#[derive(Args, Debug)]
struct ItemAddArgs {
    /// Which field the item decorates
    #[arg(long, value_enum, default_value_t = Target::Name)]
    target: Target,

    #[arg(long, value_enum)]
    role: Role,

    #[arg(value_name = "TEXT")]
    text: String,
}

#[derive(Args, Debug)]
struct ItemIdArgs {
    #[arg(value_name = "ID")]
    id: String,
}

#[derive(Args, Debug)]
struct ItemMoveArgs {
    #[arg(value_name = "ID")]
    id: String,

    #[arg(value_enum)]
    direction: Direction,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[arg(value_enum)]
    action: Action,

    /// Contact id to apply to; may be repeated
    #[arg(long = "id", value_name = "ID")]
    ids: Vec<String>,

    /// Apply to every contact in the working set
    #[arg(long)]
    all: bool,
}

#[derive(Clone, Debug, ValueEnum)]
enum Target {
    Name,
    Org,
}

#[derive(Clone, Debug, ValueEnum)]
enum Role {
    Prefix,
    Suffix,
}

impl From<Role> for DecorationRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Prefix => DecorationRole::Prefix,
            Role::Suffix => DecorationRole::Suffix,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
enum Direction {
    Up,
    Down,
}

#[derive(Clone, Debug, ValueEnum)]
enum Action {
    Add,
    Remove,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    let store = Store::open(cli.state.as_deref())?;

    match cli.command {
        Command::Import(args) => handle_import(args, &store),
        Command::List => handle_list(&store),
        Command::Export(args) => handle_export(args, &store),
        Command::Item(command) => handle_item(command, &store),
        Command::Apply(args) => handle_apply(args, &config, &store),
        Command::Reset => handle_reset(&store),
    }
}

fn handle_import(args: ImportArgs, store: &Store) -> Result<()> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read vCard file at {}", args.input.display()))?;

    let contacts = vcard_io::parse_vcards(&content);
    if contacts.is_empty() {
        eprintln!("warning: no vCards found in {}", args.input.display());
    }

    let mut set = store.load()?;
    if args.replace {
        set.contacts.clear();
    }
    let imported = contacts.len();
    set.contacts.extend(contacts);
    store.save(&set)?;

    println!(
        "Imported {} contacts from {}",
        imported,
        args.input.display()
    );
    Ok(())
}

fn handle_list(store: &Store) -> Result<()> {
    let set = store.load()?;
    for contact in &set.contacts {
        match contact.org.as_deref() {
            Some(org) if !org.is_empty() => {
                println!("{}\t{}\t{}", contact.id, contact.display_name, org)
            }
            _ => println!("{}\t{}", contact.id, contact.display_name),
        }
    }
    Ok(())
}

fn handle_export(args: ExportArgs, store: &Store) -> Result<()> {
    let set = store.load()?;
    if set.contacts.is_empty() {
        bail!("working set is empty; nothing to export");
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(vcard_io::suggested_export_filename()));
    let text = vcard_io::contacts_to_vcard_file(&set.contacts);
    fs::write(&output, text)
        .with_context(|| format!("failed to write export to {}", output.display()))?;

    println!(
        "Exported {} contacts to {}",
        set.contacts.len(),
        output.display()
    );
    Ok(())
}

fn handle_item(command: ItemCommand, store: &Store) -> Result<()> {
    match command {
        ItemCommand::Add(args) => {
            let mut set = store.load()?;
            let role = DecorationRole::from(args.role);
            let list = target_list(&mut set, &args.target, role);
            match decorate::add_item(list, &args.text, role) {
                Ok(id) => {
                    store.save(&set)?;
                    println!("Added item {id}");
                    Ok(())
                }
                Err(err) => {
                    eprintln!("cannot add item: {err}");
                    process::exit(EXIT_REJECTED);
                }
            }
        }
        ItemCommand::Rm(args) => {
            let mut set = store.load()?;
            let removed = all_lists(&mut set)
                .into_iter()
                .any(|list| decorate::remove_item(list, &args.id));
            if !removed {
                eprintln!("no decoration item with id {}", args.id);
                process::exit(EXIT_REJECTED);
            }
            store.save(&set)?;
            println!("Removed item {}", args.id);
            Ok(())
        }
        ItemCommand::Toggle(args) => {
            let mut set = store.load()?;
            let toggled = all_lists(&mut set)
                .into_iter()
                .any(|list| decorate::toggle_item(list, &args.id));
            if !toggled {
                eprintln!("no decoration item with id {}", args.id);
                process::exit(EXIT_REJECTED);
            }
            store.save(&set)?;
            println!("Toggled item {}", args.id);
            Ok(())
        }
        ItemCommand::Move(args) => {
            let mut set = store.load()?;
            let mut found = false;
            let mut moved = false;
            for list in all_lists(&mut set) {
                if let Some(index) = list.iter().position(|item| item.id == args.id) {
                    found = true;
                    moved = match args.direction {
                        Direction::Up => decorate::move_item_up(list, index),
                        Direction::Down => decorate::move_item_down(list, index),
                    };
                    break;
                }
            }
            if !found {
                eprintln!("no decoration item with id {}", args.id);
                process::exit(EXIT_REJECTED);
            }
            if moved {
                store.save(&set)?;
                println!("Moved item {}", args.id);
            } else {
                eprintln!("warning: item {} is already at the edge of its list", args.id);
            }
            Ok(())
        }
        ItemCommand::List => {
            let set = store.load()?;
            print_items("name-prefix", &set.name_prefixes);
            print_items("name-suffix", &set.name_suffixes);
            print_items("org-prefix", &set.org_prefixes);
            print_items("org-suffix", &set.org_suffixes);
            Ok(())
        }
    }
}

fn target_list<'a>(
    set: &'a mut WorkingSet,
    target: &Target,
    role: DecorationRole,
) -> &'a mut Vec<DecorationItem> {
    match (target, role) {
        (Target::Name, DecorationRole::Prefix) => &mut set.name_prefixes,
        (Target::Name, DecorationRole::Suffix) => &mut set.name_suffixes,
        (Target::Org, DecorationRole::Prefix) => &mut set.org_prefixes,
        (Target::Org, DecorationRole::Suffix) => &mut set.org_suffixes,
    }
}

fn all_lists(set: &mut WorkingSet) -> [&mut Vec<DecorationItem>; 4] {
    [
        &mut set.name_prefixes,
        &mut set.name_suffixes,
        &mut set.org_prefixes,
        &mut set.org_suffixes,
    ]
}

fn print_items(label: &str, items: &[DecorationItem]) {
    for item in items {
        let state = if item.enabled { "on" } else { "off" };
        println!("{label}\t{}\t{}\t{}", item.id, state, item.text);
    }
}

fn handle_apply(args: ApplyArgs, config: &Config, store: &Store) -> Result<()> {
    let mut set = store.load()?;

    let selected: HashSet<String> = if args.all {
        set.contacts.iter().map(|c| c.id.clone()).collect()
    } else if args.ids.is_empty() {
        bail!("select contacts with --id or --all");
    } else {
        let known: HashSet<&str> = set.contacts.iter().map(|c| c.id.as_str()).collect();
        for id in &args.ids {
            if !known.contains(id.as_str()) {
                eprintln!("warning: no contact with id {id}");
            }
        }
        args.ids.iter().cloned().collect()
    };

    let action = match args.action {
        Action::Add => BatchAction::Add,
        Action::Remove => BatchAction::Remove,
    };
    let options = config.apply_options();

    let affected = set
        .contacts
        .iter()
        .filter(|c| selected.contains(&c.id))
        .count();
    set.contacts = decorate::batch_apply(
        &set.contacts,
        &selected,
        &set.name_prefixes,
        &set.name_suffixes,
        &set.org_prefixes,
        &set.org_suffixes,
        action,
        &options,
    );
    store.save(&set)?;

    let verb = match action {
        BatchAction::Add => "Decorated",
        BatchAction::Remove => "Undecorated",
    };
    println!("{verb} {affected} contacts");
    Ok(())
}

fn handle_reset(store: &Store) -> Result<()> {
    store.reset()?;
    println!("Cleared working set and decoration lists");
    Ok(())
}
